use crate::chat::{ChatService, StoreEvent, preview_title};
use crate::render::{ResponseView, select_view};
use crate::types::{ChatMessage, ChatMode, ExpertiseLevel, Session};
use crate::views::response::ResponseBlock;
use crate::views::shared::{ErrorBanner, format_list_date, format_message_timestamp};
use dioxus::events::Key;
use dioxus::prelude::*;
use tokio::sync::broadcast::error::RecvError;

#[derive(Clone, Copy, PartialEq)]
struct ChatState {
    sessions: Signal<Vec<Session>>,
    active_session: Signal<Option<i64>>,
    messages: Signal<Vec<ChatMessage>>,
    mode: Signal<ChatMode>,
    level: Signal<ExpertiseLevel>,
    input: Signal<String>,
    sending: Signal<bool>,
    error: Signal<Option<String>>,
}

impl ChatState {
    fn report(mut self, err: impl std::fmt::Display) {
        tracing::warn!(error = %err, "chat action failed");
        self.error.set(Some(err.to_string()));
    }
}

async fn refresh_sessions(service: &ChatService, state: ChatState) {
    let mut sessions = state.sessions;
    match service.sessions().await {
        Ok(list) => sessions.set(list),
        Err(err) => state.report(err),
    }
}

async fn refresh_messages(service: &ChatService, state: ChatState, session_id: i64) {
    let mut messages = state.messages;
    match service.messages(session_id).await {
        Ok(list) => {
            // The user may have switched sessions while this was loading.
            if (state.active_session)() == Some(session_id) {
                messages.set(list);
            }
        }
        Err(err) => state.report(err),
    }
}

fn select_session(service: ChatService, state: ChatState, session_id: Option<i64>) {
    let mut active_session = state.active_session;
    let mut messages = state.messages;
    active_session.set(session_id);
    messages.set(Vec::new());
    if let Some(id) = session_id {
        spawn(async move {
            refresh_messages(&service, state, id).await;
        });
    }
}

fn delete_session(service: ChatService, state: ChatState, session_id: i64) {
    if (state.active_session)() == Some(session_id) {
        let mut active_session = state.active_session;
        let mut messages = state.messages;
        active_session.set(None);
        messages.set(Vec::new());
    }
    spawn(async move {
        if let Err(err) = service.delete_session(session_id).await {
            state.report(err);
        }
    });
}

fn send_message(service: ChatService, state: ChatState, text: String) {
    let mut sending = state.sending;
    let mut input = state.input;
    let mut active_session = state.active_session;

    let trimmed = text.trim().to_string();
    if trimmed.is_empty() || sending() {
        return;
    }
    let mode = (state.mode)();
    let level = (state.level)();
    sending.set(true);
    input.set(String::new());

    spawn(async move {
        let session_id = match active_session() {
            Some(id) => Some(id),
            None => match service.create_session(Some(&preview_title(&trimmed))).await {
                Ok(session) => {
                    active_session.set(Some(session.id));
                    Some(session.id)
                }
                Err(err) => {
                    state.report(err);
                    None
                }
            },
        };
        if let Some(session_id) = session_id {
            match service.send(session_id, &trimmed, mode, level).await {
                Ok(_) => refresh_messages(&service, state, session_id).await,
                Err(err) => state.report(err),
            }
        }
        sending.set(false);
    });
}

/// Keeps the sidebar and message list in step with store changes.
fn use_store_events(service: ChatService, state: ChatState) {
    use_future(move || {
        let service = service.clone();
        async move {
            let mut events = service.subscribe();
            futures::join!(refresh_sessions(&service, state), async {
                if let Some(id) = (state.active_session)() {
                    refresh_messages(&service, state, id).await;
                }
            });
            loop {
                match events.recv().await {
                    Ok(StoreEvent::SessionsChanged) => refresh_sessions(&service, state).await,
                    Ok(StoreEvent::MessagesChanged(id)) => {
                        if (state.active_session)() == Some(id) {
                            refresh_messages(&service, state, id).await;
                        }
                    }
                    Ok(StoreEvent::EstimatesChanged) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "chat view lagged behind store events");
                        refresh_sessions(&service, state).await;
                        if let Some(id) = (state.active_session)() {
                            refresh_messages(&service, state, id).await;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    });
}

#[component]
pub fn ChatView(level: Signal<ExpertiseLevel>) -> Element {
    let service = use_context::<ChatService>();
    let state = ChatState {
        sessions: use_signal(Vec::<Session>::new),
        active_session: use_signal(|| Option::<i64>::None),
        messages: use_signal(Vec::<ChatMessage>::new),
        mode: use_signal(|| ChatMode::GeneralSearch),
        level,
        input: use_signal(String::new),
        sending: use_signal(|| false),
        error: use_signal(|| Option::<String>::None),
    };

    use_store_events(service.clone(), state);

    let mut input = state.input;
    let mut mode = state.mode;
    let mut level = state.level;
    let sessions_snapshot = (state.sessions)();
    let messages_snapshot = (state.messages)();
    let active = (state.active_session)();
    let sending = (state.sending)();
    let placeholder = mode().placeholder();

    let new_service = service.clone();
    let key_service = service.clone();
    let click_service = service.clone();

    rsx! {
        div { class: "main-container with-sidebar",
            aside { class: "session-sidebar",
                button {
                    class: "btn btn-primary", r#type: "button",
                    onclick: move |_| {
                        let service = new_service.clone();
                        spawn(async move {
                            match service.create_session(None).await {
                                Ok(session) => select_session(service, state, Some(session.id)),
                                Err(err) => state.report(err),
                            }
                        });
                    },
                    "New conversation"
                }
                ul { class: "session-list",
                    for session in sessions_snapshot.iter() {
                        SessionRow {
                            key: "{session.id}",
                            session: session.clone(),
                            active: active == Some(session.id),
                            state,
                        }
                    }
                }
            }

            div { class: "chat-wrap",
                ErrorBanner { error: state.error }
                div { id: "chat-list", class: "chat-list",
                    if messages_snapshot.is_empty() {
                        div { class: "empty-state", "Pick a mode and ask about your next build." }
                    }
                    for (i, msg) in messages_snapshot.iter().enumerate() {
                        MessageItem { key: "{i}", message: msg.clone() }
                    }
                    if sending {
                        div { class: "shimmer-line",
                            span { class: "shimmer-text", "Processing…" }
                        }
                    }
                }

                form { class: "composer no-divider",
                    div { class: "composer-inner",
                        div { class: "hstack composer-options",
                            select {
                                class: "mode-select",
                                value: mode().slug(),
                                onchange: move |ev| {
                                    if let Some(picked) = ChatMode::from_label(&ev.value()) {
                                        mode.set(picked);
                                    }
                                },
                                for choice in ChatMode::ALL {
                                    option { key: "{choice.slug()}", value: choice.slug(), selected: choice == mode(), {choice.label()} }
                                }
                            }
                            select {
                                class: "level-select",
                                value: level().slug(),
                                onchange: move |ev| {
                                    if let Ok(picked) = ev.value().parse::<ExpertiseLevel>() {
                                        level.set(picked);
                                    }
                                },
                                for choice in ExpertiseLevel::ALL {
                                    option { key: "{choice.slug()}", value: choice.slug(), selected: choice == level(), {choice.label()} }
                                }
                            }
                        }
                        div { class: "hstack", style: "gap: 0.5rem; width: 100%; align-items: flex-end;",
                            textarea {
                                class: "", rows: "1", placeholder: placeholder,
                                value: "{input}", oninput: move |ev| input.set(ev.value()),
                                onkeydown: move |ev| {
                                    if ev.key() == Key::Enter && !ev.modifiers().shift() {
                                        ev.prevent_default();
                                        send_message(key_service.clone(), state, input());
                                    }
                                },
                                disabled: sending, autofocus: true,
                            }
                            button {
                                class: "btn btn-primary", r#type: "button",
                                disabled: sending || input().trim().is_empty(),
                                onclick: move |_| send_message(click_service.clone(), state, input()),
                                "Send"
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn SessionRow(session: Session, active: bool, state: ChatState) -> Element {
    let service = use_context::<ChatService>();
    let session_id = session.id;
    let created = format_list_date(session.created_at);
    let row_class = if active { "session-row active" } else { "session-row" };
    let open_service = service.clone();
    rsx! {
        li { class: row_class,
            button {
                class: "session-open", r#type: "button",
                onclick: move |_| select_session(open_service.clone(), state, Some(session_id)),
                span { class: "session-name", "{session.name}" }
                span { class: "session-date", "{created}" }
            }
            button {
                class: "action-btn", r#type: "button", title: "Delete conversation",
                onclick: move |_| delete_session(service.clone(), state, session_id),
                "Delete"
            }
        }
    }
}

#[component]
fn MessageItem(message: ChatMessage) -> Element {
    let side = if message.is_user() { "user" } else { "assistant" };
    let align = if message.is_user() { "align-end" } else { "align-start" };
    let mode_label = message.chat_mode.map(ChatMode::label);
    rsx! {
        div { class: format_args!("message-row {}", side),
            if !message.is_user() { div { class: "avatar assistant", "B" } }
            div { class: "message-stack",
                div { class: format_args!("bubble {}", side),
                    if message.is_user() {
                        "{message.text}"
                    } else {
                        AssistantBubble {
                            content: message.text.clone(),
                            view: select_view(&message.text, message.chat_mode),
                        }
                    }
                }
                div { class: format_args!("message-meta {}", align),
                    if let Some(ts) = format_message_timestamp(message.created_at) {
                        span { class: "message-timestamp", "{ts}" }
                    }
                    if let Some(label) = mode_label {
                        span { class: "message-mode", "{label}" }
                    }
                }
            }
        }
    }
}

#[component]
fn AssistantBubble(content: String, view: ResponseView) -> Element {
    let copy_payload = content.clone();
    let on_copy = move |_| {
        let raw = copy_payload.clone();
        spawn(async move {
            #[cfg(any(feature = "desktop", feature = "mobile"))]
            {
                if let Ok(mut cb) = arboard::Clipboard::new() {
                    let _ = cb.set_text(raw);
                }
            }
        });
    };

    rsx! {
        div { class: "bubble-controls",
            div { class: "actions",
                span { class: "view-kind", {view.kind()} }
                button { class: "action-btn", title: "Copy reply", onclick: on_copy, "Copy" }
            }
        }
        ResponseBlock { view }
    }
}
