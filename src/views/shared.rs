use crate::render::markdown_to_html;
use dioxus::prelude::*;
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};

const MESSAGE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour repr:12 padding:zero]:[minute padding:zero] [period case:upper]");

const LIST_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

fn to_local(datetime: OffsetDateTime) -> OffsetDateTime {
    match UtcOffset::current_local_offset() {
        Ok(offset) => datetime.to_offset(offset),
        Err(_) => datetime,
    }
}

pub fn format_message_timestamp(timestamp: Option<OffsetDateTime>) -> Option<String> {
    to_local(timestamp?).format(MESSAGE_TIME_FORMAT).ok()
}

pub fn format_list_date(timestamp: OffsetDateTime) -> String {
    to_local(timestamp)
        .format(LIST_DATE_FORMAT)
        .unwrap_or_default()
}

#[component]
pub fn MarkdownBlock(source: String) -> Element {
    let html = markdown_to_html(&source);
    rsx! {
        div { class: "md", dangerous_inner_html: "{html}" }
    }
}

/// Inline, dismissable error banner.
#[component]
pub fn ErrorBanner(error: Signal<Option<String>>) -> Element {
    let mut error = error;
    let Some(message) = error() else {
        return rsx! {};
    };
    rsx! {
        div { class: "error-banner", role: "alert",
            span { class: "error-text", "{message}" }
            button {
                class: "action-btn",
                r#type: "button",
                title: "Dismiss",
                onclick: move |_| error.set(None),
                "Dismiss"
            }
        }
    }
}
