use crate::chat::{ChatService, StoreEvent, parse_id};
use crate::types::{Estimate, format_won};
use crate::views::response::PartGrid;
use crate::views::shared::{ErrorBanner, format_list_date};
use dioxus::prelude::*;
use tokio::sync::broadcast::error::RecvError;

async fn refresh_estimates(
    service: &ChatService,
    mut estimates: Signal<Vec<Estimate>>,
    mut selected: Signal<Option<Estimate>>,
    mut error: Signal<Option<String>>,
) {
    match service.estimates().await {
        Ok(list) => {
            // Drop the detail pane if its estimate is gone.
            let current = selected.with(|sel| sel.as_ref().map(|e| e.id));
            if let Some(id) = current
                && !list.iter().any(|e| e.id == id)
            {
                selected.set(None);
            }
            estimates.set(list);
        }
        Err(err) => error.set(Some(err.to_string())),
    }
}

#[component]
pub fn EstimatesView() -> Element {
    let service = use_context::<ChatService>();
    let estimates = use_signal(Vec::<Estimate>::new);
    let mut selected = use_signal(|| Option::<Estimate>::None);
    let mut lookup = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);

    let events_service = service.clone();
    use_future(move || {
        let service = events_service.clone();
        async move {
            let mut events = service.subscribe();
            refresh_estimates(&service, estimates, selected, error).await;
            loop {
                match events.recv().await {
                    Ok(StoreEvent::EstimatesChanged) | Err(RecvError::Lagged(_)) => {
                        refresh_estimates(&service, estimates, selected, error).await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Closed) => break,
                }
            }
        }
    });

    let open_service = service.clone();
    let mut open_by_id = move || {
        let id = match parse_id(&lookup()) {
            Ok(id) => id,
            Err(err) => {
                error.set(Some(err.to_string()));
                return;
            }
        };
        let service = open_service.clone();
        spawn(async move {
            match service.estimate(id).await {
                Ok(estimate) => {
                    selected.set(Some(estimate));
                    lookup.set(String::new());
                }
                Err(err) => error.set(Some(err.to_string())),
            }
        });
    };

    let list_snapshot = estimates();
    let detail = selected();
    let selected_id = detail.as_ref().map(|e| e.id);

    rsx! {
        div { class: "main-container with-sidebar",
            aside { class: "estimate-sidebar",
                div { class: "hstack estimate-lookup",
                    input {
                        r#type: "text",
                        placeholder: "Estimate #",
                        value: "{lookup}",
                        oninput: move |ev| lookup.set(ev.value()),
                    }
                    button {
                        class: "btn", r#type: "button",
                        disabled: lookup().trim().is_empty(),
                        onclick: move |_| open_by_id(),
                        "Open"
                    }
                }
                if list_snapshot.is_empty() {
                    div { class: "empty-state", "Build recommendations you receive are saved here." }
                }
                ul { class: "estimate-list",
                    for estimate in list_snapshot.iter() {
                        EstimateRow {
                            key: "{estimate.id}",
                            estimate: estimate.clone(),
                            active: selected_id == Some(estimate.id),
                            selected,
                        }
                    }
                }
            }

            div { class: "estimate-detail",
                ErrorBanner { error }
                if let Some(estimate) = detail {
                    EstimateDetail { estimate, error }
                } else {
                    div { class: "empty-state", "Select an estimate to see its parts." }
                }
            }
        }
    }
}

#[component]
fn EstimateRow(estimate: Estimate, active: bool, selected: Signal<Option<Estimate>>) -> Element {
    let mut selected = selected;
    let row_class = if active { "estimate-row active" } else { "estimate-row" };
    let created = format_list_date(estimate.created_at);
    let pick = estimate.clone();
    rsx! {
        li { class: row_class,
            button {
                class: "estimate-open", r#type: "button",
                onclick: move |_| selected.set(Some(pick.clone())),
                span { class: "estimate-title", "#{estimate.id} {estimate.title}" }
                span { class: "estimate-meta", "{estimate.total_price} · {created}" }
            }
        }
    }
}

#[component]
fn EstimateDetail(estimate: Estimate, error: Signal<Option<String>>) -> Element {
    let service = use_context::<ChatService>();
    let mut error = error;
    let estimate_id = estimate.id;
    let parts_total = format_won(estimate.parts_total());
    let created = format_list_date(estimate.created_at);
    let on_delete = move |_| {
        let service = service.clone();
        spawn(async move {
            if let Err(err) = service.delete_estimate(estimate_id).await {
                error.set(Some(err.to_string()));
            }
        });
    };

    rsx! {
        div { class: "card build-card",
            div { class: "card-header",
                h3 { class: "card-title", "{estimate.title}" }
                button { class: "action-btn", r#type: "button", title: "Delete estimate", onclick: on_delete, "Delete" }
            }
            div { class: "estimate-meta", "Estimate #{estimate.id} · {created}" }
            PartGrid { parts: estimate.parts.clone() }
            div { class: "card-total",
                span { "Total" }
                strong { "{estimate.total_price}" }
            }
            div { class: "card-subtotal",
                span { "Sum of listed parts" }
                span { "{parts_total}" }
            }
            if !estimate.total_reason.is_empty() {
                p { class: "card-reason", "{estimate.total_reason}" }
            }
            if let Some(suggestion) = estimate.suggestion.clone() {
                p { class: "card-suggestion", "{suggestion}" }
            }
        }
    }
}
