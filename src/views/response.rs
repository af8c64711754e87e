use crate::render::{
    BuildPayload, CheckStatus, CompatibilityPayload, EvaluationPayload, PartRecommendationPayload,
    ResponseView, UpgradePayload, json_to_markdown,
};
use crate::types::{PartDetail, display_price};
use crate::views::shared::MarkdownBlock;
use dioxus::prelude::*;
use std::collections::BTreeMap;

/// Renders a decoded assistant reply with the component for its shape.
#[component]
pub fn ResponseBlock(view: ResponseView) -> Element {
    match view {
        ResponseView::Build(payload) => rsx! { BuildCard { payload } },
        ResponseView::PartRecommendation(payload) => rsx! { RecommendationCard { payload } },
        ResponseView::Compatibility(payload) => rsx! { CompatibilityCard { payload } },
        ResponseView::Evaluation(payload) => rsx! { EvaluationCard { payload } },
        ResponseView::Upgrade(payload) => rsx! { UpgradeCard { payload } },
        ResponseView::Markdown(source) => rsx! { MarkdownBlock { source } },
        ResponseView::Unknown(value) => rsx! {
            div { class: "card unknown-card",
                p { class: "card-note", "Unrecognized response" }
                MarkdownBlock { source: json_to_markdown(&value) }
            }
        },
    }
}

#[component]
fn BuildCard(payload: BuildPayload) -> Element {
    let title = payload
        .title
        .clone()
        .unwrap_or_else(|| "Recommended build".to_string());
    let total = display_price(&payload.total_price);
    rsx! {
        div { class: "card build-card",
            h3 { class: "card-title", "{title}" }
            PartGrid { parts: payload.parts.clone() }
            div { class: "card-total",
                span { "Total" }
                strong { "{total}" }
            }
            if let Some(reason) = payload.total_reason.clone() {
                p { class: "card-reason", "{reason}" }
            }
            if let Some(suggestion) = payload.suggestion.clone() {
                p { class: "card-suggestion", "{suggestion}" }
            }
        }
    }
}

#[component]
pub fn PartGrid(parts: BTreeMap<String, PartDetail>) -> Element {
    rsx! {
        div { class: "part-grid",
            for (kind, part) in parts.iter() {
                PartCard { key: "{kind}", kind: kind.clone(), part: part.clone() }
            }
        }
    }
}

#[component]
fn PartCard(kind: String, part: PartDetail) -> Element {
    let price = display_price(&part.price);
    rsx! {
        div { class: "part-card",
            if !part.image.is_empty() {
                img { class: "part-image", src: "{part.image}", alt: "{part.name}" }
            }
            div { class: "part-body",
                if !kind.is_empty() {
                    span { class: "part-kind", "{kind}" }
                }
                div { class: "part-name", "{part.name}" }
                if !part.price.is_empty() {
                    div { class: "part-price", "{price}" }
                }
                if !part.specs.is_empty() {
                    div { class: "part-specs", "{part.specs}" }
                }
                if !part.reason.is_empty() {
                    p { class: "part-reason", "{part.reason}" }
                }
                if !part.link.is_empty() {
                    a { class: "part-link", href: "{part.link}", target: "_blank", rel: "noopener", "View product" }
                }
            }
        }
    }
}

#[component]
fn RecommendationCard(payload: PartRecommendationPayload) -> Element {
    let heading = match &payload.part_type {
        Some(kind) => format!("Recommended {kind}"),
        None => "Recommended parts".to_string(),
    };
    rsx! {
        div { class: "card recommendation-card",
            h3 { class: "card-title", "{heading}" }
            div { class: "part-grid",
                for (i, part) in payload.recommendations.iter().enumerate() {
                    PartCard { key: "{i}", kind: "", part: part.clone() }
                }
            }
            if let Some(summary) = payload.summary.clone() {
                p { class: "card-reason", "{summary}" }
            }
        }
    }
}

fn status_class(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Ok => "status ok",
        CheckStatus::Warning => "status warning",
        CheckStatus::Incompatible => "status incompatible",
    }
}

#[component]
fn CompatibilityCard(payload: CompatibilityPayload) -> Element {
    let compatible = payload.is_compatible();
    let verdict = if compatible { "Compatible" } else { "Not compatible" };
    rsx! {
        div { class: "card compatibility-card",
            h3 { class: "card-title", "Compatibility check" }
            div { class: format_args!("verdict {}", if compatible { "ok" } else { "incompatible" }), "{verdict}" }
            ul { class: "component-list",
                for (kind, name) in payload.components.iter() {
                    li { key: "{kind}",
                        span { class: "part-kind", "{kind}" }
                        span { class: "part-name", "{name}" }
                    }
                }
            }
            if !payload.checks.is_empty() {
                ul { class: "check-list",
                    for (i, check) in payload.checks.iter().enumerate() {
                        li { key: "{i}", class: "check-row",
                            span { class: status_class(check.status), {check.status.label()} }
                            span { class: "check-items", {check.items.join(" + ")} }
                            if !check.reason.is_empty() {
                                p { class: "check-reason", "{check.reason}" }
                            }
                        }
                    }
                }
            }
            if let Some(summary) = payload.summary.clone() {
                p { class: "card-reason", "{summary}" }
            }
        }
    }
}

#[component]
fn EvaluationCard(payload: EvaluationPayload) -> Element {
    let price_performance = payload.price_performance.clamp(0.0, 100.0);
    rsx! {
        div { class: "card evaluation-card",
            h3 { class: "card-title", "Build evaluation" }
            div { class: "score-list",
                for (workload, score) in payload.performance.iter() {
                    ScoreBar { key: "{workload}", label: workload.clone(), score: *score }
                }
                ScoreBar { label: "Price / performance", score: price_performance }
            }
            if !payload.strengths.is_empty() {
                h4 { "Strengths" }
                ul { class: "bullet-list",
                    for (i, item) in payload.strengths.iter().enumerate() {
                        li { key: "{i}", "{item}" }
                    }
                }
            }
            if !payload.weaknesses.is_empty() {
                h4 { "Weaknesses" }
                ul { class: "bullet-list",
                    for (i, item) in payload.weaknesses.iter().enumerate() {
                        li { key: "{i}", "{item}" }
                    }
                }
            }
            if let Some(summary) = payload.summary.clone() {
                p { class: "card-reason", "{summary}" }
            }
        }
    }
}

#[component]
fn ScoreBar(label: String, score: f64) -> Element {
    let score = score.clamp(0.0, 100.0);
    let width = format!("width: {score:.0}%");
    let value = format!("{score:.0}");
    rsx! {
        div { class: "score-row",
            span { class: "score-label", "{label}" }
            div { class: "score-track",
                div { class: "score-fill", style: "{width}" }
            }
            span { class: "score-value", "{value}" }
        }
    }
}

#[component]
fn UpgradeCard(payload: UpgradePayload) -> Element {
    rsx! {
        div { class: "card upgrade-card",
            h3 { class: "card-title", "Upgrade plan" }
            for (i, upgrade) in payload.upgrade_parts.iter().enumerate() {
                div { key: "{i}", class: "upgrade-row",
                    div { class: "upgrade-path",
                        span { class: "part-kind", "{upgrade.part_type}" }
                        if let Some(current) = upgrade.current.clone() {
                            span { class: "upgrade-from", "{current}" }
                            span { class: "upgrade-arrow", "→" }
                        }
                    }
                    PartCard { kind: "", part: upgrade.part.clone() }
                }
            }
            if let Some(total) = payload.total_price.as_deref().map(display_price) {
                div { class: "card-total",
                    span { "Total" }
                    strong { "{total}" }
                }
            }
            if let Some(summary) = payload.summary.clone() {
                p { class: "card-reason", "{summary}" }
            }
        }
    }
}
