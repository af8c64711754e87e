//! Response rendering for assistant replies
//!
//! Assistant replies are free-form: a mode may answer with markdown or with a
//! JSON payload, and persisted messages can carry a stale or missing mode tag.
//! [`select_view`] decodes a reply into a [`ResponseView`] so the UI can pick
//! the matching component.
//!
//! Selection order:
//!
//! 1. Content that is not JSON renders as markdown.
//! 2. Well-known fields decide the shape, first match wins:
//!    `parts` + `total_price`, `components`, `performance` + `price_performance`,
//!    `upgrade_parts`.
//! 3. The declared mode decides the shape.
//! 4. Anything else is [`ResponseView::Unknown`].
mod markdown;
mod payloads;

pub use markdown::{json_to_markdown, markdown_to_html};
pub use payloads::{
    BuildPayload, CheckStatus, CompatibilityCheck, CompatibilityPayload, EvaluationPayload,
    PartRecommendationPayload, UpgradePart, UpgradePayload,
};

use crate::types::ChatMode;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq)]
pub enum ResponseView {
    Build(BuildPayload),
    PartRecommendation(PartRecommendationPayload),
    Compatibility(CompatibilityPayload),
    Evaluation(EvaluationPayload),
    Upgrade(UpgradePayload),
    Markdown(String),
    Unknown(Value),
}

impl ResponseView {
    pub fn kind(&self) -> &'static str {
        match self {
            ResponseView::Build(_) => "build",
            ResponseView::PartRecommendation(_) => "part_recommendation",
            ResponseView::Compatibility(_) => "compatibility",
            ResponseView::Evaluation(_) => "evaluation",
            ResponseView::Upgrade(_) => "upgrade",
            ResponseView::Markdown(_) => "markdown",
            ResponseView::Unknown(_) => "unknown",
        }
    }

    pub fn as_build(&self) -> Option<&BuildPayload> {
        match self {
            ResponseView::Build(payload) => Some(payload),
            _ => None,
        }
    }
}

pub fn select_view(content: &str, declared: Option<ChatMode>) -> ResponseView {
    let candidate = strip_json_fence(content.trim());
    let value = match serde_json::from_str::<Value>(candidate) {
        Ok(value) => value,
        Err(_) => return ResponseView::Markdown(content.to_string()),
    };

    if let Value::Object(object) = &value
        && let Some(view) = sniff_shape(object, &value)
    {
        return view;
    }

    if let Some(mode) = declared
        && let Some(view) = decode_for_mode(mode, &value)
    {
        return view;
    }

    match value {
        Value::String(text) => ResponseView::Markdown(text),
        other => {
            tracing::debug!(declared = ?declared, "reply did not match any known shape");
            ResponseView::Unknown(other)
        }
    }
}

fn sniff_shape(object: &Map<String, Value>, value: &Value) -> Option<ResponseView> {
    let has = |key: &str| object.contains_key(key);

    if has("parts") && has("total_price")
        && let Some(payload) = decode(value)
    {
        return Some(ResponseView::Build(payload));
    }
    if has("components")
        && let Some(payload) = decode(value)
    {
        return Some(ResponseView::Compatibility(payload));
    }
    if has("performance") && has("price_performance")
        && let Some(payload) = decode(value)
    {
        return Some(ResponseView::Evaluation(payload));
    }
    if has("upgrade_parts")
        && let Some(payload) = decode(value)
    {
        return Some(ResponseView::Upgrade(payload));
    }
    None
}

fn decode_for_mode(mode: ChatMode, value: &Value) -> Option<ResponseView> {
    match mode {
        ChatMode::GeneralSearch => None,
        ChatMode::PartRecommendation => decode(value).map(ResponseView::PartRecommendation),
        ChatMode::BuildRecommendation => decode(value).map(ResponseView::Build),
        ChatMode::CompatibilityCheck => decode(value).map(ResponseView::Compatibility),
        ChatMode::SpecUpgrade => decode(value).map(ResponseView::Upgrade),
        ChatMode::BuildEvaluation => decode(value).map(ResponseView::Evaluation),
    }
}

fn decode<T: DeserializeOwned>(value: &Value) -> Option<T> {
    T::deserialize(value).ok()
}

/// Unwraps a reply that is a single fenced code block.
fn strip_json_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return content;
    };
    // The info string runs to the first newline and must name a JSON dialect.
    let (info, body) = match body.split_once('\n') {
        Some(split) => split,
        None => match body.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => ("", &body[4..]),
            _ => ("", body),
        },
    };
    let info = info.trim();
    if !info.is_empty() && !info.to_ascii_lowercase().starts_with("json") {
        return content;
    }
    if body.contains("```") {
        return content;
    }
    body.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILD: &str = r#"{"parts": {"cpu": {"name": "Ryzen 5 7600", "price": "₩289,000"}}, "total_price": "₩100"}"#;

    #[test]
    fn test_build_shape_wins_regardless_of_mode() {
        for mode in ChatMode::ALL {
            let view = select_view(BUILD, Some(mode));
            assert_eq!(view.kind(), "build", "declared {mode:?}");
        }
        assert_eq!(select_view(BUILD, None).kind(), "build");
    }

    #[test]
    fn test_invalid_json_is_markdown() {
        let text = "## Best budget GPUs\n- RX 7600\n- RTX 4060";
        assert_eq!(
            select_view(text, Some(ChatMode::BuildRecommendation)),
            ResponseView::Markdown(text.to_string())
        );
        assert_eq!(select_view("{not json", None).kind(), "markdown");
    }

    #[test]
    fn test_first_matching_signal_wins() {
        let both = r#"{"parts": {}, "total_price": "₩0", "components": {"cpu": "i5"}, "upgrade_parts": []}"#;
        assert_eq!(select_view(both, Some(ChatMode::SpecUpgrade)).kind(), "build");

        let compat_and_upgrade = r#"{"components": {"cpu": "i5-13400"}, "upgrade_parts": []}"#;
        assert_eq!(select_view(compat_and_upgrade, None).kind(), "compatibility");
    }

    #[test]
    fn test_evaluation_needs_both_fields() {
        let eval = r#"{"performance": {"gaming": 82}, "price_performance": 74.5}"#;
        assert_eq!(select_view(eval, None).kind(), "evaluation");

        let partial = r#"{"performance": {"gaming": 82}}"#;
        assert_eq!(select_view(partial, None).kind(), "unknown");
    }

    #[test]
    fn test_upgrade_shape() {
        let upgrade = r#"{"upgrade_parts": [{"part_type": "gpu", "current": "GTX 1060", "name": "RTX 4060", "price": "₩399,000"}]}"#;
        match select_view(upgrade, Some(ChatMode::GeneralSearch)) {
            ResponseView::Upgrade(payload) => {
                assert_eq!(payload.upgrade_parts[0].part.name, "RTX 4060");
                assert_eq!(payload.upgrade_parts[0].current.as_deref(), Some("GTX 1060"));
            }
            other => panic!("expected upgrade, got {other:?}"),
        }
    }

    #[test]
    fn test_declared_mode_used_without_signals() {
        let recs = r#"{"part_type": "ssd", "recommendations": [{"name": "WD SN770 1TB"}]}"#;
        assert_eq!(
            select_view(recs, Some(ChatMode::PartRecommendation)).kind(),
            "part_recommendation"
        );
        assert_eq!(select_view(recs, Some(ChatMode::GeneralSearch)).kind(), "unknown");
        assert_eq!(select_view(recs, None).kind(), "unknown");
    }

    #[test]
    fn test_signal_with_bad_shape_falls_through() {
        // parts is a list here, so the build decode fails and nothing else matches
        let odd = r#"{"parts": ["cpu"], "total_price": "₩0"}"#;
        assert_eq!(select_view(odd, Some(ChatMode::BuildRecommendation)).kind(), "unknown");
    }

    #[test]
    fn test_fenced_json_is_decoded() {
        let fenced = format!("```json\n{BUILD}\n```");
        assert_eq!(select_view(&fenced, None).kind(), "build");

        let prose = format!("Here you go:\n```json\n{BUILD}\n```");
        assert_eq!(select_view(&prose, None).kind(), "markdown");
    }

    #[test]
    fn test_fence_info_string_is_case_insensitive() {
        for info in ["JSON", "jsonc", " Json ", ""] {
            let fenced = format!("```{info}\n{BUILD}\n```");
            assert_eq!(select_view(&fenced, None).kind(), "build", "info string {info:?}");
        }
        let inline = format!("```JSON{BUILD}```");
        assert_eq!(select_view(&inline, None).kind(), "build");
    }

    #[test]
    fn test_non_json_fence_is_markdown() {
        let fenced = format!("```rust\n{BUILD}\n```");
        assert_eq!(select_view(&fenced, None).kind(), "markdown");
    }

    #[test]
    fn test_json_string_is_markdown() {
        assert_eq!(
            select_view(r#""**hello**""#, None),
            ResponseView::Markdown("**hello**".to_string())
        );
    }

    #[test]
    fn test_build_payload_to_estimate_title() {
        let payload = select_view(BUILD, None).as_build().cloned().unwrap();
        let estimate = payload.to_estimate("Gaming PC under 1.5M", Some(9));
        assert_eq!(estimate.title, "Gaming PC under 1.5M");
        assert_eq!(estimate.session_id, Some(9));
        assert_eq!(estimate.parts["cpu"].name, "Ryzen 5 7600");
    }
}
