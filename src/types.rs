use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// The six conversation modes the assistant understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    GeneralSearch,
    PartRecommendation,
    BuildRecommendation,
    CompatibilityCheck,
    SpecUpgrade,
    BuildEvaluation,
}

impl ChatMode {
    pub const ALL: [ChatMode; 6] = [
        ChatMode::GeneralSearch,
        ChatMode::PartRecommendation,
        ChatMode::BuildRecommendation,
        ChatMode::CompatibilityCheck,
        ChatMode::SpecUpgrade,
        ChatMode::BuildEvaluation,
    ];

    /// Stable identifier used in URLs and persisted rows.
    pub fn slug(self) -> &'static str {
        match self {
            ChatMode::GeneralSearch => "general_search",
            ChatMode::PartRecommendation => "part_recommendation",
            ChatMode::BuildRecommendation => "build_recommendation",
            ChatMode::CompatibilityCheck => "compatibility_check",
            ChatMode::SpecUpgrade => "spec_upgrade",
            ChatMode::BuildEvaluation => "build_evaluation",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChatMode::GeneralSearch => "General Search",
            ChatMode::PartRecommendation => "Part Recommendation",
            ChatMode::BuildRecommendation => "Build Recommendation",
            ChatMode::CompatibilityCheck => "Compatibility Check",
            ChatMode::SpecUpgrade => "Spec Upgrade",
            ChatMode::BuildEvaluation => "Build Evaluation",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            ChatMode::GeneralSearch => "Ask anything about PC hardware",
            ChatMode::PartRecommendation => "Which part are you shopping for?",
            ChatMode::BuildRecommendation => "Describe your budget and what the PC is for",
            ChatMode::CompatibilityCheck => "List the parts you want checked",
            ChatMode::SpecUpgrade => "Describe your current build",
            ChatMode::BuildEvaluation => "Paste the build you want evaluated",
        }
    }

    /// Accepts either the slug or the display label, case-insensitively.
    pub fn from_label(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        Self::ALL.into_iter().find(|mode| {
            mode.slug().eq_ignore_ascii_case(needle) || mode.label().eq_ignore_ascii_case(needle)
        })
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("unknown chat mode '{s}'"))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpertiseLevel {
    #[default]
    Beginner,
    Intermediate,
    Expert,
}

impl ExpertiseLevel {
    pub const ALL: [ExpertiseLevel; 3] = [
        ExpertiseLevel::Beginner,
        ExpertiseLevel::Intermediate,
        ExpertiseLevel::Expert,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            ExpertiseLevel::Beginner => "beginner",
            ExpertiseLevel::Intermediate => "intermediate",
            ExpertiseLevel::Expert => "expert",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExpertiseLevel::Beginner => "Beginner",
            ExpertiseLevel::Intermediate => "Intermediate",
            ExpertiseLevel::Expert => "Expert",
        }
    }
}

impl FromStr for ExpertiseLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.slug().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown expertise level '{s}'"))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_mode: Option<ChatMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expertise_level: Option<ExpertiseLevel>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>, mode: ChatMode, level: ExpertiseLevel) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            chat_mode: Some(mode),
            expertise_level: Some(level),
            created_at: Some(OffsetDateTime::now_utc()),
        }
    }

    pub fn assistant(text: impl Into<String>, mode: ChatMode) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            chat_mode: Some(mode),
            expertise_level: None,
            created_at: Some(OffsetDateTime::now_utc()),
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self.role, Role::User)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    #[serde(rename = "session_name", alias = "name")]
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// A single part inside a build, recommendation list or upgrade plan.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PartDetail {
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub specs: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub image: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,
    pub title: String,
    pub parts: BTreeMap<String, PartDetail>,
    pub total_price: String,
    #[serde(default)]
    pub total_reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Score blob stored alongside a hosted estimate, kept as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Value>,
}

impl Estimate {
    /// Sum of every part price that is a plain amount. Other prices are skipped.
    pub fn parts_total(&self) -> u64 {
        self.parts
            .values()
            .filter_map(|part| parse_price(&part.price))
            .fold(0u64, u64::saturating_add)
    }
}

/// An estimate that has not been assigned an id by a store yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewEstimate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,
    pub title: String,
    pub parts: BTreeMap<String, PartDetail>,
    pub total_price: String,
    #[serde(default)]
    pub total_reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl NewEstimate {
    pub fn into_estimate(self, id: i64, created_at: OffsetDateTime) -> Estimate {
        Estimate {
            id,
            session_id: self.session_id,
            title: self.title,
            parts: self.parts,
            total_price: self.total_price,
            total_reason: self.total_reason,
            suggestion: self.suggestion,
            created_at,
            user_id: self.user_id,
            metrics: None,
        }
    }
}

/// Persisted form of a chat message.
///
/// User text lives in `input_text` and assistant text in `response_json`,
/// matching the hosted `messages` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: i64,
    pub session_id: i64,
    #[serde(default)]
    pub input_text: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub response_json: Option<String>,
    /// Stale or unknown tags read as `None`.
    #[serde(default, deserialize_with = "lenient_mode")]
    pub chat_mode: Option<ChatMode>,
    #[serde(default, deserialize_with = "lenient_level")]
    pub user_level: Option<ExpertiseLevel>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

fn lenient_mode<'de, D>(deserializer: D) -> Result<Option<ChatMode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Value::as_str).and_then(ChatMode::from_label))
}

fn lenient_level<'de, D>(deserializer: D) -> Result<Option<ExpertiseLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok()))
}

impl MessageRow {
    pub fn from_message(id: i64, session_id: i64, message: &ChatMessage) -> Self {
        let (input_text, response_json) = match message.role {
            Role::User => (Some(message.text.clone()), None),
            Role::Assistant => (None, Some(message.text.clone())),
        };
        Self {
            id,
            session_id,
            input_text,
            role: message.role,
            response_json,
            chat_mode: message.chat_mode,
            user_level: message.expertise_level,
            created_at: message.created_at.unwrap_or_else(OffsetDateTime::now_utc),
        }
    }

    pub fn to_message(&self) -> ChatMessage {
        let text = match self.role {
            Role::User => self.input_text.as_ref().or(self.response_json.as_ref()),
            Role::Assistant => self.response_json.as_ref().or(self.input_text.as_ref()),
        };
        ChatMessage {
            role: self.role,
            text: text.cloned().unwrap_or_default(),
            chat_mode: self.chat_mode,
            expertise_level: self.user_level,
            created_at: Some(self.created_at),
        }
    }
}

/// Reads a plain won amount such as `"₩1,250,000"`, `"329000원"` or `"1,200"`.
///
/// Anything else (other currencies, ranges, decimals, `만` units) is `None`.
pub fn parse_price(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('₩').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('원').unwrap_or(trimmed).trim();
    if !trimmed.starts_with(|c: char| c.is_ascii_digit())
        || !trimmed.chars().all(|c| c.is_ascii_digit() || c == ',')
    {
        return None;
    }
    trimmed.replace(',', "").parse().ok()
}

/// Price text for display: plain amounts are normalised to won, anything
/// else is shown exactly as the backend sent it.
pub fn display_price(raw: &str) -> String {
    parse_price(raw)
        .map(format_won)
        .unwrap_or_else(|| raw.to_string())
}

/// Formats an amount in won with thousands separators.
pub fn format_won(amount: u64) -> String {
    let raw = amount.to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3 + 1);
    out.push('₩');
    for (i, ch) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_labels_round_trip() {
        for mode in ChatMode::ALL {
            assert_eq!(ChatMode::from_label(mode.slug()), Some(mode));
            assert_eq!(ChatMode::from_label(mode.label()), Some(mode));
        }
        assert_eq!(
            ChatMode::from_label("  BUILD_RECOMMENDATION "),
            Some(ChatMode::BuildRecommendation)
        );
        assert!(ChatMode::from_label("overclocking").is_none());
    }

    #[test]
    fn test_mode_serializes_as_slug() {
        let json = serde_json::to_string(&ChatMode::SpecUpgrade).unwrap();
        assert_eq!(json, "\"spec_upgrade\"");
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("₩1,250,000"), Some(1_250_000));
        assert_eq!(parse_price("329000원"), Some(329_000));
        assert_eq!(parse_price("1,200"), Some(1_200));
        assert_eq!(parse_price("TBD"), None);
    }

    #[test]
    fn test_parse_price_rejects_non_plain_amounts() {
        assert_eq!(parse_price("35만원"), None);
        assert_eq!(parse_price("$1,299.99"), None);
        assert_eq!(parse_price("₩1,250,000 ~ ₩1,400,000"), None);
        assert_eq!(parse_price("99999999999999999999999"), None);
    }

    #[test]
    fn test_display_price_keeps_backend_text() {
        assert_eq!(display_price("1250000"), "₩1,250,000");
        assert_eq!(display_price("329000원"), "₩329,000");
        assert_eq!(display_price("35만원"), "35만원");
        assert_eq!(display_price("$1,299.99"), "$1,299.99");
        assert_eq!(display_price("₩1,250,000 ~ ₩1,400,000"), "₩1,250,000 ~ ₩1,400,000");
        assert_eq!(display_price("ask the seller"), "ask the seller");
    }

    fn estimate_with_prices(prices: &[&str]) -> Estimate {
        let parts = prices
            .iter()
            .enumerate()
            .map(|(i, price)| {
                (
                    format!("part{i}"),
                    PartDetail {
                        name: format!("Part {i}"),
                        price: price.to_string(),
                        ..PartDetail::default()
                    },
                )
            })
            .collect();
        NewEstimate {
            session_id: None,
            title: "prices".into(),
            parts,
            total_price: String::new(),
            total_reason: String::new(),
            suggestion: None,
            user_id: None,
        }
        .into_estimate(1, OffsetDateTime::UNIX_EPOCH)
    }

    #[test]
    fn test_parts_total_skips_unreadable_prices() {
        let estimate = estimate_with_prices(&["₩289,000", "35만원", "$1,299.99", "420000원"]);
        assert_eq!(estimate.parts_total(), 709_000);
    }

    #[test]
    fn test_parts_total_saturates() {
        let estimate = estimate_with_prices(&["9999999999999999999", "9999999999999999999"]);
        assert_eq!(estimate.parts_total(), u64::MAX);
    }

    #[test]
    fn test_message_row_reads_display_label_tags() {
        let raw = r#"{"id":1,"session_id":2,"input_text":"hi","role":"user",
            "chat_mode":"Build Recommendation","user_level":"Expert",
            "created_at":"2024-05-01T10:00:00Z"}"#;
        let row: MessageRow = serde_json::from_str(raw).unwrap();
        assert_eq!(row.chat_mode, Some(ChatMode::BuildRecommendation));
        assert_eq!(row.user_level, Some(ExpertiseLevel::Expert));
    }

    #[test]
    fn test_message_rows_with_unknown_tags_still_load() {
        let raw = r#"[
            {"id":1,"session_id":2,"input_text":"hi","role":"user",
             "chat_mode":"pc_build","user_level":"guru","created_at":"2024-05-01T10:00:00Z"},
            {"id":2,"session_id":2,"response_json":"ok","role":"assistant",
             "chat_mode":42,"user_level":null,"created_at":"2024-05-01T10:00:01Z"},
            {"id":3,"session_id":2,"response_json":"ok","role":"assistant",
             "chat_mode":"spec_upgrade","created_at":"2024-05-01T10:00:02Z"}
        ]"#;
        let rows: Vec<MessageRow> = serde_json::from_str(raw).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].chat_mode, None);
        assert_eq!(rows[0].user_level, None);
        assert_eq!(rows[1].chat_mode, None);
        assert_eq!(rows[2].chat_mode, Some(ChatMode::SpecUpgrade));
        assert_eq!(rows[0].to_message().text, "hi");
    }

    #[test]
    fn test_format_won() {
        assert_eq!(format_won(0), "₩0");
        assert_eq!(format_won(950), "₩950");
        assert_eq!(format_won(1_250_000), "₩1,250,000");
    }

    #[test]
    fn test_message_row_keeps_user_text_in_input_column() {
        let msg = ChatMessage::user("need a quiet build", ChatMode::GeneralSearch, ExpertiseLevel::Expert);
        let row = MessageRow::from_message(7, 3, &msg);
        assert_eq!(row.input_text.as_deref(), Some("need a quiet build"));
        assert!(row.response_json.is_none());

        let back = row.to_message();
        assert_eq!(back.text, msg.text);
        assert_eq!(back.chat_mode, Some(ChatMode::GeneralSearch));
        assert_eq!(back.expertise_level, Some(ExpertiseLevel::Expert));
    }

    #[test]
    fn test_session_reads_hosted_column_name() {
        let raw = r#"{"id":4,"session_name":"Budget gaming","created_at":"2024-05-01T10:00:00Z","user_id":"u1"}"#;
        let session: Session = serde_json::from_str(raw).unwrap();
        assert_eq!(session.name, "Budget gaming");
        assert_eq!(session.user_id.as_deref(), Some("u1"));
    }
}
