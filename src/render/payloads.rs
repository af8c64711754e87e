use crate::types::{NewEstimate, PartDetail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildPayload {
    #[serde(default)]
    pub title: Option<String>,
    pub parts: BTreeMap<String, PartDetail>,
    pub total_price: String,
    #[serde(default)]
    pub total_reason: Option<String>,
    #[serde(default)]
    pub suggestion: Option<String>,
    /// Set when the backend already stored the estimate server-side.
    #[serde(default)]
    pub estimate_id: Option<i64>,
}

impl BuildPayload {
    pub fn to_estimate(&self, fallback_title: &str, session_id: Option<i64>) -> NewEstimate {
        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(fallback_title);
        NewEstimate {
            session_id,
            title: title.to_string(),
            parts: self.parts.clone(),
            total_price: self.total_price.clone(),
            total_reason: self.total_reason.clone().unwrap_or_default(),
            suggestion: self.suggestion.clone(),
            user_id: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartRecommendationPayload {
    #[serde(default)]
    pub part_type: Option<String>,
    pub recommendations: Vec<PartDetail>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Warning,
    Incompatible,
}

impl CheckStatus {
    pub fn label(self) -> &'static str {
        match self {
            CheckStatus::Ok => "OK",
            CheckStatus::Warning => "Warning",
            CheckStatus::Incompatible => "Incompatible",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityCheck {
    #[serde(default)]
    pub items: Vec<String>,
    pub status: CheckStatus,
    #[serde(default)]
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityPayload {
    /// Part type to part name.
    pub components: BTreeMap<String, String>,
    #[serde(default)]
    pub checks: Vec<CompatibilityCheck>,
    #[serde(default)]
    pub compatible: Option<bool>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl CompatibilityPayload {
    /// Explicit verdict if present, otherwise derived from the checks.
    pub fn is_compatible(&self) -> bool {
        self.compatible.unwrap_or_else(|| {
            self.checks
                .iter()
                .all(|check| check.status != CheckStatus::Incompatible)
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationPayload {
    /// Workload name to score (0-100).
    pub performance: BTreeMap<String, f64>,
    pub price_performance: f64,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradePart {
    pub part_type: String,
    #[serde(default)]
    pub current: Option<String>,
    #[serde(flatten)]
    pub part: PartDetail,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradePayload {
    pub upgrade_parts: Vec<UpgradePart>,
    #[serde(default)]
    pub total_price: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}
