use serde::{Deserialize, Serialize};

use crate::level::SafetyLevel;
use crate::rules::RuleCategory;

/// A detected breach of one rule at a point in time.
///
/// A fresh value object is produced each evaluation tick; the tracker treats
/// two violations as "the same" active concern by `rule_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub rule_name: String,
    pub parameter: String,
    pub current_value: f64,
    pub limit_value: f64,
    pub level: SafetyLevel,
    pub category: RuleCategory,
    pub timestamp_ms: i64,
    pub description: String,
    /// Filled in after automated remediation ran for this violation.
    pub action_taken: Option<String>,
}
