use std::fmt;

use serde::{Deserialize, Serialize};

use crate::violation::Violation;

/// System-wide severity, ordered from least to most severe.
///
/// The derived `Ord` is load-bearing: level aggregation is a plain `max`
/// over this order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLevel {
    #[default]
    Safe,
    Caution,
    Warning,
    Critical,
    Emergency,
}

impl SafetyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyLevel::Safe => "safe",
            SafetyLevel::Caution => "caution",
            SafetyLevel::Warning => "warning",
            SafetyLevel::Critical => "critical",
            SafetyLevel::Emergency => "emergency",
        }
    }

    /// True for the levels that block command execution outright.
    pub fn is_blocking(&self) -> bool {
        matches!(self, SafetyLevel::Critical | SafetyLevel::Emergency)
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reduce a set of active violations to one system-wide level.
///
/// Empty input means the system is safe. Otherwise the worst severity wins,
/// independent of input order.
pub fn aggregate_level(violations: &[Violation]) -> SafetyLevel {
    violations
        .iter()
        .map(|v| v.level)
        .max()
        .unwrap_or(SafetyLevel::Safe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleCategory;

    fn violation(level: SafetyLevel) -> Violation {
        Violation {
            rule_name: "test_rule".into(),
            parameter: "engine_temp".into(),
            current_value: 120.0,
            limit_value: 110.0,
            level,
            category: RuleCategory::TemperatureLimit,
            timestamp_ms: 0,
            description: "test".into(),
            action_taken: None,
        }
    }

    #[test]
    fn levels_are_totally_ordered() {
        assert!(SafetyLevel::Safe < SafetyLevel::Caution);
        assert!(SafetyLevel::Caution < SafetyLevel::Warning);
        assert!(SafetyLevel::Warning < SafetyLevel::Critical);
        assert!(SafetyLevel::Critical < SafetyLevel::Emergency);
    }

    #[test]
    fn empty_set_aggregates_to_safe() {
        assert_eq!(aggregate_level(&[]), SafetyLevel::Safe);
    }

    #[test]
    fn critical_wins_over_lower_levels() {
        let violations = vec![
            violation(SafetyLevel::Caution),
            violation(SafetyLevel::Critical),
            violation(SafetyLevel::Warning),
        ];
        assert_eq!(aggregate_level(&violations), SafetyLevel::Critical);
    }

    #[test]
    fn aggregation_is_order_independent() {
        let mut violations = vec![
            violation(SafetyLevel::Warning),
            violation(SafetyLevel::Emergency),
            violation(SafetyLevel::Caution),
            violation(SafetyLevel::Critical),
        ];
        let expected = aggregate_level(&violations);
        // Rotate through every cyclic permutation.
        for _ in 0..violations.len() {
            violations.rotate_left(1);
            assert_eq!(aggregate_level(&violations), expected);
        }
        violations.reverse();
        assert_eq!(aggregate_level(&violations), expected);
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&SafetyLevel::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }
}
