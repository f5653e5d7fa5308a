use serde::{Deserialize, Serialize};

use crate::level::SafetyLevel;
use crate::reading::now_millis;

/// Lifecycle of an orchestrator-level alert.
///
/// Distinct from per-tick [`crate::Violation`]s, which clear implicitly on
/// the next evaluation pass: alerts stay until an operator acknowledges and
/// resolves them, preserving the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub parameter: String,
    pub level: SafetyLevel,
    pub message: String,
    pub raised_at_ms: i64,
    pub status: AlertStatus,
    pub resolved_at_ms: Option<i64>,
}

impl Alert {
    pub fn new(
        id: impl Into<String>,
        parameter: impl Into<String>,
        level: SafetyLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parameter: parameter.into(),
            level,
            message: message.into(),
            raised_at_ms: now_millis(),
            status: AlertStatus::Active,
            resolved_at_ms: None,
        }
    }

    pub fn acknowledge(&mut self) {
        if self.status == AlertStatus::Active {
            self.status = AlertStatus::Acknowledged;
        }
    }

    pub fn resolve(&mut self) {
        if self.status != AlertStatus::Resolved {
            self.status = AlertStatus::Resolved;
            self.resolved_at_ms = Some(now_millis());
        }
    }

    pub fn is_open(&self) -> bool {
        self.status != AlertStatus::Resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_runs_active_to_resolved() {
        let mut alert = Alert::new("a1", "engine_temp", SafetyLevel::Critical, "too hot");
        assert_eq!(alert.status, AlertStatus::Active);
        assert!(alert.is_open());

        alert.acknowledge();
        assert_eq!(alert.status, AlertStatus::Acknowledged);

        alert.resolve();
        assert_eq!(alert.status, AlertStatus::Resolved);
        assert!(alert.resolved_at_ms.is_some());
        assert!(!alert.is_open());
    }

    #[test]
    fn acknowledge_does_not_reopen_resolved() {
        let mut alert = Alert::new("a2", "oil_pressure", SafetyLevel::Warning, "low");
        alert.resolve();
        alert.acknowledge();
        assert_eq!(alert.status, AlertStatus::Resolved);
    }
}
