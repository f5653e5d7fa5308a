use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::level::SafetyLevel;

/// Intent categories produced by the command-parsing collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    ClimateControl,
    LightingControl,
    EngineManagement,
    AudioControl,
    VehicleStatus,
    EmergencyAction,
}

/// Snapshot of vehicle state handed in alongside a command.
///
/// Upstream collaborators are inconsistent about the speed key, so lookup
/// probes the known synonyms in order and takes the first match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleContext(pub HashMap<String, f64>);

const SPEED_KEYS: [&str; 4] = ["vehicle_speed", "speed", "mph", "kph"];

impl VehicleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    /// Vehicle speed, whichever synonym key carries it.
    pub fn speed(&self) -> Option<f64> {
        SPEED_KEYS.iter().find_map(|key| self.get(key))
    }
}

/// A parsed actuation request, ready for validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub intent: IntentCategory,
    pub parameter: String,
    pub value: f64,
    #[serde(default)]
    pub context: VehicleContext,
}

/// The sole output contract of command validation. Owns copies of
/// everything it reports; no references into live monitor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandValidationResult {
    pub allowed: bool,
    pub level: SafetyLevel,
    pub warnings: Vec<String>,
    pub required_confirmations: Vec<String>,
    pub blocked_reason: Option<String>,
}

impl CommandValidationResult {
    pub fn allowed(
        level: SafetyLevel,
        warnings: Vec<String>,
        required_confirmations: Vec<String>,
    ) -> Self {
        Self {
            allowed: true,
            level,
            warnings,
            required_confirmations,
            blocked_reason: None,
        }
    }

    pub fn blocked(level: SafetyLevel, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            level,
            warnings: Vec::new(),
            required_confirmations: Vec::new(),
            blocked_reason: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_probes_synonym_keys() {
        let ctx = VehicleContext::new().with("kph", 42.0);
        assert_eq!(ctx.speed(), Some(42.0));

        let ctx = VehicleContext::new().with("speed", 10.0).with("kph", 42.0);
        // "speed" comes before "kph" in the probe order.
        assert_eq!(ctx.speed(), Some(10.0));

        assert_eq!(VehicleContext::new().speed(), None);
    }

    #[test]
    fn blocked_result_carries_reason() {
        let result = CommandValidationResult::blocked(SafetyLevel::Critical, "nope");
        assert!(!result.allowed);
        assert_eq!(result.blocked_reason.as_deref(), Some("nope"));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn intent_serializes_snake_case() {
        let json = serde_json::to_string(&IntentCategory::EngineManagement).unwrap();
        assert_eq!(json, "\"engine_management\"");
    }
}
