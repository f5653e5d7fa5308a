use serde::{Deserialize, Serialize};

use crate::level::SafetyLevel;
use crate::violation::Violation;

/// Counter snapshot for the status/dashboard collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyStats {
    pub violations_detected: u64,
    pub commands_validated: u64,
    pub commands_blocked: u64,
    pub emergency_activations: u64,
}

/// Point-in-time safety system status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyStatus {
    pub safety_level: SafetyLevel,
    pub emergency_mode: bool,
    pub monitoring_active: bool,
    pub active_violations: Vec<Violation>,
    pub stats: SafetyStats,
}
