use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Vehicle interface configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleSettings {
    pub obd_port: String,
    pub obd_baudrate: u32,
    pub can_channel: String,
    pub can_bitrate: u32,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_year: u16,
}

impl Default for VehicleSettings {
    fn default() -> Self {
        Self {
            obd_port: "/dev/ttyUSB0".into(),
            obd_baudrate: 38400,
            can_channel: "can0".into(),
            can_bitrate: 500_000,
            vehicle_make: "generic".into(),
            vehicle_model: "unknown".into(),
            vehicle_year: 2000,
        }
    }
}

/// Safety monitoring configuration. Threshold fields feed the default rule
/// set, so per-deployment limits override the shipped ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetySettings {
    pub enable_monitoring: bool,
    pub monitoring_interval_secs: f64,
    pub parameter_timeout_ms: u64,
    pub engine_temp_warning: f64,
    pub engine_temp_critical: f64,
    pub max_boost_pressure: f64,
    pub max_rpm: f64,
    pub min_oil_pressure: f64,
    pub history_cap: usize,
    pub emergency_mode_enabled: bool,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            enable_monitoring: true,
            monitoring_interval_secs: 1.0,
            parameter_timeout_ms: 500,
            engine_temp_warning: 105.0,
            engine_temp_critical: 110.0,
            max_boost_pressure: 20.0,
            max_rpm: 7000.0,
            min_oil_pressure: 15.0,
            history_cap: 1000,
            emergency_mode_enabled: true,
        }
    }
}

/// Service-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub device_name: String,
    pub violation_db_path: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            device_name: "vigil".into(),
            violation_db_path: "vigil-violations.db".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VigilConfig {
    pub vehicle: VehicleSettings,
    pub safety: SafetySettings,
    pub service: ServiceSettings,
}

impl VigilConfig {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;
        Ok(config)
    }

    /// Validate settings, returning every problem found rather than just
    /// the first.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.safety.engine_temp_warning >= self.safety.engine_temp_critical {
            problems.push(format!(
                "engine temp warning {} must be below critical {}",
                self.safety.engine_temp_warning, self.safety.engine_temp_critical
            ));
        }
        if self.safety.max_boost_pressure <= 0.0 {
            problems.push("max boost pressure must be positive".into());
        }
        if self.safety.monitoring_interval_secs <= 0.0 {
            problems.push("monitoring interval must be positive".into());
        }
        if self.safety.history_cap == 0 {
            problems.push("violation history cap must be at least 1".into());
        }

        problems
    }
}
