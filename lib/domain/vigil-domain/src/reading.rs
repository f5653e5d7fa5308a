use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Vehicle subsystem a parameter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleSystem {
    Engine,
    Transmission,
    Hvac,
    Lighting,
    Security,
    Audio,
}

/// Where a reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingSource {
    Obd,
    Can,
    Gpio,
}

/// One sampled vehicle parameter. Produced by a telemetry adapter; the
/// safety core never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleReading {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub timestamp_ms: i64,
    pub system: VehicleSystem,
    pub source: ReadingSource,
}

impl VehicleReading {
    pub fn new(
        name: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
        system: VehicleSystem,
        source: ReadingSource,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
            timestamp_ms: now_millis(),
            system,
            source,
        }
    }
}

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
