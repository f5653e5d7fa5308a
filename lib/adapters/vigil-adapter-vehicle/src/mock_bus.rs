use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;

use vigil_domain::{ReadingSource, VehicleReading, VehicleSystem};
use vigil_ports::{ActuationPort, TelemetryPort};

/// OBD-style read-only parameters with their baseline mock values.
const OBD_BASELINES: [(&str, f64, &str); 8] = [
    ("engine_rpm", 850.0, "rpm"),
    ("vehicle_speed", 0.0, "km/h"),
    ("engine_temp", 95.0, "°C"),
    ("throttle_pos", 0.0, "%"),
    ("fuel_level", 78.5, "%"),
    ("intake_temp", 25.0, "°C"),
    ("maf_rate", 2.5, "g/s"),
    ("fuel_pressure", 350.0, "kPa"),
];

/// CAN-style parameters that accept writes.
const CAN_WRITABLE: [(&str, &str); 9] = [
    ("hvac_temp_set", "°C"),
    ("hvac_fan_speed", "level"),
    ("hvac_mode", "mode"),
    ("interior_lights", "%"),
    ("exterior_lights", "%"),
    ("boost_pressure", "PSI"),
    ("fuel_trim", "%"),
    ("audio_volume", "level"),
    ("audio_source", "source"),
];

/// Mock vehicle bus standing in for real OBD-II and CAN interfaces.
///
/// Reads serve baseline values with a small deterministic wobble so the
/// monitor sees changing data without tests becoming flaky. Writes land in
/// a CAN-state cache and are readable back, mirroring how the real bus
/// caches the last commanded value.
pub struct MockVehicleBus {
    tick: AtomicU64,
    overrides: Mutex<HashMap<String, f64>>,
    failing: Mutex<HashSet<String>>,
    can_state: Mutex<HashMap<String, f64>>,
}

impl MockVehicleBus {
    pub fn new() -> Self {
        tracing::warn!("using mock vehicle bus");
        Self {
            tick: AtomicU64::new(0),
            overrides: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            can_state: Mutex::new(HashMap::new()),
        }
    }

    /// Pin a parameter to a fixed value, bypassing baseline and wobble.
    pub fn set_reading(&self, name: impl Into<String>, value: f64) {
        self.overrides
            .lock()
            .expect("mock overrides lock poisoned")
            .insert(name.into(), value);
    }

    /// Make subsequent reads of a parameter fail at the interface level.
    pub fn fail_parameter(&self, name: impl Into<String>) {
        self.failing
            .lock()
            .expect("mock failures lock poisoned")
            .insert(name.into());
    }

    /// Triangle wave over successive reads, within ±5% of the baseline.
    fn wobble(&self, baseline: f64) -> f64 {
        let tick = self.tick.fetch_add(1, Ordering::Relaxed);
        let phase = (tick % 21) as f64 - 10.0;
        baseline + baseline * 0.05 * (phase / 10.0)
    }

    fn obd_reading(&self, name: &str) -> Option<VehicleReading> {
        let (param, baseline, unit) = OBD_BASELINES.iter().find(|(n, _, _)| *n == name)?;
        let value = self.wobble(*baseline);
        Some(VehicleReading {
            name: (*param).into(),
            value: (value * 10.0).round() / 10.0,
            unit: (*unit).into(),
            timestamp_ms: Utc::now().timestamp_millis(),
            system: VehicleSystem::Engine,
            source: ReadingSource::Obd,
        })
    }

    fn can_reading(&self, name: &str) -> Option<VehicleReading> {
        let value = *self
            .can_state
            .lock()
            .expect("mock CAN state lock poisoned")
            .get(name)?;
        let unit = CAN_WRITABLE
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, u)| *u)
            .unwrap_or("");
        Some(VehicleReading {
            name: name.into(),
            value,
            unit: unit.into(),
            timestamp_ms: Utc::now().timestamp_millis(),
            system: system_for(name),
            source: ReadingSource::Can,
        })
    }
}

impl Default for MockVehicleBus {
    fn default() -> Self {
        Self::new()
    }
}

fn system_for(name: &str) -> VehicleSystem {
    if name.starts_with("hvac_") {
        VehicleSystem::Hvac
    } else if name.starts_with("audio_") {
        VehicleSystem::Audio
    } else if name.contains("lights") {
        VehicleSystem::Lighting
    } else {
        VehicleSystem::Engine
    }
}

#[async_trait]
impl TelemetryPort for MockVehicleBus {
    async fn get_parameter(&self, name: &str) -> Result<Option<VehicleReading>> {
        if self
            .failing
            .lock()
            .expect("mock failures lock poisoned")
            .contains(name)
        {
            return Err(anyhow!("simulated interface failure reading {name}"));
        }

        if let Some(value) = self
            .overrides
            .lock()
            .expect("mock overrides lock poisoned")
            .get(name)
            .copied()
        {
            let unit = OBD_BASELINES
                .iter()
                .find(|(n, _, _)| *n == name)
                .map(|(_, _, u)| *u)
                .unwrap_or("");
            return Ok(Some(VehicleReading {
                name: name.into(),
                value,
                unit: unit.into(),
                timestamp_ms: Utc::now().timestamp_millis(),
                system: system_for(name),
                source: ReadingSource::Obd,
            }));
        }

        // OBD first for engine parameters, then the CAN cache.
        if let Some(reading) = self.obd_reading(name) {
            return Ok(Some(reading));
        }
        Ok(self.can_reading(name))
    }
}

#[async_trait]
impl ActuationPort for MockVehicleBus {
    async fn set_parameter(&self, name: &str, value: f64) -> Result<bool> {
        if !CAN_WRITABLE.iter().any(|(n, _)| *n == name) {
            tracing::error!("unknown CAN parameter: {name}");
            return Ok(false);
        }

        tracing::info!("mock CAN: set {name} = {value}");
        self.can_state
            .lock()
            .expect("mock CAN state lock poisoned")
            .insert(name.into(), value);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn obd_parameters_read_near_baseline() {
        let bus = MockVehicleBus::new();
        let reading = bus.get_parameter("engine_temp").await.unwrap().unwrap();
        assert_eq!(reading.source, ReadingSource::Obd);
        assert!((reading.value - 95.0).abs() <= 95.0 * 0.05 + 0.1);
    }

    #[tokio::test]
    async fn unknown_parameter_reads_as_missing() {
        let bus = MockVehicleBus::new();
        assert!(bus.get_parameter("warp_core_temp").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn write_then_read_roundtrips_through_can_cache() {
        let bus = MockVehicleBus::new();
        assert!(bus.set_parameter("hvac_temp_set", 22.5).await.unwrap());

        let reading = bus.get_parameter("hvac_temp_set").await.unwrap().unwrap();
        assert_eq!(reading.value, 22.5);
        assert_eq!(reading.source, ReadingSource::Can);
        assert_eq!(reading.system, VehicleSystem::Hvac);
    }

    #[tokio::test]
    async fn unknown_write_target_is_rejected() {
        let bus = MockVehicleBus::new();
        assert!(!bus.set_parameter("flux_capacitor", 1.21).await.unwrap());
    }

    #[tokio::test]
    async fn pinned_reading_bypasses_wobble() {
        let bus = MockVehicleBus::new();
        bus.set_reading("engine_temp", 112.0);
        for _ in 0..3 {
            let reading = bus.get_parameter("engine_temp").await.unwrap().unwrap();
            assert_eq!(reading.value, 112.0);
        }
    }

    #[tokio::test]
    async fn failing_parameter_surfaces_interface_error() {
        let bus = MockVehicleBus::new();
        bus.fail_parameter("oil_pressure");
        assert!(bus.get_parameter("oil_pressure").await.is_err());
    }
}
