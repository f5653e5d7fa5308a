//! Ports between the safety core and its collaborators.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use vigil_domain::{VehicleReading, Violation};

/// Read access to live vehicle parameters.
///
/// `Ok(None)` means the parameter is currently unavailable, which is an
/// expected condition; `Err` means the underlying interface itself failed.
#[async_trait]
pub trait TelemetryPort: Send + Sync {
    async fn get_parameter(&self, name: &str) -> Result<Option<VehicleReading>>;
}

/// Write access to actuatable vehicle parameters. Invoked only after a
/// command has passed validation.
#[async_trait]
pub trait ActuationPort: Send + Sync {
    /// Returns false when the parameter exists but could not be written.
    async fn set_parameter(&self, name: &str, value: f64) -> Result<bool>;
}

/// Append-only sink for detected violations.
#[async_trait]
pub trait ViolationStorePort: Send + Sync {
    async fn record(&self, violation: &Violation) -> Result<()>;
    async fn recent(&self, limit: usize) -> Result<Vec<Violation>>;
}

/// Telemetry source that never has data. Useful when wiring a monitor
/// without a vehicle connection.
#[derive(Clone, Default)]
pub struct NullTelemetry;

#[async_trait]
impl TelemetryPort for NullTelemetry {
    async fn get_parameter(&self, _name: &str) -> Result<Option<VehicleReading>> {
        Ok(None)
    }
}

#[derive(Clone, Default)]
pub struct NullActuation;

#[async_trait]
impl ActuationPort for NullActuation {
    async fn set_parameter(&self, _name: &str, _value: f64) -> Result<bool> {
        Ok(false)
    }
}

#[derive(Clone, Default)]
pub struct NullViolationStore;

#[async_trait]
impl ViolationStorePort for NullViolationStore {
    async fn record(&self, _violation: &Violation) -> Result<()> {
        Ok(())
    }

    async fn recent(&self, _limit: usize) -> Result<Vec<Violation>> {
        Ok(Vec::new())
    }
}

/// In-memory violation store for tests and development.
#[derive(Clone, Default)]
pub struct InMemoryViolationStore {
    records: Arc<Mutex<Vec<Violation>>>,
}

impl InMemoryViolationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("violation store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ViolationStorePort for InMemoryViolationStore {
    async fn record(&self, violation: &Violation) -> Result<()> {
        self.records
            .lock()
            .expect("violation store lock poisoned")
            .push(violation.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Violation>> {
        let records = self.records.lock().expect("violation store lock poisoned");
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}
