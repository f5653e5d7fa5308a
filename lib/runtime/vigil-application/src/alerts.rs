use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use vigil_domain::{Alert, SafetyLevel};

/// Orchestrator-level alerts with an operator-driven lifecycle.
///
/// Unlike per-tick violations, an alert stays open until someone
/// acknowledges and resolves it. At most one open alert per parameter.
#[derive(Default)]
pub struct AlertCenter {
    alerts: Mutex<Vec<Alert>>,
    next_id: AtomicU64,
}

impl AlertCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise an alert unless one is already open for the parameter.
    /// Returns the new alert's id, or None when deduplicated.
    pub fn raise(
        &self,
        parameter: &str,
        level: SafetyLevel,
        message: impl Into<String>,
    ) -> Option<String> {
        let mut alerts = self.alerts.lock().expect("alerts lock poisoned");
        if alerts
            .iter()
            .any(|a| a.parameter == parameter && a.is_open())
        {
            return None;
        }

        let id = format!("{parameter}-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let alert = Alert::new(id.clone(), parameter, level, message);
        tracing::warn!("alert raised: {} ({level})", alert.message);
        alerts.push(alert);
        Some(id)
    }

    pub fn acknowledge(&self, id: &str) -> bool {
        let mut alerts = self.alerts.lock().expect("alerts lock poisoned");
        match alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.acknowledge();
                true
            }
            None => false,
        }
    }

    pub fn resolve(&self, id: &str) -> bool {
        let mut alerts = self.alerts.lock().expect("alerts lock poisoned");
        match alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.resolve();
                true
            }
            None => false,
        }
    }

    /// All alerts not yet resolved.
    pub fn open(&self) -> Vec<Alert> {
        self.alerts
            .lock()
            .expect("alerts lock poisoned")
            .iter()
            .filter(|a| a.is_open())
            .cloned()
            .collect()
    }

    pub fn all(&self) -> Vec<Alert> {
        self.alerts.lock().expect("alerts lock poisoned").clone()
    }
}
