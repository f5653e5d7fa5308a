use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, timeout};

use vigil_domain::{
    RuleCategory, RuleSet, SafetyLevel, SafetyStats, SafetyStatus, VigilConfig, Violation,
    aggregate_level,
};
use vigil_ports::{TelemetryPort, ViolationStorePort};

use crate::emergency::EmergencyHandler;
use crate::policy::CommandPolicy;
use crate::tracker::ViolationTracker;

#[derive(Default)]
pub(crate) struct Counters {
    pub violations_detected: AtomicU64,
    pub commands_validated: AtomicU64,
    pub commands_blocked: AtomicU64,
}

/// Central safety monitoring and validation system.
///
/// One instance is constructed at startup and shared by reference with
/// every consumer; the monitoring loop task is its only writer.
pub struct SafetyMonitor {
    pub(crate) rules: RuleSet,
    pub(crate) policy: CommandPolicy,
    pub(crate) tracker: ViolationTracker,
    pub(crate) emergency: EmergencyHandler,
    pub(crate) counters: Counters,
    telemetry: Arc<dyn TelemetryPort>,
    store: Arc<dyn ViolationStorePort>,
    level: RwLock<SafetyLevel>,
    interval: Duration,
    parameter_timeout: Duration,
    emergency_enabled: bool,
    monitoring_active: AtomicBool,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl SafetyMonitor {
    pub fn new(
        config: &VigilConfig,
        telemetry: Arc<dyn TelemetryPort>,
        store: Arc<dyn ViolationStorePort>,
    ) -> Self {
        let rules = RuleSet::with_settings(&config.safety);
        tracing::info!("safety monitor initialized with {} rules", rules.len());
        Self {
            policy: CommandPolicy::from_settings(&config.safety),
            tracker: ViolationTracker::new(config.safety.history_cap),
            emergency: EmergencyHandler::new(),
            counters: Counters::default(),
            rules,
            telemetry,
            store,
            level: RwLock::new(SafetyLevel::Safe),
            interval: Duration::from_secs_f64(config.safety.monitoring_interval_secs),
            parameter_timeout: Duration::from_millis(config.safety.parameter_timeout_ms),
            emergency_enabled: config.safety.emergency_mode_enabled,
            monitoring_active: AtomicBool::new(false),
            shutdown: Mutex::new(None),
            task: tokio::sync::Mutex::new(None),
        }
    }

    pub fn current_level(&self) -> SafetyLevel {
        *self.level.read().expect("safety level lock poisoned")
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring_active.load(Ordering::SeqCst)
    }

    pub fn active_violations(&self) -> Arc<Vec<Violation>> {
        self.tracker.active()
    }

    pub fn violation_history(&self) -> Vec<Violation> {
        self.tracker.history()
    }

    pub fn stats(&self) -> SafetyStats {
        SafetyStats {
            violations_detected: self.counters.violations_detected.load(Ordering::Relaxed),
            commands_validated: self.counters.commands_validated.load(Ordering::Relaxed),
            commands_blocked: self.counters.commands_blocked.load(Ordering::Relaxed),
            emergency_activations: self.emergency.activations(),
        }
    }

    pub fn status(&self) -> SafetyStatus {
        SafetyStatus {
            safety_level: self.current_level(),
            emergency_mode: self.emergency.is_engaged(),
            monitoring_active: self.is_monitoring(),
            active_violations: self.tracker.active().as_ref().clone(),
            stats: self.stats(),
        }
    }

    pub fn register_emergency_callback<F, Fut>(&self, callback: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.emergency.register(callback);
    }

    /// Start the continuous evaluation loop. A second call while running is
    /// a no-op. Takes an owned handle because the loop task holds one for
    /// as long as it runs.
    pub async fn start_monitoring(self: Arc<Self>) {
        if self.monitoring_active.swap(true, Ordering::SeqCst) {
            return;
        }

        let (tx, mut rx) = watch::channel(false);
        *self.shutdown.lock().expect("shutdown lock poisoned") = Some(tx);

        let monitor = Arc::clone(&self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(monitor.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // A shutdown signal never interrupts an in-flight tick:
                // the tick body runs to completion before the next select.
                tokio::select! {
                    _ = ticker.tick() => monitor.run_tick().await,
                    _ = rx.changed() => break,
                }
            }
        });
        *self.task.lock().await = Some(handle);
        tracing::info!("safety monitoring started");
    }

    /// Stop the evaluation loop cooperatively: the current tick finishes,
    /// then the task exits.
    pub async fn stop_monitoring(&self) {
        if !self.monitoring_active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(tx) = self.shutdown.lock().expect("shutdown lock poisoned").take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.task.lock().await.take() {
            if let Err(e) = handle.await {
                tracing::error!("monitoring task join error: {e}");
            }
        }
        tracing::info!("safety monitoring stopped");
    }

    /// One evaluation pass over every rule.
    pub async fn run_tick(&self) {
        let mut found = Vec::new();

        for rule in self.rules.rules() {
            let read = timeout(
                self.parameter_timeout,
                self.telemetry.get_parameter(&rule.parameter),
            )
            .await;

            match read {
                Err(_) => {
                    tracing::warn!("telemetry read timed out for {}", rule.parameter);
                }
                Ok(Err(e)) => {
                    // One rule failing never aborts the rest of the tick.
                    tracing::error!("error checking safety rule {}: {e:#}", rule.name);
                }
                Ok(Ok(None)) => {}
                Ok(Ok(Some(reading))) => {
                    if let Some(mut violation) = rule.check(&reading) {
                        self.counters
                            .violations_detected
                            .fetch_add(1, Ordering::Relaxed);
                        tracing::warn!("safety violation: {}", violation.description);
                        if rule.requires_action {
                            take_safety_action(&mut violation);
                        }
                        found.push(violation);
                    }
                }
            }
        }

        for violation in &found {
            if let Err(e) = self.store.record(violation).await {
                tracing::error!("failed to persist violation {}: {e:#}", violation.rule_name);
            }
        }

        self.tracker.replace_active(found);
        self.refresh_level().await;
    }

    async fn refresh_level(&self) {
        let active = self.tracker.active();
        let new_level = aggregate_level(&active);
        {
            let mut level = self.level.write().expect("safety level lock poisoned");
            if *level != new_level {
                tracing::info!("safety level changed: {} -> {}", *level, new_level);
                *level = new_level;
            }
        }
        if new_level == SafetyLevel::Emergency && self.emergency_enabled {
            self.emergency.engage().await;
        }
    }

    /// Forced entry into emergency mode, e.g. a user-issued emergency stop.
    pub async fn trigger_emergency_protocol(&self) {
        tracing::error!("executing emergency safety protocol");
        *self.level.write().expect("safety level lock poisoned") = SafetyLevel::Emergency;
        self.emergency.engage().await;
    }

    pub fn is_emergency(&self) -> bool {
        self.emergency.is_engaged()
    }

    /// Manual-only exit from emergency mode; the level is recomputed from
    /// whatever violations are still active.
    pub async fn reset_emergency(&self) {
        self.emergency.reset();
        let active = self.tracker.active();
        *self.level.write().expect("safety level lock poisoned") = aggregate_level(&active);
    }

    /// Reports whether the monitoring loop is healthy. False means the loop
    /// is flagged active but its task is gone; the owner decides what to do
    /// about it, the monitor does not restart itself.
    pub async fn health_check(&self) -> bool {
        if self.is_monitoring() {
            let task = self.task.lock().await;
            let alive = task.as_ref().map(|h| !h.is_finished()).unwrap_or(false);
            if !alive {
                tracing::error!("safety monitoring task has stopped");
                return false;
            }
        }

        let critical = self
            .tracker
            .active()
            .iter()
            .filter(|v| v.level.is_blocking())
            .count();
        if critical > 0 {
            tracing::warn!("health check: {critical} critical violations active");
        }
        true
    }

    pub async fn shutdown(&self) {
        tracing::info!("shutting down safety monitor");
        self.stop_monitoring().await;
        let active = self.tracker.active();
        if !active.is_empty() {
            tracing::warn!("shutdown with {} active violations", active.len());
        }
    }
}

/// Category-specific remediation for rules flagged `requires_action`. The
/// annotation records what protection kicked in; it does not roll back the
/// triggering value.
fn take_safety_action(violation: &mut Violation) {
    let action = match (violation.category, violation.parameter.as_str()) {
        (RuleCategory::TemperatureLimit, "engine_temp") => Some("Engine protection mode activated"),
        (RuleCategory::PressureLimit, "oil_pressure") => {
            Some("Engine shutdown protection activated")
        }
        (RuleCategory::PressureLimit, "boost_pressure") => Some("Boost pressure limited"),
        (RuleCategory::RpmLimit, _) => Some("Rev limiter activated"),
        _ => None,
    };

    if let Some(action) = action {
        violation.action_taken = Some(action.to_string());
        tracing::error!("safety action: {action}");
    }
}
