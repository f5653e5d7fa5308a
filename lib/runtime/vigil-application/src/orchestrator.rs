use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use vigil_domain::{CommandRequest, IntentCategory, SafetyLevel};
use vigil_ports::ActuationPort;

use crate::alerts::AlertCenter;
use crate::monitor::SafetyMonitor;

/// What happened to a validated command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Executed {
        warnings: Vec<String>,
    },
    /// Validation passed but the user must confirm before execution.
    NeedsConfirmation {
        warnings: Vec<String>,
        prompts: Vec<String>,
    },
    Blocked {
        reason: String,
        level: SafetyLevel,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrchestratorStats {
    pub commands_processed: u64,
    pub commands_succeeded: u64,
    pub commands_failed: u64,
}

/// The validation-gated command path: every actuation request passes
/// through the safety monitor before it can reach the vehicle bus.
pub struct Orchestrator {
    monitor: Arc<SafetyMonitor>,
    actuator: Arc<dyn ActuationPort>,
    alerts: AlertCenter,
    processed: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl Orchestrator {
    pub fn new(monitor: Arc<SafetyMonitor>, actuator: Arc<dyn ActuationPort>) -> Self {
        Self {
            monitor,
            actuator,
            alerts: AlertCenter::new(),
            processed: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn alerts(&self) -> &AlertCenter {
        &self.alerts
    }

    pub fn stats(&self) -> OrchestratorStats {
        OrchestratorStats {
            commands_processed: self.processed.load(Ordering::Relaxed),
            commands_succeeded: self.succeeded.load(Ordering::Relaxed),
            commands_failed: self.failed.load(Ordering::Relaxed),
        }
    }

    pub async fn handle_command(&self, request: &CommandRequest) -> CommandOutcome {
        self.processed.fetch_add(1, Ordering::Relaxed);

        let validation = self.monitor.validate_command(
            request.intent,
            &request.parameter,
            request.value,
            &request.context,
        );

        if !validation.allowed {
            let reason = validation
                .blocked_reason
                .unwrap_or_else(|| "blocked by safety validation".into());
            self.failed.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("command blocked: {reason}");
            if validation.level.is_blocking() {
                self.alerts.raise(&request.parameter, validation.level, &reason);
            }
            return CommandOutcome::Blocked {
                reason,
                level: validation.level,
            };
        }

        if !validation.required_confirmations.is_empty() {
            return CommandOutcome::NeedsConfirmation {
                warnings: validation.warnings,
                prompts: validation.required_confirmations,
            };
        }

        if request.intent == IntentCategory::EmergencyAction {
            self.monitor.trigger_emergency_protocol().await;
            self.succeeded.fetch_add(1, Ordering::Relaxed);
            return CommandOutcome::Executed {
                warnings: validation.warnings,
            };
        }

        match self
            .actuator
            .set_parameter(&request.parameter, request.value)
            .await
        {
            Ok(true) => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
                CommandOutcome::Executed {
                    warnings: validation.warnings,
                }
            }
            Ok(false) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                CommandOutcome::Failed {
                    message: format!("no writable interface for {}", request.parameter),
                }
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!("command execution error: {e:#}");
                CommandOutcome::Failed {
                    message: format!("execution failed: {e}"),
                }
            }
        }
    }
}
