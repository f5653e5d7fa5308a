//! Command validation: the gate every actuation request passes through.

use std::sync::atomic::Ordering;

use anyhow::Result;

use vigil_domain::{
    CommandValidationResult, IntentCategory, SafetyLevel, VehicleContext,
};

use crate::monitor::SafetyMonitor;
use crate::policy::TUNING_PARAMETERS;

impl SafetyMonitor {
    /// Validate whether a command is safe to execute.
    ///
    /// Never returns an error: the caller branches on the result object, so
    /// any internal failure is converted into a deny with Critical level.
    pub fn validate_command(
        &self,
        intent: IntentCategory,
        parameter: &str,
        value: f64,
        context: &VehicleContext,
    ) -> CommandValidationResult {
        self.counters
            .commands_validated
            .fetch_add(1, Ordering::Relaxed);

        let result = match self.validate_inner(intent, parameter, value, context) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("command validation error: {e:#}");
                CommandValidationResult::blocked(
                    SafetyLevel::Critical,
                    "Safety validation system error",
                )
            }
        };

        if !result.allowed {
            self.counters
                .commands_blocked
                .fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    fn validate_inner(
        &self,
        intent: IntentCategory,
        parameter: &str,
        value: f64,
        context: &VehicleContext,
    ) -> Result<CommandValidationResult> {
        let mut warnings = Vec::new();
        let mut confirmations = Vec::new();
        let mut level = SafetyLevel::Safe;

        // 1. Emergency mode blocks everything; no other checks run.
        if self.emergency.is_engaged() {
            return Ok(CommandValidationResult::blocked(
                SafetyLevel::Emergency,
                "System in emergency mode - only emergency commands allowed",
            ));
        }

        // 2. Motion-based restrictions.
        if let Some(speed) = context.speed() {
            if speed > self.policy.low_speed {
                if intent == IntentCategory::EngineManagement {
                    warnings.push("Engine modifications while moving can be dangerous".into());
                    confirmations
                        .push("Confirm you want to modify engine parameters while driving".into());
                    level = level.max(SafetyLevel::Warning);
                }

                if TUNING_PARAMETERS.contains(&parameter) && speed > self.policy.high_speed {
                    return Ok(CommandValidationResult::blocked(
                        SafetyLevel::Critical,
                        "Engine tuning not allowed at highway speeds",
                    ));
                }
            }
        }

        // 3. Static per-parameter policy.
        let check = self.policy.check_parameter(parameter, value);
        if let Some((block_level, reason)) = check.block {
            return Ok(CommandValidationResult::blocked(block_level, reason));
        }
        warnings.extend(check.warnings);
        confirmations.extend(check.confirmations);
        level = level.max(check.level);

        // 4. Live violation state on the same parameter.
        for violation in self.tracker.active().iter() {
            if violation.parameter == parameter {
                if violation.level.is_blocking() {
                    return Ok(CommandValidationResult::blocked(
                        violation.level,
                        format!("Parameter {parameter} has active safety violation"),
                    ));
                }
                warnings.push(format!(
                    "Active safety concern with {parameter}: {}",
                    violation.description
                ));
            }
        }

        // 5. Allowed, at the highest severity reached along the way.
        Ok(CommandValidationResult::allowed(
            level,
            warnings,
            confirmations,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use vigil_domain::VigilConfig;
    use vigil_ports::{InMemoryViolationStore, NullTelemetry};

    fn monitor() -> SafetyMonitor {
        SafetyMonitor::new(
            &VigilConfig::default(),
            Arc::new(NullTelemetry),
            Arc::new(InMemoryViolationStore::new()),
        )
    }

    #[test]
    fn boost_over_hard_ceiling_is_denied() {
        let monitor = monitor();
        let result = monitor.validate_command(
            IntentCategory::EngineManagement,
            "boost_pressure",
            22.0,
            &VehicleContext::new(),
        );
        assert!(!result.allowed);
        assert_eq!(result.level, SafetyLevel::Critical);
        assert!(
            result
                .blocked_reason
                .as_deref()
                .unwrap()
                .contains("exceeds maximum safe limit")
        );
    }

    #[test]
    fn hot_cabin_request_warns_without_confirmation() {
        let monitor = monitor();
        let result = monitor.validate_command(
            IntentCategory::ClimateControl,
            "hvac_temp_set",
            36.0,
            &VehicleContext::new(),
        );
        assert!(result.allowed);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.required_confirmations.is_empty());
        assert_eq!(result.level, SafetyLevel::Caution);
    }

    #[test]
    fn tuning_at_highway_speed_is_denied_regardless_of_value() {
        let monitor = monitor();
        let context = VehicleContext::new().with("vehicle_speed", 60.0);
        // Value 0.0 would otherwise pass every policy band.
        let result = monitor.validate_command(
            IntentCategory::EngineManagement,
            "boost_pressure",
            0.0,
            &context,
        );
        assert!(!result.allowed);
        assert_eq!(result.level, SafetyLevel::Critical);
        assert!(
            result
                .blocked_reason
                .as_deref()
                .unwrap()
                .contains("not allowed at highway speeds")
        );
    }

    #[test]
    fn engine_management_while_moving_needs_confirmation() {
        let monitor = monitor();
        let context = VehicleContext::new().with("speed", 30.0);
        let result = monitor.validate_command(
            IntentCategory::EngineManagement,
            "fuel_trim",
            2.0,
            &context,
        );
        assert!(result.allowed);
        assert_eq!(result.required_confirmations.len(), 1);
        assert_eq!(result.level, SafetyLevel::Warning);
    }

    #[test]
    fn climate_commands_ignore_motion_restrictions() {
        let monitor = monitor();
        let context = VehicleContext::new().with("vehicle_speed", 100.0);
        let result = monitor.validate_command(
            IntentCategory::ClimateControl,
            "hvac_temp_set",
            22.0,
            &context,
        );
        assert!(result.allowed);
        assert!(result.warnings.is_empty());
        assert_eq!(result.level, SafetyLevel::Safe);
    }

    #[tokio::test]
    async fn emergency_mode_denies_everything_until_reset() {
        let monitor = monitor();
        monitor.trigger_emergency_protocol().await;

        for (intent, parameter, value) in [
            (IntentCategory::ClimateControl, "hvac_temp_set", 21.0),
            (IntentCategory::AudioControl, "audio_volume", 5.0),
            (IntentCategory::EngineManagement, "boost_pressure", 1.0),
        ] {
            let result =
                monitor.validate_command(intent, parameter, value, &VehicleContext::new());
            assert!(!result.allowed);
            assert_eq!(result.level, SafetyLevel::Emergency);
        }

        monitor.reset_emergency().await;
        let result = monitor.validate_command(
            IntentCategory::ClimateControl,
            "hvac_temp_set",
            21.0,
            &VehicleContext::new(),
        );
        assert!(result.allowed);
    }

    #[test]
    fn active_critical_violation_blocks_the_parameter() {
        let monitor = monitor();
        let rules = vigil_domain::RuleSet::default();
        let rule = rules
            .rules()
            .iter()
            .find(|r| r.name == "engine_temp_critical")
            .unwrap();
        let reading = vigil_domain::VehicleReading::new(
            "engine_temp",
            115.0,
            "°C",
            vigil_domain::VehicleSystem::Engine,
            vigil_domain::ReadingSource::Obd,
        );
        monitor
            .tracker
            .replace_active(vec![rule.check(&reading).unwrap()]);

        let result = monitor.validate_command(
            IntentCategory::VehicleStatus,
            "engine_temp",
            0.0,
            &VehicleContext::new(),
        );
        assert!(!result.allowed);
        assert_eq!(result.level, SafetyLevel::Critical);
        assert!(
            result
                .blocked_reason
                .as_deref()
                .unwrap()
                .contains("engine_temp")
        );
    }

    #[test]
    fn active_caution_violation_only_warns() {
        let monitor = monitor();
        let rules = vigil_domain::RuleSet::default();
        let rule = rules
            .rules()
            .iter()
            .find(|r| r.name == "hvac_temp_max")
            .unwrap();
        let reading = vigil_domain::VehicleReading::new(
            "hvac_temp_set",
            36.0,
            "°C",
            vigil_domain::VehicleSystem::Hvac,
            vigil_domain::ReadingSource::Can,
        );
        monitor
            .tracker
            .replace_active(vec![rule.check(&reading).unwrap()]);

        let result = monitor.validate_command(
            IntentCategory::ClimateControl,
            "hvac_temp_set",
            20.0,
            &VehicleContext::new(),
        );
        assert!(result.allowed);
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.contains("Active safety concern"))
        );
    }

    #[test]
    fn validation_is_idempotent_without_state_changes() {
        let monitor = monitor();
        let context = VehicleContext::new().with("vehicle_speed", 30.0);
        let first = monitor.validate_command(
            IntentCategory::EngineManagement,
            "boost_pressure",
            17.0,
            &context,
        );
        let second = monitor.validate_command(
            IntentCategory::EngineManagement,
            "boost_pressure",
            17.0,
            &context,
        );
        assert_eq!(first, second);
    }

    #[test]
    fn counters_track_validated_and_blocked() {
        let monitor = monitor();
        let _ = monitor.validate_command(
            IntentCategory::ClimateControl,
            "hvac_temp_set",
            21.0,
            &VehicleContext::new(),
        );
        let _ = monitor.validate_command(
            IntentCategory::EngineManagement,
            "boost_pressure",
            25.0,
            &VehicleContext::new(),
        );

        let stats = monitor.stats();
        assert_eq!(stats.commands_validated, 2);
        assert_eq!(stats.commands_blocked, 1);
    }
}
