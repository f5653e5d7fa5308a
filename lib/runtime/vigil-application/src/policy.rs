use vigil_domain::{SafetyLevel, SafetySettings};

/// Parameters that count as engine tuning for the high-speed restriction.
pub const TUNING_PARAMETERS: [&str; 3] = ["boost_pressure", "fuel_trim", "ignition_timing"];

/// Outcome of the static per-parameter policy check.
#[derive(Debug, Default)]
pub struct PolicyCheck {
    pub warnings: Vec<String>,
    pub confirmations: Vec<String>,
    pub level: SafetyLevel,
    pub block: Option<(SafetyLevel, String)>,
}

/// Static command policy: per-parameter value bands plus the motion-based
/// restrictions. Thresholds that have a deployment override come from the
/// safety settings; the rest are fixed.
#[derive(Debug, Clone)]
pub struct CommandPolicy {
    pub low_speed: f64,
    pub high_speed: f64,
    boost_caution: f64,
    boost_ceiling: f64,
    cabin_min: f64,
    cabin_max: f64,
    rpm_warning: f64,
}

impl CommandPolicy {
    pub fn from_settings(settings: &SafetySettings) -> Self {
        Self {
            low_speed: 5.0,
            high_speed: 50.0,
            boost_caution: 15.0,
            boost_ceiling: settings.max_boost_pressure,
            cabin_min: 15.0,
            cabin_max: 35.0,
            rpm_warning: 6000.0,
        }
    }

    /// Check a requested value against the parameter's policy band. This is
    /// an extensible table, not an exhaustive enumeration: unknown
    /// parameters pass through clean.
    pub fn check_parameter(&self, parameter: &str, value: f64) -> PolicyCheck {
        let mut check = PolicyCheck::default();

        match parameter {
            "boost_pressure" => {
                if value > self.boost_ceiling {
                    check.block = Some((
                        SafetyLevel::Critical,
                        "Boost pressure exceeds maximum safe limit".into(),
                    ));
                    return check;
                }
                if value > self.boost_caution {
                    check.warnings.push(format!(
                        "Boost pressure {value} PSI is high - ensure engine can handle it"
                    ));
                    check
                        .confirmations
                        .push("Confirm boost pressure increase is safe for your engine".into());
                    check.level = SafetyLevel::Caution;
                }
            }
            "hvac_temp_set" => {
                // Comfort band only: never blocks.
                if value > self.cabin_max {
                    check
                        .warnings
                        .push("High cabin temperature may cause discomfort".into());
                    check.level = SafetyLevel::Caution;
                } else if value < self.cabin_min {
                    check
                        .warnings
                        .push("Low cabin temperature may cause discomfort".into());
                    check.level = SafetyLevel::Caution;
                }
            }
            "engine_rpm" => {
                // Hard RPM blocking belongs to the rule evaluator's
                // automated action, not command policy.
                if value > self.rpm_warning {
                    check
                        .warnings
                        .push("High RPM operation can cause engine damage".into());
                    check
                        .confirmations
                        .push("Confirm high RPM operation is safe".into());
                    check.level = SafetyLevel::Warning;
                }
            }
            _ => {}
        }

        check
    }
}

impl Default for CommandPolicy {
    fn default() -> Self {
        Self::from_settings(&SafetySettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boost_over_ceiling_blocks_critical() {
        let policy = CommandPolicy::default();
        let check = policy.check_parameter("boost_pressure", 22.0);
        let (level, reason) = check.block.unwrap();
        assert_eq!(level, SafetyLevel::Critical);
        assert!(reason.contains("exceeds maximum safe limit"));
    }

    #[test]
    fn boost_in_caution_band_requires_confirmation() {
        let policy = CommandPolicy::default();
        let check = policy.check_parameter("boost_pressure", 17.0);
        assert!(check.block.is_none());
        assert_eq!(check.warnings.len(), 1);
        assert_eq!(check.confirmations.len(), 1);
        assert_eq!(check.level, SafetyLevel::Caution);
    }

    #[test]
    fn cabin_temperature_warns_but_never_blocks() {
        let policy = CommandPolicy::default();
        for value in [36.0, 10.0] {
            let check = policy.check_parameter("hvac_temp_set", value);
            assert!(check.block.is_none());
            assert_eq!(check.warnings.len(), 1);
            assert!(check.confirmations.is_empty());
        }
        let comfortable = policy.check_parameter("hvac_temp_set", 21.0);
        assert!(comfortable.warnings.is_empty());
        assert_eq!(comfortable.level, SafetyLevel::Safe);
    }

    #[test]
    fn high_rpm_warns_without_blocking() {
        let policy = CommandPolicy::default();
        let check = policy.check_parameter("engine_rpm", 6500.0);
        assert!(check.block.is_none());
        assert_eq!(check.level, SafetyLevel::Warning);
        assert_eq!(check.confirmations.len(), 1);
    }

    #[test]
    fn unknown_parameters_pass_clean() {
        let policy = CommandPolicy::default();
        let check = policy.check_parameter("audio_volume", 30.0);
        assert!(check.block.is_none());
        assert!(check.warnings.is_empty());
        assert_eq!(check.level, SafetyLevel::Safe);
    }

    #[test]
    fn ceiling_follows_deployment_settings() {
        let settings = SafetySettings {
            max_boost_pressure: 25.0,
            ..SafetySettings::default()
        };
        let policy = CommandPolicy::from_settings(&settings);
        assert!(policy.check_parameter("boost_pressure", 22.0).block.is_none());
        assert!(policy.check_parameter("boost_pressure", 25.5).block.is_some());
    }
}
