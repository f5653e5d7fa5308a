use std::collections::HashMap;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::config::SafetySettings;
use crate::level::SafetyLevel;
use crate::reading::VehicleReading;
use crate::violation::Violation;

/// Category a rule violation falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    TemperatureLimit,
    PressureLimit,
    SpeedLimit,
    RpmLimit,
    ElectricalFault,
    CommunicationLoss,
    SensorMalfunction,
    UserSafety,
    SystemIntegrity,
}

/// A declarative threshold over one vehicle parameter.
///
/// At least one bound must be present, and `min_value < max_value` when both
/// are. Constructed once at startup; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyRule {
    pub name: String,
    pub parameter: String,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub level: SafetyLevel,
    pub category: RuleCategory,
    pub requires_action: bool,
    pub description: String,
}

impl SafetyRule {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        parameter: impl Into<String>,
        min_value: Option<f64>,
        max_value: Option<f64>,
        level: SafetyLevel,
        category: RuleCategory,
        requires_action: bool,
        description: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        if min_value.is_none() && max_value.is_none() {
            bail!("rule {name} has no bounds");
        }
        if let (Some(min), Some(max)) = (min_value, max_value) {
            if min >= max {
                bail!("rule {name} has min {min} >= max {max}");
            }
        }
        Ok(Self {
            name,
            parameter: parameter.into(),
            min_value,
            max_value,
            level,
            category,
            requires_action,
            description: description.into(),
        })
    }

    /// Check one reading against this rule.
    ///
    /// Comparisons are strict: a value exactly at a bound is not a
    /// violation. The max bound is checked before the min bound, so a rule
    /// yields at most one violation per tick.
    pub fn check(&self, reading: &VehicleReading) -> Option<Violation> {
        let value = reading.value;

        if let Some(max) = self.max_value {
            if value > max {
                return Some(self.violation(value, max, format!("{value} > {max}")));
            }
        }

        if let Some(min) = self.min_value {
            if value < min {
                return Some(self.violation(value, min, format!("{value} < {min}")));
            }
        }

        None
    }

    fn violation(&self, current: f64, limit: f64, detail: String) -> Violation {
        Violation {
            rule_name: self.name.clone(),
            parameter: self.parameter.clone(),
            current_value: current,
            limit_value: limit,
            level: self.level,
            category: self.category,
            timestamp_ms: crate::reading::now_millis(),
            description: format!("{}: {detail}", self.description),
            action_taken: None,
        }
    }
}

/// The fixed rule collection, with a parameter-name index so the evaluation
/// loop avoids a linear scan per tick. Multiple rules may target the same
/// parameter and all of them are evaluated independently.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<SafetyRule>,
    by_parameter: HashMap<String, Vec<usize>>,
}

impl RuleSet {
    pub fn new(rules: Vec<SafetyRule>) -> Self {
        let mut by_parameter: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, rule) in rules.iter().enumerate() {
            by_parameter
                .entry(rule.parameter.clone())
                .or_default()
                .push(idx);
        }
        Self {
            rules,
            by_parameter,
        }
    }

    /// The default vehicle rule set, with thresholds taken from the
    /// deployment's safety settings.
    pub fn with_settings(settings: &SafetySettings) -> Self {
        let rules = vec![
            SafetyRule::new(
                "engine_temp_critical",
                "engine_temp",
                None,
                Some(settings.engine_temp_critical),
                SafetyLevel::Critical,
                RuleCategory::TemperatureLimit,
                true,
                "Engine temperature exceeds critical limit",
            )
            .expect("default rule"),
            SafetyRule::new(
                "engine_temp_warning",
                "engine_temp",
                None,
                Some(settings.engine_temp_warning),
                SafetyLevel::Warning,
                RuleCategory::TemperatureLimit,
                false,
                "Engine temperature high",
            )
            .expect("default rule"),
            SafetyRule::new(
                "engine_rpm_limit",
                "engine_rpm",
                None,
                Some(settings.max_rpm),
                SafetyLevel::Critical,
                RuleCategory::RpmLimit,
                true,
                "Engine RPM exceeds redline",
            )
            .expect("default rule"),
            SafetyRule::new(
                "oil_pressure_critical",
                "oil_pressure",
                Some(settings.min_oil_pressure),
                None,
                SafetyLevel::Critical,
                RuleCategory::PressureLimit,
                true,
                "Oil pressure critically low",
            )
            .expect("default rule"),
            SafetyRule::new(
                "boost_pressure_limit",
                "boost_pressure",
                None,
                Some(settings.max_boost_pressure),
                SafetyLevel::Warning,
                RuleCategory::PressureLimit,
                false,
                "Boost pressure approaching limit",
            )
            .expect("default rule"),
            SafetyRule::new(
                "hvac_temp_max",
                "hvac_temp_set",
                None,
                Some(35.0),
                SafetyLevel::Caution,
                RuleCategory::TemperatureLimit,
                false,
                "HVAC temperature set very high",
            )
            .expect("default rule"),
            SafetyRule::new(
                "hvac_temp_min",
                "hvac_temp_set",
                Some(15.0),
                None,
                SafetyLevel::Caution,
                RuleCategory::TemperatureLimit,
                false,
                "HVAC temperature set very low",
            )
            .expect("default rule"),
            SafetyRule::new(
                "high_speed_limit",
                "vehicle_speed",
                None,
                Some(80.0),
                SafetyLevel::Warning,
                RuleCategory::SpeedLimit,
                false,
                "Vehicle speed too high for certain operations",
            )
            .expect("default rule"),
        ];
        Self::new(rules)
    }

    pub fn rules(&self) -> &[SafetyRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All rules bound to a parameter name.
    pub fn for_parameter(&self, parameter: &str) -> impl Iterator<Item = &SafetyRule> {
        self.by_parameter
            .get(parameter)
            .into_iter()
            .flatten()
            .map(|&idx| &self.rules[idx])
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::with_settings(&SafetySettings::default())
    }
}
