//! Threshold configuration for the insight rules.
//!
//! Two rule sets exist for the same dataset columns and they disagree on
//! the scale of `Efficiency_Score`. Both are kept as presets; `standard`
//! is the default.

use crate::models::InsightKind;
use serde::{Deserialize, Serialize};

/// Named rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RulePreset {
    /// Raw efficiency scale, per-record energy, anomaly count above 10.
    #[default]
    Standard,
    /// Efficiency on a 0..1 scale, per-unit energy, extra status checks.
    Normalized,
}

/// How the per-line energy check measures consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyMetric {
    /// Line energy total divided by the number of line records.
    PerRecord,
    /// Mean of each record's energy/units ratio.
    PerUnit,
}

/// How efficiency scores are shown in insight text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EfficiencyScale {
    /// Score printed as-is with two decimals.
    Raw,
    /// Score is a fraction, printed as a percentage.
    Fraction,
}

/// Every threshold the insight engine compares against.
///
/// All comparisons are strict: a metric equal to its threshold never fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRules {
    pub energy_metric: EnergyMetric,
    /// Line energy above this fires a warning.
    pub energy_threshold: f64,
    /// Average line efficiency below this fires a warning.
    pub efficiency_threshold: f64,
    pub efficiency_scale: EfficiencyScale,
    /// Anomaly rows per line above this fire a critical insight.
    pub anomaly_threshold: usize,
    /// Emit a critical insight for lines with any `Critical` row.
    pub critical_status_check: bool,
    pub temperature_threshold: f64,
    pub vibration_threshold: f64,
    pub downtime_threshold: f64,
    /// Mean power factor below this fires an info insight.
    pub power_factor_threshold: Option<f64>,
    /// Kind used for the closing environmental summary.
    pub summary_kind: InsightKind,
}

impl Default for InsightRules {
    fn default() -> Self {
        Self::standard()
    }
}

impl InsightRules {
    pub fn standard() -> Self {
        Self {
            energy_metric: EnergyMetric::PerRecord,
            energy_threshold: 50.0,
            efficiency_threshold: 5.0,
            efficiency_scale: EfficiencyScale::Raw,
            anomaly_threshold: 10,
            critical_status_check: false,
            temperature_threshold: 50.0,
            vibration_threshold: 15.0,
            downtime_threshold: 100.0,
            power_factor_threshold: None,
            summary_kind: InsightKind::Info,
        }
    }

    pub fn normalized() -> Self {
        Self {
            energy_metric: EnergyMetric::PerUnit,
            energy_threshold: 10.0,
            efficiency_threshold: 0.85,
            efficiency_scale: EfficiencyScale::Fraction,
            anomaly_threshold: 5,
            critical_status_check: true,
            temperature_threshold: 50.0,
            vibration_threshold: 15.0,
            downtime_threshold: 100.0,
            power_factor_threshold: Some(3.0),
            summary_kind: InsightKind::Success,
        }
    }

    pub fn preset(preset: RulePreset) -> Self {
        match preset {
            RulePreset::Standard => Self::standard(),
            RulePreset::Normalized => Self::normalized(),
        }
    }

    /// Format an efficiency score the way this rule set displays it.
    pub fn format_efficiency(&self, score: f64) -> String {
        match self.efficiency_scale {
            EfficiencyScale::Raw => format!("{:.2}", score),
            EfficiencyScale::Fraction => format!("{:.1}%", score * 100.0),
        }
    }
}

impl From<&crate::config::RulesConfig> for InsightRules {
    fn from(config: &crate::config::RulesConfig) -> Self {
        let mut rules = Self::preset(config.preset);

        if let Some(v) = config.energy_threshold {
            rules.energy_threshold = v;
        }
        if let Some(v) = config.efficiency_threshold {
            rules.efficiency_threshold = v;
        }
        if let Some(v) = config.anomaly_threshold {
            rules.anomaly_threshold = v;
        }
        if let Some(v) = config.temperature_threshold {
            rules.temperature_threshold = v;
        }
        if let Some(v) = config.vibration_threshold {
            rules.vibration_threshold = v;
        }
        if let Some(v) = config.downtime_threshold {
            rules.downtime_threshold = v;
        }

        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;

    #[test]
    fn test_standard_thresholds() {
        let rules = InsightRules::default();
        assert_eq!(rules, InsightRules::standard());
        assert_eq!(rules.energy_metric, EnergyMetric::PerRecord);
        assert_eq!(rules.energy_threshold, 50.0);
        assert_eq!(rules.efficiency_threshold, 5.0);
        assert_eq!(rules.anomaly_threshold, 10);
        assert_eq!(rules.temperature_threshold, 50.0);
        assert_eq!(rules.vibration_threshold, 15.0);
        assert_eq!(rules.downtime_threshold, 100.0);
        assert!(!rules.critical_status_check);
        assert_eq!(rules.power_factor_threshold, None);
        assert_eq!(rules.summary_kind, InsightKind::Info);
    }

    #[test]
    fn test_normalized_thresholds() {
        let rules = InsightRules::preset(RulePreset::Normalized);
        assert_eq!(rules.energy_metric, EnergyMetric::PerUnit);
        assert_eq!(rules.energy_threshold, 10.0);
        assert_eq!(rules.efficiency_threshold, 0.85);
        assert_eq!(rules.anomaly_threshold, 5);
        assert!(rules.critical_status_check);
        assert_eq!(rules.power_factor_threshold, Some(3.0));
        assert_eq!(rules.summary_kind, InsightKind::Success);
    }

    #[test]
    fn test_format_efficiency() {
        assert_eq!(InsightRules::standard().format_efficiency(4.0), "4.00");
        assert_eq!(InsightRules::normalized().format_efficiency(0.8123), "81.2%");
    }

    #[test]
    fn test_overrides_from_config() {
        let config = RulesConfig {
            preset: RulePreset::Standard,
            downtime_threshold: Some(60.0),
            anomaly_threshold: Some(3),
            ..RulesConfig::default()
        };
        let rules = InsightRules::from(&config);
        assert_eq!(rules.downtime_threshold, 60.0);
        assert_eq!(rules.anomaly_threshold, 3);
        assert_eq!(rules.energy_threshold, 50.0);
    }
}
