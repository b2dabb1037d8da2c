//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.energylens.toml` files.

use crate::insights::{InsightRules, RulePreset};
use crate::report::{ReportOptions, DEFAULT_REPORT_TITLE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".energylens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Insight rule preset and threshold overrides.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Chart series sizes.
    #[serde(default)]
    pub charts: ChartsConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default path of the CSV export.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "energy_report.csv".to_string()
}

/// Rule preset plus optional per-threshold overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub preset: RulePreset,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_threshold: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency_threshold: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_threshold: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_threshold: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibration_threshold: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downtime_threshold: Option<f64>,
}

/// Target point counts for downsampled chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartsConfig {
    #[serde(default = "default_line_points")]
    pub line_points: usize,

    #[serde(default = "default_machine_points")]
    pub machine_points: usize,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            line_points: default_line_points(),
            machine_points: default_machine_points(),
        }
    }
}

fn default_line_points() -> usize {
    200
}

fn default_machine_points() -> usize {
    150
}

/// Report generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Title written on the first line of the export.
    #[serde(default = "default_title")]
    pub title: String,

    /// Number of top inefficiency sources.
    #[serde(default = "default_top_sources")]
    pub top_sources: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            top_sources: default_top_sources(),
        }
    }
}

fn default_title() -> String {
    DEFAULT_REPORT_TITLE.to_string()
}

fn default_top_sources() -> usize {
    5
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.energylens.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if let Some(preset) = args.rules {
            self.rules.preset = preset;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Thresholds for the configured preset with overrides applied.
    pub fn insight_rules(&self) -> InsightRules {
        InsightRules::from(&self.rules)
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            title: self.report.title.clone(),
            top_sources: self.report.top_sources,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output, "energy_report.csv");
        assert_eq!(config.rules.preset, RulePreset::Standard);
        assert_eq!(config.charts.line_points, 200);
        assert_eq!(config.charts.machine_points, 150);
        assert_eq!(config.report.top_sources, 5);
        assert_eq!(config.report.title, DEFAULT_REPORT_TITLE);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "plant_report.csv"
verbose = true

[rules]
preset = "normalized"
anomaly_threshold = 2
downtime_threshold = 45.0

[charts]
line_points = 50

[report]
title = "PLANT 7 ENERGY REPORT"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "plant_report.csv");
        assert!(config.general.verbose);
        assert_eq!(config.rules.preset, RulePreset::Normalized);
        assert_eq!(config.charts.line_points, 50);
        assert_eq!(config.charts.machine_points, 150);
        assert_eq!(config.report.title, "PLANT 7 ENERGY REPORT");
        assert_eq!(config.report.top_sources, 5);

        let rules = config.insight_rules();
        assert_eq!(rules.anomaly_threshold, 2);
        assert_eq!(rules.downtime_threshold, 45.0);
        assert_eq!(rules.energy_threshold, 10.0);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[rules]"));
        assert!(toml_str.contains("preset = \"standard\""));
        assert!(toml_str.contains("[charts]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[report]\ntop_sources = 3\n",
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.report_options().top_sources, 3);

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[report\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let args = Args::parse_from([
            "energylens",
            "--data",
            "plant.csv",
            "--rules",
            "normalized",
            "--output",
            "out.csv",
            "-v",
        ]);

        let mut config = Config::default();
        config.merge_with_args(&args);
        assert_eq!(config.rules.preset, RulePreset::Normalized);
        assert_eq!(config.general.output, "out.csv");
        assert!(config.general.verbose);
    }

    #[test]
    fn test_merge_keeps_file_values_without_flags() {
        let args = Args::parse_from(["energylens", "--data", "plant.csv"]);
        let mut config = Config::default();
        config.rules.preset = RulePreset::Normalized;
        config.general.output = "kept.csv".to_string();

        config.merge_with_args(&args);
        assert_eq!(config.rules.preset, RulePreset::Normalized);
        assert_eq!(config.general.output, "kept.csv");
    }
}
