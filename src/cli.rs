//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::insights::RulePreset;
use crate::models::InsightKind;
use clap::Parser;
use std::path::PathBuf;

/// EnergyLens - energy and production analytics for manufacturing lines
///
/// Load a line dataset (CSV or JSON rows), inspect KPIs per line or
/// machine, derive rule-based insights and export an efficiency report.
///
/// Examples:
///   energylens --data plant.csv
///   energylens --data plant.csv --view line --line "Line A"
///   energylens --data plant.csv --view machine --machine M-101 --format json
///   energylens --data plant.csv --view report --output report.csv
///   energylens --data plant.csv --view insights --fail-on critical
///   energylens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Dataset file to load (.csv or .json)
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub data: Option<PathBuf>,

    /// View to render
    #[arg(long, default_value = "home", value_name = "VIEW")]
    pub view: View,

    /// Production line shown by the line view (all lines when omitted)
    #[arg(long, value_name = "NAME")]
    pub line: Option<String>,

    /// Machine shown by the machine view (first machine when omitted)
    #[arg(long, value_name = "ID")]
    pub machine: Option<String>,

    /// Insight rule preset
    ///
    /// Overrides the preset from the config file.
    #[arg(long, value_name = "PRESET")]
    pub rules: Option<RulePreset>,

    /// Output format for the printed view
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path of the CSV export written by the report view
    ///
    /// Default: from config or energy_report.csv
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .energylens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Fail if insights at or above this kind are derived
    ///
    /// Useful for scheduled checks. Exit code 2 when threshold is reached.
    /// Values: warning, critical
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<FailOnLevel>,

    /// Generate a default .energylens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Dashboard view to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum View {
    /// Whole-dataset KPIs (default)
    #[default]
    Home,
    /// Line dashboard
    Line,
    /// Machine health
    Machine,
    /// Ordered insight list
    Insights,
    /// Efficiency report and CSV export
    Report,
}

/// Output format for the printed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default)
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Insight kind threshold for --fail-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum FailOnLevel {
    Warning,
    Critical,
}

impl FailOnLevel {
    pub fn kind(self) -> InsightKind {
        match self {
            FailOnLevel::Warning => InsightKind::Warning,
            FailOnLevel::Critical => InsightKind::Critical,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.data.is_none() {
            return Err("A dataset is required (--data FILE)".to_string());
        }

        if self.line.is_some() && self.view != View::Line {
            return Err("--line only applies to --view line".to_string());
        }

        if self.machine.is_some() && self.view != View::Machine {
            return Err("--machine only applies to --view machine".to_string());
        }

        if self.output.is_some() && self.view != View::Report {
            return Err("--output only applies to --view report".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `[general] verbose` from the config file;
    /// `--quiet` still wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
