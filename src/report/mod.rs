//! Efficiency report: the summary, per-line performance, ranked
//! inefficiency sources and fixed improvement recommendations, plus its
//! delimited export.

pub mod builder;
pub mod export;

pub use builder::{build_report, build_report_at, ReportOptions, DEFAULT_REPORT_TITLE};
pub use export::{generate_json_report, parse_line_performance, to_csv, write_csv_report};

use crate::models::Priority;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whole-dataset scalars. Undefined ratios are 0.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_energy: f64,
    pub total_production: f64,
    pub average_efficiency: f64,
    pub energy_per_unit: f64,
    pub total_co2: f64,
    pub total_cost: f64,
    pub anomaly_count: usize,
}

/// One row of the line performance table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinePerformance {
    pub line: String,
    pub total_energy: f64,
    pub total_production: f64,
    pub avg_efficiency: f64,
    /// 0.0 when the line produced nothing.
    pub energy_per_unit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Line,
    Machine,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Line => write!(f, "line"),
            SourceKind::Machine => write!(f, "machine"),
        }
    }
}

/// A ranked entry of the top inefficiency list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InefficiencySource {
    pub source: String,
    pub kind: SourceKind,
    pub issue: String,
    pub metric: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub potential_savings: String,
}

/// The complete efficiency report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    /// Ascending by line name.
    pub line_performance: Vec<LinePerformance>,
    pub inefficiency_sources: Vec<InefficiencySource>,
    pub recommendations: Vec<Recommendation>,
}
