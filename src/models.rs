//! Data models for the energy analytics engine.
//!
//! This module contains the core data structures shared by the loader,
//! the aggregation engine, the insight rules and the report builder.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Recognized source columns.
///
/// Names are matched exactly (case-sensitive) against the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    LineName,
    MachineId,
    MachineType,
    Location,
    OperatorName,
    Status,
    MaintenanceStatus,
    EnergyConsumedKwh,
    UnitsProduced,
    EfficiencyScore,
    Co2EmissionKg,
    EnergyCostUsd,
    MachineTemperature,
    AmbientTemperature,
    VibrationLevel,
    DowntimeMinutes,
    RatedPowerKw,
    PowerFactor,
    EnergyAnomalyFlag,
}

impl Column {
    pub const ALL: [Column; 19] = [
        Column::LineName,
        Column::MachineId,
        Column::MachineType,
        Column::Location,
        Column::OperatorName,
        Column::Status,
        Column::MaintenanceStatus,
        Column::EnergyConsumedKwh,
        Column::UnitsProduced,
        Column::EfficiencyScore,
        Column::Co2EmissionKg,
        Column::EnergyCostUsd,
        Column::MachineTemperature,
        Column::AmbientTemperature,
        Column::VibrationLevel,
        Column::DowntimeMinutes,
        Column::RatedPowerKw,
        Column::PowerFactor,
        Column::EnergyAnomalyFlag,
    ];

    /// Header name as it appears in the source sheet.
    pub fn header(&self) -> &'static str {
        match self {
            Column::LineName => "Line_Name",
            Column::MachineId => "Machine_ID",
            Column::MachineType => "Machine_Type",
            Column::Location => "Location",
            Column::OperatorName => "Operator_Name",
            Column::Status => "Status",
            Column::MaintenanceStatus => "Maintenance_Status",
            Column::EnergyConsumedKwh => "Energy_Consumed_kWh",
            Column::UnitsProduced => "Units_Produced",
            Column::EfficiencyScore => "Efficiency_Score",
            Column::Co2EmissionKg => "CO2_Emission_kg",
            Column::EnergyCostUsd => "Energy_Cost_USD",
            Column::MachineTemperature => "Machine_Temperature",
            Column::AmbientTemperature => "Ambient_Temperature",
            Column::VibrationLevel => "Vibration_Level",
            Column::DowntimeMinutes => "Downtime_Minutes",
            Column::RatedPowerKw => "Rated_Power_kW",
            Column::PowerFactor => "Power_Factor",
            Column::EnergyAnomalyFlag => "Energy_Anomaly_Flag",
        }
    }

    /// Look up a column by its exact header name.
    pub fn from_header(name: &str) -> Option<Column> {
        Column::ALL.iter().copied().find(|c| c.header() == name)
    }

    /// Whether the column holds a floating point measurement.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Column::EnergyConsumedKwh
                | Column::UnitsProduced
                | Column::EfficiencyScore
                | Column::Co2EmissionKg
                | Column::EnergyCostUsd
                | Column::MachineTemperature
                | Column::AmbientTemperature
                | Column::VibrationLevel
                | Column::DowntimeMinutes
                | Column::RatedPowerKw
                | Column::PowerFactor
        )
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Operating status reported for a machine on one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MachineStatus {
    #[default]
    Normal,
    Warning,
    Critical,
    /// Any value outside the three known states (including an empty cell).
    Unknown(String),
}

impl MachineStatus {
    /// Parse a status cell. Matching is exact, like the column names.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "Normal" => MachineStatus::Normal,
            "Warning" => MachineStatus::Warning,
            "Critical" => MachineStatus::Critical,
            other => MachineStatus::Unknown(other.to_string()),
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, MachineStatus::Critical)
    }
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineStatus::Normal => write!(f, "Normal"),
            MachineStatus::Warning => write!(f, "Warning"),
            MachineStatus::Critical => write!(f, "Critical"),
            MachineStatus::Unknown(s) if s.is_empty() => write!(f, "N/A"),
            MachineStatus::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// One observation row of the source sheet.
///
/// Identity is positional; nothing here acts as a key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub line_name: String,
    pub machine_id: String,
    pub machine_type: String,
    pub location: String,
    pub operator_name: String,
    pub status: MachineStatus,
    pub maintenance_status: String,
    pub energy_consumed_kwh: f64,
    pub units_produced: f64,
    pub efficiency_score: f64,
    pub co2_emission_kg: f64,
    pub energy_cost_usd: f64,
    pub machine_temperature: f64,
    pub ambient_temperature: f64,
    pub vibration_level: f64,
    pub downtime_minutes: f64,
    pub rated_power_kw: f64,
    pub power_factor: f64,
    pub energy_anomaly_flag: bool,
}

impl AsRef<Record> for Record {
    fn as_ref(&self) -> &Record {
        self
    }
}

/// Kind of a derived insight, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Success,
    Info,
    Warning,
    Critical,
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsightKind::Success => write!(f, "success"),
            InsightKind::Info => write!(f, "info"),
            InsightKind::Warning => write!(f, "warning"),
            InsightKind::Critical => write!(f, "critical"),
        }
    }
}

impl InsightKind {
    /// Returns an emoji representation of the kind.
    pub fn emoji(&self) -> &'static str {
        match self {
            InsightKind::Success => "✅",
            InsightKind::Info => "ℹ️",
            InsightKind::Warning => "⚠️",
            InsightKind::Critical => "🔴",
        }
    }
}

/// Business impact attached to an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Impact {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Impact::Low => write!(f, "Low"),
            Impact::Medium => write!(f, "Medium"),
            Impact::High => write!(f, "High"),
            Impact::Critical => write!(f, "Critical"),
        }
    }
}

impl Impact {
    /// Returns an emoji representation of the impact.
    pub fn emoji(&self) -> &'static str {
        match self {
            Impact::Low => "🟢",
            Impact::Medium => "🟡",
            Impact::High => "🟠",
            Impact::Critical => "🔴",
        }
    }
}

/// Priority of a report recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
        }
    }
}

/// Which check produced an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightRule {
    HighEnergy,
    LowEfficiency,
    AnomalyCount,
    CriticalStatus,
    HighTemperature,
    HighVibration,
    HighDowntime,
    PowerFactor,
    EnvironmentalSummary,
}

/// A derived, human-readable observation with a recommended action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// Severity of the observation.
    #[serde(rename = "type")]
    pub kind: InsightKind,
    /// Check that produced it.
    pub rule: InsightRule,
    /// Line or machine the insight is about; `None` for whole-dataset items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// The computed value that was compared with the threshold.
    pub metric: f64,
    pub title: String,
    pub description: String,
    pub impact: Impact,
    pub recommendation: String,
}
