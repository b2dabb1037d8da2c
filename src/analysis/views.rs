//! View models for the home summary, line dashboard and machine health.
//!
//! Aggregates are always computed over the full selection; only the chart
//! series go through [`downsample`].

use super::aggregator::{
    anomalies, average_efficiency, average_temperature, average_vibration, critical_rows,
    downsample, filter_by_line, filter_by_machine, line_comparison, total_co2, total_cost,
    total_downtime, total_energy, total_production, LineComparison,
};
use crate::models::{MachineStatus, Record};
use serde::Serialize;
use std::fmt;

/// Whole-dataset KPIs shown on the landing view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeSummary {
    pub record_count: usize,
    pub total_energy: f64,
    pub total_production: f64,
    /// 0.0 when the dataset is empty.
    pub average_efficiency: f64,
    pub total_co2: f64,
    pub total_cost: f64,
    pub anomaly_count: usize,
    pub critical_rows: usize,
    pub line_comparison: Vec<LineComparison>,
}

pub fn home_summary<R: AsRef<Record>>(rows: &[R]) -> HomeSummary {
    HomeSummary {
        record_count: rows.len(),
        total_energy: total_energy(rows),
        total_production: total_production(rows),
        average_efficiency: average_efficiency(rows).unwrap_or(0.0),
        total_co2: total_co2(rows),
        total_cost: total_cost(rows),
        anomaly_count: anomalies(rows).len(),
        critical_rows: critical_rows(rows).len(),
        line_comparison: line_comparison(rows),
    }
}

/// Filter applied on the line dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum LineSelection {
    #[default]
    All,
    Line(String),
}

impl From<Option<String>> for LineSelection {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(line) => LineSelection::Line(line),
            None => LineSelection::All,
        }
    }
}

impl fmt::Display for LineSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineSelection::All => write!(f, "All Lines"),
            LineSelection::Line(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStats {
    pub record_count: usize,
    pub total_energy: f64,
    pub total_production: f64,
    pub average_efficiency: f64,
    pub anomaly_count: usize,
}

/// One point of the energy-versus-output series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyPoint {
    /// 1-based position within the sampled series.
    pub index: usize,
    pub energy: f64,
    pub production: f64,
    pub efficiency: f64,
    pub is_anomaly: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineDashboard {
    pub selection: LineSelection,
    pub stats: LineStats,
    pub energy_series: Vec<EnergyPoint>,
    /// Per-line totals, only filled when every line is selected.
    pub comparison: Vec<LineComparison>,
}

pub fn line_dashboard<R: AsRef<Record>>(
    rows: &[R],
    selection: &LineSelection,
    target_points: usize,
) -> LineDashboard {
    let selected: Vec<&Record> = match selection {
        LineSelection::All => rows.iter().map(|r| r.as_ref()).collect(),
        LineSelection::Line(name) => filter_by_line(rows, name),
    };

    let stats = LineStats {
        record_count: selected.len(),
        total_energy: total_energy(&selected),
        total_production: total_production(&selected),
        average_efficiency: average_efficiency(&selected).unwrap_or(0.0),
        anomaly_count: anomalies(&selected).len(),
    };

    let energy_series = downsample(&selected, target_points)
        .into_iter()
        .enumerate()
        .map(|(i, r)| EnergyPoint {
            index: i + 1,
            energy: r.energy_consumed_kwh,
            production: r.units_produced,
            efficiency: r.efficiency_score,
            is_anomaly: r.energy_anomaly_flag,
        })
        .collect();

    let comparison = match selection {
        LineSelection::All => line_comparison(rows),
        LineSelection::Line(_) => Vec::new(),
    };

    LineDashboard {
        selection: selection.clone(),
        stats,
        energy_series,
        comparison,
    }
}

/// Health metrics of one machine over all of its records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineHealth {
    pub machine_id: String,
    pub record_count: usize,
    pub avg_temperature: f64,
    pub avg_vibration: f64,
    pub avg_efficiency: f64,
    pub total_downtime: f64,
}

impl MachineHealth {
    /// Compute health from a machine's rows; `None` when there are none.
    pub fn from_rows<R: AsRef<Record>>(machine_id: &str, rows: &[R]) -> Option<Self> {
        Some(Self {
            machine_id: machine_id.to_string(),
            record_count: rows.len(),
            avg_temperature: average_temperature(rows).ok()?,
            avg_vibration: average_vibration(rows).ok()?,
            avg_efficiency: average_efficiency(rows).ok()?,
            total_downtime: total_downtime(rows),
        })
    }
}

pub fn machine_health<R: AsRef<Record>>(rows: &[R], machine_id: &str) -> Option<MachineHealth> {
    MachineHealth::from_rows(machine_id, &filter_by_machine(rows, machine_id))
}

/// Descriptive fields taken from a machine's most recent record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineInfo {
    pub machine_type: String,
    pub status: MachineStatus,
    pub maintenance_status: String,
    pub location: String,
    pub line_name: String,
    pub rated_power_kw: f64,
    pub operator_name: String,
}

impl From<&Record> for MachineInfo {
    fn from(r: &Record) -> Self {
        Self {
            machine_type: r.machine_type.clone(),
            status: r.status.clone(),
            maintenance_status: r.maintenance_status.clone(),
            location: r.location.clone(),
            line_name: r.line_name.clone(),
            rated_power_kw: r.rated_power_kw,
            operator_name: r.operator_name.clone(),
        }
    }
}

/// Colour band of a vibration reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VibrationBand {
    Normal,
    Elevated,
    Severe,
}

impl VibrationBand {
    pub fn classify(level: f64) -> Self {
        if level > 20.0 {
            VibrationBand::Severe
        } else if level > 10.0 {
            VibrationBand::Elevated
        } else {
            VibrationBand::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperaturePoint {
    pub index: usize,
    pub machine: f64,
    pub ambient: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VibrationPoint {
    pub index: usize,
    pub level: f64,
    pub band: VibrationBand,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuePoint {
    pub index: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineView {
    pub info: MachineInfo,
    pub health: MachineHealth,
    pub temperature_series: Vec<TemperaturePoint>,
    pub vibration_series: Vec<VibrationPoint>,
    pub efficiency_series: Vec<ValuePoint>,
    pub downtime_series: Vec<ValuePoint>,
}

fn series<T>(sampled: &[&Record], point: impl Fn(usize, &Record) -> T) -> Vec<T> {
    sampled
        .iter()
        .enumerate()
        .map(|(i, r)| point(i + 1, *r))
        .collect()
}

/// Everything the machine health view shows; `None` for an unknown machine.
pub fn machine_view<R: AsRef<Record>>(
    rows: &[R],
    machine_id: &str,
    target_points: usize,
) -> Option<MachineView> {
    let machine_rows = filter_by_machine(rows, machine_id);
    let latest = machine_rows.last()?;
    let health = MachineHealth::from_rows(machine_id, &machine_rows)?;

    let sampled: Vec<&Record> = downsample(&machine_rows, target_points)
        .into_iter()
        .copied()
        .collect();

    Some(MachineView {
        info: MachineInfo::from(*latest),
        health,
        temperature_series: series(&sampled, |index, r| TemperaturePoint {
            index,
            machine: r.machine_temperature,
            ambient: r.ambient_temperature,
        }),
        vibration_series: series(&sampled, |index, r| VibrationPoint {
            index,
            level: r.vibration_level,
            band: VibrationBand::classify(r.vibration_level),
        }),
        efficiency_series: series(&sampled, |index, r| ValuePoint {
            index,
            value: r.efficiency_score,
        }),
        downtime_series: series(&sampled, |index, r| ValuePoint {
            index,
            value: r.downtime_minutes,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn machine_row(line: &str, machine: &str, temp: f64, vibration: f64, downtime: f64) -> Record {
        Record {
            line_name: line.to_string(),
            machine_id: machine.to_string(),
            machine_temperature: temp,
            ambient_temperature: 22.0,
            vibration_level: vibration,
            downtime_minutes: downtime,
            efficiency_score: 6.0,
            energy_consumed_kwh: 10.0,
            units_produced: 2.0,
            ..Record::default()
        }
    }

    #[test]
    fn test_home_summary() {
        let mut rows = vec![
            machine_row("A", "M-1", 40.0, 5.0, 0.0),
            machine_row("B", "M-2", 60.0, 25.0, 10.0),
        ];
        rows[0].energy_anomaly_flag = true;
        rows[1].status = MachineStatus::Critical;
        rows[1].co2_emission_kg = 3.5;

        let summary = home_summary(&rows);
        assert_eq!(summary.record_count, 2);
        assert_abs_diff_eq!(summary.total_energy, 20.0);
        assert_abs_diff_eq!(summary.total_co2, 3.5);
        assert_eq!(summary.anomaly_count, 1);
        assert_eq!(summary.critical_rows, 1);
        assert_eq!(summary.line_comparison.len(), 2);
    }

    #[test]
    fn test_home_summary_empty() {
        let summary = home_summary::<Record>(&[]);
        assert_eq!(summary.record_count, 0);
        assert_eq!(summary.average_efficiency, 0.0);
        assert!(summary.line_comparison.is_empty());
    }

    #[test]
    fn test_line_dashboard_all_lines() {
        let rows: Vec<Record> = (0..450)
            .map(|i| machine_row(if i % 2 == 0 { "A" } else { "B" }, "M-1", 40.0, 5.0, 0.0))
            .collect();

        let dashboard = line_dashboard(&rows, &LineSelection::All, 200);
        assert_eq!(dashboard.stats.record_count, 450);
        assert_abs_diff_eq!(dashboard.stats.total_energy, 4500.0);
        // step = 450 / 200 = 2
        assert_eq!(dashboard.energy_series.len(), 225);
        assert_eq!(dashboard.energy_series[0].index, 1);
        assert_eq!(dashboard.comparison.len(), 2);
    }

    #[test]
    fn test_line_dashboard_single_line() {
        let mut rows = vec![
            machine_row("A", "M-1", 40.0, 5.0, 0.0),
            machine_row("B", "M-2", 40.0, 5.0, 0.0),
            machine_row("A", "M-1", 40.0, 5.0, 0.0),
        ];
        rows[2].energy_anomaly_flag = true;

        let selection = LineSelection::from(Some("A".to_string()));
        let dashboard = line_dashboard(&rows, &selection, 200);
        assert_eq!(dashboard.stats.record_count, 2);
        assert_eq!(dashboard.stats.anomaly_count, 1);
        assert!(dashboard.comparison.is_empty());
        assert!(dashboard.energy_series[1].is_anomaly);
        assert_eq!(selection.to_string(), "A");
    }

    #[test]
    fn test_line_dashboard_unknown_line_is_empty() {
        let rows = vec![machine_row("A", "M-1", 40.0, 5.0, 0.0)];
        let dashboard = line_dashboard(&rows, &LineSelection::Line("Z".to_string()), 200);
        assert_eq!(dashboard.stats.record_count, 0);
        assert_eq!(dashboard.stats.average_efficiency, 0.0);
        assert!(dashboard.energy_series.is_empty());
    }

    #[test]
    fn test_machine_health() {
        let rows = vec![
            machine_row("A", "M-1", 40.0, 10.0, 30.0),
            machine_row("A", "M-2", 90.0, 10.0, 30.0),
            machine_row("A", "M-1", 60.0, 20.0, 45.0),
        ];

        let health = machine_health(&rows, "M-1").unwrap();
        assert_eq!(health.record_count, 2);
        assert_abs_diff_eq!(health.avg_temperature, 50.0);
        assert_abs_diff_eq!(health.avg_vibration, 15.0);
        assert_abs_diff_eq!(health.total_downtime, 75.0);

        assert!(machine_health(&rows, "M-9").is_none());
    }

    #[test]
    fn test_machine_view_uses_latest_record() {
        let mut rows = vec![
            machine_row("A", "M-1", 40.0, 5.0, 0.0),
            machine_row("A", "M-1", 41.0, 12.0, 0.0),
            machine_row("A", "M-1", 42.0, 25.0, 0.0),
        ];
        rows[0].status = MachineStatus::Warning;
        rows[2].status = MachineStatus::Critical;
        rows[2].operator_name = "Dana".to_string();

        let view = machine_view(&rows, "M-1", 150).unwrap();
        assert_eq!(view.info.status, MachineStatus::Critical);
        assert_eq!(view.info.operator_name, "Dana");
        assert_eq!(view.temperature_series.len(), 3);
        assert_eq!(view.vibration_series[0].band, VibrationBand::Normal);
        assert_eq!(view.vibration_series[1].band, VibrationBand::Elevated);
        assert_eq!(view.vibration_series[2].band, VibrationBand::Severe);
        assert_eq!(view.efficiency_series[2].index, 3);

        assert!(machine_view(&rows, "nope", 150).is_none());
    }

    #[test]
    fn test_vibration_band_boundaries() {
        assert_eq!(VibrationBand::classify(10.0), VibrationBand::Normal);
        assert_eq!(VibrationBand::classify(10.1), VibrationBand::Elevated);
        assert_eq!(VibrationBand::classify(20.0), VibrationBand::Elevated);
        assert_eq!(VibrationBand::classify(20.5), VibrationBand::Severe);
    }
}
