//! Record aggregation and grouping.
//!
//! Every function here is pure: it takes a slice of records (owned or
//! borrowed, see [`AsRef<Record>`]) and returns a value without touching
//! any shared state. Means and ratios return [`AggregateError`] instead
//! of producing NaN when their denominator is zero.

use crate::error::AggregateError;
use crate::models::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

fn sum_by<R: AsRef<Record>>(rows: &[R], field: impl Fn(&Record) -> f64) -> f64 {
    rows.iter().fold(0.0, |acc, r| acc + field(r.as_ref()))
}

fn mean_by<R: AsRef<Record>>(
    rows: &[R],
    what: &'static str,
    field: impl Fn(&Record) -> f64,
) -> Result<f64, AggregateError> {
    if rows.is_empty() {
        return Err(AggregateError::undefined(what));
    }
    Ok(sum_by(rows, field) / rows.len() as f64)
}

/// Sum of energy consumed (kWh).
pub fn total_energy<R: AsRef<Record>>(rows: &[R]) -> f64 {
    sum_by(rows, |r| r.energy_consumed_kwh)
}

/// Sum of units produced.
pub fn total_production<R: AsRef<Record>>(rows: &[R]) -> f64 {
    sum_by(rows, |r| r.units_produced)
}

/// Arithmetic mean of the efficiency score.
pub fn average_efficiency<R: AsRef<Record>>(rows: &[R]) -> Result<f64, AggregateError> {
    mean_by(rows, "average efficiency", |r| r.efficiency_score)
}

/// Mean energy consumed per record.
pub fn average_energy<R: AsRef<Record>>(rows: &[R]) -> Result<f64, AggregateError> {
    mean_by(rows, "average energy", |r| r.energy_consumed_kwh)
}

/// Sum of CO2 emissions (kg).
pub fn total_co2<R: AsRef<Record>>(rows: &[R]) -> f64 {
    sum_by(rows, |r| r.co2_emission_kg)
}

/// Sum of energy cost (USD).
pub fn total_cost<R: AsRef<Record>>(rows: &[R]) -> f64 {
    sum_by(rows, |r| r.energy_cost_usd)
}

/// Sum of downtime minutes.
pub fn total_downtime<R: AsRef<Record>>(rows: &[R]) -> f64 {
    sum_by(rows, |r| r.downtime_minutes)
}

pub fn average_temperature<R: AsRef<Record>>(rows: &[R]) -> Result<f64, AggregateError> {
    mean_by(rows, "average machine temperature", |r| r.machine_temperature)
}

pub fn average_vibration<R: AsRef<Record>>(rows: &[R]) -> Result<f64, AggregateError> {
    mean_by(rows, "average vibration level", |r| r.vibration_level)
}

pub fn average_power_factor<R: AsRef<Record>>(rows: &[R]) -> Result<f64, AggregateError> {
    mean_by(rows, "average power factor", |r| r.power_factor)
}

/// Mean over rows of each row's own energy/units ratio.
///
/// Rows that produced nothing contribute 0 to the sum but still count in
/// the denominator.
pub fn average_row_energy_per_unit<R: AsRef<Record>>(rows: &[R]) -> Result<f64, AggregateError> {
    mean_by(rows, "average energy per unit", |r| {
        if r.units_produced > 0.0 {
            r.energy_consumed_kwh / r.units_produced
        } else {
            0.0
        }
    })
}

/// Energy divided by production.
pub fn energy_per_unit(energy: f64, production: f64) -> Result<f64, AggregateError> {
    if production == 0.0 {
        return Err(AggregateError::undefined("energy per unit"));
    }
    Ok(energy / production)
}

fn unique_by<R: AsRef<Record>>(rows: &[R], key: impl Fn(&Record) -> &str) -> Vec<String> {
    rows.iter()
        .map(|r| key(r.as_ref()))
        .filter(|k| !k.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

/// Distinct non-empty line names in ascending order.
pub fn unique_lines<R: AsRef<Record>>(rows: &[R]) -> Vec<String> {
    unique_by(rows, |r| r.line_name.as_str())
}

/// Distinct non-empty machine ids in ascending order.
pub fn unique_machines<R: AsRef<Record>>(rows: &[R]) -> Vec<String> {
    unique_by(rows, |r| r.machine_id.as_str())
}

fn filter_rows<'a, R: AsRef<Record>>(
    rows: &'a [R],
    keep: impl Fn(&Record) -> bool,
) -> Vec<&'a Record> {
    rows.iter().map(|r| r.as_ref()).filter(|r| keep(*r)).collect()
}

/// Rows of one production line, in their original order.
pub fn filter_by_line<'a, R: AsRef<Record>>(rows: &'a [R], name: &str) -> Vec<&'a Record> {
    filter_rows(rows, |r| r.line_name == name)
}

/// Rows of one machine, in their original order.
pub fn filter_by_machine<'a, R: AsRef<Record>>(rows: &'a [R], id: &str) -> Vec<&'a Record> {
    filter_rows(rows, |r| r.machine_id == id)
}

/// Rows flagged by the source as energy anomalies.
pub fn anomalies<R: AsRef<Record>>(rows: &[R]) -> Vec<&Record> {
    filter_rows(rows, |r| r.energy_anomaly_flag)
}

/// Rows whose status is `Critical`.
pub fn critical_rows<R: AsRef<Record>>(rows: &[R]) -> Vec<&Record> {
    filter_rows(rows, |r| r.status.is_critical())
}

/// Totals for one production line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineComparison {
    pub line: String,
    pub total_energy: f64,
    pub total_production: f64,
    pub avg_efficiency: f64,
}

/// One entry per line from [`unique_lines`], in the same order.
pub fn line_comparison<R: AsRef<Record>>(rows: &[R]) -> Vec<LineComparison> {
    unique_lines(rows)
        .into_iter()
        .map(|line| {
            let line_rows = filter_by_line(rows, &line);
            LineComparison {
                total_energy: total_energy(&line_rows),
                total_production: total_production(&line_rows),
                // A line listed by unique_lines always has at least one row.
                avg_efficiency: average_efficiency(&line_rows).unwrap_or_default(),
                line,
            }
        })
        .collect()
}

/// Systematic sample for chart series.
///
/// Keeps every `step`-th row starting at index 0, where
/// `step = max(1, len / target_points)`. A target of 0 keeps only the
/// first row. Never use the result for aggregates.
pub fn downsample<T>(rows: &[T], target_points: usize) -> Vec<&T> {
    let step = match target_points {
        0 => rows.len().max(1),
        n => (rows.len() / n).max(1),
    };
    rows.iter().step_by(step).collect()
}
