//! Delimited (CSV) and JSON report output.
//!
//! The CSV export is a sequence of labelled sections separated by blank
//! lines. Each section is written by its own `csv::Writer` so quoting is
//! handled by the csv crate.

use super::{LinePerformance, Report};
use anyhow::{bail, Context, Result};
use chrono::SecondsFormat;
use csv::{ReaderBuilder, StringRecord, Terminator, Writer, WriterBuilder};
use std::path::Path;

const SUMMARY_METRICS: &str = "SUMMARY METRICS";
const LINE_PERFORMANCE: &str = "LINE PERFORMANCE";
const TOP_SOURCES: &str = "TOP INEFFICIENCY SOURCES";
const RECOMMENDATIONS: &str = "RECOMMENDATIONS";

fn section_writer() -> Writer<Vec<u8>> {
    WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV section: {}", e))?;
    String::from_utf8(bytes).context("CSV section is not valid UTF-8")
}

fn header_section(report: &Report) -> Result<String> {
    let mut w = section_writer();
    w.write_record([report.title.as_str()])?;
    let generated = report.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    w.write_record(["Generated:", generated.as_str()])?;
    finish(w)
}

fn summary_section(report: &Report) -> Result<String> {
    let s = &report.summary;
    let mut w = section_writer();
    w.write_record([SUMMARY_METRICS])?;

    let metrics = [
        ("Total Energy Consumed (kWh)", format!("{:.2}", s.total_energy)),
        ("Total Units Produced", format!("{:.2}", s.total_production)),
        ("Average Efficiency Score", format!("{:.2}", s.average_efficiency)),
        ("Energy per Unit (kWh/unit)", format!("{:.4}", s.energy_per_unit)),
        ("Total CO2 Emissions (kg)", format!("{:.2}", s.total_co2)),
        ("Total Energy Cost (USD)", format!("{:.2}", s.total_cost)),
        ("Energy Anomalies Detected", s.anomaly_count.to_string()),
    ];
    for (label, value) in &metrics {
        w.write_record([*label, value.as_str()])?;
    }
    finish(w)
}

fn line_section(report: &Report) -> Result<String> {
    let mut w = section_writer();
    w.write_record([LINE_PERFORMANCE])?;
    w.write_record([
        "Line Name",
        "Total Energy (kWh)",
        "Total Production",
        "Avg Efficiency",
        "Energy per Unit",
    ])?;
    for line in &report.line_performance {
        w.write_record([
            line.line.clone(),
            format!("{:.2}", line.total_energy),
            format!("{:.2}", line.total_production),
            format!("{:.2}", line.avg_efficiency),
            format!("{:.4}", line.energy_per_unit),
        ])?;
    }
    finish(w)
}

fn sources_section(report: &Report) -> Result<String> {
    let mut w = section_writer();
    w.write_record([TOP_SOURCES])?;
    w.write_record(["Source", "Issue", "Metric", "Recommendation"])?;
    for source in &report.inefficiency_sources {
        w.write_record([
            &source.source,
            &source.issue,
            &source.metric,
            &source.recommendation,
        ])?;
    }
    finish(w)
}

fn recommendations_section(report: &Report) -> Result<String> {
    let mut w = section_writer();
    w.write_record([RECOMMENDATIONS])?;
    w.write_record(["Title", "Description", "Priority", "Potential Savings"])?;
    for rec in &report.recommendations {
        w.write_record([
            rec.title.clone(),
            rec.description.clone(),
            rec.priority.to_string(),
            rec.potential_savings.clone(),
        ])?;
    }
    finish(w)
}

/// Render the report as the sectioned CSV export.
pub fn to_csv(report: &Report) -> Result<String> {
    let sections = [
        header_section(report)?,
        summary_section(report)?,
        line_section(report)?,
        sources_section(report)?,
        recommendations_section(report)?,
    ];
    Ok(sections.join("\n"))
}

/// Write the CSV export to a file.
pub fn write_csv_report(report: &Report, path: &Path) -> Result<()> {
    let content = to_csv(report)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

fn number(row: &StringRecord, index: usize, name: &str) -> Result<f64> {
    let raw = row
        .get(index)
        .with_context(|| format!("Missing '{}' column", name))?;
    raw.trim()
        .parse()
        .with_context(|| format!("Invalid {} value '{}'", name, raw))
}

/// Read the LINE PERFORMANCE section of a CSV export back into rows.
pub fn parse_line_performance(text: &str) -> Result<Vec<LinePerformance>> {
    let section: Vec<&str> = text
        .lines()
        .skip_while(|l| l.trim() != LINE_PERFORMANCE)
        .skip(1)
        .take_while(|l| !l.trim().is_empty())
        .collect();

    if section.is_empty() {
        bail!("No {} section found", LINE_PERFORMANCE);
    }

    let body = section.join("\n");
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body.as_bytes());

    reader
        .records()
        .map(|row| {
            let row = row.context("Malformed line performance row")?;
            Ok(LinePerformance {
                line: row.get(0).unwrap_or_default().to_string(),
                total_energy: number(&row, 1, "total energy")?,
                total_production: number(&row, 2, "total production")?,
                avg_efficiency: number(&row, 3, "average efficiency")?,
                energy_per_unit: number(&row, 4, "energy per unit")?,
            })
        })
        .collect()
}
