//! Insight derivation.
//!
//! Applies the thresholds in [`InsightRules`] to per-line and per-machine
//! aggregates and produces an ordered list of [`Insight`] values. The
//! order is fixed so that two runs over the same dataset compare equal:
//! lines in ascending order (energy, efficiency, anomalies, status), then
//! machines in ascending order (temperature, vibration, downtime), then
//! the whole-dataset items with the environmental summary always last.

pub mod rules;

pub use rules::{EfficiencyScale, EnergyMetric, InsightRules, RulePreset};

use crate::analysis::{
    anomalies, average_efficiency, average_energy, average_power_factor,
    average_row_energy_per_unit, critical_rows, filter_by_line, filter_by_machine, total_co2,
    unique_lines, unique_machines, MachineHealth,
};
use crate::format::format_compact;
use crate::models::{Impact, Insight, InsightKind, InsightRule, Record};
use serde::Serialize;
use tracing::debug;

/// One triggered per-machine check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineCheck {
    pub rule: InsightRule,
    pub value: f64,
}

impl MachineCheck {
    /// Short label used in report tables.
    pub fn label(&self) -> &'static str {
        match self.rule {
            InsightRule::HighTemperature => "High Temperature",
            InsightRule::HighVibration => "Excessive Vibration",
            InsightRule::HighDowntime => "High Downtime",
            _ => "Machine Issue",
        }
    }

    /// The measured value with its unit.
    pub fn metric_text(&self) -> String {
        match self.rule {
            InsightRule::HighTemperature => format!("Avg temperature {:.1}°C", self.value),
            InsightRule::HighVibration => format!("Avg vibration {:.1}", self.value),
            InsightRule::HighDowntime => format!("Downtime {:.0} min", self.value),
            _ => format!("{:.2}", self.value),
        }
    }
}

/// A machine with at least one triggered check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineFinding {
    pub health: MachineHealth,
    pub checks: Vec<MachineCheck>,
}

impl MachineFinding {
    pub fn machine_id(&self) -> &str {
        &self.health.machine_id
    }
}

/// Evaluate temperature, vibration and downtime checks, in that order.
pub fn machine_checks(health: &MachineHealth, rules: &InsightRules) -> Vec<MachineCheck> {
    let mut checks = Vec::new();

    if health.avg_temperature > rules.temperature_threshold {
        checks.push(MachineCheck {
            rule: InsightRule::HighTemperature,
            value: health.avg_temperature,
        });
    }
    if health.avg_vibration > rules.vibration_threshold {
        checks.push(MachineCheck {
            rule: InsightRule::HighVibration,
            value: health.avg_vibration,
        });
    }
    if health.total_downtime > rules.downtime_threshold {
        checks.push(MachineCheck {
            rule: InsightRule::HighDowntime,
            value: health.total_downtime,
        });
    }

    checks
}

/// Machines with triggered checks, in ascending machine id order.
pub fn machine_findings<R: AsRef<Record>>(rows: &[R], rules: &InsightRules) -> Vec<MachineFinding> {
    unique_machines(rows)
        .into_iter()
        .filter_map(|id| MachineHealth::from_rows(&id, &filter_by_machine(rows, &id)))
        .filter_map(|health| {
            let checks = machine_checks(&health, rules);
            (!checks.is_empty()).then_some(MachineFinding { health, checks })
        })
        .collect()
}

fn line_insights(line: &str, line_rows: &[&Record], rules: &InsightRules) -> Vec<Insight> {
    let mut insights = Vec::new();

    let energy = match rules.energy_metric {
        EnergyMetric::PerRecord => average_energy(line_rows),
        EnergyMetric::PerUnit => average_row_energy_per_unit(line_rows),
    };
    if let Ok(energy) = energy {
        if energy > rules.energy_threshold {
            let description = match rules.energy_metric {
                EnergyMetric::PerRecord => format!(
                    "{} shows high average energy consumption of {:.2} kWh per record. \
                     Consider optimizing production schedules or reviewing equipment efficiency.",
                    line, energy
                ),
                EnergyMetric::PerUnit => format!(
                    "{} shows high energy per unit output ({:.2} kWh/unit). \
                     Consider recalibrating motors or optimizing production schedules.",
                    line, energy
                ),
            };
            insights.push(Insight {
                kind: InsightKind::Warning,
                rule: InsightRule::HighEnergy,
                subject: Some(line.to_string()),
                metric: energy,
                title: format!("High Energy Consumption - {}", line),
                description,
                impact: Impact::Medium,
                recommendation: "Schedule energy audit and optimize production parameters"
                    .to_string(),
            });
        }
    }

    if let Ok(efficiency) = average_efficiency(line_rows) {
        if efficiency < rules.efficiency_threshold {
            insights.push(Insight {
                kind: InsightKind::Warning,
                rule: InsightRule::LowEfficiency,
                subject: Some(line.to_string()),
                metric: efficiency,
                title: format!("Low Efficiency Score - {}", line),
                description: format!(
                    "{} has efficiency score of {}, which is below optimal levels. \
                     This indicates potential operational inefficiencies.",
                    line,
                    rules.format_efficiency(efficiency)
                ),
                impact: Impact::High,
                recommendation: "Review machine settings and operator training programs"
                    .to_string(),
            });
        }
    }

    let anomaly_count = anomalies(line_rows).len();
    if anomaly_count > rules.anomaly_threshold {
        insights.push(Insight {
            kind: InsightKind::Critical,
            rule: InsightRule::AnomalyCount,
            subject: Some(line.to_string()),
            metric: anomaly_count as f64,
            title: format!("Energy Anomalies Detected - {}", line),
            description: format!(
                "{} energy anomalies detected in {}. Unusual energy patterns may indicate \
                 equipment issues or operational problems.",
                anomaly_count, line
            ),
            impact: Impact::High,
            recommendation: "Investigate anomaly patterns and check equipment status".to_string(),
        });
    }

    if rules.critical_status_check {
        let critical = critical_rows(line_rows).len();
        if critical > 0 {
            insights.push(Insight {
                kind: InsightKind::Critical,
                rule: InsightRule::CriticalStatus,
                subject: Some(line.to_string()),
                metric: critical as f64,
                title: format!("Critical Machine Status - {}", line),
                description: format!(
                    "{} record(s) in {} report critical machine status. \
                     Immediate attention required to prevent production loss.",
                    critical, line
                ),
                impact: Impact::Critical,
                recommendation: "Immediate inspection and maintenance required".to_string(),
            });
        }
    }

    insights
}

fn machine_insight(machine: &str, check: &MachineCheck) -> Insight {
    let (kind, impact, title, description, recommendation) = match check.rule {
        InsightRule::HighTemperature => (
            InsightKind::Warning,
            Impact::Medium,
            format!("High Operating Temperature - {}", machine),
            format!(
                "{} running at {:.1}°C average temperature. \
                 Elevated temperatures may reduce equipment lifespan.",
                machine, check.value
            ),
            "Check cooling systems and ensure proper ventilation",
        ),
        InsightRule::HighVibration => (
            InsightKind::Warning,
            Impact::Medium,
            format!("Excessive Vibration - {}", machine),
            format!(
                "{} shows high vibration levels ({:.1} average). \
                 May indicate mechanical wear or misalignment.",
                machine, check.value
            ),
            "Perform vibration analysis and check for loose components",
        ),
        InsightRule::HighDowntime => (
            InsightKind::Critical,
            Impact::High,
            format!("Excessive Downtime - {}", machine),
            format!(
                "{} has {:.0} minutes of downtime. \
                 This significantly impacts production efficiency.",
                machine, check.value
            ),
            "Review maintenance logs and identify root causes",
        ),
        _ => (
            InsightKind::Warning,
            Impact::Medium,
            format!("{} - {}", check.label(), machine),
            format!("{} measured {}.", machine, check.metric_text()),
            "Inspect the machine",
        ),
    };

    Insight {
        kind,
        rule: check.rule,
        subject: Some(machine.to_string()),
        metric: check.value,
        title,
        description,
        impact,
        recommendation: recommendation.to_string(),
    }
}

/// Derive the ordered insight list for a dataset.
pub fn derive_insights<R: AsRef<Record>>(rows: &[R], rules: &InsightRules) -> Vec<Insight> {
    let mut insights = Vec::new();

    for line in unique_lines(rows) {
        let line_rows = filter_by_line(rows, &line);
        insights.extend(line_insights(&line, &line_rows, rules));
    }

    for finding in machine_findings(rows, rules) {
        for check in &finding.checks {
            insights.push(machine_insight(finding.machine_id(), check));
        }
    }

    if let Some(threshold) = rules.power_factor_threshold {
        if let Ok(power_factor) = average_power_factor(rows) {
            if power_factor < threshold {
                insights.push(Insight {
                    kind: InsightKind::Info,
                    rule: InsightRule::PowerFactor,
                    subject: None,
                    metric: power_factor,
                    title: "Power Factor Optimization Opportunity".to_string(),
                    description: format!(
                        "System average power factor is {:.2}. \
                         Improving power factor can reduce energy costs.",
                        power_factor
                    ),
                    impact: Impact::Low,
                    recommendation: "Consider installing power factor correction capacitors"
                        .to_string(),
                });
            }
        }
    }

    let co2 = total_co2(rows);
    insights.push(Insight {
        kind: rules.summary_kind,
        rule: InsightRule::EnvironmentalSummary,
        subject: None,
        metric: co2,
        title: "Environmental Impact Summary".to_string(),
        description: format!(
            "Total CO₂ emissions: {} kg. Implementing energy-saving measures could \
             reduce emissions by 15-20%.",
            format_compact(co2)
        ),
        impact: Impact::Medium,
        recommendation: "Focus on high-consumption periods and implement energy recovery systems"
            .to_string(),
    });

    debug!("Derived {} insights from {} records", insights.len(), rows.len());
    insights
}

/// Counts of derived insights by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InsightSummary {
    pub total: usize,
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
    pub success: usize,
}

impl InsightSummary {
    pub fn from_insights(insights: &[Insight]) -> Self {
        let mut summary = Self {
            total: insights.len(),
            ..Self::default()
        };

        for insight in insights {
            match insight.kind {
                InsightKind::Critical => summary.critical += 1,
                InsightKind::Warning => summary.warning += 1,
                InsightKind::Info => summary.info += 1,
                InsightKind::Success => summary.success += 1,
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MachineStatus;

    fn line_row(line: &str, energy: f64, units: f64, efficiency: f64, anomaly: bool) -> Record {
        Record {
            line_name: line.to_string(),
            energy_consumed_kwh: energy,
            units_produced: units,
            efficiency_score: efficiency,
            energy_anomaly_flag: anomaly,
            ..Record::default()
        }
    }

    fn machine_row(machine: &str, temp: f64, vibration: f64, downtime: f64) -> Record {
        Record {
            machine_id: machine.to_string(),
            machine_temperature: temp,
            vibration_level: vibration,
            downtime_minutes: downtime,
            ..Record::default()
        }
    }

    fn rules_of(insights: &[Insight], subject: &str) -> Vec<InsightRule> {
        insights
            .iter()
            .filter(|i| i.subject.as_deref() == Some(subject))
            .map(|i| i.rule)
            .collect()
    }

    #[test]
    fn test_high_energy_and_low_efficiency_without_anomalies() {
        let rows: Vec<Record> = (0..11).map(|_| line_row("A", 60.0, 1.0, 4.0, false)).collect();
        let insights = derive_insights(&rows, &InsightRules::standard());

        assert_eq!(
            rules_of(&insights, "A"),
            vec![InsightRule::HighEnergy, InsightRule::LowEfficiency]
        );

        let energy = &insights[0];
        assert_eq!(energy.kind, InsightKind::Warning);
        assert_eq!(energy.impact, Impact::Medium);
        assert_eq!(energy.metric, 60.0);
        assert!(energy.description.contains("60.00 kWh per record"));

        let efficiency = &insights[1];
        assert_eq!(efficiency.kind, InsightKind::Warning);
        assert_eq!(efficiency.impact, Impact::High);
        assert_eq!(efficiency.metric, 4.0);
        assert!(efficiency.description.contains("4.00"));

        assert!(!insights.iter().any(|i| i.rule == InsightRule::AnomalyCount));
    }

    #[test]
    fn test_thresholds_are_strict() {
        let rows: Vec<Record> = (0..10).map(|_| line_row("A", 50.0, 1.0, 5.0, true)).collect();
        let insights = derive_insights(&rows, &InsightRules::standard());
        // energy == 50, efficiency == 5.0 and anomalies == 10 never fire
        assert!(rules_of(&insights, "A").is_empty());
        assert_eq!(insights.len(), 1);
    }

    #[test]
    fn test_anomaly_count_above_ten() {
        let rows: Vec<Record> = (0..11).map(|_| line_row("A", 1.0, 1.0, 9.0, true)).collect();
        let insights = derive_insights(&rows, &InsightRules::standard());

        let anomaly = insights
            .iter()
            .find(|i| i.rule == InsightRule::AnomalyCount)
            .unwrap();
        assert_eq!(anomaly.kind, InsightKind::Critical);
        assert_eq!(anomaly.impact, Impact::High);
        assert_eq!(anomaly.metric, 11.0);
        assert!(anomaly.description.starts_with("11 energy anomalies detected in A"));
    }

    #[test]
    fn test_high_downtime_single_critical_insight() {
        let rows: Vec<Record> = (0..11).map(|_| machine_row("M-7", 30.0, 2.0, 10.0)).collect();
        let insights = derive_insights(&rows, &InsightRules::standard());

        let downtime: Vec<&Insight> = insights
            .iter()
            .filter(|i| i.rule == InsightRule::HighDowntime)
            .collect();
        assert_eq!(downtime.len(), 1);
        assert_eq!(downtime[0].kind, InsightKind::Critical);
        assert_eq!(downtime[0].impact, Impact::High);
        assert_eq!(downtime[0].subject.as_deref(), Some("M-7"));
        assert_eq!(downtime[0].metric, 110.0);
        assert!(downtime[0].description.contains("110 minutes"));
    }

    #[test]
    fn test_machine_temperature_and_vibration() {
        let rows = vec![
            machine_row("M-1", 52.0, 16.0, 0.0),
            machine_row("M-1", 50.0, 15.0, 0.0),
            machine_row("M-2", 50.0, 15.0, 100.0),
        ];
        let insights = derive_insights(&rows, &InsightRules::standard());

        assert_eq!(
            rules_of(&insights, "M-1"),
            vec![InsightRule::HighTemperature, InsightRule::HighVibration]
        );
        assert!(rules_of(&insights, "M-2").is_empty());

        let temp = &insights[0];
        assert_eq!(temp.metric, 51.0);
        assert!(temp.description.contains("51.0°C"));
        assert_eq!(insights[1].metric, 15.5);
    }

    #[test]
    fn test_evaluation_order() {
        let mut rows = Vec::new();
        for line in ["B", "A"] {
            for _ in 0..11 {
                let mut r = line_row(line, 60.0, 1.0, 4.0, true);
                r.machine_id = format!("M-{}", line);
                r.machine_temperature = 70.0;
                r.vibration_level = 20.0;
                r.downtime_minutes = 10.0;
                rows.push(r);
            }
        }

        let insights = derive_insights(&rows, &InsightRules::standard());
        let order: Vec<(Option<&str>, InsightRule)> = insights
            .iter()
            .map(|i| (i.subject.as_deref(), i.rule))
            .collect();

        assert_eq!(
            order,
            vec![
                (Some("A"), InsightRule::HighEnergy),
                (Some("A"), InsightRule::LowEfficiency),
                (Some("A"), InsightRule::AnomalyCount),
                (Some("B"), InsightRule::HighEnergy),
                (Some("B"), InsightRule::LowEfficiency),
                (Some("B"), InsightRule::AnomalyCount),
                (Some("M-A"), InsightRule::HighTemperature),
                (Some("M-A"), InsightRule::HighVibration),
                (Some("M-A"), InsightRule::HighDowntime),
                (Some("M-B"), InsightRule::HighTemperature),
                (Some("M-B"), InsightRule::HighVibration),
                (Some("M-B"), InsightRule::HighDowntime),
                (None, InsightRule::EnvironmentalSummary),
            ]
        );
    }

    #[test]
    fn test_environmental_summary_always_last() {
        let insights = derive_insights::<Record>(&[], &InsightRules::standard());
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].rule, InsightRule::EnvironmentalSummary);
        assert_eq!(insights[0].kind, InsightKind::Info);
        assert_eq!(insights[0].impact, Impact::Medium);

        let mut rows = vec![line_row("A", 60.0, 1.0, 4.0, false)];
        rows[0].co2_emission_kg = 1_500.0;
        let insights = derive_insights(&rows, &InsightRules::standard());
        let last = insights.last().unwrap();
        assert_eq!(last.rule, InsightRule::EnvironmentalSummary);
        assert_eq!(last.metric, 1_500.0);
        assert!(last.description.contains("1.50K kg"));
    }

    #[test]
    fn test_deterministic() {
        let rows: Vec<Record> = (0..30)
            .map(|i| {
                let mut r = line_row(["X", "Y", "Z"][i % 3], 40.0 + i as f64, 1.0, 4.5, i % 2 == 0);
                r.machine_id = format!("M-{}", i % 4);
                r.downtime_minutes = 15.0;
                r.machine_temperature = 45.0 + i as f64;
                r
            })
            .collect();

        let first = derive_insights(&rows, &InsightRules::standard());
        let second = derive_insights(&rows, &InsightRules::standard());
        assert_eq!(first, second);
    }

    #[test]
    fn test_normalized_preset() {
        let mut rows: Vec<Record> = (0..6)
            .map(|_| line_row("A", 24.0, 2.0, 0.8, true))
            .collect();
        rows[0].status = MachineStatus::Critical;
        for r in rows.iter_mut() {
            r.power_factor = 0.9;
        }

        let insights = derive_insights(&rows, &InsightRules::normalized());
        assert_eq!(
            rules_of(&insights, "A"),
            vec![
                InsightRule::HighEnergy,
                InsightRule::LowEfficiency,
                InsightRule::AnomalyCount,
                InsightRule::CriticalStatus,
            ]
        );
        assert_eq!(insights[0].metric, 12.0);
        assert!(insights[0].description.contains("12.00 kWh/unit"));
        assert!(insights[1].description.contains("80.0%"));
        assert_eq!(insights[3].impact, Impact::Critical);

        let n = insights.len();
        assert_eq!(insights[n - 2].rule, InsightRule::PowerFactor);
        assert_eq!(insights[n - 2].impact, Impact::Low);
        assert_eq!(insights[n - 1].kind, InsightKind::Success);
    }

    #[test]
    fn test_standard_preset_ignores_status() {
        let mut rows = vec![line_row("A", 1.0, 1.0, 9.0, false)];
        rows[0].status = MachineStatus::Critical;
        let insights = derive_insights(&rows, &InsightRules::standard());
        assert!(!insights.iter().any(|i| i.rule == InsightRule::CriticalStatus));
    }

    #[test]
    fn test_machine_findings_only_flagged_machines() {
        let rows = vec![
            machine_row("M-2", 60.0, 1.0, 0.0),
            machine_row("M-1", 20.0, 1.0, 0.0),
            machine_row("M-3", 20.0, 30.0, 120.0),
        ];
        let findings = machine_findings(&rows, &InsightRules::standard());
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].machine_id(), "M-2");
        assert_eq!(findings[0].checks[0].label(), "High Temperature");
        assert_eq!(findings[1].machine_id(), "M-3");
        assert_eq!(findings[1].checks.len(), 2);
        assert_eq!(findings[1].checks[1].metric_text(), "Downtime 120 min");
    }

    #[test]
    fn test_machine_text_matches_rule() {
        let downtime = MachineCheck {
            rule: InsightRule::HighDowntime,
            value: 120.0,
        };
        assert_eq!(downtime.label(), "High Downtime");
        assert_eq!(
            machine_insight("M-7", &downtime).title,
            "Excessive Downtime - M-7"
        );

        let other = MachineCheck {
            rule: InsightRule::PowerFactor,
            value: 0.5,
        };
        let insight = machine_insight("M-7", &other);
        assert_eq!(other.label(), "Machine Issue");
        assert_eq!(insight.title, "Machine Issue - M-7");
        assert!(!insight.description.contains("downtime"));
        assert_eq!(insight.rule, InsightRule::PowerFactor);
    }

    #[test]
    fn test_insight_summary() {
        let rows: Vec<Record> = (0..11).map(|_| line_row("A", 60.0, 1.0, 4.0, true)).collect();
        let insights = derive_insights(&rows, &InsightRules::standard());
        let summary = InsightSummary::from_insights(&insights);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.warning, 2);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.info, 1);
    }
}
