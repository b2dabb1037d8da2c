//! EnergyLens - energy and production analytics for manufacturing lines
//!
//! A CLI tool that loads a line dataset, renders the home, line, machine,
//! insight and report views, and writes the efficiency report export.
//!
//! Exit codes:
//!   0 - Success (no insights at the --fail-on level, or no --fail-on set)
//!   1 - Runtime error (dataset load failure, bad arguments, config, etc.)
//!   2 - Insights found at or above the --fail-on level

use anyhow::{bail, Context, Result};
use energylens::analysis::{
    home_summary, line_dashboard, machine_view, unique_lines, unique_machines, HomeSummary,
    LineDashboard, LineSelection, MachineView,
};
use energylens::cli::{Args, OutputFormat, View};
use energylens::config::{Config, CONFIG_FILE_NAME};
use energylens::dataset::DatasetHandle;
use energylens::format::format_compact;
use energylens::insights::{derive_insights, InsightSummary};
use energylens::loader::{load_dataset, LoadOptions};
use energylens::models::Insight;
use energylens::report::{build_report, generate_json_report, write_csv_report, Report};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is read before logging so `[general] verbose` can set the level
    let (mut config, origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(args.log_level(config.general.verbose));

    info!("EnergyLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    origin.log();

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .energylens.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to choose a rule preset, thresholds, chart sizes and report title.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load the dataset, render the selected view. Returns exit code (0 or 2).
async fn run(args: Args, config: Config) -> Result<i32> {
    let data_path = args.data.clone().context("No dataset given")?;

    let handle = DatasetHandle::default();
    let options = LoadOptions {
        show_progress: !args.quiet,
    };
    let dataset = load_dataset(&data_path, &options)
        .await
        .with_context(|| format!("Failed to load dataset {}", data_path.display()))?;
    handle.replace(dataset);

    let dataset = handle.current();
    let rows = dataset.records();
    let rules = config.insight_rules();
    let insights = derive_insights(rows, &rules);

    match args.view {
        View::Home => emit(args.format, &home_summary(rows), print_home)?,
        View::Line => {
            let selection = LineSelection::from(args.line.clone());
            if let LineSelection::Line(ref name) = selection {
                if !unique_lines(rows).contains(name) {
                    warn!("Line '{}' not found in dataset", name);
                }
            }
            let dashboard = line_dashboard(rows, &selection, config.charts.line_points);
            emit(args.format, &dashboard, print_line)?;
        }
        View::Machine => {
            let machine_id = match args.machine.clone() {
                Some(id) => id,
                None => unique_machines(rows)
                    .into_iter()
                    .next()
                    .context("Dataset has no machines")?,
            };
            let Some(view) = machine_view(rows, &machine_id, config.charts.machine_points) else {
                bail!("Machine '{}' not found in dataset", machine_id);
            };
            emit(args.format, &view, print_machine)?;
        }
        View::Insights => emit(args.format, &insights, |list: &Vec<Insight>| {
            print_insights(list)
        })?,
        View::Report => {
            let report = build_report(rows, &rules, &config.report_options());
            let output = Path::new(&config.general.output);
            write_csv_report(&report, output)?;
            info!("Report written to {}", output.display());

            match args.format {
                OutputFormat::Json => println!("{}", generate_json_report(&report)?),
                OutputFormat::Text => print_report(&report, output),
            }
        }
    }

    // Check --fail-on threshold
    if let Some(fail_level) = args.fail_on {
        let threshold = fail_level.kind();
        if insights.iter().any(|i| i.kind >= threshold) {
            eprintln!(
                "\n⛔ Insights found at or above {} level. Failing (exit code 2).",
                threshold
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Print a view model as text or pretty JSON.
fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl Fn(&T)) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).context("Failed to serialize view")?;
            println!("{}", json);
        }
        OutputFormat::Text => text(value),
    }
    Ok(())
}

fn print_home(summary: &HomeSummary) {
    println!("\n🏭 Plant Overview ({} records)", summary.record_count);
    println!("   Total energy:      {} kWh", format_compact(summary.total_energy));
    println!("   Total production:  {} units", format_compact(summary.total_production));
    println!("   Avg efficiency:    {:.2}", summary.average_efficiency);
    println!("   CO₂ emissions:     {} kg", format_compact(summary.total_co2));
    println!("   Energy cost:       ${}", format_compact(summary.total_cost));
    println!("   Anomalies:         {}", summary.anomaly_count);
    println!("   Critical records:  {}", summary.critical_rows);

    if !summary.line_comparison.is_empty() {
        println!("\n📊 Line Comparison:");
        for line in &summary.line_comparison {
            println!(
                "   {:<20} {:>10} kWh  {:>10} units  eff {:.2}",
                line.line,
                format_compact(line.total_energy),
                format_compact(line.total_production),
                line.avg_efficiency
            );
        }
    }
}

fn print_line(dashboard: &LineDashboard) {
    let stats = &dashboard.stats;
    println!("\n📈 Line Dashboard: {}", dashboard.selection);
    println!("   Records:           {}", stats.record_count);
    println!("   Total energy:      {} kWh", format_compact(stats.total_energy));
    println!("   Total production:  {} units", format_compact(stats.total_production));
    println!("   Avg efficiency:    {:.2}", stats.average_efficiency);
    println!("   Anomalies:         {}", stats.anomaly_count);
    println!("   Chart points:      {}", dashboard.energy_series.len());

    for line in &dashboard.comparison {
        println!(
            "   - {}: {} kWh, {} units",
            line.line,
            format_compact(line.total_energy),
            format_compact(line.total_production)
        );
    }
}

fn print_machine(view: &MachineView) {
    let info = &view.info;
    let health = &view.health;
    println!("\n🔧 Machine {} ({})", health.machine_id, info.machine_type);
    println!("   Line:              {}", info.line_name);
    println!("   Location:          {}", info.location);
    println!("   Operator:          {}", info.operator_name);
    println!("   Status:            {}", info.status);
    println!("   Maintenance:       {}", info.maintenance_status);
    println!("   Rated power:       {:.1} kW", info.rated_power_kw);
    println!("   Records:           {}", health.record_count);
    println!("   Avg temperature:   {:.1}°C", health.avg_temperature);
    println!("   Avg vibration:     {:.1}", health.avg_vibration);
    println!("   Avg efficiency:    {:.2}", health.avg_efficiency);
    println!("   Total downtime:    {:.0} min", health.total_downtime);
}

fn print_insights(insights: &[Insight]) {
    let summary = InsightSummary::from_insights(insights);
    println!("\n💡 Insights ({} total)", summary.total);
    println!(
        "   🔴 Critical: {} | ⚠️ Warning: {} | ℹ️ Info: {} | ✅ Success: {}",
        summary.critical, summary.warning, summary.info, summary.success
    );

    for insight in insights {
        println!(
            "\n{} {} [{} impact {}]",
            insight.kind.emoji(),
            insight.title,
            insight.impact.emoji(),
            insight.impact
        );
        println!("   {}", insight.description);
        println!("   💡 {}", insight.recommendation);
    }
}

fn print_report(report: &Report, output: &Path) {
    let s = &report.summary;
    println!("\n📝 {}", report.title);
    println!("   Total energy:      {:.2} kWh", s.total_energy);
    println!("   Total production:  {:.2} units", s.total_production);
    println!("   Energy per unit:   {:.4} kWh/unit", s.energy_per_unit);
    println!("   Anomalies:         {}", s.anomaly_count);

    if !report.inefficiency_sources.is_empty() {
        println!("\n🎯 Top Inefficiency Sources:");
        for (i, source) in report.inefficiency_sources.iter().enumerate() {
            println!("   {}. {} - {} ({})", i + 1, source.source, source.issue, source.metric);
        }
    }

    println!("\n✅ Report saved to: {}", output.display());
}

/// Where the configuration came from, logged once logging is up.
enum ConfigOrigin {
    Explicit(PathBuf),
    Default,
    Builtin,
    Invalid(anyhow::Error),
}

impl ConfigOrigin {
    fn log(&self) {
        match self {
            ConfigOrigin::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigOrigin::Default => info!("Loaded default config from {}", CONFIG_FILE_NAME),
            ConfigOrigin::Builtin => debug!("No config file found, using defaults"),
            ConfigOrigin::Invalid(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration: explicit path, else the default file, else defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigOrigin::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigOrigin::Default)),
        Ok(None) => Ok((Config::default(), ConfigOrigin::Builtin)),
        Err(e) => Ok((Config::default(), ConfigOrigin::Invalid(e))),
    }
}
