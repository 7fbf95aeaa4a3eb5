//! runlens - health report and reconciled series for a results directory
//!
//! ```text
//! runlens scan [--json]
//! runlens compare
//! runlens series <run> <family> [--max-points N]
//! runlens reconcile <run> [--write]
//! ```
//!
//! Logs go to stderr (`RUST_LOG`, default `runlens=info`); reports go to stdout.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use runlens::compare::{compare, training_curves};
use runlens::config::{ScanOptions, ScanOptionsBuilder};
use runlens::reconcile::SeriesFamily;
use runlens::scan::{CancellationToken, ScanReport, Scanner};
use runlens::series::{self, FamilyData};
use runlens::store::{format_size, RunOrdering};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Telemetry reconciliation and run-health classification for training runs
#[derive(Parser, Debug)]
#[command(name = "runlens", author, version, about)]
struct Args {
    /// Options file (TOML); flags override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Results directory
    #[arg(short, long, global = true)]
    results_dir: Option<PathBuf>,

    /// Worker threads for scanning
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    /// List runs by modification time, newest first
    #[arg(long, global = true)]
    newest_first: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify every run as healthy or failed
    Scan {
        /// Emit the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare runs: summaries, chart series and training curves (JSON)
    Compare,

    /// Print one series of a run (JSON)
    ///
    /// Families: action-distribution, losses, entropy, episodes, stamina,
    /// reward-breakdown, training-curve, roll-usage
    Series {
        /// Run identifier
        run: String,
        /// Series family
        family: String,
        /// Point cap for time series
        #[arg(long)]
        max_points: Option<usize>,
    },

    /// Derive series from run_logs/scalars.json (JSON)
    Reconcile {
        /// Run identifier
        run: String,
        /// Persist the derived files, keeping richer existing ones
        #[arg(long)]
        write: bool,
    },
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "runlens=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn scan_options(args: &Args, max_points: Option<usize>) -> Result<ScanOptions> {
    let base = match &args.config {
        Some(path) => ScanOptions::load(path)
            .with_context(|| format!("failed to load options from {}", path.display()))?,
        None => ScanOptions::default(),
    };

    let mut builder = ScanOptionsBuilder::from_options(base);
    if let Some(dir) = &args.results_dir {
        builder = builder.results_dir(dir.clone());
    }
    if let Some(workers) = args.workers {
        builder = builder.workers(workers);
    }
    if args.newest_first {
        builder = builder.order(RunOrdering::ModifiedNewestFirst);
    }
    if let Some(max_points) = max_points {
        builder = builder.max_points(max_points);
    }
    Ok(builder.build()?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_scan_text(report: &ScanReport) {
    let healthy: Vec<_> = report.healthy().collect();
    let failed: Vec<_> = report.failed().collect();

    println!("Scanned {} runs", report.runs.len());
    if report.cancelled {
        println!("  (cancelled; {} runs found)", report.runs_found);
    }
    println!();

    println!("Healthy ({}):", healthy.len());
    for run in &healthy {
        println!("  {:<40} {}", run.run_id(), run.verdict.summary());
        for warning in &run.verdict.warnings {
            println!("  {:<40}   warning: {warning}", "");
        }
    }
    println!();

    println!("Failed ({}):", failed.len());
    for (reason, runs) in report.failures_by_reason() {
        println!("  {reason} ({})", runs.len());
        for run in runs {
            println!("    {:<38} {}", run.run_id(), format_size(run.verdict.size_bytes));
        }
    }
    println!();
    println!("Space held by failed runs: {}", format_size(report.wasted_bytes()));
}

fn run_series(scanner: &Scanner, run: &str, family: &str) -> Result<()> {
    let store = scanner.store();
    let max_points = scanner.options().max_points;

    if let Some(family) = SeriesFamily::from_name(family) {
        let data = series::load_family(store, run, family)?.downsampled(max_points);
        if data == FamilyData::Unavailable {
            tracing::warn!(run_id = %run, ?family, "no data recorded for family");
        }
        return print_json(&data);
    }

    match family.to_ascii_lowercase().replace('_', "-").as_str() {
        "episodes" => print_json(&series::load_episodes(store, run)?),
        "stamina" => print_json(&series::load_stamina(store, run)?),
        "reward-breakdown" | "rewards" => print_json(&series::load_reward_breakdown(store, run)?),
        "training-curve" => print_json(&series::load_training_curve(store, run)?),
        "roll-usage" => print_json(&series::roll_usage(store, run)?),
        other => bail!("unknown series family '{other}'"),
    }
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let max_points = match &args.command {
        Command::Series { max_points, .. } => *max_points,
        _ => None,
    };
    let scanner = Scanner::new(scan_options(&args, max_points)?);

    match &args.command {
        Command::Scan { json } => {
            let report = scanner.scan(&CancellationToken::new())?;
            if *json {
                print_json(&report)?;
            } else {
                print_scan_text(&report);
            }
        }
        Command::Compare => {
            let report = scanner.scan(&CancellationToken::new())?;
            let overviews = report.overviews();
            let comparison = compare(&overviews);
            let curves = training_curves(&overviews, scanner.options().comparative_limit);
            print_json(&json!({
                "comparison": comparison,
                "trainingCurves": curves,
            }))?;
        }
        Command::Series { run, family, .. } => run_series(&scanner, run, family)?,
        Command::Reconcile { run, write } => {
            let reconciled = series::reconcile_run(scanner.store(), run)
                .with_context(|| format!("failed to reconcile run '{run}'"))?;
            if *write {
                let run_dir = scanner.options().results_dir.join(run);
                let outcomes = reconciled.persist(&run_dir)?;
                print_json(&json!({ "runId": run, "written": outcomes }))?;
            } else {
                print_json(&reconciled)?;
            }
        }
    }
    Ok(())
}
