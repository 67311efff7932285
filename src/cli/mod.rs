pub mod config;
pub mod export;
pub mod filters;
pub mod list;
pub mod summary;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::error::{RevenueError, Result};
use crate::importer::{get_by_key, ImporterKind};
use crate::ledger::{Overrides, Session};
use crate::settings::{load_settings, validate_salary};

#[derive(Parser)]
#[command(
    name = "revenue-eval",
    about = "Doctor revenue-share ledger built from hospital billing exports."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show share totals, counts and payout for the loaded files.
    Summary {
        #[command(flatten)]
        load: LoadArgs,
    },
    /// List transactions in the current view.
    List {
        #[command(flatten)]
        load: LoadArgs,
        /// Segment: all, ipd, consult, dressing, proc
        #[arg(long, default_value = "all")]
        segment: String,
        /// Print the transactions as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show available month/category filters with row counts.
    Filters {
        #[command(flatten)]
        load: LoadArgs,
    },
    /// Write the segmented revenue report to XLSX.
    Export {
        #[command(flatten)]
        load: LoadArgs,
        /// Output file path (default: <export_dir>/Revenue_Report_<date>.xlsx)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show or change saved defaults.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the current settings.
    Show,
    /// Persist new defaults.
    Set {
        /// Monthly base salary
        #[arg(long)]
        salary: Option<f64>,
        /// Salary month multiplier
        #[arg(long)]
        months: Option<u32>,
        /// Directory exports are written to
        #[arg(long = "export-dir")]
        export_dir: Option<String>,
    },
}

/// Arguments shared by every command that builds a ledger from files.
#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// Billing exports (xlsx, xls, xlsb, ods, csv), merged in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Restrict the view to a filter, e.g. "Sep 2025 IPD" (repeatable)
    #[arg(long)]
    pub only: Vec<String>,
    /// Force a builder instead of detecting: ipd, opd
    #[arg(long)]
    pub format: Option<String>,
    /// JSON file of per-transaction overrides
    #[arg(long)]
    pub overrides: Option<PathBuf>,
    /// Manual IPD deduction: <id>=<amount> (repeatable)
    #[arg(long, value_parser = parse_deduction)]
    pub deduct: Vec<(String, f64)>,
    /// Soft-delete an IPD transaction by id (repeatable)
    #[arg(long)]
    pub void: Vec<String>,
    /// Monthly base salary for this run
    #[arg(long)]
    pub salary: Option<f64>,
    /// Salary month multiplier for this run
    #[arg(long)]
    pub months: Option<u32>,
}

fn parse_deduction(s: &str) -> std::result::Result<(String, f64), String> {
    let (id, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <id>=<amount>, got '{s}'"))?;
    let amount: f64 = amount
        .trim()
        .parse()
        .map_err(|_| format!("invalid amount '{amount}'"))?;
    Ok((id.trim().to_string(), amount))
}

fn resolve_format(key: Option<&str>) -> Result<Option<ImporterKind>> {
    match key {
        None => Ok(None),
        Some(k) => get_by_key(k)
            .map(Some)
            .ok_or_else(|| RevenueError::Other(format!("Unknown format '{k}' (expected ipd or opd)"))),
    }
}

/// Build a session from the command line: ingest files, then layer overrides.
pub(crate) fn load_session(args: &LoadArgs) -> Result<Session> {
    let format = resolve_format(args.format.as_deref())?;
    let mut session = Session::new(&load_settings());
    if let Some(salary) = args.salary {
        session.salary = validate_salary(salary)?;
    }
    if let Some(months) = args.months {
        session.months = months;
    }

    let report = session.ingest(&args.files, format);
    for failure in &report.batch.failures {
        eprintln!(
            "{} {}: {}",
            "Skipping".yellow(),
            failure.file,
            failure.error
        );
    }
    for outcome in &report.batch.files {
        eprintln!(
            "{}: {} rows as {} ({} dropped)",
            outcome.file,
            outcome.parsed,
            outcome.kind.name(),
            outcome.dropped
        );
    }
    eprintln!(
        "{} imported, {} skipped (duplicates)",
        report.merge.added, report.merge.duplicates
    );

    if let Some(path) = &args.overrides {
        session.apply_overrides(&Overrides::load(path)?)?;
    }
    for (id, amount) in &args.deduct {
        session.set_deduction(id, *amount)?;
    }
    for id in &args.void {
        session.set_deleted(id, true)?;
    }
    Ok(session)
}
