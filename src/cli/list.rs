use colored::Colorize;
use comfy_table::{Cell, Table};
use serde::Serialize;

use crate::cli::{load_session, LoadArgs};
use crate::error::{RevenueError, Result};
use crate::fmt::rupees;
use crate::models::{Category, Transaction};
use crate::reports::SegmentFilter;

/// A transaction as listed, with its session overrides alongside.
#[derive(Serialize)]
struct ListedTransaction<'a> {
    #[serde(flatten)]
    transaction: &'a Transaction,
    deduction: f64,
    deleted: bool,
}

pub fn run(args: &LoadArgs, segment: &str, json: bool) -> Result<()> {
    let filter = SegmentFilter::from_key(segment).ok_or_else(|| {
        RevenueError::Other(format!(
            "Unknown segment '{segment}' (expected all, ipd, consult, dressing or proc)"
        ))
    })?;
    let session = load_session(args)?;
    let overrides = session.overrides();
    let rows: Vec<_> = session
        .view(&args.only)
        .into_iter()
        .filter(|t| filter.matches(t))
        .collect();

    if json {
        let listed: Vec<ListedTransaction> = rows
            .iter()
            .map(|txn| ListedTransaction {
                transaction: txn,
                deduction: overrides.deduction(&txn.id),
                deleted: overrides.is_deleted(&txn.id),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No transactions in view.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Date", "Patient", "Service", "Category", "Gross", "Deduction", "Share",
    ]);
    for txn in &rows {
        let deleted = overrides.is_deleted(&txn.id);
        let deduction = if txn.category == Category::Ipd {
            rupees(overrides.deduction(&txn.id))
        } else {
            String::new()
        };
        let patient = if deleted {
            format!("{} (VOID)", txn.patient_name).dimmed().strikethrough().to_string()
        } else {
            txn.patient_name.clone()
        };
        table.add_row(vec![
            Cell::new(&txn.id),
            Cell::new(&txn.date),
            Cell::new(patient),
            Cell::new(&txn.service_name),
            Cell::new(txn.category.label()),
            Cell::new(rupees(txn.gross_amount)),
            Cell::new(deduction),
            Cell::new(rupees(txn.calculated_share)),
        ]);
    }
    println!("{table}");
    println!("{} transaction(s)", rows.len());
    Ok(())
}
