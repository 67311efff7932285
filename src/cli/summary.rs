use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{load_session, LoadArgs};
use crate::error::Result;
use crate::fmt::{rupees, rupees_rounded};
use crate::reports::Financials;

pub fn run(args: &LoadArgs) -> Result<()> {
    let session = load_session(args)?;
    let s = session.summary(&args.only);
    let f = Financials::compute(s.total_revenue, session.salary, session.months);

    let mut counts = Table::new();
    counts.set_header(vec!["Activity", "Count"]);
    counts.add_row(vec![Cell::new("Transactions in view"), Cell::new(s.transactions)]);
    counts.add_row(vec![Cell::new("Admissions"), Cell::new(s.admissions)]);
    counts.add_row(vec![Cell::new("OPD consults"), Cell::new(s.consultations)]);
    counts.add_row(vec![Cell::new("Emergency procedures"), Cell::new(s.emergency_procedures)]);
    counts.add_row(vec![Cell::new("Dressings"), Cell::new(s.dressings)]);
    println!("{counts}");

    let mut shares = Table::new();
    shares.set_header(vec!["Segment", "Share"]);
    shares.add_row(vec![Cell::new("IPD"), Cell::new(rupees(s.ipd_share))]);
    shares.add_row(vec![Cell::new("Consultations"), Cell::new(rupees(s.consult_share))]);
    shares.add_row(vec![Cell::new("Procedures"), Cell::new(rupees(s.other_procedure_share))]);
    shares.add_row(vec![Cell::new("Dressings"), Cell::new(rupees(s.dressing_share))]);
    shares.add_row(vec![
        Cell::new("All OPD procedures".dimmed()),
        Cell::new(rupees(s.procedure_share).dimmed()),
    ]);
    shares.add_row(vec![
        Cell::new("Total Revenue".bold()),
        Cell::new(rupees(f.total_revenue).bold()),
    ]);
    println!("{shares}");

    let mut payout = Table::new();
    payout.set_header(vec!["Financials", "INR"]);
    payout.add_row(vec![Cell::new("Base salary"), Cell::new(rupees_rounded(f.salary))]);
    payout.add_row(vec![Cell::new("Months"), Cell::new(f.months)]);
    payout.add_row(vec![Cell::new("Total deduction"), Cell::new(rupees_rounded(f.total_deduction))]);
    payout.add_row(vec![Cell::new("Incentive"), Cell::new(rupees_rounded(f.incentive))]);
    let net = rupees_rounded(f.net_payout);
    let net = if f.net_payout < 0.0 { net.red() } else { net.green() };
    payout.add_row(vec![Cell::new("Net payout (10% TDS)".bold()), Cell::new(net.bold())]);
    println!("{payout}");

    let overrides = session.overrides();
    if !overrides.is_empty() {
        println!("{} override(s) applied", overrides.len());
    }
    if s.deleted > 0 {
        println!("{} voided transaction(s) excluded", s.deleted);
    }
    Ok(())
}
