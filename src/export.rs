use chrono::NaiveDate;

use crate::error::{RevenueError, Result};
use crate::ledger::Overrides;
use crate::models::{Category, Transaction};
use crate::reports::{summarize, Financials, Segment};

pub const SHEET_NAME: &str = "Revenue Report";

pub const HEADERS: [&str; 9] = [
    "S.No",
    "Date",
    "Patient Name",
    "Service",
    "Category",
    "Hospital Amount",
    "Deduction",
    "Net Amount",
    "My Share",
];

/// Summary block sits beside the segment tables, starting at column L, row 2.
pub const STATS_COLUMN: usize = 11;
pub const STATS_ROW: usize = 1;

pub const COLUMN_WIDTHS: [f64; 13] = [
    6.0, 12.0, 25.0, 30.0, 15.0, 12.0, 12.0, 12.0, 12.0, 5.0, 5.0, 25.0, 15.0,
];

pub fn report_file_name(date: NaiveDate) -> String {
    format!("Revenue_Report_{}.xlsx", date.format("%Y-%m-%d"))
}

// ---------------------------------------------------------------------------
// Grid model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ReportValue {
    Blank,
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    Plain,
    Bold,
    /// Soft-deleted line: struck through and greyed.
    Void,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportCell {
    pub value: ReportValue,
    pub style: CellStyle,
}

impl ReportCell {
    pub fn blank() -> Self {
        Self {
            value: ReportValue::Blank,
            style: CellStyle::Plain,
        }
    }

    pub fn text(s: &str, style: CellStyle) -> Self {
        Self {
            value: ReportValue::Text(s.to_string()),
            style,
        }
    }

    pub fn number(n: f64, style: CellStyle) -> Self {
        Self {
            value: ReportValue::Number(n),
            style,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportGrid {
    pub sheet_name: String,
    pub rows: Vec<Vec<ReportCell>>,
    pub column_widths: Vec<f64>,
}

impl ReportGrid {
    fn put(&mut self, row: usize, col: usize, cell: ReportCell) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let r = &mut self.rows[row];
        if r.len() <= col {
            r.resize_with(col + 1, ReportCell::blank);
        }
        r[col] = cell;
    }
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SegmentTotals {
    pub gross: f64,
    pub deduction: f64,
    pub net: f64,
    pub share: f64,
}

fn segment_rows(segment: Segment, items: &[&Transaction], overrides: &Overrides) -> Vec<Vec<ReportCell>> {
    let mut rows = Vec::with_capacity(items.len() + 5);

    let mut title = vec![ReportCell::text(&segment.title().to_uppercase(), CellStyle::Bold)];
    title.resize_with(HEADERS.len(), ReportCell::blank);
    rows.push(title);
    rows.push(HEADERS.iter().map(|h| ReportCell::text(h, CellStyle::Bold)).collect());

    let mut totals = SegmentTotals::default();
    for (idx, txn) in items.iter().enumerate() {
        let deduction = if txn.category == Category::Ipd {
            overrides.deduction(&txn.id)
        } else {
            0.0
        };
        let net = txn.gross_amount - deduction;
        let deleted = overrides.is_deleted(&txn.id);
        let style = if deleted { CellStyle::Void } else { CellStyle::Plain };
        let patient = if deleted {
            format!("{} (VOID)", txn.patient_name)
        } else {
            txn.patient_name.clone()
        };

        rows.push(vec![
            ReportCell::number((idx + 1) as f64, CellStyle::Plain),
            ReportCell::text(&txn.date, style),
            ReportCell::text(&patient, style),
            ReportCell::text(&txn.service_name, style),
            ReportCell::text(txn.category.label(), style),
            ReportCell::number(txn.gross_amount, style),
            ReportCell::number(deduction, style),
            ReportCell::number(net, style),
            ReportCell::number(txn.calculated_share, style),
        ]);

        if !deleted {
            totals.gross += txn.gross_amount;
            totals.deduction += deduction;
            totals.share += txn.calculated_share;
        }
    }
    totals.net = totals.gross - totals.deduction;

    rows.push(vec![
        ReportCell::blank(),
        ReportCell::blank(),
        ReportCell::text(&format!("TOTAL {}", segment.title()), CellStyle::Bold),
        ReportCell::blank(),
        ReportCell::blank(),
        ReportCell::number(totals.gross, CellStyle::Bold),
        ReportCell::number(totals.deduction, CellStyle::Bold),
        ReportCell::number(totals.net, CellStyle::Bold),
        ReportCell::number(totals.share, CellStyle::Bold),
    ]);
    rows.push(Vec::new());
    rows.push(Vec::new());
    rows
}

enum Stat {
    Heading(&'static str, &'static str),
    Value(&'static str, f64),
    Spacer,
}

fn stats_block(transactions: &[Transaction], salary: f64, months: u32, overrides: &Overrides) -> Vec<Stat> {
    let s = summarize(transactions, overrides);
    let f = Financials::compute(s.total_revenue, salary, months);
    vec![
        Stat::Heading("SUMMARY STATISTICS", "VALUE"),
        Stat::Value("Total Admissions", s.admissions as f64),
        Stat::Value("Total OPD Consults", s.consultations as f64),
        Stat::Value("Emergency Procs", s.emergency_procedures as f64),
        Stat::Value("Dressings Done", s.dressings as f64),
        Stat::Spacer,
        Stat::Heading("REVENUE BREAKDOWN", "INR"),
        Stat::Value("IPD Share", s.ipd_share),
        Stat::Value("Consult Share", s.consult_share),
        Stat::Value("Procedure Share", s.other_procedure_share),
        Stat::Value("Dressing Share", s.dressing_share),
        Stat::Spacer,
        Stat::Heading("FINANCIALS", "INR"),
        Stat::Value("Total Revenue", f.total_revenue),
        Stat::Value("Base Salary", f.salary),
        Stat::Value("Months Multiplier", f.months as f64),
        Stat::Value("Total Deduction", f.total_deduction),
        Stat::Value("Incentive (Rev-Ded)", f.incentive),
        Stat::Value("Net Payout (10% TDS)", f.net_payout),
    ]
}

/// Lay the view out as four date-sorted segment tables with the summary
/// statistics block beside them. Refuses an empty view.
pub fn build_report(
    transactions: &[Transaction],
    salary: f64,
    months: u32,
    overrides: &Overrides,
) -> Result<ReportGrid> {
    if transactions.is_empty() {
        return Err(RevenueError::EmptyReport);
    }

    let mut grid = ReportGrid {
        sheet_name: SHEET_NAME.to_string(),
        rows: Vec::new(),
        column_widths: COLUMN_WIDTHS.to_vec(),
    };

    for segment in Segment::ALL {
        let mut items: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| Segment::of(t) == segment)
            .collect();
        if items.is_empty() {
            continue;
        }
        items.sort_by_key(|t| t.sort_date);
        grid.rows.extend(segment_rows(segment, &items, overrides));
    }

    for (i, stat) in stats_block(transactions, salary, months, overrides).into_iter().enumerate() {
        let row = STATS_ROW + i;
        let (label, value) = match stat {
            Stat::Heading(label, unit) => (
                ReportCell::text(label, CellStyle::Bold),
                ReportCell::text(unit, CellStyle::Bold),
            ),
            Stat::Value(label, n) => (
                ReportCell::text(label, CellStyle::Plain),
                ReportCell::number(n, CellStyle::Plain),
            ),
            Stat::Spacer => (ReportCell::blank(), ReportCell::blank()),
        };
        grid.put(row, STATS_COLUMN, label);
        grid.put(row, STATS_COLUMN + 1, value);
    }

    Ok(grid)
}
