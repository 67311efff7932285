use chrono::NaiveDate;
use serde::Serialize;

/// A single decoded spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Text rendering of the cell; whole numbers print without a decimal part.
    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Cell::Text(s) => s.clone(),
        }
    }

    /// True when the cell carries a usable value: non-empty text or a non-zero number.
    pub fn is_present(&self) -> bool {
        match self {
            Cell::Empty => false,
            Cell::Number(n) => *n != 0.0 && !n.is_nan(),
            Cell::Text(s) => !s.is_empty(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Rows of cells, as read from the first sheet of an uploaded file.
pub type Grid = Vec<Vec<Cell>>;

pub static EMPTY_CELL: Cell = Cell::Empty;

/// Fetch a cell by position, treating ragged rows as empty.
pub fn cell_at(row: &[Cell], idx: usize) -> &Cell {
    row.get(idx).unwrap_or(&EMPTY_CELL)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    #[serde(rename = "IPD")]
    Ipd,
    #[serde(rename = "OPD Consultation")]
    OpdConsultation,
    #[serde(rename = "OPD Procedure")]
    OpdProcedure,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ipd => "IPD",
            Self::OpdConsultation => "OPD Consultation",
            Self::OpdProcedure => "OPD Procedure",
        }
    }

    /// Short tag used in filter keys and compact listings.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Ipd => "IPD",
            Self::OpdConsultation => "OPD Consult",
            Self::OpdProcedure => "OPD Proc",
        }
    }

    pub fn share_rate(&self) -> f64 {
        match self {
            Self::Ipd => 0.20,
            Self::OpdConsultation => 0.70,
            Self::OpdProcedure => 0.50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceType {
    #[serde(rename = "IPD")]
    Ipd,
    #[serde(rename = "OPD_Consult")]
    OpdConsult,
    #[serde(rename = "OPD_Procedure")]
    OpdProcedure,
}

/// Normalized form of a raw date cell.
#[derive(Debug, Clone, PartialEq)]
pub struct DateInfo {
    /// DD/MM/YYYY, or the raw value when it could not be parsed.
    pub display: String,
    /// "Sep 2025" style bucket, or "Unknown".
    pub month_year: String,
    pub date: Option<NaiveDate>,
}

/// One billable line in the ledger. Immutable once built; user edits live in
/// `ledger::Overrides`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: String,
    pub date: String,
    pub month_year: String,
    #[serde(skip)]
    pub sort_date: Option<NaiveDate>,
    pub patient_name: String,
    pub service_name: String,
    pub category: Category,
    pub gross_amount: f64,
    pub calculated_share: f64,
    pub source_file: String,
    pub source_type: SourceType,
}
