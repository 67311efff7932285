use thiserror::Error;

#[derive(Error, Debug)]
pub enum RevenueError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("XLSX write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("Workbook has no sheets: {0}")]
    EmptyWorkbook(String),

    #[error("Nothing to export: no transactions in view")]
    EmptyReport,

    #[error("Unknown transaction: {0}")]
    UnknownTransaction(String),

    #[error("Overrides only apply to IPD transactions: {0}")]
    NotIpd(String),

    #[error("Invalid override: {0}")]
    InvalidOverride(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RevenueError>;
