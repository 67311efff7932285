use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use sha2::{Digest, Sha256};

use crate::classifier::is_excluded;
use crate::error::Result;
use crate::models::{cell_at, Category, Cell, Grid, SourceType, Transaction, EMPTY_CELL};
use crate::normalize::{parse_amount, parse_date};
use crate::workbook::read_grid;

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

/// One way of locating a field in a row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Column {
    /// Header label, looked up in the header row's column map.
    Named(&'static str),
    /// Fixed position, for exports whose header label drifts.
    Fixed(usize),
}

/// Header label to column index, built from the trimmed header cells.
#[derive(Debug, Default)]
pub struct HeaderMap(HashMap<String, usize>);

impl HeaderMap {
    pub fn from_row(row: &[Cell]) -> Self {
        let mut map = HashMap::new();
        for (i, cell) in row.iter().enumerate() {
            let label = cell.text().trim().to_string();
            if !label.is_empty() {
                map.insert(label, i);
            }
        }
        Self(map)
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.0.get(label).copied()
    }
}

/// First strategy that yields a present cell wins.
pub fn resolve<'a>(row: &'a [Cell], header: &HeaderMap, strategies: &[Column]) -> &'a Cell {
    strategies
        .iter()
        .filter_map(|col| match col {
            Column::Named(label) => header.get(label),
            Column::Fixed(idx) => Some(*idx),
        })
        .map(|idx| cell_at(row, idx))
        .find(|cell| cell.is_present())
        .unwrap_or(&EMPTY_CELL)
}

const IPD_PATIENT: &[Column] = &[
    Column::Named("PatientName"),
    Column::Named("Patient Name"),
    Column::Fixed(2),
];
const IPD_BILL_DATE: &[Column] = &[
    Column::Named("BillDate"),
    Column::Named("Bill Date"),
    Column::Fixed(13),
];
const IPD_DEPOSIT: &[Column] = &[Column::Named("Deposit"), Column::Fixed(16)];
const IPD_SERVICE: &[Column] = &[Column::Named("remarks"), Column::Fixed(18)];

const IPD_HEADER_SCAN_ROWS: usize = 20;
const IPD_DEFAULT_HEADER_ROW: usize = 3;
const IPD_DEFAULT_SERVICE: &str = "IPD Treatment";

// Fixed positions of the outpatient export, header on row 0.
const OPD_DATE: usize = 3;
const OPD_PATIENT: usize = 5;
const OPD_SERVICE_NAME: usize = 13;
const OPD_SERVICE_TYPE: usize = 15;
const OPD_NET_AMOUNT: usize = 20;

const DETECT_SCAN_ROWS: usize = 15;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Deterministic id from a row's content signature.
pub fn content_id(prefix: &str, signature: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(signature.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{prefix}-{}", &digest[..16])
}

fn is_ipd_header(row: &[Cell]) -> bool {
    row.iter().any(|c| {
        let label = c.text();
        let label = label.trim();
        label == "Deposit" || label == "PatientName"
    })
}

fn find_ipd_header_row(grid: &Grid) -> Option<usize> {
    grid.iter()
        .take(IPD_HEADER_SCAN_ROWS)
        .position(|row| is_ipd_header(row))
}

fn row_mentions_deposit(row: &[Cell]) -> bool {
    row.iter()
        .map(|c| c.text())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .contains("deposit")
}

// ---------------------------------------------------------------------------
// Importer kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImporterKind {
    Ipd,
    Opd,
}

pub struct ParsedFile {
    pub kind: ImporterKind,
    pub transactions: Vec<Transaction>,
    pub dropped: usize,
}

impl ImporterKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Ipd => "ipd",
            Self::Opd => "opd",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ipd => "Inpatient (IPD)",
            Self::Opd => "Outpatient (OPD)",
        }
    }

    pub fn detect(&self, grid: &Grid) -> bool {
        match self {
            Self::Ipd => grid.iter().take(DETECT_SCAN_ROWS).any(|row| row_mentions_deposit(row)),
            Self::Opd => true, // fallback for anything not inpatient
        }
    }

    pub fn parse(&self, grid: &Grid, file_name: &str) -> ParsedFile {
        match self {
            Self::Ipd => parse_ipd(grid, file_name),
            Self::Opd => parse_opd(grid, file_name),
        }
    }
}

const ALL_IMPORTERS: &[ImporterKind] = &[ImporterKind::Ipd, ImporterKind::Opd];

pub fn get_by_key(key: &str) -> Option<ImporterKind> {
    ALL_IMPORTERS.iter().find(|i| i.key() == key).copied()
}

pub fn detect_format(grid: &Grid) -> ImporterKind {
    ALL_IMPORTERS
        .iter()
        .find(|i| i.detect(grid))
        .copied()
        .unwrap_or(ImporterKind::Opd)
}

/// Detect (or take the forced format) and build transactions for one grid.
pub fn parse_grid(grid: &Grid, file_name: &str, format: Option<ImporterKind>) -> ParsedFile {
    let kind = format.unwrap_or_else(|| detect_format(grid));
    info!("{file_name}: parsing as {}", kind.name());
    let parsed = kind.parse(grid, file_name);
    debug!(
        "{file_name}: {} transactions, {} rows dropped",
        parsed.transactions.len(),
        parsed.dropped
    );
    parsed
}

// ---------------------------------------------------------------------------
// IPD builder
// ---------------------------------------------------------------------------

fn parse_ipd(grid: &Grid, file_name: &str) -> ParsedFile {
    let header_idx = match find_ipd_header_row(grid) {
        Some(idx) => {
            debug!("{file_name}: IPD header on row {idx}");
            idx
        }
        None => {
            warn!(
                "{file_name}: no IPD header in first {IPD_HEADER_SCAN_ROWS} rows, assuming row {IPD_DEFAULT_HEADER_ROW}"
            );
            IPD_DEFAULT_HEADER_ROW
        }
    };
    let header = grid
        .get(header_idx)
        .map(|row| HeaderMap::from_row(row))
        .unwrap_or_default();
    debug!("{file_name}: columns {:?}", header.0);

    let mut transactions = Vec::new();
    let mut dropped = 0usize;
    for row in grid.iter().skip(header_idx + 1) {
        match build_ipd(row, &header, file_name) {
            Some(txn) => transactions.push(txn),
            None => dropped += 1,
        }
    }
    ParsedFile {
        kind: ImporterKind::Ipd,
        transactions,
        dropped,
    }
}

fn build_ipd(row: &[Cell], header: &HeaderMap, file_name: &str) -> Option<Transaction> {
    let patient = resolve(row, header, IPD_PATIENT).text().trim().to_string();
    let date_cell = resolve(row, header, IPD_BILL_DATE);
    let gross_amount = parse_amount(resolve(row, header, IPD_DEPOSIT));
    let service_cell = resolve(row, header, IPD_SERVICE);
    let service_name = if service_cell.is_present() {
        service_cell.text().trim().to_string()
    } else {
        IPD_DEFAULT_SERVICE.to_string()
    };

    if !date_cell.is_present() || patient.is_empty() || is_excluded(&service_name, "IPD") {
        return None;
    }
    if gross_amount <= 0.0 {
        return None;
    }

    let date = parse_date(date_cell);
    let signature = format!("{}|{patient}|{service_name}|{gross_amount}", date.display);
    let category = Category::Ipd;
    Some(Transaction {
        id: content_id("ipd", &signature),
        date: date.display,
        month_year: date.month_year,
        sort_date: date.date,
        patient_name: patient,
        service_name,
        category,
        gross_amount,
        calculated_share: gross_amount * category.share_rate(),
        source_file: file_name.to_string(),
        source_type: SourceType::Ipd,
    })
}

// ---------------------------------------------------------------------------
// OPD builder
// ---------------------------------------------------------------------------

fn parse_opd(grid: &Grid, file_name: &str) -> ParsedFile {
    let mut transactions = Vec::new();
    let mut dropped = 0usize;
    for row in grid.iter().skip(1) {
        match build_opd(row, file_name) {
            Some(txn) => transactions.push(txn),
            None => dropped += 1,
        }
    }
    ParsedFile {
        kind: ImporterKind::Opd,
        transactions,
        dropped,
    }
}

fn build_opd(row: &[Cell], file_name: &str) -> Option<Transaction> {
    let service_type = cell_at(row, OPD_SERVICE_TYPE).text();
    let service_name = cell_at(row, OPD_SERVICE_NAME).text().trim().to_string();
    let patient = cell_at(row, OPD_PATIENT).text().trim().to_string();
    let gross_amount = parse_amount(cell_at(row, OPD_NET_AMOUNT));

    if patient.is_empty() || is_excluded(&service_name, &service_type) {
        return None;
    }
    if gross_amount <= 0.0 {
        return None;
    }

    let is_consult = service_type.to_lowercase().contains("consult")
        || service_name.to_lowercase().contains("consult");
    let (category, source_type) = if is_consult {
        (Category::OpdConsultation, SourceType::OpdConsult)
    } else {
        (Category::OpdProcedure, SourceType::OpdProcedure)
    };

    let date = parse_date(cell_at(row, OPD_DATE));
    let signature = format!("opd|{}|{patient}|{service_name}|{gross_amount}", date.display);
    Some(Transaction {
        id: content_id("opd", &signature),
        date: date.display,
        month_year: date.month_year,
        sort_date: date.date,
        patient_name: patient,
        service_name,
        category,
        gross_amount,
        calculated_share: gross_amount * category.share_rate(),
        source_file: file_name.to_string(),
        source_type,
    })
}

// ---------------------------------------------------------------------------
// Batch parsing
// ---------------------------------------------------------------------------

pub struct FileOutcome {
    pub file: String,
    pub kind: ImporterKind,
    pub parsed: usize,
    pub dropped: usize,
}

pub struct FileFailure {
    pub file: String,
    pub error: String,
}

#[derive(Default)]
pub struct BatchReport {
    pub transactions: Vec<Transaction>,
    pub files: Vec<FileOutcome>,
    pub failures: Vec<FileFailure>,
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

/// Parse one file end to end. Any decode error rejects the whole file.
pub fn parse_file(path: &Path, format: Option<ImporterKind>) -> Result<ParsedFile> {
    let grid = read_grid(path)?;
    Ok(parse_grid(&grid, &display_name(path), format))
}

/// Parse files one after another. A file that fails to decode is reported and
/// skipped; the rest of the batch still goes through.
pub fn parse_batch(files: &[PathBuf], format: Option<ImporterKind>) -> BatchReport {
    let mut report = BatchReport::default();
    for path in files {
        let name = display_name(path);
        match parse_file(path, format) {
            Ok(parsed) => {
                report.files.push(FileOutcome {
                    file: name,
                    kind: parsed.kind,
                    parsed: parsed.transactions.len(),
                    dropped: parsed.dropped,
                });
                report.transactions.extend(parsed.transactions);
            }
            Err(e) => {
                warn!("{name}: {e}");
                report.failures.push(FileFailure {
                    file: name,
                    error: e.to_string(),
                });
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn ipd_header() -> Vec<Cell> {
        let mut row = vec![Cell::Empty; 19];
        row[0] = text("IPNo");
        row[2] = text("PatientName");
        row[13] = text("BillDate");
        row[16] = text("Deposit");
        row[18] = text("remarks");
        row
    }

    fn ipd_row(patient: &str, date: Cell, deposit: Cell, remarks: &str) -> Vec<Cell> {
        let mut row = vec![Cell::Empty; 19];
        row[2] = Cell::from(patient);
        row[13] = date;
        row[16] = deposit;
        row[18] = Cell::from(remarks);
        row
    }

    fn ipd_grid(rows: Vec<Vec<Cell>>) -> Grid {
        let mut grid = vec![
            vec![text("City Hospital")],
            vec![text("IPD Deposit Register")],
            vec![],
            ipd_header(),
        ];
        grid.extend(rows);
        grid
    }

    fn opd_row(date: &str, patient: &str, service: &str, service_type: &str, net: f64) -> Vec<Cell> {
        let mut row = vec![Cell::Empty; 21];
        row[OPD_DATE] = Cell::from(date);
        row[OPD_PATIENT] = Cell::from(patient);
        row[OPD_SERVICE_NAME] = Cell::from(service);
        row[OPD_SERVICE_TYPE] = Cell::from(service_type);
        row[OPD_NET_AMOUNT] = Cell::Number(net);
        row
    }

    fn opd_grid(rows: Vec<Vec<Cell>>) -> Grid {
        let mut header = vec![Cell::Empty; 21];
        header[OPD_DATE] = text("BillDate");
        header[OPD_PATIENT] = text("Patient");
        header[OPD_SERVICE_NAME] = text("ServiceName");
        header[OPD_SERVICE_TYPE] = text("ServiceType");
        header[OPD_NET_AMOUNT] = text("NetAmount");
        let mut grid = vec![header];
        grid.extend(rows);
        grid
    }

    #[test]
    fn test_detects_ipd_by_deposit_column() {
        let grid = ipd_grid(vec![]);
        assert_eq!(detect_format(&grid), ImporterKind::Ipd);
    }

    #[test]
    fn test_defaults_to_opd() {
        let grid = opd_grid(vec![opd_row("01/09/2025", "A", "Consultation", "Consultancy OPD", 500.0)]);
        assert_eq!(detect_format(&grid), ImporterKind::Opd);
        assert_eq!(detect_format(&Vec::new()), ImporterKind::Opd);
    }

    #[test]
    fn test_detection_only_scans_first_rows() {
        let mut grid: Grid = (0..15).map(|_| vec![text("filler")]).collect();
        grid.push(vec![text("Deposit")]);
        assert_eq!(detect_format(&grid), ImporterKind::Opd);
    }

    #[test]
    fn test_ipd_share_is_twenty_percent() {
        let grid = ipd_grid(vec![ipd_row(
            "Ramesh Kumar",
            text("14/09/2025"),
            text("10,000"),
            "",
        )]);
        let parsed = ImporterKind::Ipd.parse(&grid, "Sep25 IPD.xlsx");
        assert_eq!(parsed.transactions.len(), 1);
        let txn = &parsed.transactions[0];
        assert_eq!(txn.category, Category::Ipd);
        assert_eq!(txn.gross_amount, 10000.0);
        assert_eq!(txn.calculated_share, 2000.0);
        assert_eq!(txn.service_name, "IPD Treatment");
        assert_eq!(txn.month_year, "Sep 2025");
        assert!(txn.id.starts_with("ipd-"));
    }

    #[test]
    fn test_ipd_drops_incomplete_and_excluded_rows() {
        let grid = ipd_grid(vec![
            ipd_row("", text("14/09/2025"), Cell::Number(5000.0), ""),
            ipd_row("No Date", Cell::Empty, Cell::Number(5000.0), ""),
            ipd_row("Zero", text("14/09/2025"), Cell::Number(0.0), ""),
            ipd_row("Imaging", text("14/09/2025"), Cell::Number(5000.0), "CT Scan Brain"),
            ipd_row("Kept", Cell::Number(45914.0), Cell::Number(5000.0), "Laparotomy"),
        ]);
        let parsed = ImporterKind::Ipd.parse(&grid, "ipd.xlsx");
        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.dropped, 4);
        assert_eq!(parsed.transactions[0].patient_name, "Kept");
        assert_eq!(parsed.transactions[0].date, "14/09/2025");
    }

    #[test]
    fn test_ipd_header_found_by_patient_name_and_named_columns() {
        let mut header = vec![Cell::Empty; 6];
        header[0] = text("Patient Name");
        header[1] = text("Bill Date");
        header[2] = text("PatientName");
        header[3] = text("Deposit");
        let mut row = vec![Cell::Empty; 6];
        row[2] = text("Sita Devi");
        row[1] = text("02/09/2025");
        row[3] = Cell::Number(3000.0);
        let grid = vec![vec![text("Report")], header, row];
        let parsed = ImporterKind::Ipd.parse(&grid, "ipd.xlsx");
        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.transactions[0].patient_name, "Sita Devi");
        assert_eq!(parsed.transactions[0].calculated_share, 600.0);
    }

    #[test]
    fn test_ipd_header_fallback_row() {
        // No recognizable header: data starts after row 3.
        let mut grid: Grid = (0..4).map(|_| vec![text("junk")]).collect();
        grid.push(ipd_row("Fallback", text("05/09/2025"), Cell::Number(1000.0), ""));
        let parsed = ImporterKind::Ipd.parse(&grid, "ipd.xlsx");
        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.transactions[0].gross_amount, 1000.0);
    }

    #[test]
    fn test_resolve_falls_back_to_fixed_position() {
        let header = HeaderMap::from_row(&[text("Deposit"), text("Other")]);
        let row = vec![Cell::Empty, text("x"), text("fallback")];
        let cols = [Column::Named("Deposit"), Column::Named("Missing"), Column::Fixed(2)];
        assert_eq!(resolve(&row, &header, &cols), &text("fallback"));
        assert_eq!(resolve(&row, &header, &[Column::Fixed(9)]), &Cell::Empty);
    }

    #[test]
    fn test_opd_consultation_share() {
        let grid = opd_grid(vec![opd_row(
            "01/09/2025",
            "Anil",
            "Dr Visit",
            "Consultancy OPD",
            500.0,
        )]);
        let parsed = ImporterKind::Opd.parse(&grid, "opd.xlsx");
        let txn = &parsed.transactions[0];
        assert_eq!(txn.category, Category::OpdConsultation);
        assert_eq!(txn.source_type, SourceType::OpdConsult);
        assert_eq!(txn.calculated_share, 350.0);
    }

    #[test]
    fn test_opd_consult_in_service_name() {
        let grid = opd_grid(vec![opd_row("01/09/2025", "Anil", "Follow-up CONSULTATION", "OPD", 300.0)]);
        let parsed = ImporterKind::Opd.parse(&grid, "opd.xlsx");
        assert_eq!(parsed.transactions[0].category, Category::OpdConsultation);
        assert_eq!(parsed.transactions[0].calculated_share, 210.0);
    }

    #[test]
    fn test_opd_procedure_share() {
        let grid = opd_grid(vec![opd_row("01/09/2025", "Anil", "Suturing of wound", "Procedure", 1200.0)]);
        let parsed = ImporterKind::Opd.parse(&grid, "opd.xlsx");
        let txn = &parsed.transactions[0];
        assert_eq!(txn.category, Category::OpdProcedure);
        assert_eq!(txn.calculated_share, 600.0);
    }

    #[test]
    fn test_opd_drops_excluded_and_invalid_rows() {
        let grid = opd_grid(vec![
            opd_row("01/09/2025", "", "Suturing", "Procedure", 800.0),
            opd_row("01/09/2025", "B", "CBC", "Laboratory", 300.0),
            opd_row("01/09/2025", "C", "2D Echo", "Procedure", 1500.0),
            opd_row("01/09/2025", "D", "Incision and drainage", "Procedure", 0.0),
            opd_row("01/09/2025", "E", "Incision and drainage", "Procedure", 900.0),
        ]);
        let parsed = ImporterKind::Opd.parse(&grid, "opd.xlsx");
        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.dropped, 4);
        assert_eq!(parsed.transactions[0].patient_name, "E");
    }

    #[test]
    fn test_ids_ignore_filename_and_row_order() {
        let rows = vec![
            opd_row("01/09/2025", "A", "Dressing", "Procedure", 400.0),
            opd_row("02/09/2025", "B", "Consultation", "Consultancy OPD", 500.0),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();
        let a = ImporterKind::Opd.parse(&opd_grid(rows), "first.xlsx");
        let b = ImporterKind::Opd.parse(&opd_grid(reversed), "second.xlsx");
        let mut ids_a: Vec<_> = a.transactions.iter().map(|t| t.id.clone()).collect();
        let mut ids_b: Vec<_> = b.transactions.iter().map(|t| t.id.clone()).collect();
        ids_a.sort();
        ids_b.sort();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_ipd_and_opd_ids_do_not_collide() {
        let sig = "14/09/2025|A|IPD Treatment|1000";
        assert_ne!(content_id("ipd", sig), content_id("opd", &format!("opd|{sig}")));
        assert_eq!(content_id("ipd", sig), content_id("ipd", sig));
    }

    #[test]
    fn test_get_by_key() {
        assert_eq!(get_by_key("ipd"), Some(ImporterKind::Ipd));
        assert_eq!(get_by_key("opd"), Some(ImporterKind::Opd));
        assert_eq!(get_by_key("csv"), None);
    }

    #[test]
    fn test_parse_batch_continues_past_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("broken.xlsx");
        std::fs::write(&bad, b"not a workbook").unwrap();
        let good = dir.path().join("opd.csv");
        let mut header = vec![""; 21];
        header[OPD_DATE] = "Date";
        header[OPD_PATIENT] = "Patient";
        header[OPD_SERVICE_NAME] = "Service";
        header[OPD_SERVICE_TYPE] = "Type";
        header[OPD_NET_AMOUNT] = "Net";
        let mut data = vec![""; 21];
        data[OPD_DATE] = "01/09/2025";
        data[OPD_PATIENT] = "Anil";
        data[OPD_SERVICE_NAME] = "Consultation";
        data[OPD_SERVICE_TYPE] = "Consultancy OPD";
        data[OPD_NET_AMOUNT] = "500";
        let content = format!("{}\n{}\n", header.join(","), data.join(","));
        std::fs::write(&good, content).unwrap();

        let report = parse_batch(&[bad, good], None);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].file, "broken.xlsx");
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.transactions.len(), 1);
        assert_eq!(report.transactions[0].calculated_share, 350.0);
    }
}
