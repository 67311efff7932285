use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_xlsxwriter::{Color, Format, Workbook};

use crate::error::{RevenueError, Result};
use crate::export::{CellStyle, ReportGrid, ReportValue};
use crate::models::{Cell, Grid};

const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods", "csv"];

const VOID_FONT_COLOR: u32 = 0x999999;

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Read a billing export into a grid. Only the first sheet of a workbook is used.
pub fn read_grid(path: &Path) -> Result<Grid> {
    let ext = extension(path);
    if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(RevenueError::UnsupportedFile(path.display().to_string()));
    }
    let bytes = std::fs::read(path)?;
    if ext == "csv" {
        decode_csv(&bytes)
    } else {
        decode_workbook(bytes, &path.display().to_string())
    }
}

fn csv_field(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Cell::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Cell::Number(n),
        _ => Cell::Text(raw.to_string()),
    }
}

pub fn decode_csv(bytes: &[u8]) -> Result<Grid> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut grid = Vec::new();
    // Exports are not always UTF-8; undecodable bytes become U+FFFD.
    for result in rdr.byte_records() {
        let record = result?;
        grid.push(
            record
                .iter()
                .map(|field| csv_field(&String::from_utf8_lossy(field)))
                .collect(),
        );
    }
    Ok(grid)
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
    }
}

pub fn decode_workbook(bytes: Vec<u8>, name: &str) -> Result<Grid> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| RevenueError::EmptyWorkbook(name.to_string()))?;
    let range = workbook.worksheet_range(&sheet_name)?;

    // Ranges begin at the first used cell; pad so fixed column positions hold.
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut grid: Grid = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; start_col as usize];
        cells.extend(row.iter().map(data_to_cell));
        grid.push(cells);
    }
    Ok(grid)
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

fn style_format(style: CellStyle) -> Format {
    match style {
        CellStyle::Plain => Format::new(),
        CellStyle::Bold => Format::new().set_bold(),
        CellStyle::Void => Format::new()
            .set_font_strikethrough()
            .set_font_color(Color::RGB(VOID_FONT_COLOR)),
    }
}

pub fn write_report(report: &ReportGrid, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&report.sheet_name)?;

    for (col, width) in report.column_widths.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }

    for (r, row) in report.rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let format = style_format(cell.style);
            let (r, c) = (r as u32, c as u16);
            match &cell.value {
                ReportValue::Blank => {}
                ReportValue::Text(s) => {
                    worksheet.write_string_with_format(r, c, s, &format)?;
                }
                ReportValue::Number(n) => {
                    worksheet.write_number_with_format(r, c, *n, &format)?;
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ReportCell;

    #[test]
    fn test_read_grid_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        assert!(matches!(read_grid(&path), Err(RevenueError::UnsupportedFile(_))));
    }

    #[test]
    fn test_read_grid_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_grid(&dir.path().join("gone.xlsx")),
            Err(RevenueError::Io(_))
        ));
    }

    #[test]
    fn test_decode_csv_types_numbers() {
        let grid = decode_csv(b"Name,Amount,Date\nAnil, 500 ,14/09/2025\n,,\n").unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[1][0], Cell::Text("Anil".to_string()));
        assert_eq!(grid[1][1], Cell::Number(500.0));
        assert_eq!(grid[1][2], Cell::Text("14/09/2025".to_string()));
        assert_eq!(grid[2], vec![Cell::Empty, Cell::Empty, Cell::Empty]);
    }

    #[test]
    fn test_decode_csv_tolerates_non_utf8_bytes() {
        let grid = decode_csv(b"Caf\xe9 Wound Dressing,500\nAnil,300\n").unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0][0], Cell::Text("Caf\u{FFFD} Wound Dressing".to_string()));
        assert_eq!(grid[0][1], Cell::Number(500.0));
        assert_eq!(grid[1][1], Cell::Number(300.0));
    }

    #[test]
    fn test_decode_workbook_rejects_garbage() {
        let result = decode_workbook(b"definitely not a spreadsheet".to_vec(), "junk.xlsx");
        assert!(matches!(result, Err(RevenueError::Spreadsheet(_))));
    }

    #[test]
    fn test_xlsx_keeps_absolute_positions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offset.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(2, 3, "Patient").unwrap();
        sheet.write_number(3, 5, 1500.0).unwrap();
        workbook.save(&path).unwrap();

        let grid = read_grid(&path).unwrap();
        assert_eq!(grid[2][3], Cell::Text("Patient".to_string()));
        assert_eq!(grid[3][5], Cell::Number(1500.0));
        assert!(grid[0].is_empty());
    }

    #[test]
    fn test_write_report_round_trips_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.xlsx");
        let report = ReportGrid {
            sheet_name: "Revenue Report".to_string(),
            rows: vec![
                vec![ReportCell::text("IPD SECTIONS", CellStyle::Bold)],
                vec![
                    ReportCell::number(1.0, CellStyle::Void),
                    ReportCell::blank(),
                    ReportCell::text("Ramesh (VOID)", CellStyle::Void),
                ],
            ],
            column_widths: vec![6.0, 12.0, 25.0],
        };
        write_report(&report, &path).unwrap();

        let grid = read_grid(&path).unwrap();
        assert_eq!(grid[0][0], Cell::Text("IPD SECTIONS".to_string()));
        assert_eq!(grid[1][0], Cell::Number(1.0));
        assert_eq!(grid[1][2], Cell::Text("Ramesh (VOID)".to_string()));
    }
}
