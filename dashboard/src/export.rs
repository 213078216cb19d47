//! # Export Formatter
//!
//! Turns attendance rows into CSV text or a paginated PDF table. Columns are
//! always `Student ID, Student Name, Date, Status`, dates are `MM/DD/YYYY`
//! and statuses are capitalized.

use chrono::NaiveDate;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use shared::AttendanceStatus;
use std::fmt;
use thiserror::Error;
use tracing::info;

pub const COLUMNS: [&str; 4] = ["Student ID", "Student Name", "Date", "Status"];

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 14.0;
const ROW_HEIGHT: f32 = 7.0;
const COLUMN_X: [f32; 4] = [14.0, 54.0, 124.0, 164.0];

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No data to export")]
    NoData,

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Export I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export produced invalid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("PDF export failed: {0}")]
    Pdf(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub business_id: String,
    pub display_name: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

impl ExportRow {
    fn cells(&self) -> [String; 4] {
        [
            self.business_id.clone(),
            self.display_name.clone(),
            format_date(self.date),
            self.status.label().to_string(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

/// `Attendance_<label>.<ext>`
pub fn file_name(label: &str, format: ExportFormat) -> String {
    format!("Attendance_{}.{}", label, format.extension())
}

pub fn to_csv(rows: &[ExportRow]) -> Result<String, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::NoData);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for row in rows {
        writer.write_record(row.cells())?;
    }
    writer.flush()?;

    let bytes = writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    info!("Exported {} rows as CSV", rows.len());
    Ok(String::from_utf8(bytes)?)
}

/// Builtin PDF fonts only cover WinAnsi, so the separator stays ASCII
fn heading(title: &str) -> String {
    format!("Attendance Report - {}", title)
}

/// A4 PDF with a report heading above the table, paginated as needed
pub fn to_pdf(title: &str, rows: &[ExportRow]) -> Result<Vec<u8>, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::NoData);
    }

    let heading = heading(title);
    let (doc, first_page, first_layer) =
        PdfDocument::new(heading.as_str(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    layer.use_text(heading.as_str(), 16.0, Mm(MARGIN), Mm(PAGE_HEIGHT - 18.0), &bold);

    let header_y = PAGE_HEIGHT - 30.0;
    let mut y = header_y;
    let mut pages = 1;

    for (column, x) in COLUMNS.iter().zip(COLUMN_X) {
        layer.use_text(*column, 10.0, Mm(x), Mm(y), &bold);
    }
    y -= ROW_HEIGHT;

    for row in rows {
        if y < MARGIN {
            let (page, page_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            layer = doc.get_page(page).get_layer(page_layer);
            pages += 1;
            y = header_y;
            for (column, x) in COLUMNS.iter().zip(COLUMN_X) {
                layer.use_text(*column, 10.0, Mm(x), Mm(y), &bold);
            }
            y -= ROW_HEIGHT;
        }
        for (cell, x) in row.cells().iter().zip(COLUMN_X) {
            layer.use_text(cell.as_str(), 10.0, Mm(x), Mm(y), &font);
        }
        y -= ROW_HEIGHT;
    }

    let bytes = doc.save_to_bytes().map_err(|e| ExportError::Pdf(e.to_string()))?;
    info!("Exported {} rows as PDF over {} pages", rows.len(), pages);
    Ok(bytes)
}
