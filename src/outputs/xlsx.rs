//! Spreadsheet report.
//!
//! One worksheet named [`SHEET_NAME`], a bold header row, then one row per
//! record in extraction order:
//!
//! | title | description | published_at | image | contains_amount | search_term_count |
//! |-------|-------------|--------------|-------|-----------------|-------------------|
//! | text | text | `YYYY-MM-DD` or blank | `images/<file>` or blank | boolean | number |

use crate::error::ReportError;
use crate::models::ArticleRecord;
use calamine::{Data, Reader, Xlsx, open_workbook};
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, instrument};

pub const SHEET_NAME: &str = "News";

pub const HEADERS: [&str; 6] = [
    "title",
    "description",
    "published_at",
    "image",
    "contains_amount",
    "search_term_count",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One report row, as written and as read back from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub title: String,
    pub description: String,
    pub published_at: Option<NaiveDate>,
    pub image: String,
    pub contains_amount: bool,
    pub search_term_count: usize,
}

impl From<&ArticleRecord> for ReportRow {
    fn from(record: &ArticleRecord) -> Self {
        Self {
            title: record.title().to_string(),
            description: record.description().to_string(),
            published_at: record.published_at(),
            image: record.image_ref(),
            contains_amount: record.contains_amount(),
            search_term_count: record.search_term_count(),
        }
    }
}

impl ReportRow {
    /// Row for `record`, with the image cell left blank unless its file is
    /// among `saved`.
    pub fn with_saved_image(record: &ArticleRecord, saved: &HashSet<String>) -> Self {
        let mut row = Self::from(record);
        if let Some(image) = record.image() {
            if !saved.contains(&image.file_name) {
                row.image.clear();
            }
        }
        row
    }
}

/// Write `rows` to a new workbook at `path`, replacing any existing file.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = rows.len()))]
pub fn write_report(rows: &[ReportRow], path: &Path) -> Result<(), ReportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &bold)?;
    }

    for (i, record) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        let published_at = record
            .published_at
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default();

        sheet.write_string(row, 0, &record.title)?;
        sheet.write_string(row, 1, &record.description)?;
        sheet.write_string(row, 2, published_at)?;
        sheet.write_string(row, 3, &record.image)?;
        sheet.write_boolean(row, 4, record.contains_amount)?;
        sheet.write_number(row, 5, record.search_term_count as f64)?;
    }

    workbook.save(path)?;
    info!("Excel file created successfully");
    Ok(())
}

/// Read a report written by [`write_report`].
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn read_report(path: &Path) -> Result<Vec<ReportRow>, ReportError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook.worksheet_range(SHEET_NAME)?;
    let mut rows = range.rows();

    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| ReportError::Malformed("missing header row".to_string()))?
        .iter()
        .map(cell_text)
        .collect();
    if header != HEADERS {
        return Err(ReportError::Malformed(format!("unexpected header {header:?}")));
    }

    rows.enumerate()
        .map(|(i, row)| parse_row(i + 1, row))
        .collect()
}

fn parse_row(line: usize, row: &[Data]) -> Result<ReportRow, ReportError> {
    let cell = |col: usize| row.get(col).unwrap_or(&Data::Empty);
    let malformed = |what: &str| ReportError::Malformed(format!("row {line}: bad {what}"));

    let published_at = match cell_text(cell(2)).as_str() {
        "" => None,
        text => Some(NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| malformed("published_at"))?),
    };
    let contains_amount = match cell(4) {
        Data::Bool(b) => *b,
        Data::String(s) => s.parse().map_err(|_| malformed("contains_amount"))?,
        _ => return Err(malformed("contains_amount")),
    };
    let search_term_count = match cell(5) {
        Data::Float(f) if *f >= 0.0 => *f as usize,
        Data::Int(i) if *i >= 0 => *i as usize,
        Data::String(s) => s.parse().map_err(|_| malformed("search_term_count"))?,
        _ => return Err(malformed("search_term_count")),
    };

    Ok(ReportRow {
        title: cell_text(cell(0)),
        description: cell_text(cell(1)),
        published_at,
        image: cell_text(cell(3)),
        contains_amount,
        search_term_count,
    })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageRef;

    fn records() -> Vec<ArticleRecord> {
        vec![
            ArticleRecord::new(
                "Israel and Iran trade strikes",
                "Oil jumps to $90 as Israel war iran fears grow",
                NaiveDate::from_ymd_opt(2024, 4, 19),
                Some(ImageRef {
                    source: "https://example.com/a.jpg".to_string(),
                    file_name: "000-strikes.jpg".to_string(),
                }),
                "Israel",
            )
            .unwrap(),
            ArticleRecord::new("Undated piece", "", None, None, "Israel").unwrap(),
            ArticleRecord::new(
                "Aid pledge",
                "Donors pledge 50 USD per person",
                NaiveDate::from_ymd_opt(2024, 4, 2),
                None,
                "Israel",
            )
            .unwrap(),
        ]
    }

    #[test]
    fn test_round_trip_preserves_rows_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news.xlsx");
        let expected: Vec<ReportRow> = records().iter().map(ReportRow::from).collect();

        write_report(&expected, &path).unwrap();
        let rows = read_report(&path).unwrap();

        assert_eq!(rows, expected);
        assert_eq!(rows[0].image, "images/000-strikes.jpg");
        assert_eq!(rows[0].search_term_count, 2);
        assert!(rows[2].contains_amount);
    }

    #[test]
    fn test_unsaved_image_cell_is_blank() {
        let records = records();
        let none_saved = HashSet::new();
        assert_eq!(ReportRow::with_saved_image(&records[0], &none_saved).image, "");

        let saved = HashSet::from(["000-strikes.jpg".to_string()]);
        assert_eq!(
            ReportRow::with_saved_image(&records[0], &saved).image,
            "images/000-strikes.jpg"
        );
        assert_eq!(ReportRow::with_saved_image(&records[1], &saved).image, "");
    }

    #[test]
    fn test_empty_report_has_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news.xlsx");
        write_report(&[], &path).unwrap();
        assert!(read_report(&path).unwrap().is_empty());
    }

    #[test]
    fn test_unexpected_header_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME).unwrap();
        sheet.write_string(0, 0, "headline").unwrap();
        workbook.save(&path).unwrap();

        assert!(matches!(read_report(&path), Err(ReportError::Malformed(_))));
    }
}
