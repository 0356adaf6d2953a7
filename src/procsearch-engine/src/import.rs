//! CSV import of catalogue spreadsheets.
//!
//! The header must name the four catalogue columns, in any order; other
//! columns are ignored. A data row whose field count differs from the
//! header's is skipped and reported, never fatal.

use csv::StringRecord;
use serde::Serialize;

use crate::error::ImportError;
use crate::record::{NewRecord, RecordField};

/// Columns every import file must have.
pub const REQUIRED_COLUMNS: [&str; 4] = ["chuanqtkt", "qdbanhanh", "chuyenkhoa", "tenqtkt"];

/// Maximum number of chars of a skipped line kept in its report.
const PREVIEW_CHARS: usize = 100;

/// Number of skipped rows logged individually.
const LOGGED_SKIPS: usize = 10;

/// A data row left out of the import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// 1-based line number in the file.
    pub line: usize,
    pub expected: usize,
    pub actual: usize,
    /// Start of the offending row.
    pub preview: String,
}

/// Outcome of parsing one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub records: Vec<NewRecord>,
    pub skipped: Vec<SkippedRow>,
    /// Non-blank data rows seen, parsed or skipped.
    pub total_rows: usize,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Parses a whole CSV document.
///
/// Fields are trimmed and may be quoted; a quoted field can hold commas,
/// doubled quotes and line breaks. Blank lines are ignored.
pub fn parse_csv(text: &str) -> Result<ImportReport, ImportError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if header.iter().all(String::is_empty) {
        return Err(ImportError::NotEnoughRows);
    }

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !header.iter().any(|h| h == column))
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::missing_columns(REQUIRED_COLUMNS, missing));
    }

    let position = |field: RecordField| header.iter().position(|h| h == field.column());
    let columns = ColumnMap {
        standard_category: position(RecordField::StandardCategory),
        issuing_decision_ref: position(RecordField::IssuingDecisionRef),
        specialty: position(RecordField::Specialty),
        procedure_name: position(RecordField::ProcedureName),
    };

    let mut report = ImportReport::default();
    for result in reader.records() {
        let row = result?;
        if row.iter().all(str::is_empty) {
            continue;
        }
        report.total_rows += 1;
        if row.len() != header.len() {
            report.skipped.push(SkippedRow {
                line: row.position().map_or(0, |p| p.line() as usize),
                expected: header.len(),
                actual: row.len(),
                preview: preview(&row),
            });
            continue;
        }
        report.records.push(columns.extract(&row));
    }

    if report.total_rows == 0 {
        return Err(ImportError::NotEnoughRows);
    }

    for row in report.skipped.iter().take(LOGGED_SKIPS) {
        tracing::warn!(
            line = row.line,
            expected = row.expected,
            actual = row.actual,
            preview = %row.preview,
            "skipped CSV row with wrong column count"
        );
    }
    tracing::info!(
        parsed = report.records.len(),
        skipped = report.skipped.len(),
        total = report.total_rows,
        "parsed CSV import"
    );

    Ok(report)
}

struct ColumnMap {
    standard_category: Option<usize>,
    issuing_decision_ref: Option<usize>,
    specialty: Option<usize>,
    procedure_name: Option<usize>,
}

impl ColumnMap {
    fn extract(&self, row: &StringRecord) -> NewRecord {
        let take = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(str::to_string)
                .unwrap_or_default()
        };
        NewRecord {
            standard_category: take(self.standard_category),
            issuing_decision_ref: take(self.issuing_decision_ref),
            specialty: take(self.specialty),
            procedure_name: take(self.procedure_name),
        }
    }
}

/// The row's fields joined back with commas, cut to `PREVIEW_CHARS`.
fn preview(row: &StringRecord) -> String {
    let line = row.iter().collect::<Vec<_>>().join(",");
    let mut chars = line.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
