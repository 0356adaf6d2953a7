//! Procedure record types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One procedure in the catalogue.
///
/// Serialized field names follow the catalogue's column names so that
/// stored documents and CSV exports share one vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Opaque identifier assigned by the store.
    #[serde(default)]
    pub id: String,

    /// Standard the procedure follows (e.g. old or new standard).
    #[serde(rename = "chuanqtkt", default)]
    pub standard_category: String,

    /// Issuing decision reference and date.
    #[serde(rename = "qdbanhanh", default)]
    pub issuing_decision_ref: String,

    /// Department or specialty name.
    #[serde(rename = "chuyenkhoa", default)]
    pub specialty: String,

    /// Procedure name; the primary search field.
    #[serde(rename = "tenqtkt", default)]
    pub procedure_name: String,

    /// Creation time assigned by the store.
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Returns the text of one field.
    pub fn field(&self, field: RecordField) -> &str {
        match field {
            RecordField::StandardCategory => &self.standard_category,
            RecordField::IssuingDecisionRef => &self.issuing_decision_ref,
            RecordField::Specialty => &self.specialty,
            RecordField::ProcedureName => &self.procedure_name,
        }
    }
}

/// A record as produced by an import, before the store assigns an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    #[serde(rename = "chuanqtkt", default)]
    pub standard_category: String,

    #[serde(rename = "qdbanhanh", default)]
    pub issuing_decision_ref: String,

    #[serde(rename = "chuyenkhoa", default)]
    pub specialty: String,

    #[serde(rename = "tenqtkt", default)]
    pub procedure_name: String,
}

impl NewRecord {
    pub fn new(
        standard_category: impl Into<String>,
        issuing_decision_ref: impl Into<String>,
        specialty: impl Into<String>,
        procedure_name: impl Into<String>,
    ) -> Self {
        Self {
            standard_category: standard_category.into(),
            issuing_decision_ref: issuing_decision_ref.into(),
            specialty: specialty.into(),
            procedure_name: procedure_name.into(),
        }
    }

    /// Turns this into a stored record.
    pub fn into_record(self, id: impl Into<String>, created_at: DateTime<Utc>) -> Record {
        Record {
            id: id.into(),
            standard_category: self.standard_category,
            issuing_decision_ref: self.issuing_decision_ref,
            specialty: self.specialty,
            procedure_name: self.procedure_name,
            created_at: Some(created_at),
        }
    }
}

impl From<&Record> for NewRecord {
    fn from(record: &Record) -> Self {
        Self {
            standard_category: record.standard_category.clone(),
            issuing_decision_ref: record.issuing_decision_ref.clone(),
            specialty: record.specialty.clone(),
            procedure_name: record.procedure_name.clone(),
        }
    }
}

/// The four text fields of a record; also the sortable columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum RecordField {
    StandardCategory,
    IssuingDecisionRef,
    Specialty,
    ProcedureName,
}

impl RecordField {
    pub const ALL: [RecordField; 4] = [
        Self::StandardCategory,
        Self::IssuingDecisionRef,
        Self::Specialty,
        Self::ProcedureName,
    ];

    /// Column name used in CSV files and stored documents.
    pub fn column(&self) -> &'static str {
        match self {
            Self::StandardCategory => "chuanqtkt",
            Self::IssuingDecisionRef => "qdbanhanh",
            Self::Specialty => "chuyenkhoa",
            Self::ProcedureName => "tenqtkt",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StandardCategory => "standard_category",
            Self::IssuingDecisionRef => "issuing_decision_ref",
            Self::Specialty => "specialty",
            Self::ProcedureName => "procedure_name",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown field name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown record field '{0}'")]
pub struct ParseRecordFieldError(String);

impl FromStr for RecordField {
    type Err = ParseRecordFieldError;

    /// Accepts both the snake_case name and the column name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == wanted || field.column() == wanted)
            .ok_or(ParseRecordFieldError(wanted))
    }
}
