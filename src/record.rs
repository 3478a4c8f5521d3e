//! Record kinds and the common record shape parsed from SOQL result rows.

use crate::error::ExportError;
use serde_json::Value;
use std::fmt;

/// The two exportable kinds. Each carries its own manifest schema, SOQL
/// field set, and fetch strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Classic Attachment: binary payload fetched per record over HTTP.
    Attachment,
    /// Classic Note: text body delivered inline by the batch query.
    Note,
}

impl RecordKind {
    /// Salesforce object name used in SOQL FROM clauses.
    pub fn sobject(self) -> &'static str {
        match self {
            RecordKind::Attachment => "Attachment",
            RecordKind::Note => "Note",
        }
    }

    /// Field holding the record's display title.
    pub fn title_field(self) -> &'static str {
        match self {
            RecordKind::Attachment => "Name",
            RecordKind::Note => "Title",
        }
    }

    /// Manifest file written next to the exported content.
    pub fn manifest_file_name(self) -> &'static str {
        match self {
            RecordKind::Attachment => "files.csv",
            RecordKind::Note => "content_notes.csv",
        }
    }

    /// Suffix appended to the title before the file name is sanitized.
    pub(crate) fn title_suffix(self) -> &'static str {
        match self {
            RecordKind::Attachment => "",
            RecordKind::Note => ".txt",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Attachment => write!(f, "attachment"),
            RecordKind::Note => write!(f, "note"),
        }
    }
}

/// One SOQL result row in the shape both pipeline stages consume.
///
/// Metadata fields are kept as the opaque strings Salesforce returned and
/// written to the manifest verbatim. Only `Id` is mandatory; everything
/// else defaults to empty.
#[derive(Clone, Debug)]
pub struct Record {
    pub id: String,
    pub parent_id: String,
    pub title: String,
    pub owner_id: String,
    pub created_date: String,
    pub created_by_id: String,
    pub last_modified_date: String,
    /// Note body from the batch query; never present on enumeration rows.
    pub body: Option<String>,
}

fn str_field(row: &Value, name: &str) -> String {
    row.get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

impl Record {
    /// Parse a SOQL result row. Rows without an `Id` are malformed and
    /// rejected.
    pub fn from_row(kind: RecordKind, row: &Value) -> Result<Self, ExportError> {
        let id = str_field(row, "Id");
        if id.is_empty() {
            return Err(ExportError::Query(format!("{kind} row is missing Id")));
        }
        Ok(Self {
            parent_id: str_field(row, "ParentId"),
            title: str_field(row, kind.title_field()),
            owner_id: str_field(row, "OwnerId"),
            created_date: str_field(row, "CreatedDate"),
            created_by_id: str_field(row, "CreatedById"),
            last_modified_date: str_field(row, "LastModifiedDate"),
            body: row.get("Body").and_then(Value::as_str).map(str::to_string),
            id,
        })
    }

    /// Title with the kind's suffix, as used for the exported file name.
    pub fn file_title(&self, kind: RecordKind) -> String {
        format!("{}{}", self.title, kind.title_suffix())
    }
}
