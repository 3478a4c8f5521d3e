//! Enumeration stage: one manifest CSV per kind, plus the identifier set
//! that feeds the fetch stage.

use crate::config::ExportOptions;
use crate::error::ExportError;
use crate::query::enumeration_query;
use crate::record::{Record, RecordKind};
use crate::sanitize::sanitized_path;
use crate::source::QueryExecutor;
use crate::util::create_with_backoff;
use ahash::AHashSet;
use std::io::{BufWriter, Write};

const ATTACHMENT_HEADER: [&str; 9] = [
    "FirstPublishLocationId",
    "AttachmentId",
    "VersionData",
    "PathOnClient",
    "Title",
    "OwnerId",
    "CreatedDate",
    "CreatedById",
    "LastModifiedDate",
];

const NOTE_HEADER: [&str; 10] = [
    "LinkedEntityId",
    "LegacyNoteId",
    "Title",
    "OwnerId",
    "Content",
    "CreatedDate",
    "CreatedById",
    "LastModifiedDate",
    "ShareType",
    "Visibility",
];

/// Minimal-quoting CSV: a field is wrapped in `|` quotes only when it
/// contains the delimiter, the quote character, or a line break; embedded
/// quote characters are doubled.
fn write_csv_row<W: Write>(w: &mut W, fields: &[&str]) -> std::io::Result<()> {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        if field.contains([',', '|', '\n', '\r']) {
            write!(w, "|{}|", field.replace('|', "||"))?;
        } else {
            w.write_all(field.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

/// Run the kind's enumeration query, write its manifest, and return the
/// set of record ids discovered.
///
/// The manifest maps every record to the local path the fetch stage will
/// write; row order follows the query result. A failure mid-stream may
/// leave a partial manifest behind (no rollback).
pub fn build_manifest<Q: QueryExecutor>(
    source: &Q,
    opts: &ExportOptions,
    kind: RecordKind,
) -> Result<AHashSet<String>, ExportError> {
    std::fs::create_dir_all(&opts.output_dir)?;

    let rows = source.query_all(&enumeration_query(kind, &opts.parent_scope))?;

    let manifest_path = opts.output_dir.join(kind.manifest_file_name());
    let file = create_with_backoff(&manifest_path, 16, 50)?;
    let mut w = BufWriter::with_capacity(opts.write_buffer_bytes, file);

    match kind {
        RecordKind::Attachment => write_csv_row(&mut w, &ATTACHMENT_HEADER)?,
        RecordKind::Note => write_csv_row(&mut w, &NOTE_HEADER)?,
    }

    let mut ids = AHashSet::with_capacity(rows.len());
    for row in &rows {
        let record = Record::from_row(kind, row)?;
        let path = sanitized_path(&opts.output_dir, &record.file_title(kind), &record.id);
        let path_str = path.to_string_lossy();
        match kind {
            // Local path twice: once as the storage location, once as the
            // client path the migration tooling expects.
            RecordKind::Attachment => write_csv_row(
                &mut w,
                &[
                    &record.parent_id,
                    &record.id,
                    &path_str,
                    &path_str,
                    &record.title,
                    &record.owner_id,
                    &record.created_date,
                    &record.created_by_id,
                    &record.last_modified_date,
                ],
            )?,
            RecordKind::Note => write_csv_row(
                &mut w,
                &[
                    &record.parent_id,
                    &record.id,
                    &record.title,
                    &record.owner_id,
                    &path_str,
                    &record.created_date,
                    &record.created_by_id,
                    &record.last_modified_date,
                    &opts.share_type,
                    &opts.visibility,
                ],
            )?,
        }
        ids.insert(record.id);
    }
    w.flush()?;

    tracing::info!("Found {} total {} records", ids.len(), kind);
    Ok(ids)
}
