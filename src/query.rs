//! SOQL construction shared by the enumeration and batch-fetch stages.
//!
//! Both stages must select overlapping id spaces: every id the manifest
//! records has to be refetchable by a batch query. Deriving every query
//! from one per-kind field table keeps the two in sync.

use crate::record::RecordKind;

/// Metadata fields selected by the enumeration query. Everything the
/// manifest needs, no content payloads.
fn enumeration_fields(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Attachment => {
            "Id, ContentType, Description, Name, OwnerId, ParentId, \
             CreatedById, CreatedDate, LastModifiedDate"
        }
        RecordKind::Note => {
            "Id, Title, OwnerId, ParentId, CreatedById, CreatedDate, LastModifiedDate"
        }
    }
}

/// Fields selected by the per-batch re-query. Note bodies ride along
/// here; attachment bodies come from the content endpoint instead.
fn batch_fields(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Attachment => "Id, ContentType, Description, Name, OwnerId, ParentId",
        RecordKind::Note => "Id, Body, Title, OwnerId, ParentId",
    }
}

/// Enumeration query: all records whose parent falls inside
/// `parent_scope`, a SOQL fragment yielding parent ids (a sub-select or a
/// quoted id list).
pub fn enumeration_query(kind: RecordKind, parent_scope: &str) -> String {
    format!(
        "SELECT {} FROM {} WHERE ParentId IN ({})",
        enumeration_fields(kind),
        kind.sobject(),
        parent_scope
    )
}

/// Batch re-fetch query restricted to exactly the ids of one batch.
pub fn batch_query(kind: RecordKind, ids: &[String]) -> String {
    let quoted: Vec<String> = ids.iter().map(|id| format!("'{}'", id)).collect();
    format!(
        "SELECT {} FROM {} WHERE Id IN ({})",
        batch_fields(kind),
        kind.sobject(),
        quoted.join(",")
    )
}
