#[path = "common/mod.rs"]
mod common;

use common::*;
use sfexport::{BatchErrorPolicy, ExportError, KindReport, SalesforceExport};

fn export_into(dir: &std::path::Path) -> SalesforceExport {
    SalesforceExport::new()
        .output_dir(dir)
        .parent_scope("SELECT Id FROM Account WHERE Name = 'Acme'")
        .progress(false)
}

/// Full run over both kinds: manifests plus one file per record.
#[test]
fn exports_both_kinds_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let source = FakeSource::new(vec![
        attachment_row("00P1", "a.pdf"),
        attachment_row("00P2", "b.pdf"),
        note_row("00N1", "minutes", Some("body text")),
    ]);
    let fetcher = FakeFetcher::new();

    let report = export_into(dir.path())
        .batch_size(50)
        .run(&source, &fetcher)
        .unwrap();

    assert!(report.success());
    assert!(dir.path().join("files.csv").exists());
    assert!(dir.path().join("content_notes.csv").exists());
    assert!(dir.path().join("00P1-a.pdf").exists());
    assert!(dir.path().join("00P2-b.pdf").exists());
    assert!(dir.path().join("00N1-minutes.txt").exists());

    match report.attachments.as_ref().unwrap() {
        KindReport::Completed {
            manifest_rows,
            summary,
        } => {
            assert_eq!(*manifest_rows, 2);
            assert_eq!(summary.saved, 2);
        }
        KindReport::Failed(e) => panic!("attachments failed: {e}"),
    }
    match report.notes.as_ref().unwrap() {
        KindReport::Completed {
            manifest_rows,
            summary,
        } => {
            assert_eq!(*manifest_rows, 1);
            assert_eq!(summary.saved, 1);
        }
        KindReport::Failed(e) => panic!("notes failed: {e}"),
    }
}

#[test]
fn disabled_kind_is_skipped_entirely() {
    let dir = tempfile::tempdir().unwrap();
    let source = FakeSource::new(vec![attachment_row("00P1", "a.pdf")]);
    let fetcher = FakeFetcher::new();

    let report = export_into(dir.path())
        .notes(false)
        .run(&source, &fetcher)
        .unwrap();

    assert!(report.notes.is_none());
    assert!(report.attachments.is_some());
    assert!(!dir.path().join("content_notes.csv").exists());
}

/// Option validation happens before any query runs.
#[test]
fn zero_batch_size_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = FakeSource::new(vec![]);
    let fetcher = FakeFetcher::new();

    let err = export_into(dir.path())
        .batch_size(0)
        .run(&source, &fetcher)
        .unwrap_err();
    assert!(matches!(err, ExportError::Config(_)));
    assert!(source.queries.lock().unwrap().is_empty());
}

#[test]
fn missing_parent_scope_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = FakeSource::new(vec![]);
    let fetcher = FakeFetcher::new();

    let err = SalesforceExport::new()
        .output_dir(dir.path())
        .progress(false)
        .run(&source, &fetcher)
        .unwrap_err();
    assert!(matches!(err, ExportError::Config(_)));
}

/// A kind whose enumeration fails is reported as failed but does not
/// stop the other kind.
#[test]
fn kind_failure_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let source = FakeSource::new(vec![note_row("00N1", "n", Some("x"))]).fail_enumeration();
    let fetcher = FakeFetcher::new();

    let report = export_into(dir.path()).run(&source, &fetcher).unwrap();

    assert!(matches!(
        report.attachments,
        Some(KindReport::Failed(ExportError::Query(_)))
    ));
    assert!(matches!(
        report.notes,
        Some(KindReport::Failed(ExportError::Query(_)))
    ));
    assert!(!report.success());
    // both kinds were attempted: two enumeration queries went out
    assert_eq!(source.queries.lock().unwrap().len(), 2);
}

/// Partial success (a failed record) flips the report to unsuccessful.
#[test]
fn failed_record_fails_the_report() {
    let dir = tempfile::tempdir().unwrap();
    let source = FakeSource::new(vec![
        attachment_row("00P1", "a.pdf"),
        attachment_row("00P2", "b.pdf"),
    ]);
    let fetcher = FakeFetcher::new().fail_id("00P2");

    let report = export_into(dir.path())
        .notes(false)
        .batch_error_policy(BatchErrorPolicy::Continue)
        .run(&source, &fetcher)
        .unwrap();

    assert!(!report.success());
    assert!(dir.path().join("00P1-a.pdf").exists());
}
