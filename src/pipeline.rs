use crate::config::{BatchErrorPolicy, ExportOptions};
use crate::error::ExportError;
use crate::fetch::{fetch_all, FetchSummary};
use crate::manifest::build_manifest;
use crate::record::RecordKind;
use crate::source::{ContentFetcher, QueryExecutor};
use crate::util::init_tracing_once;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of one kind's manifest + fetch pass.
#[derive(Debug)]
pub enum KindReport {
    Completed {
        manifest_rows: usize,
        summary: FetchSummary,
    },
    /// The kind's pipeline aborted (enumeration or fetch pass failure).
    Failed(ExportError),
}

impl KindReport {
    pub fn clean(&self) -> bool {
        matches!(self, KindReport::Completed { summary, .. } if summary.clean())
    }
}

/// Aggregated outcome of a full export run; one entry per enabled kind.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub attachments: Option<KindReport>,
    pub notes: Option<KindReport>,
}

impl ExportReport {
    /// True when every enabled kind completed with no failed batches or
    /// records. Drives the binary's exit code.
    pub fn success(&self) -> bool {
        self.attachments
            .iter()
            .chain(self.notes.iter())
            .all(KindReport::clean)
    }
}

/// Fluent driver for the two-stage export.
#[derive(Clone)]
pub struct SalesforceExport {
    pub(crate) opts: ExportOptions,
}

impl SalesforceExport {
    pub fn new() -> Self {
        Self {
            opts: ExportOptions::default(),
        }
    }

    // -------- Builder methods --------
    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self { self.opts = self.opts.with_output_dir(dir); self }
    pub fn parent_scope(mut self, scope: impl AsRef<str>) -> Self { self.opts = self.opts.with_parent_scope(scope); self }
    pub fn attachments(mut self, yes: bool) -> Self { self.opts = self.opts.with_attachments(yes); self }
    pub fn notes(mut self, yes: bool) -> Self { self.opts = self.opts.with_notes(yes); self }
    pub fn batch_size(mut self, size: usize) -> Self { self.opts = self.opts.with_batch_size(size); self }
    pub fn fetch_concurrency(mut self, n: usize) -> Self { self.opts = self.opts.with_fetch_concurrency(n); self }
    pub fn share_type(mut self, share_type: impl Into<String>) -> Self { self.opts = self.opts.with_share_type(share_type); self }
    pub fn visibility(mut self, visibility: impl Into<String>) -> Self { self.opts = self.opts.with_visibility(visibility); self }
    pub fn batch_error_policy(mut self, policy: BatchErrorPolicy) -> Self { self.opts = self.opts.with_batch_error_policy(policy); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_label(mut self, label: impl Into<String>) -> Self { self.opts = self.opts.with_progress_label(label); self }
    pub fn http_timeout(mut self, timeout: Duration) -> Self { self.opts = self.opts.with_http_timeout(timeout); self }
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self { self.opts = self.opts.with_cancel_flag(flag); self }
    pub fn write_buffer(mut self, bytes: usize) -> Self { self.opts = self.opts.with_write_buffer(bytes); self }

    /// Run the export: for each enabled kind, the manifest pass then the
    /// batched fetch pass. A failure in one kind is recorded on the
    /// report and does not stop the other.
    pub fn run<Q, C>(self, source: &Q, fetcher: &C) -> Result<ExportReport, ExportError>
    where
        Q: QueryExecutor,
        C: ContentFetcher + Sync,
    {
        init_tracing_once();
        self.opts.validate()?;
        if self.opts.fetch_concurrency > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.opts.fetch_concurrency)
                .build_global()
                .ok();
        }

        let mut report = ExportReport::default();
        if self.opts.attachments {
            report.attachments = Some(self.run_kind(source, fetcher, RecordKind::Attachment));
        }
        if self.opts.notes {
            report.notes = Some(self.run_kind(source, fetcher, RecordKind::Note));
        }
        Ok(report)
    }

    fn run_kind<Q, C>(&self, source: &Q, fetcher: &C, kind: RecordKind) -> KindReport
    where
        Q: QueryExecutor,
        C: ContentFetcher + Sync,
    {
        tracing::info!("Querying to get {} ids...", kind);
        let ids = match build_manifest(source, &self.opts, kind) {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(kind = %kind, error = %e, "Enumeration failed");
                return KindReport::Failed(e);
            }
        };
        let manifest_rows = ids.len();
        match fetch_all(source, fetcher, &self.opts, kind, &ids) {
            Ok(summary) => KindReport::Completed {
                manifest_rows,
                summary,
            },
            Err(e) => {
                tracing::error!(kind = %kind, error = %e, "Fetch pass failed");
                KindReport::Failed(e)
            }
        }
    }
}

impl Default for SalesforceExport {
    fn default() -> Self {
        Self::new()
    }
}
