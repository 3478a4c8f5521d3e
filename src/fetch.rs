//! Fetch stage: batched re-queries plus per-record content materialization.
//!
//! Batches run strictly one after another; the only fan-out is the bounded
//! map over a single batch's records. A record that fails to download or
//! write is logged and skipped, never fatal.

use crate::batch::split_into_batches;
use crate::concurrency::map_limited;
use crate::config::{BatchErrorPolicy, ExportOptions};
use crate::error::ExportError;
use crate::progress::make_count_progress;
use crate::query::batch_query;
use crate::record::{Record, RecordKind};
use crate::sanitize::sanitized_path;
use crate::source::{ContentFetcher, QueryExecutor};
use crate::util::create_with_backoff;
use ahash::AHashSet;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-kind tally returned by [`fetch_all`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchSummary {
    /// Ids scheduled for fetching (= identifier set cardinality).
    pub total_records: usize,
    pub saved: usize,
    /// Record-level fetch/write failures.
    pub failed: usize,
    /// Records never attempted: cancelled, or part of a failed batch.
    pub skipped: usize,
    /// Batch queries that failed under the `Continue` policy.
    pub failed_batches: usize,
    pub cancelled: bool,
}

impl FetchSummary {
    pub fn clean(&self) -> bool {
        self.failed == 0 && self.failed_batches == 0 && !self.cancelled
    }
}

enum Outcome {
    Saved,
    Failed,
    Skipped,
}

/// Re-fetch every id of the set in `batch_size` batches and write each
/// record's payload under the output directory.
pub fn fetch_all<Q, C>(
    source: &Q,
    fetcher: &C,
    opts: &ExportOptions,
    kind: RecordKind,
    ids: &AHashSet<String>,
) -> Result<FetchSummary, ExportError>
where
    Q: QueryExecutor,
    C: ContentFetcher + Sync,
{
    // Set iteration order is not stable across runs; batches are
    // independent, so any materialized order works.
    let id_list: Vec<String> = ids.iter().cloned().collect();
    let mut summary = FetchSummary {
        total_records: id_list.len(),
        ..Default::default()
    };
    if id_list.is_empty() {
        return Ok(summary);
    }

    let batches = split_into_batches(&id_list, opts.batch_size);
    let total_batches = batches.len();

    let default_label = format!("Fetching {}s", kind);
    let pb = if opts.progress {
        Some(make_count_progress(
            id_list.len() as u64,
            opts.progress_label.as_deref().unwrap_or(&default_label),
        ))
    } else {
        None
    };

    for (index, batch) in batches.iter().enumerate() {
        let batch_no = index + 1;
        if cancelled(opts) {
            summary.cancelled = true;
            summary.skipped += batches[index..].iter().map(|b| b.len()).sum::<usize>();
            tracing::warn!(
                "Cancellation requested; leaving {} batches unprocessed",
                total_batches - index
            );
            break;
        }

        tracing::info!("Processing batch {}/{}", batch_no, total_batches);
        let rows = match source.query(&batch_query(kind, batch)) {
            Ok(rows) => rows,
            Err(e) => match opts.batch_error_policy {
                BatchErrorPolicy::FailFast => return Err(e),
                BatchErrorPolicy::Continue => {
                    tracing::warn!(batch = batch_no, error = %e, "Batch query failed; continuing");
                    summary.failed_batches += 1;
                    summary.skipped += batch.len();
                    if let Some(pb) = &pb {
                        pb.inc(batch.len() as u64);
                    }
                    continue;
                }
            },
        };
        tracing::debug!("{} query found {} results", kind, rows.len());
        if rows.len() < batch.len() {
            tracing::debug!(
                "Batch {} returned {} of {} ids",
                batch_no,
                rows.len(),
                batch.len()
            );
        }

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            match Record::from_row(kind, row) {
                Ok(r) => records.push(r),
                Err(e) => {
                    tracing::warn!(batch = batch_no, error = %e, "Skipping malformed row");
                    summary.failed += 1;
                }
            }
        }

        let limit = match kind {
            RecordKind::Attachment => opts.fetch_concurrency,
            RecordKind::Note => 1,
        };

        let in_batch = records.len();
        let done = AtomicUsize::new(0);
        let outcomes = map_limited(&records, limit, |record| {
            if cancelled(opts) {
                return Outcome::Skipped;
            }
            let path = sanitized_path(&opts.output_dir, &record.file_title(kind), &record.id);
            let result = match kind {
                RecordKind::Attachment => save_attachment(fetcher, record, &path),
                RecordKind::Note => save_note(record, &path),
            };
            let m = done.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            match result {
                Ok(()) => {
                    tracing::debug!("({}/{}) Saved {}", m, in_batch, path.display());
                    Outcome::Saved
                }
                Err(e) => {
                    tracing::warn!(
                        batch = batch_no,
                        id = %record.id,
                        path = %path.display(),
                        error = %e,
                        "Record failed; continuing"
                    );
                    Outcome::Failed
                }
            }
        });

        for outcome in outcomes {
            match outcome {
                Outcome::Saved => summary.saved += 1,
                Outcome::Failed => summary.failed += 1,
                Outcome::Skipped => summary.skipped += 1,
            }
        }
        tracing::info!("All records in batch {} processed", batch_no);
    }

    if let Some(pb) = &pb {
        pb.finish_with_message("done");
    }
    tracing::info!("All batches complete");
    Ok(summary)
}

fn cancelled(opts: &ExportOptions) -> bool {
    opts.cancel
        .as_ref()
        .is_some_and(|flag| flag.load(Ordering::Relaxed))
}

fn save_attachment<C: ContentFetcher>(
    fetcher: &C,
    record: &Record,
    path: &Path,
) -> Result<(), ExportError> {
    let bytes = fetcher.fetch(&record.id)?;
    let mut file = create_with_backoff(path, 16, 50)?;
    file.write_all(&bytes)?;
    Ok(())
}

fn save_note(record: &Record, path: &Path) -> Result<(), ExportError> {
    // Absent/empty bodies still produce a file, matching the manifest row.
    let mut file = create_with_backoff(path, 16, 50)?;
    file.write_all(record.body.as_deref().unwrap_or_default().as_bytes())?;
    Ok(())
}
