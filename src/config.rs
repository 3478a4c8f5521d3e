use crate::error::ExportError;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Policy for a failed per-batch re-query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchErrorPolicy {
    /// Propagate the failure and abort the kind's remaining batches.
    FailFast,
    /// Log the failure, count the batch against the summary, keep going.
    Continue,
}

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub parent_scope: String,        // SOQL fragment yielding parent ids
    pub attachments: bool,
    pub notes: bool,
    pub batch_size: usize,           // ids per re-fetch query
    pub fetch_concurrency: usize,    // attachment download workers per batch
    pub share_type: String,          // Note manifest ShareType column
    pub visibility: String,          // Note manifest Visibility column
    pub batch_error_policy: BatchErrorPolicy,
    pub progress: bool,              // show progress bar
    pub progress_label: Option<String>, // optional label for progress bar
    pub http_timeout: Duration,      // per-request cap for the REST client
    pub cancel: Option<Arc<AtomicBool>>, // checked between batches and fetches

    // IO tuning
    pub write_buffer_bytes: usize,   // BufWriter capacity for the manifest
}

impl Default for ExportOptions {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(8);

        Self {
            output_dir: PathBuf::from("./export"),
            parent_scope: String::new(),
            attachments: true,
            notes: true,
            batch_size: 100, // sized to stay within one REST result page
            fetch_concurrency: workers,
            share_type: "V".to_string(),
            visibility: "AllUsers".to_string(),
            batch_error_policy: BatchErrorPolicy::Continue,
            progress: true,
            progress_label: None,
            http_timeout: Duration::from_secs(60),
            cancel: None,

            write_buffer_bytes: 256 * 1024,
        }
    }
}

impl ExportOptions {
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_parent_scope(mut self, scope: impl AsRef<str>) -> Self {
        self.parent_scope = scope.as_ref().trim().to_string();
        self
    }
    pub fn with_attachments(mut self, yes: bool) -> Self {
        self.attachments = yes;
        self
    }
    pub fn with_notes(mut self, yes: bool) -> Self {
        self.notes = yes;
        self
    }
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }
    pub fn with_fetch_concurrency(mut self, n: usize) -> Self {
        self.fetch_concurrency = n.max(1);
        self
    }
    pub fn with_share_type(mut self, share_type: impl Into<String>) -> Self {
        self.share_type = share_type.into();
        self
    }
    pub fn with_visibility(mut self, visibility: impl Into<String>) -> Self {
        self.visibility = visibility.into();
        self
    }
    pub fn with_batch_error_policy(mut self, policy: BatchErrorPolicy) -> Self {
        self.batch_error_policy = policy;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }
    pub fn with_write_buffer(mut self, bytes: usize) -> Self {
        self.write_buffer_bytes = bytes.max(8 * 1024);
        self
    }

    /// Reject invalid settings before any network call is made.
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.batch_size == 0 {
            return Err(ExportError::Config("batch_size must be positive".into()));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ExportError::Config("output_dir must not be empty".into()));
        }
        if (self.attachments || self.notes) && self.parent_scope.is_empty() {
            return Err(ExportError::Config(
                "parent_scope is required when any record kind is enabled".into(),
            ));
        }
        Ok(())
    }
}
