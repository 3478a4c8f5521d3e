mod batch;
mod concurrency;
mod config;
mod error;
mod fetch;
mod http;
mod manifest;
mod pipeline;
mod progress;
mod query;
mod record;
mod sanitize;
mod source;
mod util;

pub use crate::config::{BatchErrorPolicy, ExportOptions};
pub use crate::error::ExportError;
pub use crate::pipeline::{ExportReport, KindReport, SalesforceExport};
pub use crate::record::{Record, RecordKind};

// Expose the remote seams so drivers and tests can plug in their own.
pub use crate::http::{Credentials, RestClient, Session, API_VERSION};
pub use crate::source::{ContentFetcher, QueryExecutor};

// Expose the pipeline stages for custom drivers.
pub use crate::fetch::{fetch_all, FetchSummary};
pub use crate::manifest::build_manifest;

// Expose the pure building blocks (also exercised directly by tests).
pub use crate::batch::split_into_batches;
pub use crate::query::{batch_query, enumeration_query};
pub use crate::sanitize::{sanitize_file_name, sanitized_path};

// Expose multiprogress helpers so binaries can multiplex bars.
pub use crate::progress::{make_count_progress, set_global_multiprogress};
