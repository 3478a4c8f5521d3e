use thiserror::Error;

/// Failure taxonomy for the export pipeline.
///
/// `ContentFetch` and per-file `Io` failures are caught and logged by the
/// fetch stage; `Config` and `Auth` abort before any data moves; `Query`
/// aborts the enumeration pass, and is subject to the configured
/// [`BatchErrorPolicy`](crate::BatchErrorPolicy) during batch re-fetches.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("query execution failed: {0}")]
    Query(String),

    #[error("content fetch failed for {id}: {reason}")]
    ContentFetch { id: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
