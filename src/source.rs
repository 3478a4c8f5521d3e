//! Seams to the remote data source.
//!
//! Production code talks to the Salesforce REST API through
//! [`RestClient`](crate::RestClient); tests substitute in-memory fakes at
//! the same seam.

use crate::error::ExportError;
use serde_json::Value;

/// Executes SOQL queries, returning result rows as field-name/value maps.
pub trait QueryExecutor {
    /// Run `soql` and return **all** matching rows, following server-side
    /// pagination to exhaustion.
    fn query_all(&self, soql: &str) -> Result<Vec<Value>, ExportError>;

    /// Run `soql` and return the first result page only. Batch queries
    /// are sized to fit within a single page.
    fn query(&self, soql: &str) -> Result<Vec<Value>, ExportError>;
}

/// Fetches one attachment's binary payload by record id.
///
/// Implementations must be shareable across the fetch workers, hence the
/// `Sync` bound at the call sites.
pub trait ContentFetcher {
    fn fetch(&self, id: &str) -> Result<Vec<u8>, ExportError>;
}
