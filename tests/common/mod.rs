#![allow(dead_code)]

use serde_json::{json, Value};
use sfexport::{ContentFetcher, ExportError, ExportOptions, QueryExecutor};
use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Mutex;

/// In-memory query executor over a fixed row set. `query_all` serves the
/// enumeration pass; `query` serves batch re-queries by filtering the
/// rows down to the ids named in the SOQL `IN (...)` list.
pub struct FakeSource {
    rows: Vec<Value>,
    fail_batches_containing: Vec<String>,
    fail_enumeration: bool,
    /// Every SOQL string this source received, in call order.
    pub queries: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new(rows: Vec<Value>) -> Self {
        Self {
            rows,
            fail_batches_containing: Vec::new(),
            fail_enumeration: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Make any batch query whose id list contains `id` fail.
    pub fn fail_batches_containing(mut self, id: &str) -> Self {
        self.fail_batches_containing.push(id.to_string());
        self
    }

    /// Make every `query_all` call fail.
    pub fn fail_enumeration(mut self) -> Self {
        self.fail_enumeration = true;
        self
    }

    pub fn batch_queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.contains("WHERE Id IN ("))
            .cloned()
            .collect()
    }
}

/// Pull the quoted ids out of a `... IN ('a','b')` clause.
pub fn parse_in_list(soql: &str) -> Vec<String> {
    soql.rsplit_once("IN (")
        .and_then(|(_, rest)| rest.strip_suffix(')'))
        .map(|inner| {
            inner
                .split(',')
                .map(|s| s.trim().trim_matches('\'').to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

impl FakeSource {
    /// Rows matching the query's FROM object: note rows carry a `Title`
    /// key, attachment rows a `Name` key.
    fn rows_for(&self, soql: &str) -> Vec<Value> {
        let want_note = soql.contains("FROM Note");
        self.rows
            .iter()
            .filter(|row| row.get("Title").is_some() == want_note)
            .cloned()
            .collect()
    }
}

impl QueryExecutor for FakeSource {
    fn query_all(&self, soql: &str) -> Result<Vec<Value>, ExportError> {
        self.queries.lock().unwrap().push(soql.to_string());
        if self.fail_enumeration {
            return Err(ExportError::Query("simulated enumeration failure".into()));
        }
        Ok(self.rows_for(soql))
    }

    fn query(&self, soql: &str) -> Result<Vec<Value>, ExportError> {
        self.queries.lock().unwrap().push(soql.to_string());
        let ids = parse_in_list(soql);
        if self
            .fail_batches_containing
            .iter()
            .any(|bad| ids.contains(bad))
        {
            return Err(ExportError::Query("simulated batch failure".into()));
        }
        Ok(self
            .rows_for(soql)
            .into_iter()
            .filter(|row| {
                row.get("Id")
                    .and_then(Value::as_str)
                    .is_some_and(|id| ids.iter().any(|want| want == id))
            })
            .collect())
    }
}

/// In-memory content fetcher with per-id payloads and injectable failures.
pub struct FakeFetcher {
    payloads: HashMap<String, Vec<u8>>,
    fail_ids: Vec<String>,
    /// Every id fetched, in call order (unordered across workers).
    pub fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self {
            payloads: HashMap::new(),
            fail_ids: Vec::new(),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn with_payload(mut self, id: &str, bytes: &[u8]) -> Self {
        self.payloads.insert(id.to_string(), bytes.to_vec());
        self
    }

    pub fn fail_id(mut self, id: &str) -> Self {
        self.fail_ids.push(id.to_string());
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }
}

impl ContentFetcher for FakeFetcher {
    fn fetch(&self, id: &str) -> Result<Vec<u8>, ExportError> {
        self.fetched.lock().unwrap().push(id.to_string());
        if self.fail_ids.iter().any(|bad| bad == id) {
            return Err(ExportError::ContentFetch {
                id: id.to_string(),
                reason: "HTTP 404 Not Found".into(),
            });
        }
        Ok(self
            .payloads
            .get(id)
            .cloned()
            .unwrap_or_else(|| format!("payload-{id}").into_bytes()))
    }
}

/// A SOQL result row shaped like an Attachment enumeration/batch row.
pub fn attachment_row(id: &str, name: &str) -> Value {
    json!({
        "Id": id,
        "Name": name,
        "ParentId": format!("001P-{id}"),
        "OwnerId": "005000000000001AAA",
        "ContentType": "application/pdf",
        "Description": "",
        "CreatedDate": "2019-10-01T12:00:00.000+0000",
        "CreatedById": "005000000000002AAA",
        "LastModifiedDate": "2019-10-02T12:00:00.000+0000",
    })
}

/// A SOQL result row shaped like a Note row; `body` is what the batch
/// query would deliver inline.
pub fn note_row(id: &str, title: &str, body: Option<&str>) -> Value {
    json!({
        "Id": id,
        "Title": title,
        "Body": body,
        "ParentId": format!("001P-{id}"),
        "OwnerId": "005000000000001AAA",
        "CreatedDate": "2019-10-01T12:00:00.000+0000",
        "CreatedById": "005000000000002AAA",
        "LastModifiedDate": "2019-10-02T12:00:00.000+0000",
    })
}

/// Options preset for tests: tempdir output, progress off.
pub fn test_options(dir: &Path) -> ExportOptions {
    ExportOptions::default()
        .with_output_dir(dir)
        .with_parent_scope("SELECT Id FROM Account WHERE Name = 'Acme'")
        .with_progress(false)
}

/// Read a text file line-by-line into strings (useful for manifests).
pub fn read_lines(path: &Path) -> Vec<String> {
    let f = fs::File::open(path).unwrap();
    let r = BufReader::new(f);
    r.lines().map(|l| l.unwrap()).filter(|s| !s.is_empty()).collect()
}
