//! Salesforce plumbing: SOAP username-password login plus the production
//! [`QueryExecutor`]/[`ContentFetcher`] implementations over the REST API.

use crate::error::ExportError;
use crate::source::{ContentFetcher, QueryExecutor};
use regex::Regex;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// REST API version all endpoints are pinned to.
pub const API_VERSION: &str = "v47.0";

/// Login credentials for the SOAP username-password flow. The security
/// token is appended to the password, as the partner API requires.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub security_token: String,
}

/// An authenticated session: instance host plus session id.
#[derive(Clone, Debug)]
pub struct Session {
    pub instance: String,
    pub session_id: String,
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Login responses are small and flat; a regex keeps us out of full XML
/// parsing for the three tags we need.
fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    let re = Regex::new(&format!("<{tag}>([^<]+)</{tag}>")).ok()?;
    re.captures(xml).map(|caps| caps[1].to_string())
}

fn host_of(url: &str) -> Option<String> {
    url.strip_prefix("https://")?
        .split('/')
        .next()
        .map(str::to_string)
}

impl Session {
    /// Use an externally obtained session (e.g. from an OAuth flow).
    pub fn new(instance: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            session_id: session_id.into(),
        }
    }

    /// SOAP username-password login against the partner endpoint.
    /// `sandbox` switches the login host to test.salesforce.com.
    pub fn login(
        creds: &Credentials,
        sandbox: bool,
        timeout: Duration,
    ) -> Result<Self, ExportError> {
        let host = if sandbox {
            "test.salesforce.com"
        } else {
            "login.salesforce.com"
        };
        let url = format!(
            "https://{}/services/Soap/u/{}",
            host,
            API_VERSION.trim_start_matches('v')
        );
        let envelope = format!(
            concat!(
                r#"<?xml version="1.0" encoding="utf-8"?>"#,
                r#"<env:Envelope xmlns:env="http://schemas.xmlsoap.org/soap/envelope/""#,
                r#" xmlns:urn="urn:partner.soap.sforce.com">"#,
                "<env:Body><urn:login>",
                "<urn:username>{}</urn:username>",
                "<urn:password>{}{}</urn:password>",
                "</urn:login></env:Body></env:Envelope>"
            ),
            xml_escape(&creds.username),
            xml_escape(&creds.password),
            xml_escape(&creds.security_token),
        );

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExportError::Auth(e.to_string()))?;
        let response = client
            .post(&url)
            .header("Content-Type", "text/xml; charset=UTF-8")
            .header("SOAPAction", "login")
            .body(envelope)
            .send()
            .map_err(|e| ExportError::Auth(e.to_string()))?;

        let status = response.status();
        let body = response.text().map_err(|e| ExportError::Auth(e.to_string()))?;
        if !status.is_success() {
            let fault = extract_tag(&body, "faultstring").unwrap_or_else(|| status.to_string());
            return Err(ExportError::Auth(fault));
        }

        let session_id = extract_tag(&body, "sessionId")
            .ok_or_else(|| ExportError::Auth("login response had no sessionId".into()))?;
        let server_url = extract_tag(&body, "serverUrl")
            .ok_or_else(|| ExportError::Auth("login response had no serverUrl".into()))?;
        let instance = host_of(&server_url)
            .ok_or_else(|| ExportError::Auth(format!("unexpected serverUrl: {server_url}")))?;

        tracing::debug!("Connected successfully to {}", instance);
        Ok(Self {
            instance,
            session_id,
        })
    }
}

/// One page of a SOQL query response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    done: bool,
    next_records_url: Option<String>,
    records: Vec<Value>,
}

/// Query and content access over the REST API.
pub struct RestClient {
    http: Client,
    session: Session,
}

impl RestClient {
    pub fn new(session: Session, timeout: Duration) -> Result<Self, ExportError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExportError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, session })
    }

    /// The session's instance is normally a bare host from login, but a
    /// full origin (scheme included) is honored as-is.
    fn origin(&self) -> String {
        let instance = &self.session.instance;
        if instance.starts_with("http://") || instance.starts_with("https://") {
            instance.trim_end_matches('/').to_string()
        } else {
            format!("https://{instance}")
        }
    }

    fn base(&self) -> String {
        format!("{}/services/data/{}", self.origin(), API_VERSION)
    }

    fn auth_header(&self) -> String {
        format!("OAuth {}", self.session.session_id)
    }

    fn query_page(&self, request: reqwest::blocking::RequestBuilder) -> Result<QueryResponse, ExportError> {
        let response = request
            .header("Authorization", self.auth_header())
            .send()
            .map_err(|e| ExportError::Query(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExportError::Query(format!("HTTP {status}: {body}")));
        }
        response
            .json::<QueryResponse>()
            .map_err(|e| ExportError::Query(e.to_string()))
    }

    fn first_page(&self, soql: &str) -> Result<QueryResponse, ExportError> {
        let request = self
            .http
            .get(format!("{}/query", self.base()))
            .query(&[("q", soql)]);
        self.query_page(request)
    }
}

impl QueryExecutor for RestClient {
    fn query_all(&self, soql: &str) -> Result<Vec<Value>, ExportError> {
        let mut page = self.first_page(soql)?;
        let mut records = std::mem::take(&mut page.records);
        while !page.done {
            let next = match page.next_records_url.take() {
                Some(next) => next,
                None => break,
            };
            let url = format!("{}{}", self.origin(), next);
            page = self.query_page(self.http.get(url))?;
            records.append(&mut page.records);
        }
        Ok(records)
    }

    fn query(&self, soql: &str) -> Result<Vec<Value>, ExportError> {
        Ok(self.first_page(soql)?.records)
    }
}

impl ContentFetcher for RestClient {
    fn fetch(&self, id: &str) -> Result<Vec<u8>, ExportError> {
        let url = format!("{}/sobjects/Attachment/{}/body", self.base(), id);
        tracing::debug!("Downloading from {}", url);
        let response = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .header("Content-Type", "application/octet-stream")
            .send()
            .map_err(|e| ExportError::ContentFetch {
                id: id.to_string(),
                reason: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExportError::ContentFetch {
                id: id.to_string(),
                reason: format!("HTTP {status}"),
            });
        }
        let bytes = response.bytes().map_err(|e| ExportError::ContentFetch {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}
