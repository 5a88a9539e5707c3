//! HTTP client for the cohort analysis backend.
//!
//! Thin plumbing over four endpoints: upload, schema discovery, analysis
//! submission and export job status. Failures are classified into
//! [`ClientError`] so callers can show the user a short explanation.

use crate::config::ApiConfig;
use crate::logging::new_request_id;
use crate::models::{AnalysisResponse, JobStatusResponse, SchemaResponse, UploadResponse};
use crate::request::AnalysisRequest;
use reqwest::{multipart, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};

const REQUEST_ID_HEADER: &str = "X-Request-Id";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error - check if server is running")]
    Network(#[source] reqwest::Error),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{operation} failed: {detail}")]
    Http {
        operation: &'static str,
        status: u16,
        detail: String,
    },

    #[error("{operation} failed: unexpected response body")]
    Decode {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client")]
    Setup(#[source] reqwest::Error),
}

/// Query for `GET /schema`; unset fields are omitted.
#[derive(Debug, Clone, Default)]
pub struct SchemaQuery {
    pub filename: Option<String>,
    pub db_url: Option<String>,
    pub table: Option<String>,
}

impl SchemaQuery {
    fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("filename", self.filename.as_deref()),
            ("db_url", self.db_url.as_deref()),
            ("table", self.table.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    base_url: String,
}

impl AnalysisClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Setup)?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ClientError> {
        Self::new(config.base_url.clone(), config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn upload_file(&self, path: &Path) -> Result<UploadResponse, ClientError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());

        info!(file = %path.display(), bytes = bytes.len(), "Uploading dataset");

        let form = multipart::Form::new().part("file", multipart::Part::bytes(bytes).file_name(file_name));
        let request = self
            .http
            .post(self.url("upload"))
            .header(reqwest::header::ACCEPT, "application/json")
            .multipart(form);

        self.send("Upload", request).await
    }

    pub async fn fetch_schema(&self, query: &SchemaQuery) -> Result<SchemaResponse, ClientError> {
        let request = self.http.get(self.url("schema")).query(&query.pairs());
        self.send("Schema lookup", request).await
    }

    pub async fn run_analysis(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResponse, ClientError> {
        debug!(
            metric = %request.analysis_metric,
            interval = %request.cohort_interval,
            "Submitting analysis request"
        );
        let builder = self.http.post(self.url("analysis")).json(request);
        self.send("Analysis", builder).await
    }

    pub async fn fetch_status(&self, job_id: &str) -> Result<JobStatusResponse, ClientError> {
        let request = self
            .http
            .get(self.url("analysis-status"))
            .query(&[("job_id", job_id)]);
        self.send("Status check", request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let request_id = new_request_id();
        let span = info_span!("backend_request", %request_id, operation);

        async move {
            let response = request
                .header(REQUEST_ID_HEADER, request_id.as_str())
                .send()
                .await
                .map_err(|e| {
                    warn!(error = %e, "Backend request failed");
                    if e.is_connect() || e.is_timeout() || e.is_request() {
                        ClientError::Network(e)
                    } else {
                        ClientError::Decode { operation, source: e }
                    }
                })?;

            let status = response.status();
            debug!(status = status.as_u16(), "Backend responded");

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let error = classify_error(operation, status, &body);
                warn!(status = status.as_u16(), error = %error, "Backend returned an error");
                return Err(error);
            }

            response
                .json::<T>()
                .await
                .map_err(|source| ClientError::Decode { operation, source })
        }
        .instrument(span)
        .await
    }
}

/// Map a non-success response to a user-facing error. FastAPI-style bodies
/// carry `detail` as a string or, for 422, a list of `{msg, type}` items.
pub fn classify_error(operation: &'static str, status: StatusCode, body: &str) -> ClientError {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned());

    if status == StatusCode::UNPROCESSABLE_ENTITY {
        if let Some(serde_json::Value::Array(items)) = &detail {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            return ClientError::Validation(messages.join(", "));
        }
    }

    let detail = match detail {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s,
        _ => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };

    ClientError::Http {
        operation,
        status: status.as_u16(),
        detail,
    }
}
