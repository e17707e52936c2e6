//! Layout analysis: submit a document to the analysis service and wait for
//! its `analyzeResult`.
//!
//! The REST flow is a long-running operation:
//!
//! 1. `POST …/documentModels/{model}:analyze` with the raw bytes. The service
//!    answers `202 Accepted` and an `Operation-Location` header.
//! 2. `GET` that URL every `poll_interval_ms` until `status` is terminal, or
//!    until `analysis_timeout_secs` have passed.

use crate::config::{ConversionConfig, ENV_ENDPOINT, ENV_KEY};
use crate::error::Doc2MdError;
use crate::model::AnalyzeResult;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION: &str = "operation-location";

/// Produces an [`AnalyzeResult`] for a binary document.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, document: Vec<u8>) -> Result<AnalyzeResult, Doc2MdError>;
}

/// [`DocumentAnalyzer`] for the Azure AI Document Intelligence REST API.
#[derive(Clone)]
pub struct AzureDocumentAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    key: String,
    model_id: String,
    api_version: String,
    poll_interval: Duration,
    timeout: Duration,
}

impl std::fmt::Debug for AzureDocumentAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureDocumentAnalyzer")
            .field("endpoint", &self.endpoint)
            .field("model_id", &self.model_id)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl AzureDocumentAnalyzer {
    /// Build an analyzer from the endpoint and key in `config`.
    pub fn from_config(config: &ConversionConfig) -> Result<Self, Doc2MdError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(Doc2MdError::AnalyzerNotConfigured {
                missing: ENV_ENDPOINT,
            })?;
        let key = config
            .key
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(Doc2MdError::AnalyzerNotConfigured { missing: ENV_KEY })?;

        let timeout = Duration::from_secs(config.analysis_timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Doc2MdError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key: key.to_string(),
            model_id: config.model_id.clone(),
            api_version: config.api_version.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            timeout,
        })
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/documentintelligence/documentModels/{}:analyze?api-version={}&outputContentFormat=markdown",
            self.endpoint, self.model_id, self.api_version
        )
    }

    async fn submit(&self, document: Vec<u8>) -> Result<String, Doc2MdError> {
        let response = self
            .client
            .post(self.analyze_url())
            .header(KEY_HEADER, &self.key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(document)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if status != reqwest::StatusCode::ACCEPTED {
            let body = response.text().await.unwrap_or_default();
            return Err(Doc2MdError::AnalysisFailed {
                detail: format!("HTTP {status}: {}", service_message(&body)),
            });
        }

        response
            .headers()
            .get(OPERATION_LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| Doc2MdError::AnalysisFailed {
                detail: "response has no Operation-Location header".to_string(),
            })
    }

    fn timed_out(&self) -> Doc2MdError {
        Doc2MdError::AnalysisTimeout {
            secs: self.timeout.as_secs(),
        }
    }

    fn request_error(&self, e: reqwest::Error) -> Doc2MdError {
        if e.is_timeout() {
            self.timed_out()
        } else {
            Doc2MdError::AnalysisFailed {
                detail: e.to_string(),
            }
        }
    }

    async fn poll(&self, operation_url: &str) -> Result<AnalyzeResult, Doc2MdError> {
        let start = Instant::now();
        loop {
            let response = self
                .client
                .get(operation_url)
                .header(KEY_HEADER, &self.key)
                .send()
                .await
                .map_err(|e| self.request_error(e))?;

            let status = response.status();
            let body = response.text().await.map_err(|e| self.request_error(e))?;
            if !status.is_success() {
                return Err(Doc2MdError::AnalysisFailed {
                    detail: format!("HTTP {status}: {}", service_message(&body)),
                });
            }

            match parse_operation(&body)? {
                Some(result) => {
                    info!(
                        "Analysis finished in {:?}: {} paragraphs, {} tables, {} figures",
                        start.elapsed(),
                        result.paragraphs.len(),
                        result.tables.len(),
                        result.figures.len()
                    );
                    return Ok(result);
                }
                None => {
                    if start.elapsed() >= self.timeout {
                        return Err(self.timed_out());
                    }
                    debug!("Analysis still running after {:?}", start.elapsed());
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}

#[async_trait]
impl DocumentAnalyzer for AzureDocumentAnalyzer {
    async fn analyze(&self, document: Vec<u8>) -> Result<AnalyzeResult, Doc2MdError> {
        debug!(
            "Submitting {} bytes to model '{}'",
            document.len(),
            self.model_id
        );
        // A stalled connection must not outlive the overall budget.
        let run = async {
            let operation_url = self.submit(document).await?;
            self.poll(&operation_url).await
        };
        tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| self.timed_out())?
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
enum OperationStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    Canceled,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: OperationStatus,
    #[serde(default)]
    analyze_result: Option<AnalyzeResult>,
    #[serde(default)]
    error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ServiceError,
}

/// `Ok(None)` while the operation is still running.
fn parse_operation(body: &str) -> Result<Option<AnalyzeResult>, Doc2MdError> {
    let op: AnalyzeOperation = serde_json::from_str(body)
        .map_err(|e| Doc2MdError::InvalidAnalysisResult(e.to_string()))?;

    match op.status {
        OperationStatus::NotStarted | OperationStatus::Running => Ok(None),
        OperationStatus::Succeeded => op.analyze_result.map(Some).ok_or_else(|| {
            Doc2MdError::InvalidAnalysisResult("succeeded without analyzeResult".to_string())
        }),
        OperationStatus::Failed | OperationStatus::Canceled => Err(Doc2MdError::AnalysisFailed {
            detail: match op.error {
                Some(e) => format!("{}: {}", e.code, e.message),
                None => format!("operation {:?}", op.status).to_lowercase(),
            },
        }),
    }
}

/// The service's own error message if the body is an error envelope,
/// else the raw body.
fn service_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => format!("{}: {}", env.error.code, env.error.message),
        Err(_) => body.to_string(),
    }
}
