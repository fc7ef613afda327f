use crate::error::ServiceError;
use crate::spec::{EndpointDescriptor, SchemaInfo};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// The external documentation generation service.
///
/// Implementations produce a Markdown summary for one endpoint. They do not
/// retry, cache, or rate limit; [`GenerationClient`](super::GenerationClient)
/// layers all of that on top.
#[async_trait]
pub trait DocumentationService: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn summarize(
        &self,
        endpoint: &EndpointDescriptor,
        schema_info: &SchemaInfo,
    ) -> Result<String, ServiceError>;
}

/// Wire payload of a summarize request: `{"endpoint": ..., "schemaInfo": ...}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest<'a> {
    pub endpoint: &'a EndpointDescriptor,
    pub schema_info: &'a SchemaInfo,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary: Option<String>,
}

/// Error body of a summarize endpoint: `{"error": "...", "code": "...", "retryable": bool}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    code: Option<String>,
}

/// Error code the service uses for upstream rate limiting.
pub const RATE_LIMIT_CODE: &str = "rate_limit_exceeded";
/// Error code the service uses for a bad upstream credential.
pub const INVALID_CREDENTIAL_CODE: &str = "invalid_api_key";

/// Map a non-success status and its (possibly empty) error body to a [`ServiceError`].
pub(crate) fn classify_failure(
    status: http::StatusCode,
    message: Option<String>,
    code: Option<&str>,
) -> ServiceError {
    if status == http::StatusCode::TOO_MANY_REQUESTS || code == Some(RATE_LIMIT_CODE) {
        return ServiceError::RateLimited {
            message: message.unwrap_or_else(|| "Rate limit exceeded".to_string()),
        };
    }
    if code == Some(INVALID_CREDENTIAL_CODE) {
        return ServiceError::InvalidCredentials;
    }
    ServiceError::http_status(status, message)
}

/// [`DocumentationService`] backed by an HTTP summarize endpoint.
///
/// POSTs [`SummaryRequest`] as JSON and expects `{"summary": "..."}` back.
pub struct HttpDocumentationService {
    client: reqwest::Client,
    url: String,
}

impl HttpDocumentationService {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DocumentationService for HttpDocumentationService {
    fn name(&self) -> &str {
        "http"
    }

    async fn summarize(
        &self,
        endpoint: &EndpointDescriptor,
        schema_info: &SchemaInfo,
    ) -> Result<String, ServiceError> {
        let request = SummaryRequest {
            endpoint,
            schema_info,
        };
        debug!(url = %self.url, endpoint = %endpoint.key(), "POST summarize");
        let response = self.client.post(&self.url).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                code = body.code.as_deref().unwrap_or(""),
                "Summarize request failed"
            );
            return Err(classify_failure(status, body.error, body.code.as_deref()));
        }

        let body: SummaryResponse = response.json().await?;
        body.summary
            .ok_or_else(|| ServiceError::MalformedResponse("response has no `summary`".to_string()))
    }
}
