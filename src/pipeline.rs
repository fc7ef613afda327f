//! # Pipeline Module
//!
//! Job-level entry point: schema text or document in, per-endpoint
//! documentation out.
//!
//! A [`Pipeline`] owns the process-wide pieces (summary cache, rate gate,
//! documentation service) and hands them to a fresh
//! [`BatchOrchestrator`] per job, so concurrent jobs share one cache and one
//! rate budget.

use crate::config::{PipelineConfig, ServiceConfig, ServiceKind};
use crate::error::PipelineError;
use crate::generation::{DocumentationService, GenerationClient, HttpDocumentationService, OpenAiClient};
use crate::orchestrator::BatchOrchestrator;
use crate::rate_gate::RateGate;
use crate::spec::{extract_schema_info, parse_document, parse_openapi_schema, EndpointDescriptor, SchemaInfo};
use crate::summary_cache::SummaryCache;
use anyhow::Context;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Raw schema text or an already parsed document.
#[derive(Debug, Clone)]
pub enum SchemaInput {
    Text(String),
    Document(Value),
}

impl From<String> for SchemaInput {
    fn from(text: String) -> Self {
        SchemaInput::Text(text)
    }
}

impl From<&str> for SchemaInput {
    fn from(text: &str) -> Self {
        SchemaInput::Text(text.to_string())
    }
}

impl From<Value> for SchemaInput {
    fn from(document: Value) -> Self {
        SchemaInput::Document(document)
    }
}

impl SchemaInput {
    fn into_document(self) -> Result<Value, PipelineError> {
        match self {
            SchemaInput::Text(text) => parse_document(&text),
            SchemaInput::Document(document) => Ok(document),
        }
    }
}

/// Result of a documentation job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Documentation {
    /// Every extracted endpoint, in document order.
    pub endpoints: Vec<EndpointDescriptor>,
    pub schema_info: SchemaInfo,
    /// `"<METHOD> <path>"` → summary or fallback notice.
    pub summaries: HashMap<String, String>,
    /// Keys whose summary is a fallback notice.
    pub failed: HashSet<String>,
}

impl Documentation {
    pub fn summary_for(&self, endpoint: &EndpointDescriptor) -> Option<&str> {
        self.summaries.get(&endpoint.key()).map(String::as_str)
    }
}

/// Build the configured [`DocumentationService`] backend.
pub fn build_service(config: &ServiceConfig) -> anyhow::Result<Arc<dyn DocumentationService>> {
    match config.kind {
        ServiceKind::Http => {
            let url = config
                .url
                .as_deref()
                .context("service.url is required for the http backend (APIDOC_SERVICE_URL)")?;
            let service = HttpDocumentationService::new(url, config.timeout())?;
            Ok(Arc::new(service))
        }
        ServiceKind::OpenAi => {
            let api_key = config
                .api_key
                .as_deref()
                .context("service.api_key is required for the openai backend (OPENAI_API_KEY)")?;
            let mut client = OpenAiClient::new(api_key, config.timeout())?.with_model(&config.model);
            if let Some(url) = &config.url {
                client = client.with_base_url(url);
            }
            Ok(Arc::new(client))
        }
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    service: Arc<dyn DocumentationService>,
    cache: SummaryCache,
    gate: RateGate,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, service: Arc<dyn DocumentationService>) -> Self {
        let cache = SummaryCache::new(config.cache_ttl());
        let gate = RateGate::new(config.rate_limit);
        Self {
            config,
            service,
            cache,
            gate,
        }
    }

    /// Build the service backend from `config.service` as well.
    pub fn from_config(config: PipelineConfig) -> anyhow::Result<Self> {
        let service = build_service(&config.service)?;
        info!(service = service.name(), "Documentation service configured");
        Ok(Self::new(config, service))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache(&self) -> &SummaryCache {
        &self.cache
    }

    pub fn gate(&self) -> &RateGate {
        &self.gate
    }

    /// An orchestrator sharing this pipeline's cache and gate. `caller` is the
    /// rate-gate identity; `None` is the global caller.
    pub fn orchestrator(&self, caller: Option<&str>) -> BatchOrchestrator {
        let mut client = GenerationClient::new(
            Arc::clone(&self.service),
            self.cache.clone(),
            self.gate.clone(),
            self.config.retry_policy(),
        );
        if let Some(caller) = caller {
            client = client.with_caller(caller);
        }
        BatchOrchestrator::new(client)
            .with_batch_size(self.config.batch_size)
            .with_inter_batch_delay(self.config.inter_batch_delay())
    }

    /// Start the periodic cache sweep; it stops when `shutdown` is cancelled.
    pub fn start_cache_sweeper(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        self.cache
            .spawn_sweeper(self.config.cache_sweep_interval(), shutdown)
    }

    /// Generate documentation for every endpoint in `input`.
    ///
    /// Fails only when the text is not JSON or the document has no
    /// endpoints. Per-endpoint failures are reported inside the result.
    pub async fn generate_schema_documentation(
        &self,
        input: impl Into<SchemaInput>,
    ) -> Result<Documentation, PipelineError> {
        self.generate_with_cancel(input, &self.orchestrator(None), &CancellationToken::new())
            .await
    }

    /// Run a job on a caller-supplied orchestrator (for progress
    /// subscriptions or a caller identity) with cancellation.
    pub async fn generate_with_cancel(
        &self,
        input: impl Into<SchemaInput>,
        orchestrator: &BatchOrchestrator,
        cancel: &CancellationToken,
    ) -> Result<Documentation, PipelineError> {
        let document = input.into().into_document()?;
        let endpoints = parse_openapi_schema(&document);
        if endpoints.is_empty() {
            return Err(PipelineError::NoEndpoints);
        }
        let schema_info = extract_schema_info(&document);

        let result = orchestrator
            .run_with_cancel(&endpoints, &schema_info, cancel)
            .await?;

        Ok(Documentation {
            endpoints,
            schema_info,
            summaries: result.summaries,
            failed: result.failed,
        })
    }
}
