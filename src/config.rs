//! # Configuration Module
//!
//! Tunables for a documentation job, loaded in three layers:
//!
//! 1. Built-in defaults ([`PipelineConfig::default`])
//! 2. An optional YAML file
//! 3. Environment variables
//!
//! ## Environment Variables
//!
//! | Variable | Field |
//! |----------|-------|
//! | `APIDOC_BATCH_SIZE` | `batch_size` |
//! | `APIDOC_INTER_BATCH_DELAY_MS` | `inter_batch_delay_ms` |
//! | `APIDOC_MAX_RETRIES` | `max_retries` |
//! | `APIDOC_RATE_LIMIT_BACKOFF_MS` | `rate_limit_backoff_ms` |
//! | `APIDOC_ERROR_BACKOFF_MS` | `error_backoff_ms` |
//! | `APIDOC_CACHE_TTL_SECS` | `cache_ttl_secs` |
//! | `APIDOC_CACHE_SWEEP_INTERVAL_SECS` | `cache_sweep_interval_secs` |
//! | `APIDOC_RATE_LIMIT_MAX` | `rate_limit.max` |
//! | `APIDOC_RATE_LIMIT_WINDOW_MS` | `rate_limit.window_ms` |
//! | `APIDOC_SERVICE_KIND` | `service.kind` (`http` or `openai`) |
//! | `APIDOC_SERVICE_URL` | `service.url` |
//! | `OPENAI_API_KEY` | `service.api_key` |
//! | `APIDOC_MODEL` | `service.model` |
//! | `APIDOC_SERVICE_TIMEOUT_SECS` | `service.timeout_secs` |
//!
//! Unparseable numeric values are ignored and the previous layer's value is kept.
//!
//! ## Example
//!
//! ```yaml
//! batch_size: 4
//! max_retries: 5
//! rate_limit:
//!   max: 30
//!   window_ms: 60000
//! service:
//!   kind: http
//!   url: http://localhost:3000/api/summarize
//! ```

use crate::generation::RetryPolicy;
use crate::rate_gate::RateGateConfig;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Which [`DocumentationService`](crate::generation::DocumentationService) backend to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// A summarize endpoint speaking `{endpoint, schemaInfo}` → `{summary}`.
    #[default]
    Http,
    /// An OpenAI-compatible chat-completions API.
    OpenAi,
}

impl FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(ServiceKind::Http),
            "openai" => Ok(ServiceKind::OpenAi),
            other => Err(format!("unknown service kind '{other}' (expected http or openai)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub kind: ServiceKind,
    /// Summarize endpoint (http) or API base URL (openai).
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            kind: ServiceKind::Http,
            url: None,
            api_key: None,
            model: crate::generation::DEFAULT_MODEL.to_string(),
            timeout_secs: 300,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub batch_size: usize,
    pub inter_batch_delay_ms: u64,
    pub max_retries: u32,
    pub rate_limit_backoff_ms: u64,
    pub error_backoff_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_sweep_interval_secs: u64,
    pub rate_limit: RateGateConfig,
    pub service: ServiceConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 2,
            inter_batch_delay_ms: 2000,
            max_retries: 3,
            rate_limit_backoff_ms: 2000,
            error_backoff_ms: 1000,
            cache_ttl_secs: 3600,
            cache_sweep_interval_secs: 3600,
            rate_limit: RateGateConfig::default(),
            service: ServiceConfig::default(),
        }
    }
}

fn parse_into<T: FromStr>(target: &mut T, value: Option<String>) {
    if let Some(parsed) = value.and_then(|v| v.trim().parse().ok()) {
        *target = parsed;
    }
}

impl PipelineConfig {
    /// Defaults, then `path` (if any), then the process environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        parse_into(&mut self.batch_size, lookup("APIDOC_BATCH_SIZE"));
        parse_into(&mut self.inter_batch_delay_ms, lookup("APIDOC_INTER_BATCH_DELAY_MS"));
        parse_into(&mut self.max_retries, lookup("APIDOC_MAX_RETRIES"));
        parse_into(&mut self.rate_limit_backoff_ms, lookup("APIDOC_RATE_LIMIT_BACKOFF_MS"));
        parse_into(&mut self.error_backoff_ms, lookup("APIDOC_ERROR_BACKOFF_MS"));
        parse_into(&mut self.cache_ttl_secs, lookup("APIDOC_CACHE_TTL_SECS"));
        parse_into(&mut self.cache_sweep_interval_secs, lookup("APIDOC_CACHE_SWEEP_INTERVAL_SECS"));
        parse_into(&mut self.rate_limit.max, lookup("APIDOC_RATE_LIMIT_MAX"));
        parse_into(&mut self.rate_limit.window_ms, lookup("APIDOC_RATE_LIMIT_WINDOW_MS"));
        parse_into(&mut self.service.kind, lookup("APIDOC_SERVICE_KIND"));
        parse_into(&mut self.service.timeout_secs, lookup("APIDOC_SERVICE_TIMEOUT_SECS"));

        if let Some(url) = lookup("APIDOC_SERVICE_URL").filter(|v| !v.trim().is_empty()) {
            self.service.url = Some(url);
        }
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.service.api_key = Some(key);
        }
        if let Some(model) = lookup("APIDOC_MODEL").filter(|v| !v.trim().is_empty()) {
            self.service.model = model;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.max_retries == 0 {
            bail!("max_retries must be at least 1");
        }
        if self.rate_limit.max == 0 {
            bail!("rate_limit.max must be at least 1");
        }
        if self.rate_limit.window_ms == 0 {
            bail!("rate_limit.window_ms must be positive");
        }
        if let Some(raw) = &self.service.url {
            let url = url::Url::parse(raw)
                .with_context(|| format!("service.url is not a valid URL: {raw}"))?;
            if !matches!(url.scheme(), "http" | "https") {
                bail!("service.url must use http or https, got {}", url.scheme());
            }
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            rate_limit_backoff: Duration::from_millis(self.rate_limit_backoff_ms),
            error_backoff: Duration::from_millis(self.error_backoff_ms),
        }
    }

    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_millis(self.inter_batch_delay_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_secs)
    }
}
