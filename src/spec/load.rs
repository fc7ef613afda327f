use super::build::{extract_schema_info, parse_openapi_schema};
use super::types::{EndpointDescriptor, SchemaInfo};
use crate::error::PipelineError;
use anyhow::Context;
use serde_json::Value;
use std::path::Path;

/// Parse raw schema text as JSON.
///
/// This is the job-level parse: a failure here aborts the whole job with
/// [`PipelineError::Parse`].
pub fn parse_document(text: &str) -> Result<Value, PipelineError> {
    serde_json::from_str(text).map_err(|e| PipelineError::Parse(e.to_string()))
}

/// Read a schema file from disk.
///
/// `.yaml`/`.yml` files go through `serde_yaml`, everything else is treated
/// as JSON.
pub fn load_document(file_path: impl AsRef<Path>) -> anyhow::Result<Value> {
    let file_path = file_path.as_ref();
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read schema file {}", file_path.display()))?;

    let is_yaml = matches!(
        file_path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let value: Value = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML in {}", file_path.display()))?
    } else {
        parse_document(&content).with_context(|| format!("invalid JSON in {}", file_path.display()))?
    };
    Ok(value)
}

/// Load a schema file and extract its endpoints and document metadata.
pub fn load_endpoints(
    file_path: impl AsRef<Path>,
) -> anyhow::Result<(Vec<EndpointDescriptor>, SchemaInfo, Value)> {
    let document = load_document(file_path)?;
    let endpoints = parse_openapi_schema(&document);
    let info = extract_schema_info(&document);
    Ok((endpoints, info, document))
}
