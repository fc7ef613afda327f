use super::types::{EndpointDescriptor, HttpMethod, SchemaInfo};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

/// Why a document could not be walked. Never returned to callers of
/// [`parse_openapi_schema`]; it only ends up in the log.
#[derive(Debug)]
struct MalformedDocument {
    location: String,
    message: &'static str,
}

/// Extract every operation from a parsed OpenAPI/Swagger document
///
/// Walks `paths`, and within each path item keeps only the lowercase HTTP
/// method keys (`get`, `post`, `put`, `delete`, `patch`, `options`, `head`).
/// Shared path-level `parameters`, `summary`, `servers`, `$ref` and `x-*`
/// keys are skipped; they are not merged into the operations.
///
/// # Returns
///
/// Endpoints in document order. A document without `paths` yields an empty
/// vector. Path items that are not objects contribute nothing, and an
/// operation that is not an object contributes a bare `METHOD path` entry.
/// A `null` path item or operation makes the whole document unreadable and
/// yields an empty vector; the problem is logged, never surfaced.
pub fn parse_openapi_schema(document: &Value) -> Vec<EndpointDescriptor> {
    match build_endpoints(document) {
        Ok(endpoints) => {
            debug!(count = endpoints.len(), "Parsed OpenAPI operations");
            endpoints
        }
        Err(err) => {
            error!(
                location = %err.location,
                reason = err.message,
                "Error parsing OpenAPI schema"
            );
            Vec::new()
        }
    }
}

fn build_endpoints(document: &Value) -> Result<Vec<EndpointDescriptor>, MalformedDocument> {
    let paths = match document.get("paths") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(paths)) => paths,
        Some(_) => {
            return Err(MalformedDocument {
                location: "paths".to_string(),
                message: "`paths` is not an object",
            })
        }
    };

    let no_fields = Map::new();
    let mut endpoints = Vec::new();
    for (path, item) in paths {
        let item = match item {
            Value::Object(item) => item,
            Value::Null => {
                return Err(MalformedDocument {
                    location: format!("paths.{path}"),
                    message: "path item is null",
                })
            }
            _ => {
                warn!(%path, "Skipping path item that is not an object");
                continue;
            }
        };

        for (key, operation) in item {
            let Some(method) = HttpMethod::from_operation_key(key) else {
                continue;
            };
            let fields = match operation {
                Value::Object(fields) => fields,
                Value::Null => {
                    return Err(MalformedDocument {
                        location: format!("paths.{path}.{key}"),
                        message: "operation is null",
                    })
                }
                _ => {
                    warn!(%path, %method, "Operation is not an object; keeping it without details");
                    &no_fields
                }
            };
            endpoints.push(build_endpoint(path, method, fields));
        }
    }
    Ok(endpoints)
}

fn build_endpoint(path: &str, method: HttpMethod, operation: &Map<String, Value>) -> EndpointDescriptor {
    let text = |field: &str| operation.get(field).and_then(Value::as_str).map(str::to_string);

    EndpointDescriptor {
        path: path.to_string(),
        method,
        summary: text("summary"),
        description: text("description"),
        parameters: operation
            .get("parameters")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        request_body: operation.get("requestBody").filter(|v| !v.is_null()).cloned(),
        responses: operation.get("responses").and_then(Value::as_object).cloned(),
    }
}

/// Pull `info.title`, `info.version` and the first server URL out of a document.
///
/// Swagger 2.0 documents have no `servers`; for those the base URL is built
/// from `host` + `basePath` (scheme from `schemes[0]`, default `https`).
pub fn extract_schema_info(document: &Value) -> SchemaInfo {
    let info = document.get("info");
    let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);

    let base_url = text(
        document
            .get("servers")
            .and_then(Value::as_array)
            .and_then(|servers| servers.first())
            .and_then(|server| server.get("url")),
    )
    .or_else(|| swagger2_base_url(document));

    SchemaInfo {
        title: text(info.and_then(|i| i.get("title"))),
        version: text(info.and_then(|i| i.get("version"))),
        base_url,
    }
}

fn swagger2_base_url(document: &Value) -> Option<String> {
    let host = document.get("host").and_then(Value::as_str)?;
    let scheme = document
        .get("schemes")
        .and_then(Value::as_array)
        .and_then(|s| s.first())
        .and_then(Value::as_str)
        .unwrap_or("https");
    let base_path = document.get("basePath").and_then(Value::as_str).unwrap_or("");
    Some(format!("{scheme}://{host}{base_path}"))
}
