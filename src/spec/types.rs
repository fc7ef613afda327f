use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// HTTP methods recognised as OpenAPI operations.
///
/// Any other key under a path item (`parameters`, `summary`, `servers`,
/// `trace`, vendor extensions, ...) is not an operation for our purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    /// All recognised methods, in the order OpenAPI documents usually list them.
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Options,
        HttpMethod::Head,
    ];

    /// Match a path-item key against the operation keys.
    ///
    /// OpenAPI operation keys are lowercase; `GET` as a key is not an operation.
    pub fn from_operation_key(key: &str) -> Option<Self> {
        match key {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "delete" => Some(HttpMethod::Delete),
            "patch" => Some(HttpMethod::Patch),
            "options" => Some(HttpMethod::Options),
            "head" => Some(HttpMethod::Head),
            _ => None,
        }
    }

    /// Case-insensitive parse, used for user input (CLI flags).
    pub fn parse(s: &str) -> Option<Self> {
        Self::from_operation_key(&s.to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Lowercase form, as used by client libraries (`requests.get`, `axios({method: 'get'})`).
    pub fn as_lower(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Put => http::Method::PUT,
            HttpMethod::Delete => http::Method::DELETE,
            HttpMethod::Patch => http::Method::PATCH,
            HttpMethod::Options => http::Method::OPTIONS,
            HttpMethod::Head => http::Method::HEAD,
        }
    }
}

/// One operation extracted from an OpenAPI/Swagger document.
///
/// `parameters`, `request_body` and `responses` are carried as opaque JSON;
/// the pipeline forwards them to the generation service untouched. The same
/// `(method, path)` pair may appear more than once, nothing deduplicates.
///
/// Serialized with camelCase names so the value can be posted as-is to a
/// summarize endpoint (`{"endpoint": {...}, "schemaInfo": {...}}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDescriptor {
    pub path: String,
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<Map<String, Value>>,
}

impl EndpointDescriptor {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            summary: None,
            description: None,
            parameters: Vec::new(),
            request_body: None,
            responses: None,
        }
    }

    /// Result-map key: `"<METHOD> <path>"`.
    pub fn key(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Number of declared response status codes.
    pub fn response_count(&self) -> usize {
        self.responses.as_ref().map_or(0, Map::len)
    }

    /// Parameters declared with `in: <location>`.
    pub fn parameters_in<'a>(&'a self, location: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.parameters
            .iter()
            .filter(move |p| p.get("in").and_then(Value::as_str) == Some(location))
    }
}

/// Document-level metadata handed to every generation call of a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}
