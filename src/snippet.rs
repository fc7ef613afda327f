//! Ready-to-paste request snippets for a single endpoint.
//!
//! Snippets use the literal placeholders `${API_BASE_URL}` and `${API_KEY}`
//! rather than real values. Query parameters come from `in: query`
//! parameters (their `example`, else `{value}`); the body comes from
//! `requestBody.content."application/json".schema.example`.

use crate::spec::EndpointDescriptor;
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

pub const BASE_URL_PLACEHOLDER: &str = "${API_BASE_URL}";
pub const API_KEY_PLACEHOLDER: &str = "${API_KEY}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Curl,
    Fetch,
    Axios,
    Python,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Curl,
        Language::Fetch,
        Language::Axios,
        Language::Python,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Curl => "curl",
            Language::Fetch => "fetch",
            Language::Axios => "axios",
            Language::Python => "python",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown language '{s}' (expected curl, fetch, axios or python)"))
    }
}

fn query_string(endpoint: &EndpointDescriptor) -> Option<String> {
    let pairs: Vec<String> = endpoint
        .parameters_in("query")
        .map(|p| {
            let name = p.get("name").and_then(Value::as_str).unwrap_or_default();
            let value = match p.get("example") {
                Some(Value::String(s)) if !s.is_empty() => s.clone(),
                Some(v) if !v.is_null() && v != &Value::Bool(false) => v.to_string(),
                _ => "{value}".to_string(),
            };
            format!("{name}={value}")
        })
        .collect();
    (!pairs.is_empty()).then(|| pairs.join("&"))
}

/// Example body, or `None` when the endpoint has no (or an empty) request body.
fn example_body(endpoint: &EndpointDescriptor) -> Option<Value> {
    let body = endpoint.request_body.as_ref()?;
    let non_empty = match body {
        Value::Object(map) => !map.is_empty(),
        Value::Null | Value::Bool(false) => false,
        _ => true,
    };
    if !non_empty {
        return None;
    }
    let example = body
        .pointer("/content/application~1json/schema/example")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_else(Map::new);
    Some(Value::Object(example))
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// Render a request for `endpoint` in `language`.
pub fn request_snippet(endpoint: &EndpointDescriptor, language: Language) -> String {
    let full_path = match query_string(endpoint) {
        Some(query) => format!("{}?{}", endpoint.path, query),
        None => endpoint.path.clone(),
    };
    let url = format!("{BASE_URL_PLACEHOLDER}{full_path}");
    let headers = pretty(&json!({
        "Content-Type": "application/json",
        "Authorization": format!("Bearer {API_KEY_PLACEHOLDER}"),
    }));
    let body = example_body(endpoint).map(|b| pretty(&b));
    let method = endpoint.method;

    match language {
        Language::Curl => {
            let mut out = format!(
                "curl -X {method} '{url}' \\\n  -H 'Content-Type: application/json' \\\n  -H 'Authorization: Bearer {API_KEY_PLACEHOLDER}'"
            );
            if let Some(body) = body {
                out.push_str(&format!(" \\\n  -d '{body}'"));
            }
            out
        }
        Language::Fetch => {
            let body = body
                .map(|b| format!(",\n  body: JSON.stringify({b})"))
                .unwrap_or_default();
            format!(
                "fetch('{url}', {{\n  method: '{method}',\n  headers: {headers}{body}\n}})\n  .then(response => response.json())\n  .then(data => console.log(data))\n  .catch(error => console.error('Error:', error));"
            )
        }
        Language::Axios => {
            let body = body.map(|b| format!(",\n  data: {b}")).unwrap_or_default();
            format!(
                "import axios from 'axios';\n\naxios({{\n  method: '{}',\n  url: '{url}',\n  headers: {headers}{body}\n}})\n  .then(response => console.log(response.data))\n  .catch(error => console.error('Error:', error));",
                method.as_lower()
            )
        }
        Language::Python => {
            let call = match body {
                Some(b) => format!(
                    "\npayload = {b}\n\nresponse = requests.{}(url, headers=headers, json=payload)",
                    method.as_lower()
                ),
                None => format!("\n\nresponse = requests.{}(url, headers=headers)", method.as_lower()),
            };
            format!("import requests\n\nurl = '{url}'\nheaders = {headers}{call}\nprint(response.json())")
        }
    }
}
