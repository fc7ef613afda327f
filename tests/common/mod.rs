#![allow(dead_code)]

pub mod service {
    use apidocgen::error::ServiceError;
    use apidocgen::generation::DocumentationService;
    use apidocgen::spec::{EndpointDescriptor, SchemaInfo};
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    /// One recorded `summarize` call.
    #[derive(Debug, Clone)]
    pub struct Call {
        pub key: String,
        pub at: Instant,
        pub schema_info: SchemaInfo,
    }

    /// In-process [`DocumentationService`] with scripted outcomes.
    ///
    /// Per-key scripts are consumed first, then the shared script; once both
    /// are empty, keys in `always_fail` fail and everything else succeeds with
    /// `"Summary of <key>"`.
    pub struct ScriptedService {
        shared: Mutex<VecDeque<Result<String, ServiceError>>>,
        per_key: Mutex<HashMap<String, VecDeque<Result<String, ServiceError>>>>,
        always_fail: HashSet<String>,
        latency: Duration,
        calls: Mutex<Vec<Call>>,
    }

    impl Default for ScriptedService {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ScriptedService {
        pub fn new() -> Self {
            Self {
                shared: Mutex::new(VecDeque::new()),
                per_key: Mutex::new(HashMap::new()),
                always_fail: HashSet::new(),
                latency: Duration::ZERO,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn with_script(self, outcomes: Vec<Result<String, ServiceError>>) -> Self {
            *self.shared.lock().unwrap() = outcomes.into();
            self
        }

        pub fn with_key_script(self, key: &str, outcomes: Vec<Result<String, ServiceError>>) -> Self {
            self.per_key
                .lock()
                .unwrap()
                .insert(key.to_string(), outcomes.into());
            self
        }

        pub fn failing(mut self, key: &str) -> Self {
            self.always_fail.insert(key.to_string());
            self
        }

        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls_for(&self, key: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.key == key)
                .count()
        }
    }

    pub fn rate_limited() -> ServiceError {
        ServiceError::RateLimited {
            message: "OpenAI rate limit exceeded. Please try again in a few moments.".into(),
        }
    }

    pub fn server_error() -> ServiceError {
        ServiceError::Http {
            status: 500,
            message: "Failed to generate summary. Please try again.".into(),
        }
    }

    #[async_trait]
    impl DocumentationService for ScriptedService {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn summarize(
            &self,
            endpoint: &EndpointDescriptor,
            schema_info: &SchemaInfo,
        ) -> Result<String, ServiceError> {
            let key = endpoint.key();
            self.calls.lock().unwrap().push(Call {
                key: key.clone(),
                at: Instant::now(),
                schema_info: schema_info.clone(),
            });
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }

            let scripted = self
                .per_key
                .lock()
                .unwrap()
                .get_mut(&key)
                .and_then(VecDeque::pop_front)
                .or_else(|| self.shared.lock().unwrap().pop_front());
            if let Some(outcome) = scripted {
                return outcome;
            }
            if self.always_fail.contains(&key) {
                return Err(server_error());
            }
            Ok(format!("Summary of {key}"))
        }
    }
}

pub mod schemas {
    use serde_json::{json, Value};

    pub const PETSTORE_JSON: &str = r#"{
  "openapi": "3.0.0",
  "info": { "title": "Petstore", "version": "1.0.0", "description": "Pets and owners" },
  "servers": [{ "url": "https://petstore.example.com/v1" }],
  "paths": {
    "/pets": {
      "parameters": [{ "name": "trace", "in": "header" }],
      "get": {
        "summary": "List pets",
        "parameters": [{ "name": "limit", "in": "query", "example": 10 }],
        "responses": { "200": { "description": "OK" } }
      },
      "post": {
        "summary": "Create a pet",
        "requestBody": {
          "content": { "application/json": { "schema": { "example": { "name": "Rex" } } } }
        },
        "responses": { "201": { "description": "Created" } }
      }
    },
    "/pets/{petId}": {
      "get": {
        "summary": "Get a pet",
        "parameters": [{ "name": "petId", "in": "path", "required": true }],
        "responses": { "200": { "description": "OK" }, "404": { "description": "Not found" } }
      },
      "delete": {
        "description": "Requires auth",
        "responses": { "204": { "description": "Deleted" } }
      }
    },
    "/auth/login": {
      "post": { "summary": "Log in", "responses": { "200": { "description": "OK" } } }
    }
  }
}"#;

    pub const PETSTORE_YAML: &str = r#"openapi: 3.0.0
info:
  title: Petstore
  version: 1.0.0
paths:
  /pets:
    get:
      summary: List pets
      responses:
        '200': { description: OK }
    x-internal: true
  /pets/{petId}:
    put:
      summary: Replace a pet
      responses:
        '200': { description: OK }
"#;

    /// Five operations on five distinct paths, in document order.
    pub fn five_endpoints() -> Value {
        json!({
            "openapi": "3.0.0",
            "info": { "title": "Five", "version": "1" },
            "paths": {
                "/a": { "get": { "summary": "a" } },
                "/b": { "get": { "summary": "b" } },
                "/c": { "get": { "summary": "c" } },
                "/d": { "get": { "summary": "d" } },
                "/e": { "get": { "summary": "e" } }
            }
        })
    }
}

pub mod mock_http {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// A captured request: request line, lowercase headers, body.
    #[derive(Debug, Clone)]
    pub struct Captured {
        pub request_line: String,
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl Captured {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        }
    }

    /// Serve `responses` (status, JSON body) to consecutive connections, then
    /// stop. Returns the base URL and a handle yielding the captured requests.
    pub fn start_mock_server(
        responses: Vec<(u16, String)>,
    ) -> (String, thread::JoinHandle<Vec<Captured>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let url = format!("http://{}:{}", addr.ip(), addr.port());
        let handle = thread::spawn(move || {
            let mut captured = Vec::new();
            for (status, body) in responses {
                let Ok((stream, _)) = listener.accept() else {
                    break;
                };
                let mut reader = BufReader::new(stream);

                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                let mut headers = Vec::new();
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    let line = line.trim_end();
                    if line.is_empty() {
                        break;
                    }
                    if let Some((k, v)) = line.split_once(':') {
                        headers.push((k.trim().to_lowercase(), v.trim().to_string()));
                    }
                }
                let length = headers
                    .iter()
                    .find(|(k, _)| k == "content-length")
                    .and_then(|(_, v)| v.parse::<usize>().ok())
                    .unwrap_or(0);
                let mut buf = vec![0u8; length];
                reader.read_exact(&mut buf).unwrap();
                captured.push(Captured {
                    request_line: request_line.trim_end().to_string(),
                    headers,
                    body: String::from_utf8_lossy(&buf).into_owned(),
                });

                let reason = match status {
                    200 => "OK",
                    400 => "Bad Request",
                    401 => "Unauthorized",
                    413 => "Payload Too Large",
                    429 => "Too Many Requests",
                    500 => "Internal Server Error",
                    503 => "Service Unavailable",
                    _ => "Unknown",
                };
                let resp = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let mut stream = reader.into_inner();
                stream.write_all(resp.as_bytes()).unwrap();
                stream.flush().unwrap();
            }
            captured
        });
        (url, handle)
    }
}

pub mod temp_files {
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Write `content` to `name` inside a fresh temp dir. Keep the dir alive
    /// for as long as the file is needed.
    pub fn write_temp(name: &str, content: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }
}
