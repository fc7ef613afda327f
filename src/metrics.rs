//! Static metrics over a parsed endpoint list: method mix, an authentication
//! heuristic, complexity scoring and path depth. Nothing here calls the
//! generation service.

use crate::spec::{EndpointDescriptor, HttpMethod};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Score above which an endpoint is [`Complexity::Complex`].
const COMPLEX_THRESHOLD: usize = 4;
/// Score above which an endpoint is [`Complexity::Medium`].
const MEDIUM_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

impl Complexity {
    pub fn from_score(score: usize) -> Self {
        if score > COMPLEX_THRESHOLD {
            Complexity::Complex
        } else if score > MEDIUM_THRESHOLD {
            Complexity::Medium
        } else {
            Complexity::Simple
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Complexity::Simple => "Simple",
            Complexity::Medium => "Medium",
            Complexity::Complex => "Complex",
        })
    }
}

/// Parameters, plus 2 for a request body, plus 1 for more than three responses.
pub fn complexity_score(endpoint: &EndpointDescriptor) -> usize {
    endpoint.parameters.len()
        + if endpoint.request_body.is_some() { 2 } else { 0 }
        + usize::from(endpoint.response_count() > 3)
}

/// Heuristic: the summary or description mentions "auth" (any case), or the
/// path contains "auth".
pub fn requires_auth(endpoint: &EndpointDescriptor) -> bool {
    let mentions = |text: &Option<String>| {
        text.as_deref()
            .is_some_and(|t| t.to_lowercase().contains("auth"))
    };
    mentions(&endpoint.description) || mentions(&endpoint.summary) || endpoint.path.contains("auth")
}

/// Non-empty `/`-separated segments.
pub fn path_depth(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodCount {
    pub method: HttpMethod,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplexityBucket {
    pub level: Complexity,
    pub count: usize,
    /// Share of all endpoints, rounded to a whole percent.
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointDepth {
    pub endpoint: String,
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointMetrics {
    pub total_endpoints: usize,
    pub unique_paths: usize,
    /// Mean parameter count, one decimal place.
    pub avg_parameters: f64,
    /// In order of first appearance.
    pub methods: Vec<MethodCount>,
    pub auth_required: usize,
    pub public: usize,
    /// In order of first appearance.
    pub complexity: Vec<ComplexityBucket>,
    pub path_depths: Vec<EndpointDepth>,
}

impl EndpointMetrics {
    pub fn from_endpoints(endpoints: &[EndpointDescriptor]) -> Self {
        let total = endpoints.len();

        let mut methods: Vec<MethodCount> = Vec::new();
        let mut levels: Vec<(Complexity, usize)> = Vec::new();
        let mut auth_required = 0;
        let mut parameter_total = 0;

        for endpoint in endpoints {
            match methods.iter_mut().find(|m| m.method == endpoint.method) {
                Some(entry) => entry.count += 1,
                None => methods.push(MethodCount {
                    method: endpoint.method,
                    count: 1,
                }),
            }

            let level = Complexity::from_score(complexity_score(endpoint));
            match levels.iter_mut().find(|(l, _)| *l == level) {
                Some((_, count)) => *count += 1,
                None => levels.push((level, 1)),
            }

            if requires_auth(endpoint) {
                auth_required += 1;
            }
            parameter_total += endpoint.parameters.len();
        }

        let complexity = levels
            .into_iter()
            .map(|(level, count)| ComplexityBucket {
                level,
                count,
                percentage: percentage(count, total),
            })
            .collect();

        let avg_parameters = if total == 0 {
            0.0
        } else {
            (parameter_total as f64 / total as f64 * 10.0).round() / 10.0
        };

        Self {
            total_endpoints: total,
            unique_paths: endpoints
                .iter()
                .map(|e| e.path.as_str())
                .collect::<HashSet<_>>()
                .len(),
            avg_parameters,
            methods,
            auth_required,
            public: total - auth_required,
            complexity,
            path_depths: endpoints
                .iter()
                .map(|e| EndpointDepth {
                    endpoint: e.key(),
                    depth: path_depth(&e.path),
                })
                .collect(),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.path_depths.iter().map(|d| d.depth).max().unwrap_or(0)
    }
}

fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (count as f64 / total as f64 * 100.0).round() as u32
}
