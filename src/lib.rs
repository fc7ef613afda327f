//! # apidocgen
//!
//! **apidocgen** turns an OpenAPI/Swagger schema into human-readable
//! documentation for each endpoint, using an external documentation
//! generation service (an AI-backed summarize endpoint, or OpenAI directly).
//!
//! ## Overview
//!
//! The core is the endpoint-summary generation pipeline. It extracts endpoints
//! from an arbitrary document, batches them, calls the generation service with
//! retry and backoff, caches results, and folds per-endpoint failures into a
//! complete report instead of failing the job.
//!
//! ## Architecture
//!
//! - **[`spec`]** - Schema parsing: raw document → [`spec::EndpointDescriptor`]s
//! - **[`summary_cache`]** - Summary store with a one-hour TTL and periodic sweep
//! - **[`rate_gate`]** - Per-caller fixed-window request counter
//! - **[`generation`]** - Service seam, HTTP and OpenAI backends, retrying client
//! - **[`orchestrator`]** - Batching, settle-all joins, inter-batch pauses
//! - **[`pipeline`]** - Job entry point wiring all of the above
//! - **[`metrics`]**, **[`snippet`]**, **[`report`]**, **[`chat`]** - Schema
//!   metrics, request snippets, Markdown output and schema Q&A
//! - **[`config`]**, **[`logging`]**, **[`cli`]** - Configuration, tracing setup, CLI
//!
//! ### Job Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant Pipeline
//!     participant Orchestrator as BatchOrchestrator
//!     participant Client as GenerationClient
//!     participant Cache as SummaryCache
//!     participant Gate as RateGate
//!     participant Service as DocumentationService
//!
//!     Caller->>Pipeline: generate_schema_documentation(schema)
//!     Pipeline->>Pipeline: parse JSON, extract endpoints
//!     Pipeline->>Orchestrator: run(endpoints, schema_info)
//!     loop each batch of 2
//!         par each endpoint in batch
//!             Orchestrator->>Client: generate(endpoint)
//!             Client->>Cache: get(key)
//!             alt hit
//!                 Cache-->>Client: summary
//!             else miss
//!                 loop attempt 1..=3
//!                     Client->>Gate: check(caller)
//!                     Client->>Service: summarize(endpoint, schema_info)
//!                 end
//!                 Client->>Cache: put(key, summary)
//!             end
//!             Client-->>Orchestrator: summary or error
//!         end
//!         Orchestrator->>Orchestrator: record summary / fallback notice
//!         Orchestrator->>Orchestrator: sleep 2s (not after last batch)
//!     end
//!     Orchestrator-->>Pipeline: JobResult
//!     Pipeline-->>Caller: Documentation
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use apidocgen::config::PipelineConfig;
//! use apidocgen::pipeline::Pipeline;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut config = PipelineConfig::default();
//! config.service.url = Some("http://localhost:3000/api/summarize".into());
//! let pipeline = Pipeline::from_config(config)?;
//!
//! let doc = pipeline
//!     .generate_schema_documentation(std::fs::read_to_string("openapi.json")?)
//!     .await?;
//! for endpoint in &doc.endpoints {
//!     println!("{}: {:?}", endpoint.key(), doc.summary_for(endpoint));
//! }
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod pipeline;
pub mod rate_gate;
pub mod report;
pub mod snippet;
pub mod spec;
pub mod summary_cache;

pub use error::{GenerationError, PipelineError, RateLimitExceeded, ServiceError};
pub use pipeline::{Documentation, Pipeline, SchemaInput};
pub use spec::{EndpointDescriptor, HttpMethod, SchemaInfo};
