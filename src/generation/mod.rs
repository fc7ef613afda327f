//! # Generation Module
//!
//! Calls the external documentation generation service for one endpoint.
//!
//! - [`DocumentationService`] is the seam to the service. Two backends ship:
//!   [`HttpDocumentationService`] (a summarize endpoint speaking
//!   `{endpoint, schemaInfo}` → `{summary}`) and [`OpenAiClient`] (chat
//!   completions called directly).
//! - [`GenerationClient`] wraps a service with the summary cache, the rate
//!   gate and a [`RetryPolicy`].

mod client;
mod openai;
pub mod prompt;
mod service;

pub use client::{GenerationClient, RetryPolicy};
pub use openai::{OpenAiClient, DEFAULT_BASE_URL, DEFAULT_MODEL, SUMMARY_MAX_TOKENS};
pub use service::{
    DocumentationService, HttpDocumentationService, SummaryRequest, INVALID_CREDENTIAL_CODE,
    RATE_LIMIT_CODE,
};
