//! # Schema Parser
//!
//! Turns a raw OpenAPI 3.x / Swagger 2.0 document into a flat list of
//! [`EndpointDescriptor`]s plus the [`SchemaInfo`] shared by every generation
//! call of a job.
//!
//! The parser walks `serde_json::Value` rather than a typed OpenAPI model, so
//! an incomplete or slightly invalid document still yields the operations it
//! does contain.
mod build;
mod load;
mod types;

pub use build::*;
pub use load::*;
pub use types::*;
