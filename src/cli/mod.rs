//! # CLI Module
//!
//! Command-line front end over the library, shipped as the `apidocgen` binary.
//!
//! ## Commands
//!
//! ```bash
//! # List endpoints
//! apidocgen endpoints --schema openapi.yaml
//!
//! # Endpoint metrics, as text or JSON
//! apidocgen metrics --schema openapi.json --json
//!
//! # Generate documentation through a summarize endpoint
//! APIDOC_SERVICE_URL=http://localhost:3000/api/summarize \
//!     apidocgen generate --schema openapi.yaml --out API.md
//!
//! # Or call OpenAI directly
//! APIDOC_SERVICE_KIND=openai OPENAI_API_KEY=sk-... \
//!     apidocgen generate --schema openapi.yaml
//!
//! # Request snippet for one endpoint
//! apidocgen snippet --schema openapi.yaml --method post --path /pets --lang python
//!
//! # Questions about the schema
//! apidocgen chat --schema openapi.yaml -q "How do I authenticate?"
//! ```
//!
//! Logging goes to stderr (see [`crate::logging`]); command output goes to stdout.

mod commands;


pub use commands::{render_endpoints, render_metrics, run_cli, Cli, Commands};
