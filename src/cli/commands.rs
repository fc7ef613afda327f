use crate::chat::ChatSession;
use crate::config::PipelineConfig;
use crate::generation::OpenAiClient;
use crate::metrics::EndpointMetrics;
use crate::pipeline::Pipeline;
use crate::report::render_markdown;
use crate::snippet::{request_snippet, Language};
use crate::spec::{load_document, load_endpoints, EndpointDescriptor, HttpMethod};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Command-line interface for apidocgen
///
/// Generates human-readable documentation for every endpoint of an
/// OpenAPI/Swagger schema.
#[derive(Debug, Parser)]
#[command(name = "apidocgen")]
#[command(about = "API schema documentation generator", long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the endpoints found in a schema
    Endpoints {
        /// Path to the OpenAPI/Swagger schema (JSON or YAML)
        #[arg(short, long)]
        schema: PathBuf,
    },
    /// Print endpoint metrics: method mix, auth heuristic, complexity, path depth
    Metrics {
        /// Path to the OpenAPI/Swagger schema (JSON or YAML)
        #[arg(short, long)]
        schema: PathBuf,

        /// Emit JSON instead of a text summary
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Generate documentation for every endpoint and write a Markdown report
    Generate {
        /// Path to the OpenAPI/Swagger schema (JSON or YAML)
        #[arg(short, long)]
        schema: PathBuf,

        /// Pipeline configuration file (YAML); environment variables override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print a ready-to-paste request for one endpoint
    Snippet {
        /// Path to the OpenAPI/Swagger schema (JSON or YAML)
        #[arg(short, long)]
        schema: PathBuf,

        /// HTTP method of the endpoint (case-insensitive)
        #[arg(short, long, value_parser = parse_method)]
        method: HttpMethod,

        /// Path of the endpoint exactly as written in the schema
        #[arg(short, long)]
        path: String,

        /// curl, fetch, axios or python
        #[arg(short, long, default_value = "curl")]
        lang: Language,
    },
    /// Ask questions about a schema (OpenAI backend)
    Chat {
        /// Path to the OpenAPI/Swagger schema (JSON or YAML)
        #[arg(short, long)]
        schema: PathBuf,

        /// Pipeline configuration file (YAML); only the `service` section is used
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Question to ask; repeat to continue the conversation
        #[arg(short, long, required = true)]
        question: Vec<String>,
    },
}

fn parse_method(s: &str) -> Result<HttpMethod, String> {
    HttpMethod::parse(s).ok_or_else(|| format!("unsupported HTTP method '{s}'"))
}

/// One line per endpoint: method, path and the schema's own summary.
pub fn render_endpoints(endpoints: &[EndpointDescriptor]) -> String {
    let width = endpoints
        .iter()
        .map(|e| e.method.as_str().len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for endpoint in endpoints {
        out.push_str(&format!(
            "{:<width$} {}",
            endpoint.method.as_str(),
            endpoint.path
        ));
        if let Some(summary) = &endpoint.summary {
            out.push_str(&format!("  - {summary}"));
        }
        out.push('\n');
    }
    out.push_str(&format!("{} endpoint(s)\n", endpoints.len()));
    out
}

pub fn render_metrics(metrics: &EndpointMetrics) -> String {
    let mut out = format!(
        "Endpoints:       {}\nUnique paths:    {}\nAvg parameters:  {}\nMax path depth:  {}\n",
        metrics.total_endpoints,
        metrics.unique_paths,
        metrics.avg_parameters,
        metrics.max_depth()
    );
    out.push_str("\nMethods:\n");
    for m in &metrics.methods {
        out.push_str(&format!("  {:<8}{}\n", m.method.as_str(), m.count));
    }
    out.push_str(&format!(
        "\nAuthentication:\n  Public         {}\n  Auth required  {}\n",
        metrics.public, metrics.auth_required
    ));
    out.push_str("\nComplexity:\n");
    for bucket in &metrics.complexity {
        out.push_str(&format!(
            "  {:<8}{} ({}%)\n",
            bucket.level.to_string(),
            bucket.count,
            bucket.percentage
        ));
    }
    out
}

fn emit(output: &str, out: Option<&Path>) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, output)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
        None => print!("{output}"),
    }
    Ok(())
}

/// Execute a parsed command line.
pub async fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Endpoints { schema } => {
            let (endpoints, _, _) = load_endpoints(&schema)?;
            print!("{}", render_endpoints(&endpoints));
            Ok(())
        }
        Commands::Metrics { schema, json } => {
            let (endpoints, _, _) = load_endpoints(&schema)?;
            let metrics = EndpointMetrics::from_endpoints(&endpoints);
            if json {
                println!("{}", serde_json::to_string_pretty(&metrics)?);
            } else {
                print!("{}", render_metrics(&metrics));
            }
            Ok(())
        }
        Commands::Generate {
            schema,
            config,
            out,
        } => {
            let document = load_document(&schema)?;
            let config = PipelineConfig::load(config.as_deref())?;
            let pipeline = Pipeline::from_config(config)?;

            let shutdown = CancellationToken::new();
            let sweeper = pipeline.start_cache_sweeper(shutdown.clone());
            let result = pipeline.generate_schema_documentation(document).await;
            shutdown.cancel();
            sweeper.await.ok();

            let doc = result?;
            if !doc.failed.is_empty() {
                tracing::warn!(failed = doc.failed.len(), "Some endpoints have no generated summary");
            }
            emit(&render_markdown(&doc), out.as_deref())
        }
        Commands::Snippet {
            schema,
            method,
            path,
            lang,
        } => {
            let (endpoints, _, _) = load_endpoints(&schema)?;
            let Some(endpoint) = endpoints
                .iter()
                .find(|e| e.method == method && e.path == path)
            else {
                bail!("no {method} {path} operation in {}", schema.display());
            };
            println!("{}", request_snippet(endpoint, lang));
            Ok(())
        }
        Commands::Chat {
            schema,
            config,
            question,
        } => {
            let document = load_document(&schema)?;
            let config = PipelineConfig::load(config.as_deref())?;
            let api_key = config
                .service
                .api_key
                .as_deref()
                .context("chat needs an OpenAI API key (OPENAI_API_KEY)")?;
            let mut client =
                OpenAiClient::new(api_key, config.service.timeout())?.with_model(&config.service.model);
            if let Some(url) = &config.service.url {
                client = client.with_base_url(url);
            }

            let mut session = ChatSession::new(&client, &document);
            for q in &question {
                let answer = session.ask(q).await?;
                println!("> {q}\n\n{answer}\n");
            }
            Ok(())
        }
    }
}
