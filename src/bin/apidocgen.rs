use apidocgen::cli::{run_cli, Cli};
use apidocgen::logging::{init_logging, LogConfig};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    init_logging(&log_config)?;

    run_cli(cli).await
}
