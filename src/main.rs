use clap::Parser;

use syntax_lsp::config::{Cli, ServerConfig};
use syntax_lsp::log;
use syntax_lsp::lsp::run_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from(Cli::parse());

    // Keep the guard alive so queued log lines are flushed on the way out
    let guard = log::init(&config.log_file, &config.log_level)?;

    let code = run_server(config).await?;

    drop(guard);
    std::process::exit(code);
}
