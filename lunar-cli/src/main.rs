//! Lunar storage command-line tool.
//!
//! Usage:
//!   lunar init
//!   lunar datasource create --user u1 --json '{"type": "LOCAL_FILE", ...}'
//!   lunar resolve --user u1 --kind datasource --id d1
//!
//! Output is JSON on stdout; logs go to stderr.

use anyhow::Result;
use clap::Parser;
use lunar_cli::{Cli, exit_code, load_config, run};
use lunar_service::StorageContext;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    if let Err(e) = execute(cli).await {
        error!("{:#}", e);
        std::process::exit(exit_code(&e));
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let config = load_config(&cli.config, cli.base_path);
    let context = StorageContext::local(config)?;
    info!("Lunar storage at {:?}", context.namespace().base());

    let output = run(cli.command, &context).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
