#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! `instagram-cli`: one subcommand per gateway operation, results as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use instagram_gateway::config::GatewayConfig;
use instagram_gateway::{GatewayError, InstagramGateway, PublishFailure};

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "instagram-cli")]
#[command(version, about = "Instagram Graph API gateway client", long_about = None)]
struct Cli {
    /// YAML configuration file; `INSTAGRAM_*` environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = logging::LogFormat::Text)]
    log_format: logging::LogFormat,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: commands::Command,
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = GatewayConfig::load(cli.config.as_deref()).context("loading configuration")?;
    tracing::debug!(
        api_version = %config.api_version,
        business_account_id = config.business_account_id.as_deref(),
        cache_enabled = config.cache_enabled,
        "Configuration loaded"
    );
    let gateway = InstagramGateway::from_config(&config).context("building HTTP client")?;
    let client = gateway.client();

    let output = cli.command.run(client.as_ref()).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn report(err: &anyhow::Error) {
    if let Some(failure) = err.downcast_ref::<PublishFailure>() {
        eprintln!("error [{}]: {failure}", failure.error.category());
        if let Some(container_id) = failure.container_id.as_deref() {
            eprintln!("container {container_id} was created but not published");
        }
    } else if let Some(error) = err.downcast_ref::<GatewayError>() {
        eprintln!("error [{}]: {error}", error.category());
    } else {
        eprintln!("error: {err:#}");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.log_format, cli.verbose) {
        eprintln!("failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}
