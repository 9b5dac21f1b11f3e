use std::path::PathBuf;

use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use graphql_intercept::proxy::Upstream;
use graphql_intercept::runtime;
use graphql_intercept::server::Server;
use tracing::info;

/// Clap styling
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Arguments to the interception proxy
#[derive(Debug, clap::Parser)]
#[command(
    styles = STYLES,
    version,
    about = "GraphQL Intercept - logs operation content and batch size of GraphQL requests",
)]
struct Args {
    /// Path to the YAML configuration file. When omitted, all options are
    /// read from GRAPHQL_INTERCEPT_ environment variables.
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match args.config {
        Some(path) => runtime::read_config(path)?,
        None => runtime::read_config_from_env()?,
    };

    let _guard = runtime::setup_logging(&config.logging)?;

    info!(
        "GraphQL Intercept v{} - forwarding to {}",
        std::env!("CARGO_PKG_VERSION"),
        config.endpoint.as_str(),
    );

    let upstream = Upstream::new(config.endpoint.into_inner(), config.headers);
    Server::new(config.listen.socket_addr(), upstream, config.intercept)
        .serve()
        .await?;

    Ok(())
}
