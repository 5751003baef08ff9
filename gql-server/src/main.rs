// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::path::PathBuf;

use clap::Parser;
use gql_server::config::load_config_from_file;
use gql_server::config::ServerConfig;
use gql_server::defaults;
use gql_server::helpers::init_tracing;
use gql_server::web;
use tokio_util::sync::CancellationToken;

/// Paginated GraphQL API over the block archive
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The DB url (default: sqlite://data/node-archive.db)
    #[arg(short = 'd', long = "db", env, num_args = 0..=1)]
    db: Option<String>,

    /// The host address and TCP port on which the service will accept
    /// connections (default: 127.0.0.1:3000)
    #[arg(short = 'l', long = "listen", env, num_args = 0..=1)]
    listen: Option<String>,

    /// Path to a JSON config file with a `paging` section
    #[arg(short = 'c', long = "config", env = "GQL_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides `paging.max_page_size` of the config
    #[arg(long = "max-page-size", env)]
    max_page_size: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config_from_file(path)?,
        None => ServerConfig::default(),
    }
    .with_max_page_size(args.max_page_size)
    .ensure_page_sizes();
    tracing::info!(target: "gql_server", "Paging: {:?}", config.paging);

    let db = args.db.unwrap_or(defaults::PATH_TO_DB.to_string());
    let listen = args.listen.unwrap_or(defaults::LISTEN.to_string());

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(target: "gql_server", "Failed to listen for shutdown signal: {err}");
            return;
        }
        tracing::info!(target: "gql_server", "Shutting down");
        signal.cancel();
    });

    web::start(listen, db, config, shutdown).await
}
