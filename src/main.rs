//! Caching forwarding proxy binary

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cachew_proxy::{
    option::{DEFAULT_HOST, DEFAULT_PORT},
    CacheStore, Listener, ProxyOption, SessionHandler, TcpOrigin,
};

#[derive(Debug, Parser)]
#[command(about = "Forwarding HTTP proxy with an on-disk GET cache")]
struct Cli {
    /// Host to bind
    #[arg(short = 'H', long)]
    host: Option<String>,
    /// Port to listen on
    #[arg(short = 'P', long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cachew_proxy=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut option = ProxyOption::default();
    match cli.host {
        Some(host) => option.host = host,
        None => tracing::warn!("using default host: {}", DEFAULT_HOST),
    }
    match cli.port {
        Some(port) => option.port = port,
        None => tracing::warn!("using default port: {}", DEFAULT_PORT),
    }

    let cache = Arc::new(CacheStore::open(option.cache_dir.clone()).await?);
    let handler = Arc::new(SessionHandler::new(
        TcpOrigin::new(option.buf_size),
        cache,
        option.error_page.clone(),
        option.buf_size,
    ));

    let listener = Listener::bind(&option.host, option.port).await?;
    tracing::info!(host = %option.host, port = option.port, "proxy listening, stop with ctrl-c");

    listener.run(handler).await;

    Ok(())
}
