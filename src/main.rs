// HTTP entry point for article acquisition.
//
// Reads configuration from flags or the environment (a `.env` file is
// honoured), serves the fetch trigger and closes Chrome on shutdown.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use article_fetch::{BrowserManager, FetchConfig, browser_pipeline, server};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "article-fetch", version, about = "Fetch, render and submit articles for ingestion")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// Shared secret for signing ingestion API tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// Base URL of the ingestion API (`/graphql` is appended)
    #[arg(long, env = "REST_BACKEND_ENDPOINT")]
    api_base: String,

    /// Rendering proxy API key; the fallback is disabled without it
    #[arg(long, env = "SCRAPINGBEE_API_KEY", hide_env_values = true)]
    proxy_api_key: Option<String>,

    #[arg(long, env = "CHROMIUM_PATH")]
    chromium_path: Option<PathBuf>,

    /// Egress proxy for browser traffic
    #[arg(long, env = "PROXY_URL")]
    egress_proxy: Option<String>,

    /// Show the browser window (debugging)
    #[arg(long)]
    headful: bool,

    #[arg(long, env = "LAUNCH_TIMEOUT_SECS", default_value_t = 60)]
    launch_timeout_secs: u64,

    #[arg(long, env = "NAVIGATION_TIMEOUT_SECS", default_value_t = 30)]
    navigation_timeout_secs: u64,
}

impl Args {
    fn into_config(self) -> Result<FetchConfig> {
        FetchConfig::builder()
            .jwt_secret(self.jwt_secret)
            .api_base(self.api_base)
            .proxy_api_key(self.proxy_api_key)
            .chrome_executable(self.chromium_path)
            .egress_proxy(self.egress_proxy)
            .headless(!self.headful)
            .launch_timeout_secs(self.launch_timeout_secs)
            .navigation_timeout_secs(self.navigation_timeout_secs)
            .build()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let listen = args.listen;
    let config = args.into_config().context("Invalid configuration")?;

    let manager = BrowserManager::new(config.clone());
    let fetcher = Arc::new(browser_pipeline(config, manager.clone())?);
    info!(
        "Registered handlers: {}",
        fetcher.registry().names().join(", ")
    );

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind {listen}"))?;
    info!("Listening on {}", listen);

    axum::serve(listener, server::router(fetcher))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    manager.shutdown().await;
    Ok(())
}
