//! # NYT Relay
//!
//! A small HTTP service that relays the New York Times Top Stories and
//! Article Search APIs behind two normalized endpoints.
//!
//! ## Features
//!
//! - `GET /nytimes/topstories`: the latest stories from a fixed list of
//!   sections (arts, food, movies, travel, science by default), two per section
//! - `GET /nytimes/articlesearch`: keyword search with optional date bounds
//! - Linear backoff retry when the upstream answers 429
//! - Upstream JSON normalized into fixed shapes with empty-string defaults
//!
//! ## Usage
//!
//! ```sh
//! NYTIMES_API_KEY=YOUR_KEY nyt_relay --bind 0.0.0.0:8000
//! ```
//!
//! ## Architecture
//!
//! 1. **Routes** ([`routes`]): validate query parameters, map failures to status codes
//! 2. **Aggregation** ([`nyt`]): one upstream call per section, or one for search
//! 3. **Upstream client** ([`api`]): GET with retry on throttling

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod models;
mod nyt;
mod routes;
mod utils;

#[cfg(test)]
mod test_utils;

use api::{ReqwestTransport, UpstreamClient};
use cli::Cli;
use config::Settings;
use nyt::NytService;
use routes::{AppState, router};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // Values from .env feed RUST_LOG and clap's env fallbacks
    let dotenv_path = dotenvy::dotenv().ok();

    // --- Tracing init ---
    tfmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("nyt_relay starting up");
    if let Some(path) = dotenv_path {
        debug!(path = %path.display(), "Loaded .env file");
    }

    let args = Cli::parse();
    debug!(bind = %args.bind, config = ?args.config, "Parsed CLI arguments");

    let settings = Settings::load(&args).await?;

    let transport = ReqwestTransport::new(&settings.user_agent, settings.request_timeout())?;
    let client = UpstreamClient::new(
        Arc::new(transport),
        settings.max_retries,
        settings.backoff_unit(),
    );
    let nyt = NytService::new(client, &settings);
    let app = router(AppState::new(nyt, settings));

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down cleanly");
    Ok(())
}

/// Log filter from `RUST_LOG`, defaulting to `info`.
///
/// Must run after `.env` has been loaded.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_picks_up_rust_log_from_dotenv() {
        if std::env::var_os("RUST_LOG").is_some() {
            // an inherited RUST_LOG wins over .env; nothing to observe
            return;
        }
        let path = std::env::temp_dir().join(format!("nyt_relay_{}.env", std::process::id()));
        std::fs::write(&path, "RUST_LOG=nyt_relay=trace\n").unwrap();

        dotenvy::from_path(&path).unwrap();
        let filter = env_filter().to_string();
        let _ = std::fs::remove_file(&path);

        assert!(filter.contains("nyt_relay=trace"), "got {filter}");
    }
}
