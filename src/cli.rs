//! Command-line interface definitions for the NYT relay.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every argument can also be provided through an environment variable, and a
//! `.env` file in the working directory is loaded before parsing.

use clap::Parser;

/// Command-line arguments for the relay server.
///
/// # Examples
///
/// ```sh
/// # Key from the environment, default bind address
/// NYTIMES_API_KEY=YOUR_KEY nyt_relay
///
/// # Explicit key, custom port and a YAML config with overrides
/// nyt_relay --nytimes-api-key YOUR_KEY --bind 127.0.0.1:9000 -c ./config.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// New York Times API key
    #[arg(long, env = "NYTIMES_API_KEY", hide_env_values = true)]
    pub nytimes_api_key: String,

    /// Address the HTTP server listens on
    #[arg(short, long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind: String,

    /// Optional path to config.yaml file
    #[arg(short, long, env = "NYT_RELAY_CONFIG")]
    pub config: Option<String>,
}
