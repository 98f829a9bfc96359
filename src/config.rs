//! Runtime settings for the relay.
//!
//! [`Settings`] is built once at startup from the [`Cli`] and an optional YAML
//! file, validated, and then handed to the service and router by value. Nothing
//! reads the environment after that point.
//!
//! # YAML overrides
//!
//! ```yaml
//! app_name: NYTimes Articles API
//! categories: [arts, food, movies, travel, science]
//! stories_per_category: 2
//! max_retries: 3
//! backoff_unit_ms: 1000
//! request_timeout_secs: 30
//! ```

use crate::cli::Cli;
use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

pub const TOP_STORIES_URL: &str = "https://api.nytimes.com/svc/topstories/v2/{section}.json";
pub const ARTICLE_SEARCH_URL: &str = "https://api.nytimes.com/svc/search/v2/articlesearch.json";
pub const DEFAULT_CATEGORIES: [&str; 5] = ["arts", "food", "movies", "travel", "science"];

/// Application settings.
///
/// The API key is never deserialized from the YAML file; it only comes from the
/// CLI or environment.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(skip)]
    pub api_key: String,
    pub app_name: String,
    pub api_version: String,
    /// Sections requested by `GET /nytimes/topstories`, in output order.
    pub categories: Vec<String>,
    pub stories_per_category: usize,
    /// Total attempts per upstream request, including the first.
    pub max_retries: u32,
    /// Length of one backoff unit. The Nth retry waits `2 * (N + 1)` units.
    pub backoff_unit_ms: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Top Stories URL template; must contain `{section}`.
    pub top_stories_url: String,
    pub article_search_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            app_name: "NYTimes Articles API".to_string(),
            api_version: "v1".to_string(),
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            stories_per_category: 2,
            max_retries: 3,
            backoff_unit_ms: 1000,
            request_timeout_secs: 30,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            top_stories_url: TOP_STORIES_URL.to_string(),
            article_search_url: ARTICLE_SEARCH_URL.to_string(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("app_name", &self.app_name)
            .field("api_version", &self.api_version)
            .field("categories", &self.categories)
            .field("stories_per_category", &self.stories_per_category)
            .field("max_retries", &self.max_retries)
            .field("backoff_unit_ms", &self.backoff_unit_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("top_stories_url", &self.top_stories_url)
            .field("article_search_url", &self.article_search_url)
            .finish()
    }
}

impl Settings {
    /// Assemble settings from parsed CLI arguments and the optional YAML file.
    #[instrument(level = "info", skip_all, fields(config = ?cli.config))]
    pub async fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut settings = match &cli.config {
            Some(path) => Self::from_yaml_file(path).await?,
            None => Self::default(),
        };
        settings.api_key = cli.nytimes_api_key.trim().to_string();
        settings.validate()?;
        info!(settings = ?settings, "Loaded configuration");
        Ok(settings)
    }

    async fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_yaml_str(&raw).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    /// Parse YAML overrides on top of the defaults.
    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::Invalid("the NYT API key must not be empty".into()));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid("max_retries must be at least 1".into()));
        }
        if !self.top_stories_url.contains("{section}") {
            return Err(ConfigError::Invalid(format!(
                "top_stories_url must contain {{section}}: {}",
                self.top_stories_url
            )));
        }
        for u in [&self.top_stories_url, &self.article_search_url] {
            url::Url::parse(&u.replace("{section}", "arts"))
                .map_err(|e| ConfigError::Invalid(format!("invalid upstream URL {u}: {e}")))?;
        }
        Ok(())
    }

    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
