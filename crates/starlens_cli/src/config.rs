//! Configuration file support for starlens.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `STARLENS_`, e.g., `STARLENS_GITHUB_TOKEN`)
//! 3. Config file (./starlens.toml, then ~/.config/starlens/config.toml)
//! 4. Built-in defaults
//!
//! The environment separator is `_`, so only single-word keys such as
//! `github.token`, `github.endpoint`, `collect.output` or `analyze.input`
//! can be set from the environment. The GitHub token additionally falls back
//! to the conventional `GITHUB_TOKEN` variable.
//!
//! Example config file:
//! ```toml
//! [github]
//! token = "ghp_..."  # or use STARLENS_GITHUB_TOKEN / GITHUB_TOKEN
//!
//! [collect]
//! target_count = 1000
//! page_size = 25
//! max_retries = 4
//! retry_base = 1.5
//! output = "repositories.csv"
//!
//! [analyze]
//! input = "repositories.csv"
//! output_dir = "charts"
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use starlens::collect::{DEFAULT_PAGE_SIZE, DEFAULT_TARGET_COUNT};
use starlens::github::DEFAULT_SEARCH_QUERY;
use starlens::retry::{MAX_RETRIES, RETRY_BASE};
use starlens::{CollectOptions, GITHUB_GRAPHQL_URL, RetryConfig};

/// Conventional token variable consulted when none is configured.
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub configuration.
    pub github: GitHubConfig,
    /// Default collection options.
    pub collect: CollectConfig,
    /// Default analysis options.
    pub analyze: AnalyzeConfig,
}

/// GitHub configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token.
    /// Can also be set via STARLENS_GITHUB_TOKEN or GITHUB_TOKEN.
    pub token: Option<String>,
    /// GraphQL endpoint.
    pub endpoint: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            endpoint: GITHUB_GRAPHQL_URL.to_string(),
        }
    }
}

/// Collection defaults.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    /// Number of repositories to collect.
    pub target_count: usize,
    /// Edges requested per page.
    pub page_size: usize,
    /// Retries per page after the first attempt.
    pub max_retries: usize,
    /// Base of the exponential backoff, in seconds.
    pub retry_base: f64,
    /// CSV file written by `collect`.
    pub output: PathBuf,
    /// Search qualifier string.
    pub search_query: String,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            target_count: DEFAULT_TARGET_COUNT,
            page_size: DEFAULT_PAGE_SIZE,
            max_retries: MAX_RETRIES,
            retry_base: RETRY_BASE,
            output: PathBuf::from("repositories.csv"),
            search_query: DEFAULT_SEARCH_QUERY.to_string(),
        }
    }
}

/// Analysis defaults.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AnalyzeConfig {
    /// CSV file read by `analyze`.
    pub input: PathBuf,
    /// Directory the charts are written to.
    pub output_dir: PathBuf,
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("repositories.csv"),
            output_dir: PathBuf::from("charts"),
        }
    }
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Falls back to defaults (with a warning) when a source cannot be parsed.
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // Local config file (higher priority than XDG)
        let local_config = PathBuf::from("starlens.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./starlens.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., STARLENS_GITHUB_TOKEN -> github.token
        builder = builder.add_source(
            Environment::with_prefix("STARLENS")
                .separator("_")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the GitHub token, falling back to `GITHUB_TOKEN`.
    pub fn github_token(&self) -> Option<String> {
        self.github_token_or(std::env::var(GITHUB_TOKEN_VAR).ok())
    }

    /// Get the GitHub token, falling back to `fallback`.
    pub fn github_token_or(&self, fallback: Option<String>) -> Option<String> {
        resolve_token(self.github.token.as_deref(), fallback)
    }

    /// Collection options from the configured defaults.
    pub fn collect_options(&self) -> CollectOptions {
        CollectOptions::new(self.collect.target_count, self.collect.page_size)
            .with_search_query(self.collect.search_query.clone())
            .with_retry(RetryConfig::new(
                self.collect.retry_base,
                self.collect.max_retries,
            ))
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "starlens").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Pick the configured token, else the fallback. Blank values count as unset.
fn resolve_token(configured: Option<&str>, fallback: Option<String>) -> Option<String> {
    configured
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| {
            fallback
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
        })
}
