mod file_config;

pub use file_config::{FileConfig, ProviderConfig};

use crate::enrichment::PosterPreferences;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.themoviedb.org/3";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub tmdb_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub provider: ProviderSettings,
}

/// Metadata provider connection and retry settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub api_key: String,
    pub base_url: String,
    pub timeout_sec: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub poster_language: String,
    pub poster_secondary_language: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            timeout_sec: 10,
            max_retries: 2,
            initial_backoff_ms: 250,
            max_backoff_ms: 2000,
            backoff_multiplier: 2.0,
            poster_language: "en".to_string(),
            poster_secondary_language: None,
        }
    }
}

impl ProviderSettings {
    pub fn poster_preferences(&self) -> PosterPreferences {
        PosterPreferences {
            preferred: self.poster_language.clone(),
            secondary: self.poster_secondary_language.clone(),
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let provider_file = file.provider.unwrap_or_default();
        let defaults = ProviderSettings::default();
        let api_key = provider_file
            .api_key
            .or_else(|| cli.tmdb_api_key.clone())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Provider API key must be specified via --tmdb-api-key, TMDB_API_KEY or [provider].api_key"
                )
            })?;

        let provider = ProviderSettings {
            api_key,
            base_url: provider_file.base_url.unwrap_or(defaults.base_url),
            timeout_sec: provider_file.timeout_sec.unwrap_or(defaults.timeout_sec),
            max_retries: provider_file.max_retries.unwrap_or(defaults.max_retries),
            initial_backoff_ms: provider_file
                .initial_backoff_ms
                .unwrap_or(defaults.initial_backoff_ms),
            max_backoff_ms: provider_file
                .max_backoff_ms
                .unwrap_or(defaults.max_backoff_ms),
            backoff_multiplier: provider_file
                .backoff_multiplier
                .unwrap_or(defaults.backoff_multiplier),
            poster_language: provider_file
                .poster_language
                .unwrap_or(defaults.poster_language),
            poster_secondary_language: provider_file.poster_secondary_language,
        };

        if provider.backoff_multiplier < 1.0 {
            bail!(
                "provider.backoff_multiplier must be at least 1.0, got {}",
                provider.backoff_multiplier
            );
        }

        Ok(Self {
            db_dir,
            port,
            metrics_port,
            logging_level,
            provider,
        })
    }

    pub fn movie_db_path(&self) -> PathBuf {
        self.db_dir.join("boxoffice.db")
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
