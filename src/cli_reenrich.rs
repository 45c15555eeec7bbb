//! Re-runs provider enrichment for movies whose correction stopped after the
//! merge, without going through the HTTP server.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use boxoffice_catalog_server::config;
use boxoffice_catalog_server::correction::IdentityResolver;
use boxoffice_catalog_server::movie_store::SqliteMovieStore;
use boxoffice_catalog_server::provider::TmdbClient;

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory containing the movie database (boxoffice.db).
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// TMDB API key used for metadata enrichment.
    #[clap(long, env = "TMDB_API_KEY", hide_env_values = true)]
    pub tmdb_api_key: Option<String>,

    /// Canonical movie ids to re-enrich.
    #[clap(required = true, num_args = 1..)]
    pub ids: Vec<i64>,
}

impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_dir: args.db_dir.clone(),
            tmdb_api_key: args.tmdb_api_key.clone(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(config::FileConfig::load(path)?),
        None => None,
    };
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    let db_path = app_config.movie_db_path();
    if !db_path.exists() {
        bail!("No movie database at {:?}", db_path);
    }
    let movie_store = Arc::new(
        SqliteMovieStore::new(&db_path, 1)
            .with_context(|| format!("Failed to open movie database at {:?}", db_path))?,
    );
    let provider = Arc::new(TmdbClient::new(&app_config.provider)?);
    let resolver = IdentityResolver::new(
        movie_store,
        provider,
        app_config.provider.poster_preferences(),
    );

    let mut failed = Vec::new();
    for id in &cli_args.ids {
        match resolver.reenrich(*id).await {
            Ok(outcome) => info!(
                "Movie {}: {} rows inserted",
                outcome.movie_id,
                outcome.inserted.total()
            ),
            Err(err) => {
                error!("Movie {}: {}", id, err);
                failed.push(*id);
            }
        }
    }

    if !failed.is_empty() {
        bail!("Re-enrichment failed for {} movie(s): {:?}", failed.len(), failed);
    }
    Ok(())
}
