//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own database directory and
//! its own fake metadata provider.

use super::constants::*;
use super::provider::FakeProvider;
use boxoffice_catalog_server::config::ProviderSettings;
use boxoffice_catalog_server::correction::IdentityResolver;
use boxoffice_catalog_server::movie_store::SqliteMovieStore;
use boxoffice_catalog_server::provider::TmdbClient;
use boxoffice_catalog_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated database.
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Database file, for seeding and inspecting rows directly
    pub db_path: PathBuf,

    /// Store backing the server, for reading movies back
    pub store: Arc<SqliteMovieStore>,

    pub provider: FakeProvider,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the database can't be created, the port can't be bound or
    /// the server doesn't become ready within timeout.
    pub async fn spawn() -> Self {
        let provider = FakeProvider::spawn().await;

        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_db_dir.path().join("boxoffice.db");
        let store = Arc::new(SqliteMovieStore::new(&db_path, 2).expect("Failed to open movie store"));

        let settings = ProviderSettings {
            api_key: TEST_API_KEY.to_string(),
            base_url: provider.base_url.clone(),
            timeout_sec: 5,
            max_retries: 1,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            ..ProviderSettings::default()
        };
        let client = Arc::new(TmdbClient::new(&settings).expect("Failed to create provider client"));
        let resolver = Arc::new(IdentityResolver::new(
            store.clone(),
            client,
            settings.poster_preferences(),
        ));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            ..ServerConfig::default()
        };

        let app = make_app(config, store.clone(), resolver).expect("Failed to build app");

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            db_path,
            store,
            provider,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the / endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
