use anyhow::{Context, Result};
use std::future::IntoFuture;
use std::time::Duration;

use axum::{extract::State, middleware, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use tracing::info;

use super::correction_routes::make_correction_routes;
use super::metrics::metrics_handler;
use super::{log_requests, state::*, RequestsLoggingLevel, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub movies: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        movies: state.movie_store.get_movies_count(),
    };
    Json(stats)
}

pub fn make_app(
    config: ServerConfig,
    movie_store: GuardedMovieStore,
    resolver: GuardedResolver,
) -> Result<Router> {
    let state = ServerState::new(config, movie_store, resolver);

    let movie_routes = make_correction_routes(state.clone())?;

    let app: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone())
        .nest("/v1/movies", movie_routes)
        .layer(middleware::from_fn_with_state(state, log_requests));

    Ok(app)
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(
    movie_store: GuardedMovieStore,
    resolver: GuardedResolver,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
    metrics_port: u16,
) -> Result<()> {
    let config = ServerConfig {
        requests_logging_level,
        port,
        metrics_port,
        ..ServerConfig::default()
    };
    let app = make_app(config, movie_store, resolver)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            result.context("HTTP server failed")
        }
        result = axum::serve(metrics_listener, make_metrics_app()).into_future() => {
            result.context("Metrics server failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::IdentityResolver;
    use crate::enrichment::PosterPreferences;
    use crate::movie_store::{create_test_store, seed_placeholder, SqliteMovieStore};
    use crate::provider::mock::{fight_club, MockProvider};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt; // for `oneshot`

    fn test_app() -> (Router, Arc<SqliteMovieStore>, TempDir) {
        let (store, temp_dir) = create_test_store();
        let store = Arc::new(store);
        let provider = Arc::new(MockProvider::new());
        provider.add_movie(fight_club(550));
        let resolver = Arc::new(IdentityResolver::new(
            store.clone(),
            provider,
            PosterPreferences::default(),
        ));
        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            ..ServerConfig::default()
        };
        let app = make_app(config, store.clone(), resolver).unwrap();
        (app, store, temp_dir)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 01:01:01");
    }

    #[tokio::test]
    async fn home_reports_status() {
        let (app, _store, _temp_dir) = test_app();
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["movies"], 0);
        assert!(body["uptime"].as_str().unwrap().starts_with("0d"));
    }

    #[tokio::test]
    async fn correct_id_succeeds() {
        let (app, store, _temp_dir) = test_app();
        seed_placeholder(&store, -7);

        let response = app
            .oneshot(post_json("/v1/movies/correct-id", r#"{"tempId": -7, "newId": 550}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let body = body_json(response).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["newId"], 550);
        assert_eq!(body["redirect"], "/movie/550");
    }

    #[tokio::test]
    async fn preflight_returns_no_content_with_cors_headers() {
        let (app, _store, _temp_dir) = test_app();
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/v1/movies/correct-id")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "content-type");
    }

    #[tokio::test]
    async fn other_methods_are_not_allowed() {
        let (app, _store, _temp_dir) = test_app();
        for method in ["GET", "PUT", "DELETE"] {
            let request = Request::builder()
                .method(method)
                .uri("/v1/movies/correct-id")
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(response.headers()[header::ALLOW], "POST, OPTIONS");
        }
    }

    #[tokio::test]
    async fn reenrich_only_allows_post() {
        let (app, _store, _temp_dir) = test_app();
        for method in ["GET", "OPTIONS", "DELETE"] {
            let request = Request::builder()
                .method(method)
                .uri("/v1/movies/550/reenrich")
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "method: {}", method);
            assert_eq!(response.headers()[header::ALLOW], "POST");
        }
    }

    #[tokio::test]
    async fn malformed_bodies_are_bad_requests() {
        let (app, _store, _temp_dir) = test_app();
        let cases = [
            "not json",
            "[1, 2]",
            r#"{"newId": 550}"#,
            r#"{"tempId": "abc", "newId": 550}"#,
            r#"{"tempId": 550, "newId": 550}"#,
        ];
        for body in cases {
            let response = app
                .clone()
                .oneshot(post_json("/v1/movies/correct-id", body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
            let json = body_json(response).await;
            assert!(json["error"].is_string());
        }
    }

    #[tokio::test]
    async fn reenrich_unknown_movie_is_not_found() {
        let (app, _store, _temp_dir) = test_app();
        let response = app
            .oneshot(post_json("/v1/movies/550/reenrich", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reenrich_existing_movie() {
        let (app, store, _temp_dir) = test_app();
        crate::movie_store::MovieStore::ensure_movie(store.as_ref(), 550).unwrap();

        let response = app
            .oneshot(post_json("/v1/movies/550/reenrich", ""))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], 550);
        assert_eq!(body["inserted"]["movie_genres"], 1);
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_text() {
        crate::server::metrics::init_metrics();
        let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let response = make_metrics_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
