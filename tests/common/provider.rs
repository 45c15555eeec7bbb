//! Fake metadata provider speaking the TMDB v3 movie endpoints.
//!
//! Knows a single movie (CANONICAL_ID). Any id can be switched into a
//! failure mode so tests can exercise post-merge error handling.

use super::constants::*;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

const NOT_FOUND_BODY: &str =
    r#"{"status_code":34,"status_message":"The resource you requested could not be found."}"#;

#[derive(Default)]
struct FakeProviderState {
    failures: Mutex<HashMap<i64, u16>>,
    requests: AtomicUsize,
}

/// Handle to a running fake provider. The server task lives until the test runtime stops.
#[derive(Clone)]
pub struct FakeProvider {
    pub base_url: String,
    state: Arc<FakeProviderState>,
}

impl FakeProvider {
    pub async fn spawn() -> Self {
        let state = Arc::new(FakeProviderState::default());

        let app = Router::new()
            .route("/movie/{id}", get(details))
            .route("/movie/{id}/credits", get(credits))
            .route("/movie/{id}/images", get(images))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake provider");
        let addr = listener.local_addr().expect("Failed to get local address");
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Fake provider failed");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Every endpoint for `movie_id` answers with `status` until cleared.
    pub fn fail_with(&self, movie_id: i64, status: u16) {
        self.state.failures.lock().unwrap().insert(movie_id, status);
    }

    pub fn clear_failure(&self, movie_id: i64) {
        self.state.failures.lock().unwrap().remove(&movie_id);
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }
}

fn check_request(
    state: &FakeProviderState,
    movie_id: i64,
    query: &HashMap<String, String>,
) -> Option<Response> {
    state.requests.fetch_add(1, Ordering::SeqCst);

    if query.get("api_key").map(String::as_str) != Some(TEST_API_KEY) {
        return Some((StatusCode::UNAUTHORIZED, "Invalid API key").into_response());
    }
    if let Some(status) = state.failures.lock().unwrap().get(&movie_id) {
        let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return Some((status, "provider unavailable").into_response());
    }
    if movie_id != CANONICAL_ID {
        return Some((StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response());
    }
    None
}

fn respond(
    state: &FakeProviderState,
    movie_id: i64,
    query: &HashMap<String, String>,
    body: impl FnOnce() -> Value,
) -> Response {
    match check_request(state, movie_id, query) {
        Some(response) => response,
        None => Json(body()).into_response(),
    }
}

async fn details(
    State(state): State<Arc<FakeProviderState>>,
    Path(movie_id): Path<i64>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    respond(&state, movie_id, &query, || {
        json!({
            "id": movie_id,
            "title": CANONICAL_TITLE,
            "release_date": "1999-10-15",
            "popularity": 61.4,
            "poster_path": "/details-poster.jpg",
            "backdrop_path": "/backdrop.jpg",
            "budget": 63000000,
            "runtime": 139,
            "genres": [{"id": 18, "name": "Drama"}, {"id": 53, "name": "Thriller"}],
            "production_countries": [
                {"iso_3166_1": "US", "name": "United States of America"},
                {"iso_3166_1": "DE", "name": "Germany"}
            ],
            "production_companies": [
                {"id": 508, "name": "Regency Enterprises", "origin_country": "US"},
                {"id": 711, "name": "Fox 2000 Pictures", "origin_country": ""}
            ]
        })
    })
}

async fn credits(
    State(state): State<Arc<FakeProviderState>>,
    Path(movie_id): Path<i64>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    respond(&state, movie_id, &query, || {
        // Billing order reversed on the wire.
        let cast: Vec<Value> = (0..CAST_SIZE as i64)
            .rev()
            .map(|order| {
                json!({
                    "id": 1000 + order,
                    "name": format!("Actor {}", order),
                    "character": format!("Character {}", order),
                    "order": order
                })
            })
            .collect();
        json!({
            "id": movie_id,
            "cast": cast,
            "crew": [
                {"id": DIRECTOR_ID, "name": "David Fincher", "job": "Director"},
                {"id": 7474, "name": "Jim Uhls", "job": "Screenplay"},
                {"id": 7475, "name": "Ross Grayson Bell", "job": "Producer"}
            ]
        })
    })
}

async fn images(
    State(state): State<Arc<FakeProviderState>>,
    Path(movie_id): Path<i64>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    respond(&state, movie_id, &query, || {
        json!({
            "id": movie_id,
            "posters": [
                {"file_path": "/poster-fr.jpg", "iso_639_1": "fr", "vote_count": 50},
                {"file_path": "/poster-neutral.jpg", "iso_639_1": null, "vote_count": 30},
                {"file_path": ENGLISH_POSTER, "iso_639_1": "en", "vote_count": 10}
            ],
            "backdrops": []
        })
    })
}
