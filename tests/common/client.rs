//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per catalog-server endpoint.
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::{Method, Response};
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// GET /
    pub async fn home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    /// POST /v1/movies/correct-id with numeric ids
    pub async fn correct_id(&self, temp_id: i64, new_id: i64) -> Response {
        self.correct_id_raw(json!({ "tempId": temp_id, "newId": new_id }))
            .await
    }

    /// POST /v1/movies/correct-id with an arbitrary JSON body
    pub async fn correct_id_raw(&self, body: Value) -> Response {
        self.client
            .post(format!("{}/v1/movies/correct-id", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Correct id request failed")
    }

    /// Any method against /v1/movies/correct-id, without a body
    pub async fn correct_id_with_method(&self, method: Method) -> Response {
        self.client
            .request(method, format!("{}/v1/movies/correct-id", self.base_url))
            .send()
            .await
            .expect("Correct id request failed")
    }

    /// POST /v1/movies/{id}/reenrich
    pub async fn reenrich(&self, id: &str) -> Response {
        self.client
            .post(format!("{}/v1/movies/{}/reenrich", self.base_url, id))
            .send()
            .await
            .expect("Reenrich request failed")
    }
}
