//! TMDB v3 API client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::models::{MovieCredits, MovieDetails, MovieImages};
use super::{MetadataProvider, ProviderError, RetryPolicy};
use crate::config::ProviderSettings;

/// HTTP client for the TMDB movie endpoints, authenticated with an `api_key` query parameter.
pub struct TmdbClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry_policy: RetryPolicy,
}

impl TmdbClient {
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_sec))
            .user_agent(concat!("boxoffice-catalog-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create provider HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            retry_policy: RetryPolicy::new(settings),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_once<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport(e.without_url().to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| ProviderError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned + Send>(
        &self,
        what: &str,
        path: String,
    ) -> Result<T, ProviderError> {
        debug!("Provider GET {}", path);
        let path = path.as_str();
        self.retry_policy
            .run(what, move || self.get_once::<T>(path))
            .await
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    async fn movie_details(&self, movie_id: i64) -> Result<MovieDetails, ProviderError> {
        self.get_json("details", format!("/movie/{}", movie_id))
            .await
    }

    async fn movie_credits(&self, movie_id: i64) -> Result<MovieCredits, ProviderError> {
        self.get_json("credits", format!("/movie/{}/credits", movie_id))
            .await
    }

    async fn movie_images(&self, movie_id: i64) -> Result<MovieImages, ProviderError> {
        self.get_json("images", format!("/movie/{}/images", movie_id))
            .await
    }
}
