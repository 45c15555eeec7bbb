//! External movie metadata provider.
//!
//! [`MetadataProvider`] is the seam used by the enrichment pipeline;
//! [`TmdbClient`] is the HTTP implementation.

#[cfg(test)]
pub(crate) mod mock;
mod models;
mod retry;
mod tmdb;

pub use models::*;
pub use retry::RetryPolicy;
pub use tmdb::TmdbClient;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Non-2xx response.
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider request failed: {0}")]
    Transport(String),

    #[error("failed to decode provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// 5xx and transport failures may succeed later; 4xx never will.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Status { status, .. } => *status >= 500,
            ProviderError::Transport(_) => true,
            ProviderError::Decode(_) => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            ProviderError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn movie_details(&self, movie_id: i64) -> Result<MovieDetails, ProviderError>;

    async fn movie_credits(&self, movie_id: i64) -> Result<MovieCredits, ProviderError>;

    async fn movie_images(&self, movie_id: i64) -> Result<MovieImages, ProviderError>;
}
