//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestServer, TestClient, CANONICAL_ID, PLACEHOLDER_ID};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_correct_id() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let response = client.correct_id(PLACEHOLDER_ID, CANONICAL_ID).await;
//!     assert_eq!(response.status(), StatusCode::NOT_FOUND);
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod provider;
mod server;

// Public API - this is what tests import
pub use client::TestClient;
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{count_rows, seed_movie, seed_placeholder};
pub use server::TestServer;
