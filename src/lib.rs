//! Box office catalog server library
//!
//! Exposes the store, provider client and correction pipeline to both
//! binaries and the end-to-end tests.

pub mod config;
pub mod correction;
pub mod enrichment;
pub mod movie_store;
pub mod provider;
pub mod server;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use correction::{CorrectionError, IdentityResolver};
pub use movie_store::{MovieStore, SqliteMovieStore};
pub use provider::{MetadataProvider, TmdbClient};
pub use server::{run_server, RequestsLoggingLevel};
