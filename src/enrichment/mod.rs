//! Enrichment pipeline: fetch canonical metadata from the provider, then
//! merge it into the store.

mod fetcher;
mod upserter;

pub use fetcher::{normalize, select_poster, EnrichmentFetcher, FetchedMovie, PosterPreferences};
pub use upserter::{build_enrichment, upsert, DIRECTOR_JOB, MAX_CAST_MEMBERS};
