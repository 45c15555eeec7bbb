//! Identity resolver: validates a correction, drives the merge, then
//! enrichment and title backfill.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::backfill::backfill_title;
use super::error::{CorrectionError, Stage};
use super::merge::{run_merge, MergeOutcome};
use super::validation::{validate_canonical_id, validate_ids};
use crate::enrichment::{upsert, EnrichmentFetcher, PosterPreferences};
use crate::movie_store::{EnrichmentSummary, MovieStore};
use crate::provider::MetadataProvider;
use crate::server::metrics::{record_correction, record_enrichment};

#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionOutcome {
    pub canonical_id: i64,
    pub redirect_path: String,
    /// The canonical row did not exist before this correction.
    pub created_canonical: bool,
    pub merge: MergeOutcome,
    pub enrichment: EnrichmentSummary,
    pub title_backfilled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReenrichOutcome {
    pub movie_id: i64,
    pub inserted: EnrichmentSummary,
}

pub fn redirect_path(canonical_id: i64) -> String {
    format!("/movie/{}", canonical_id)
}

pub struct IdentityResolver {
    store: Arc<dyn MovieStore>,
    fetcher: EnrichmentFetcher,
}

impl IdentityResolver {
    pub fn new(
        store: Arc<dyn MovieStore>,
        provider: Arc<dyn MetadataProvider>,
        posters: PosterPreferences,
    ) -> Self {
        Self {
            store,
            fetcher: EnrichmentFetcher::new(provider, posters),
        }
    }

    /// Re-key `placeholder_id` onto `canonical_id` and refresh its metadata.
    ///
    /// Failures after the merge commit leave a correctly re-keyed movie;
    /// [`reenrich`](Self::reenrich) repairs its metadata.
    pub async fn correct(
        &self,
        placeholder_id: i64,
        canonical_id: i64,
    ) -> Result<CorrectionOutcome, CorrectionError> {
        let result = self.run_correction(placeholder_id, canonical_id).await;
        match &result {
            Ok(_) => record_correction("success"),
            Err(err) => {
                if err.http_status() >= 500 {
                    warn!(
                        "Correction {} -> {} failed in {}: {}",
                        placeholder_id,
                        canonical_id,
                        err.stage().map(|s| s.as_str()).unwrap_or("unknown"),
                        err
                    );
                }
                record_correction(err.kind());
            }
        }
        result
    }

    async fn run_correction(
        &self,
        placeholder_id: i64,
        canonical_id: i64,
    ) -> Result<CorrectionOutcome, CorrectionError> {
        validate_ids(placeholder_id, canonical_id)?;

        // Runs before the placeholder is known to exist, so a 404 may leave
        // an empty canonical row behind.
        let created_canonical = self
            .store
            .ensure_movie(canonical_id)
            .map_err(|e| CorrectionError::persistence(Stage::EnsureCanonical, e))?;

        let (prior, merge) = run_merge(self.store.as_ref(), placeholder_id, canonical_id)?;

        let enrichment = self.enrich(canonical_id).await;
        let backfill = backfill_title(self.store.as_ref(), canonical_id, &prior);
        if let (Err(_), Err(backfill_err)) = (&enrichment, &backfill) {
            warn!(
                "Title backfill for movie {} also failed: {}",
                canonical_id, backfill_err
            );
        }
        let enrichment = enrichment?;
        let title_backfilled = backfill?;

        info!(
            "Corrected movie {} -> {}: {} enrichment rows, title backfilled: {}",
            placeholder_id,
            canonical_id,
            enrichment.total(),
            title_backfilled
        );

        Ok(CorrectionOutcome {
            canonical_id,
            redirect_path: redirect_path(canonical_id),
            created_canonical,
            merge,
            enrichment,
            title_backfilled,
        })
    }

    /// Fetch and upsert metadata for an existing movie. Idempotent.
    pub async fn reenrich(&self, movie_id: i64) -> Result<ReenrichOutcome, CorrectionError> {
        validate_canonical_id(movie_id)?;
        let movie = self
            .store
            .get_movie(movie_id)
            .map_err(|e| CorrectionError::persistence(Stage::Lookup, e))?;
        if movie.is_none() {
            return Err(CorrectionError::NotFound(format!(
                "Movie {} not found",
                movie_id
            )));
        }

        let inserted = self.enrich(movie_id).await?;
        info!(
            "Re-enriched movie {}: {} rows inserted",
            movie_id,
            inserted.total()
        );
        Ok(ReenrichOutcome { movie_id, inserted })
    }

    async fn enrich(&self, movie_id: i64) -> Result<EnrichmentSummary, CorrectionError> {
        let start = Instant::now();
        let result = match self.fetcher.fetch(movie_id).await {
            Ok(fetched) => upsert(self.store.as_ref(), &fetched)
                .map_err(|e| CorrectionError::persistence(Stage::Upsert, e)),
            Err(source) => Err(CorrectionError::ExternalFetch { movie_id, source }),
        };
        record_enrichment(
            if result.is_ok() { "success" } else { "failure" },
            start.elapsed(),
        );
        result
    }
}
