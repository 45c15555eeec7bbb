//! MovieStore trait definition.

use super::models::{
    EnrichmentSummary, MovieEnrichment, MovieRecord, MovieReferenceCounts, PriorTitles,
    PurgedAttachments, ReassignedFacts,
};
use anyhow::Result;

/// Storage gateway for the movie aggregate.
pub trait MovieStore: Send + Sync {
    // =========================================================================
    // Reads
    // =========================================================================

    /// Get a movie by id.
    fn get_movie(&self, id: i64) -> Result<Option<MovieRecord>>;

    /// Count the rows in every table that reference `id`.
    fn count_references(&self, id: i64) -> Result<MovieReferenceCounts>;

    fn get_movies_count(&self) -> usize;

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert a bare row for `id` unless one exists. Returns true if a row was created.
    fn ensure_movie(&self, id: i64) -> Result<bool>;

    /// Open a merge transaction. The write lock is held until the returned
    /// value is committed, rolled back or dropped.
    fn begin_merge(&self) -> Result<Box<dyn MergeTransaction + '_>>;

    /// Merge fetched metadata and relationships into `enrichment.movie_id`
    /// in a single transaction.
    ///
    /// - title, localized title, release date, poster and backdrop only fill nulls
    /// - popularity is replaced whenever a value was fetched
    /// - budget and runtime are replaced only when the stored value is null or zero
    /// - reference and association rows are insert-or-ignore
    fn apply_enrichment(&self, enrichment: &MovieEnrichment) -> Result<EnrichmentSummary>;

    /// Set `localized_title` on `id` if it is still null. Returns true if a row changed.
    fn backfill_localized_title(&self, id: i64, prior: &PriorTitles) -> Result<bool>;
}

/// One open merge of a placeholder movie onto its canonical id.
///
/// Each step runs inside the same database transaction. Nothing is visible
/// to other connections until [`commit`](MergeTransaction::commit).
pub trait MergeTransaction {
    /// Re-read the placeholder inside the transaction.
    fn load_placeholder(&mut self, placeholder_id: i64) -> Result<Option<PriorTitles>>;

    /// Lock both movie rows with one statement, ascending by id.
    /// Returns the ids in the order they were visited.
    fn lock_movies(&mut self, placeholder_id: i64, canonical_id: i64) -> Result<Vec<i64>>;

    /// Delete association rows and derived daily revenue for `movie_id`.
    fn purge_attachments(&mut self, movie_id: i64) -> Result<PurgedAttachments>;

    /// Move revenue and showing facts from one movie id to another.
    fn reassign_facts(&mut self, from_id: i64, to_id: i64) -> Result<ReassignedFacts>;

    fn delete_movie(&mut self, movie_id: i64) -> Result<()>;

    fn commit(self: Box<Self>) -> Result<()>;

    fn rollback(self: Box<Self>) -> Result<()>;
}
