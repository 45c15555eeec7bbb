//! Merge transaction engine: re-keys a placeholder movie onto its canonical id.

use anyhow::anyhow;
use tracing::{debug, info, warn};

use super::error::{CorrectionError, Stage};
use crate::movie_store::{
    MergeTransaction, MovieStore, PriorTitles, PurgedAttachments, ReassignedFacts,
};

/// Rows touched by one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Movie ids in the order they were locked.
    pub locked: Vec<i64>,
    pub purged: PurgedAttachments,
    pub reassigned: ReassignedFacts,
}

fn merge_steps(
    tx: &mut (dyn MergeTransaction + '_),
    placeholder_id: i64,
    canonical_id: i64,
) -> Result<(PriorTitles, MergeOutcome), CorrectionError> {
    let prior = tx
        .load_placeholder(placeholder_id)
        .map_err(|e| CorrectionError::transaction(Stage::LoadPlaceholder, e))?
        .ok_or_else(|| CorrectionError::NotFound(format!("Movie {} not found", placeholder_id)))?;

    let locked = tx
        .lock_movies(placeholder_id, canonical_id)
        .map_err(|e| CorrectionError::transaction(Stage::LockMovies, e))?;
    if !locked.contains(&canonical_id) {
        return Err(CorrectionError::transaction(
            Stage::LockMovies,
            anyhow!("Canonical movie {} has no row to lock", canonical_id),
        ));
    }
    debug!("Locked movies {:?}", locked);

    let purged = tx
        .purge_attachments(placeholder_id)
        .map_err(|e| CorrectionError::transaction(Stage::PurgeAttachments, e))?;
    debug!("Purged attachments of {}: {:?}", placeholder_id, purged);

    let reassigned = tx
        .reassign_facts(placeholder_id, canonical_id)
        .map_err(|e| CorrectionError::transaction(Stage::ReassignFacts, e))?;
    debug!(
        "Reassigned {} revenues and {} showings from {} to {}",
        reassigned.revenues, reassigned.showings, placeholder_id, canonical_id
    );

    tx.delete_movie(placeholder_id)
        .map_err(|e| CorrectionError::transaction(Stage::DeletePlaceholder, e))?;

    Ok((
        prior,
        MergeOutcome {
            locked,
            purged,
            reassigned,
        },
    ))
}

/// Run the whole merge in one transaction. Any failure rolls everything back.
///
/// Synchronous on purpose: the transaction holds the store's write connection
/// and must not live across an await point.
pub fn run_merge(
    store: &dyn MovieStore,
    placeholder_id: i64,
    canonical_id: i64,
) -> Result<(PriorTitles, MergeOutcome), CorrectionError> {
    let mut tx = store
        .begin_merge()
        .map_err(|e| CorrectionError::transaction(Stage::BeginMerge, e))?;

    match merge_steps(tx.as_mut(), placeholder_id, canonical_id) {
        Ok(merged) => {
            tx.commit()
                .map_err(|e| CorrectionError::transaction(Stage::CommitMerge, e))?;
            let reassigned = &merged.1.reassigned;
            info!(
                "Merged movie {} into {} ({} revenues, {} showings moved)",
                placeholder_id, canonical_id, reassigned.revenues, reassigned.showings
            );
            Ok(merged)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(
                    "Rollback of merge {} -> {} failed: {:#}",
                    placeholder_id, canonical_id, rollback_err
                );
            }
            Err(err)
        }
    }
}
