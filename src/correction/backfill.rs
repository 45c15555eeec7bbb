//! Post-commit patch for the canonical localized title.

use tracing::debug;

use super::error::{CorrectionError, Stage};
use crate::movie_store::{MovieStore, PriorTitles};

/// Fill a still-empty localized title from the placeholder's prior titles.
pub fn backfill_title(
    store: &dyn MovieStore,
    canonical_id: i64,
    prior: &PriorTitles,
) -> Result<bool, CorrectionError> {
    let changed = store
        .backfill_localized_title(canonical_id, prior)
        .map_err(|e| CorrectionError::persistence(Stage::Backfill, e))?;
    if changed {
        debug!(
            "Backfilled localized title of movie {} with {:?}",
            canonical_id,
            prior.backfill_value()
        );
    }
    Ok(changed)
}
