//! Movie identity correction: re-key a placeholder movie onto its canonical
//! external id, then refresh its metadata from the provider.

mod backfill;
mod error;
mod merge;
mod resolver;
mod validation;

pub use backfill::backfill_title;
pub use error::{CorrectionError, ErrorResponse, Stage};
pub use merge::{run_merge, MergeOutcome};
pub use resolver::{redirect_path, CorrectionOutcome, IdentityResolver, ReenrichOutcome};
pub use validation::{
    parse_movie_id, validate_canonical_id, validate_ids, CANONICAL_ID_MAX_EXCLUSIVE,
    CANONICAL_ID_MIN_EXCLUSIVE,
};
