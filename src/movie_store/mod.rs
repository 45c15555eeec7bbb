mod models;
mod schema;
mod store;
mod trait_def;

pub use models::*;
pub use schema::MOVIE_VERSIONED_SCHEMAS;
pub use store::SqliteMovieStore;
pub use trait_def::{MergeTransaction, MovieStore};

#[cfg(test)]
pub(crate) use store::tests::{create_test_store, seed_placeholder};
