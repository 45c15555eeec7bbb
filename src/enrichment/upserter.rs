//! Turns fetched provider data into store rows.

use anyhow::Result;

use super::fetcher::FetchedMovie;
use crate::movie_store::{
    CastCredit, CountryRef, DirectorCredit, EnrichmentSummary, GenreRef, MovieEnrichment,
    MovieStore, StudioRef,
};

/// Billing positions kept per movie.
pub const MAX_CAST_MEMBERS: usize = 9;

/// Only this crew job is stored.
pub const DIRECTOR_JOB: &str = "Director";

pub fn build_enrichment(fetched: &FetchedMovie) -> MovieEnrichment {
    let directors = fetched
        .crew
        .iter()
        .filter(|member| member.job == DIRECTOR_JOB)
        .map(|member| DirectorCredit {
            person_id: member.id,
            name: member.name.clone(),
            profile_path: member.profile_path.clone(),
        })
        .collect();

    let mut billed: Vec<_> = fetched.cast.iter().collect();
    billed.sort_by_key(|member| member.order);
    let cast = billed
        .into_iter()
        .take(MAX_CAST_MEMBERS)
        .map(|member| CastCredit {
            person_id: member.id,
            name: member.name.clone(),
            character: member.character.clone(),
            cast_order: member.order,
            profile_path: member.profile_path.clone(),
        })
        .collect();

    MovieEnrichment {
        movie_id: fetched.movie_id,
        title: fetched.title.clone(),
        release_date: fetched.release_date.clone(),
        popularity: fetched.popularity,
        poster_path: fetched.poster_path.clone(),
        backdrop_path: fetched.backdrop_path.clone(),
        budget: fetched.budget,
        runtime: fetched.runtime,
        genres: fetched
            .genres
            .iter()
            .map(|g| GenreRef {
                id: g.id,
                name: g.name.clone(),
            })
            .collect(),
        countries: fetched
            .countries
            .iter()
            .map(|c| CountryRef {
                code: c.iso_3166_1.clone(),
                name: c.name.clone(),
            })
            .collect(),
        studios: fetched
            .companies
            .iter()
            .map(|c| StudioRef {
                id: c.id,
                name: c.name.clone(),
                origin_country: c.origin_country.clone().filter(|s| !s.is_empty()),
            })
            .collect(),
        directors,
        cast,
    }
}

/// Write one fetched movie in a single store transaction.
pub fn upsert(store: &dyn MovieStore, fetched: &FetchedMovie) -> Result<EnrichmentSummary> {
    store.apply_enrichment(&build_enrichment(fetched))
}
