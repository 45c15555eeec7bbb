//! Data models for the movie store.

use serde::Serialize;

/// A row of the `movies` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieRecord {
    pub id: i64,
    pub title: Option<String>,
    pub localized_title: Option<String>,
    pub release_date: Option<String>,
    pub popularity: Option<f64>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub budget: Option<i64>,
    pub runtime: Option<i64>,
}

/// Titles a placeholder carried right before it was merged away.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriorTitles {
    pub title: Option<String>,
    pub localized_title: Option<String>,
}

impl PriorTitles {
    /// The value used to fill an empty localized title on the canonical movie.
    pub fn backfill_value(&self) -> Option<&str> {
        self.localized_title
            .as_deref()
            .or(self.title.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenreRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountryRef {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudioRef {
    pub id: i64,
    pub name: String,
    pub origin_country: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectorCredit {
    pub person_id: i64,
    pub name: String,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastCredit {
    pub person_id: i64,
    pub name: String,
    pub character: Option<String>,
    pub cast_order: i64,
    pub profile_path: Option<String>,
}

/// Everything the upserter writes for one canonical movie.
///
/// Scalar fields follow the per-column precedence rules of
/// [`MovieStore::apply_enrichment`](super::MovieStore::apply_enrichment).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieEnrichment {
    pub movie_id: i64,
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub popularity: Option<f64>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub budget: Option<i64>,
    pub runtime: Option<i64>,
    pub genres: Vec<GenreRef>,
    pub countries: Vec<CountryRef>,
    pub studios: Vec<StudioRef>,
    pub directors: Vec<DirectorCredit>,
    pub cast: Vec<CastCredit>,
}

/// Rows actually inserted by one enrichment run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentSummary {
    pub genres: usize,
    pub movie_genres: usize,
    pub countries: usize,
    pub movie_countries: usize,
    pub studios: usize,
    pub movie_studio: usize,
    pub crew: usize,
    pub movie_crew: usize,
    pub actors: usize,
    pub movie_actors: usize,
}

impl EnrichmentSummary {
    pub fn total(&self) -> usize {
        self.genres
            + self.movie_genres
            + self.countries
            + self.movie_countries
            + self.studios
            + self.movie_studio
            + self.crew
            + self.movie_crew
            + self.actors
            + self.movie_actors
    }
}

/// Association and derived rows dropped for a placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgedAttachments {
    pub genres: usize,
    pub countries: usize,
    pub studios: usize,
    pub crew: usize,
    pub actors: usize,
    pub daily_revenues: usize,
}

/// Fact rows moved from the placeholder onto the canonical id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReassignedFacts {
    pub revenues: usize,
    pub showings: usize,
}

/// Number of rows in every table that may point at a movie id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieReferenceCounts {
    pub movie_genres: usize,
    pub movie_countries: usize,
    pub movie_studio: usize,
    pub movie_crew: usize,
    pub movie_actors: usize,
    pub revenues: usize,
    pub showings: usize,
    pub daily_revenues: usize,
}

impl MovieReferenceCounts {
    pub fn total(&self) -> usize {
        self.movie_genres
            + self.movie_countries
            + self.movie_studio
            + self.movie_crew
            + self.movie_actors
            + self.revenues
            + self.showings
            + self.daily_revenues
    }
}
