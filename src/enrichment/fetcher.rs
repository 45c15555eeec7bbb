//! Fetches canonical metadata for one movie and normalizes it.

use std::cmp::Reverse;
use std::sync::Arc;
use tracing::debug;

use crate::provider::{
    CastMember, CrewMember, ImageAsset, MetadataProvider, MovieCredits, MovieDetails,
    MovieImages, ProviderCompany, ProviderCountry, ProviderError, ProviderGenre,
};

/// Locale ranking used to pick a poster.
///
/// `secondary = None` ranks language-neutral artwork (no `iso_639_1`) second.
#[derive(Debug, Clone, PartialEq)]
pub struct PosterPreferences {
    pub preferred: String,
    pub secondary: Option<String>,
}

impl Default for PosterPreferences {
    fn default() -> Self {
        Self {
            preferred: "en".to_string(),
            secondary: None,
        }
    }
}

impl PosterPreferences {
    fn tier(&self, asset: &ImageAsset) -> u8 {
        let language = asset.iso_639_1.as_deref();
        if language == Some(self.preferred.as_str()) {
            0
        } else if language == self.secondary.as_deref() {
            1
        } else {
            2
        }
    }
}

/// Provider data for one movie after normalization. Not yet filtered for storage.
#[derive(Debug, Clone, Default)]
pub struct FetchedMovie {
    pub movie_id: i64,
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub popularity: Option<f64>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub budget: Option<i64>,
    pub runtime: Option<i64>,
    pub genres: Vec<ProviderGenre>,
    pub countries: Vec<ProviderCountry>,
    pub companies: Vec<ProviderCompany>,
    pub crew: Vec<CrewMember>,
    pub cast: Vec<CastMember>,
}

/// Pick the best poster: locale tier first, then vote count descending.
/// Ties keep provider order.
pub fn select_poster<'a>(posters: &'a [ImageAsset], prefs: &PosterPreferences) -> Option<&'a str> {
    posters
        .iter()
        .min_by_key(|asset| (prefs.tier(asset), Reverse(asset.vote_count)))
        .map(|asset| asset.file_path.as_str())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// A reported zero is not box-office data.
fn known_amount(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v != 0)
}

pub fn normalize(
    movie_id: i64,
    details: MovieDetails,
    credits: MovieCredits,
    images: MovieImages,
    prefs: &PosterPreferences,
) -> FetchedMovie {
    let poster_path = select_poster(&images.posters, prefs)
        .map(str::to_string)
        .or_else(|| non_empty(details.poster_path));

    FetchedMovie {
        movie_id,
        title: non_empty(details.title),
        release_date: non_empty(details.release_date),
        popularity: details.popularity,
        poster_path: non_empty(poster_path),
        backdrop_path: non_empty(details.backdrop_path),
        budget: known_amount(details.budget),
        runtime: known_amount(details.runtime),
        genres: details.genres,
        countries: details.production_countries,
        companies: details.production_companies,
        crew: credits.crew,
        cast: credits.cast,
    }
}

pub struct EnrichmentFetcher {
    provider: Arc<dyn MetadataProvider>,
    posters: PosterPreferences,
}

impl EnrichmentFetcher {
    pub fn new(provider: Arc<dyn MetadataProvider>, posters: PosterPreferences) -> Self {
        Self { provider, posters }
    }

    /// Issue the details, credits and images calls concurrently. Any failure fails the fetch.
    pub async fn fetch(&self, movie_id: i64) -> Result<FetchedMovie, ProviderError> {
        let (details, credits, images) = tokio::try_join!(
            self.provider.movie_details(movie_id),
            self.provider.movie_credits(movie_id),
            self.provider.movie_images(movie_id),
        )?;
        debug!(
            "Fetched movie {}: {} cast, {} crew, {} posters",
            movie_id,
            credits.cast.len(),
            credits.crew.len(),
            images.posters.len()
        );
        Ok(normalize(movie_id, details, credits, images, &self.posters))
    }
}
