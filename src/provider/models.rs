//! Response types of the movie metadata provider (TMDB v3 shape).

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProviderGenre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProviderCountry {
    pub iso_3166_1: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProviderCompany {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub origin_country: Option<String>,
}

/// `GET /movie/{id}`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MovieDetails {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub budget: Option<i64>,
    #[serde(default)]
    pub runtime: Option<i64>,
    #[serde(default)]
    pub genres: Vec<ProviderGenre>,
    #[serde(default)]
    pub production_countries: Vec<ProviderCountry>,
    #[serde(default)]
    pub production_companies: Vec<ProviderCompany>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CastMember {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CrewMember {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub job: String,
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// `GET /movie/{id}/credits`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MovieCredits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ImageAsset {
    pub file_path: String,
    /// Language of any text on the artwork, `None` for language-neutral images.
    #[serde(default)]
    pub iso_639_1: Option<String>,
    #[serde(default)]
    pub vote_count: i64,
    #[serde(default)]
    pub vote_average: f64,
}

/// `GET /movie/{id}/images`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MovieImages {
    #[serde(default)]
    pub posters: Vec<ImageAsset>,
    #[serde(default)]
    pub backdrops: Vec<ImageAsset>,
}
