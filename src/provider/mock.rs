//! In-memory provider for unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::models::*;
use super::{MetadataProvider, ProviderError};

#[derive(Debug, Clone, Default)]
pub struct MockMovie {
    pub details: MovieDetails,
    pub credits: MovieCredits,
    pub images: MovieImages,
}

pub struct MockProvider {
    movies: Mutex<HashMap<i64, MockMovie>>,
    failures: Mutex<HashMap<i64, u16>>,
    call_counts: Mutex<HashMap<String, usize>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            movies: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            call_counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn add_movie(&self, movie: MockMovie) {
        self.movies
            .lock()
            .unwrap()
            .insert(movie.details.id, movie);
    }

    /// Every call for `movie_id` fails with `status` until cleared.
    pub fn fail_with(&self, movie_id: i64, status: u16) {
        self.failures.lock().unwrap().insert(movie_id, status);
    }

    pub fn clear_failure(&self, movie_id: i64) {
        self.failures.lock().unwrap().remove(&movie_id);
    }

    pub fn get_call_count(&self, method: &str) -> usize {
        *self.call_counts.lock().unwrap().get(method).unwrap_or(&0)
    }

    fn increment_call(&self, method: &str) {
        let mut counts = self.call_counts.lock().unwrap();
        *counts.entry(method.to_string()).or_insert(0) += 1;
    }

    fn lookup(&self, movie_id: i64) -> Result<MockMovie, ProviderError> {
        if let Some(status) = self.failures.lock().unwrap().get(&movie_id) {
            return Err(ProviderError::Status {
                status: *status,
                body: format!("mock failure for movie {}", movie_id),
            });
        }
        self.movies
            .lock()
            .unwrap()
            .get(&movie_id)
            .cloned()
            .ok_or_else(|| ProviderError::Status {
                status: 404,
                body: r#"{"status_code":34,"status_message":"The resource you requested could not be found."}"#
                    .to_string(),
            })
    }
}

#[async_trait]
impl MetadataProvider for MockProvider {
    async fn movie_details(&self, movie_id: i64) -> Result<MovieDetails, ProviderError> {
        self.increment_call("movie_details");
        self.lookup(movie_id).map(|m| m.details)
    }

    async fn movie_credits(&self, movie_id: i64) -> Result<MovieCredits, ProviderError> {
        self.increment_call("movie_credits");
        self.lookup(movie_id).map(|m| m.credits)
    }

    async fn movie_images(&self, movie_id: i64) -> Result<MovieImages, ProviderError> {
        self.increment_call("movie_images");
        self.lookup(movie_id).map(|m| m.images)
    }
}

/// Fight Club as the provider reports it.
pub fn fight_club(movie_id: i64) -> MockMovie {
    MockMovie {
        details: MovieDetails {
            id: movie_id,
            title: Some("Fight Club".to_string()),
            release_date: Some("1999-10-15".to_string()),
            popularity: Some(61.4),
            poster_path: Some("/details-poster.jpg".to_string()),
            backdrop_path: Some("/backdrop.jpg".to_string()),
            budget: Some(63_000_000),
            runtime: Some(139),
            genres: vec![ProviderGenre {
                id: 18,
                name: "Drama".to_string(),
            }],
            production_countries: vec![ProviderCountry {
                iso_3166_1: "US".to_string(),
                name: "United States of America".to_string(),
            }],
            production_companies: vec![ProviderCompany {
                id: 508,
                name: "Regency Enterprises".to_string(),
                origin_country: Some("US".to_string()),
            }],
        },
        credits: MovieCredits {
            cast: vec![
                CastMember {
                    id: 819,
                    name: "Edward Norton".to_string(),
                    character: Some("The Narrator".to_string()),
                    order: 0,
                    profile_path: None,
                },
                CastMember {
                    id: 287,
                    name: "Brad Pitt".to_string(),
                    character: Some("Tyler Durden".to_string()),
                    order: 1,
                    profile_path: None,
                },
            ],
            crew: vec![
                CrewMember {
                    id: 7467,
                    name: "David Fincher".to_string(),
                    job: "Director".to_string(),
                    profile_path: None,
                },
                CrewMember {
                    id: 7474,
                    name: "Jim Uhls".to_string(),
                    job: "Screenplay".to_string(),
                    profile_path: None,
                },
            ],
        },
        images: MovieImages {
            posters: vec![
                ImageAsset {
                    file_path: "/poster-fr.jpg".to_string(),
                    iso_639_1: Some("fr".to_string()),
                    vote_count: 50,
                    vote_average: 5.5,
                },
                ImageAsset {
                    file_path: "/poster-en.jpg".to_string(),
                    iso_639_1: Some("en".to_string()),
                    vote_count: 10,
                    vote_average: 5.2,
                },
            ],
            backdrops: vec![],
        },
    }
}
