use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Instant;

use crate::correction::IdentityResolver;
use crate::movie_store::MovieStore;

use super::ServerConfig;

pub type GuardedMovieStore = Arc<dyn MovieStore>;
pub type GuardedResolver = Arc<IdentityResolver>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub hash: String,
    pub movie_store: GuardedMovieStore,
    pub resolver: GuardedResolver,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        movie_store: GuardedMovieStore,
        resolver: GuardedResolver,
    ) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            hash: env!("GIT_HASH").to_string(),
            movie_store,
            resolver,
        }
    }
}

impl FromRef<ServerState> for GuardedMovieStore {
    fn from_ref(input: &ServerState) -> Self {
        input.movie_store.clone()
    }
}

impl FromRef<ServerState> for GuardedResolver {
    fn from_ref(input: &ServerState) -> Self {
        input.resolver.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
