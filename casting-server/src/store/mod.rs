pub mod memory;

use crate::models::{Actor, ActorPatch, Movie, MoviePatch, NewActor, NewMovie};
use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("actor {0} does not exist")]
    ActorNotFound(u64),
    #[error("movie {0} does not exist")]
    MovieNotFound(u64),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence of actors, movies and the casting links between them.
///
/// Links are kept symmetric: an actor lists a movie exactly when that movie lists the actor.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn list_actors(&self) -> Result<Vec<Actor>, StoreError>;

    /// Fails with [`StoreError::MovieNotFound`] when the linked movie does not exist
    async fn create_actor(&self, actor: NewActor) -> Result<Actor, StoreError>;

    async fn update_actor(&self, id: u64, patch: ActorPatch) -> Result<Actor, StoreError>;

    async fn delete_actor(&self, id: u64) -> Result<(), StoreError>;

    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError>;

    /// Fails with [`StoreError::ActorNotFound`] when the linked actor does not exist
    async fn create_movie(&self, movie: NewMovie) -> Result<Movie, StoreError>;

    async fn update_movie(&self, id: u64, patch: MoviePatch) -> Result<Movie, StoreError>;

    async fn delete_movie(&self, id: u64) -> Result<(), StoreError>;
}
