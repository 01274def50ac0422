use super::{ResourceStore, StoreError};
use crate::models::{Actor, ActorPatch, Movie, MoviePatch, NewActor, NewMovie};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Records {
    actors: BTreeMap<u64, Actor>,
    movies: BTreeMap<u64, Movie>,
    last_actor_id: u64,
    last_movie_id: u64,
}

/// In-process store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn list_actors(&self) -> Result<Vec<Actor>, StoreError> {
        Ok(self.records.read().await.actors.values().cloned().collect())
    }

    async fn create_actor(&self, actor: NewActor) -> Result<Actor, StoreError> {
        let mut records = self.records.write().await;
        if let Some(movie_id) = actor.movie_id {
            if !records.movies.contains_key(&movie_id) {
                return Err(StoreError::MovieNotFound(movie_id));
            }
        }

        records.last_actor_id += 1;
        let id = records.last_actor_id;
        let created = Actor {
            id,
            name: actor.name,
            age: actor.age,
            email: actor.email,
            salary: actor.salary,
            movies: actor.movie_id.into_iter().collect(),
        };
        if let Some(movie) = actor.movie_id.and_then(|m| records.movies.get_mut(&m)) {
            movie.actors.push(id);
        }
        records.actors.insert(id, created.clone());
        Ok(created)
    }

    async fn update_actor(&self, id: u64, patch: ActorPatch) -> Result<Actor, StoreError> {
        let mut records = self.records.write().await;
        let actor = records
            .actors
            .get_mut(&id)
            .ok_or(StoreError::ActorNotFound(id))?;
        if let Some(name) = patch.name {
            actor.name = name;
        }
        if let Some(age) = patch.age {
            actor.age = age;
        }
        if let Some(email) = patch.email {
            actor.email = email;
        }
        if let Some(salary) = patch.salary {
            actor.salary = salary;
        }
        Ok(actor.clone())
    }

    async fn delete_actor(&self, id: u64) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let actor = records
            .actors
            .remove(&id)
            .ok_or(StoreError::ActorNotFound(id))?;
        for movie_id in actor.movies {
            if let Some(movie) = records.movies.get_mut(&movie_id) {
                movie.actors.retain(|actor_id| *actor_id != id);
            }
        }
        Ok(())
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError> {
        Ok(self.records.read().await.movies.values().cloned().collect())
    }

    async fn create_movie(&self, movie: NewMovie) -> Result<Movie, StoreError> {
        let mut records = self.records.write().await;
        if let Some(actor_id) = movie.actor_id {
            if !records.actors.contains_key(&actor_id) {
                return Err(StoreError::ActorNotFound(actor_id));
            }
        }

        records.last_movie_id += 1;
        let id = records.last_movie_id;
        let created = Movie {
            id,
            name: movie.name,
            length: movie.length,
            genre: movie.genre,
            actors: movie.actor_id.into_iter().collect(),
        };
        if let Some(actor) = movie.actor_id.and_then(|a| records.actors.get_mut(&a)) {
            actor.movies.push(id);
        }
        records.movies.insert(id, created.clone());
        Ok(created)
    }

    async fn update_movie(&self, id: u64, patch: MoviePatch) -> Result<Movie, StoreError> {
        let mut records = self.records.write().await;
        let movie = records
            .movies
            .get_mut(&id)
            .ok_or(StoreError::MovieNotFound(id))?;
        if let Some(name) = patch.name {
            movie.name = name;
        }
        if let Some(length) = patch.length {
            movie.length = length;
        }
        if let Some(genre) = patch.genre {
            movie.genre = genre;
        }
        Ok(movie.clone())
    }

    async fn delete_movie(&self, id: u64) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let movie = records
            .movies
            .remove(&id)
            .ok_or(StoreError::MovieNotFound(id))?;
        for actor_id in movie.actors {
            if let Some(actor) = records.actors.get_mut(&actor_id) {
                actor.movies.retain(|movie_id| *movie_id != id);
            }
        }
        Ok(())
    }
}
