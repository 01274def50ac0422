use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct Actor {
    pub id: u64,
    pub name: String,
    pub age: u32,
    pub email: String,
    pub salary: u64,
    /// Movies the actor is cast in
    pub movies: Vec<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct Movie {
    pub id: u64,
    pub name: String,
    /// Running time in minutes
    pub length: u32,
    pub genre: String,
    /// Actors cast in the movie
    pub actors: Vec<u64>,
}

/// Body of `POST /actors`
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct NewActor {
    pub name: String,
    pub age: u32,
    pub email: String,
    pub salary: u64,
    /// Movie to cast the new actor in
    #[serde(rename = "movie_ID", default, skip_serializing_if = "Option::is_none")]
    pub movie_id: Option<u64>,
}

/// Body of `PATCH /actors/{id}`, absent fields are left unchanged
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Default)]
pub struct ActorPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<u64>,
}

/// Body of `POST /movies`
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct NewMovie {
    pub name: String,
    pub length: u32,
    pub genre: String,
    /// Actor to cast in the new movie
    #[serde(rename = "actor_ID", default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<u64>,
}

/// Body of `PATCH /movies/{id}`, absent fields are left unchanged
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Default)]
pub struct MoviePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

/// Response of the mutating endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct Success {
    pub success: bool,
}

impl Success {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct ActorList {
    pub success: bool,
    #[serde(rename = "Actors")]
    pub actors: Vec<Actor>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct MovieList {
    pub success: bool,
    #[serde(rename = "Movies")]
    pub movies: Vec<Movie>,
}
