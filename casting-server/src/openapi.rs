use crate::api::{actors, health, movies};
use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const ACTORS_TAG: &str = "Actors API";
pub(crate) const MOVIES_TAG: &str = "Movies API";

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::welcome,
        health::health_check,
        actors::list_actors,
        actors::create_actor,
        actors::update_actor,
        actors::delete_actor,
        movies::list_movies,
        movies::create_movie,
        movies::update_movie,
        movies::delete_movie,
    ),
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = ACTORS_TAG, description = "Actor records, each route guarded by its own permission"),
        (name = MOVIES_TAG, description = "Movie records, each route guarded by its own permission"),
    ),
    info(
        title = "Casting Agency API",
        description = "Actors and movies behind bearer token permissions",
        version = "1.0.0"
    )
)]
pub(crate) struct ApiDoc;
