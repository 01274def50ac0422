use crate::api::guard::guarded;
use crate::errors::ApiError;
use crate::models::{MovieList, MoviePatch, NewMovie, Success};
use crate::openapi::MOVIES_TAG;
use crate::state::AppState;
use crate::store::StoreError;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Json, Path, State,
    },
    routing::{delete, get, patch, post},
    Extension, Router,
};
use casting_auth::Authorized;
use log::info;

pub(crate) const GET_MOVIES: &str = "get:movies";
pub(crate) const POST_MOVIES: &str = "post:movies";
pub(crate) const PATCH_MOVIES: &str = "patch:movies";
pub(crate) const DELETE_MOVIES: &str = "delete:movies";

#[utoipa::path(
    get,
    path = "/movies",
    tag = MOVIES_TAG,
    params(
        ("Authorization" = String, Header, description = "Bearer token granting get:movies"),
    ),
    responses(
        (status = 200, description = "All movies", body = MovieList),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Permission not granted")
    )
)]
pub(crate) async fn list_movies(State(state): State<AppState>) -> Result<Json<MovieList>, ApiError> {
    let movies = state.store.list_movies().await?;
    Ok(Json(MovieList {
        success: true,
        movies,
    }))
}

#[utoipa::path(
    post,
    path = "/movies",
    tag = MOVIES_TAG,
    request_body = NewMovie,
    params(
        ("Authorization" = String, Header, description = "Bearer token granting post:movies"),
    ),
    responses(
        (status = 200, description = "Movie created", body = Success),
        (status = 404, description = "Linked actor does not exist"),
        (status = 422, description = "Invalid request payload")
    )
)]
pub(crate) async fn create_movie(
    State(state): State<AppState>,
    Extension(authorized): Extension<Authorized>,
    payload: Result<Json<NewMovie>, JsonRejection>,
) -> Result<Json<Success>, ApiError> {
    let Json(movie) = payload?;
    let created = state.store.create_movie(movie).await?;
    info!(
        "Movie {} created by {:?}",
        created.id, authorized.claims.subject
    );
    Ok(Json(Success::ok()))
}

#[utoipa::path(
    patch,
    path = "/movies/{id}",
    tag = MOVIES_TAG,
    request_body = MoviePatch,
    params(
        ("id" = u64, Path, description = "Movie identifier"),
        ("Authorization" = String, Header, description = "Bearer token granting patch:movies"),
    ),
    responses(
        (status = 200, description = "Movie updated", body = Success),
        (status = 404, description = "Movie does not exist"),
        (status = 422, description = "Invalid request payload")
    )
)]
pub(crate) async fn update_movie(
    State(state): State<AppState>,
    Extension(authorized): Extension<Authorized>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<MoviePatch>, JsonRejection>,
) -> Result<Json<Success>, ApiError> {
    let Path(id) = id?;
    let Json(patch) = payload?;
    state.store.update_movie(id, patch).await?;
    info!("Movie {id} updated by {:?}", authorized.claims.subject);
    Ok(Json(Success::ok()))
}

#[utoipa::path(
    delete,
    path = "/movies/{id}",
    tag = MOVIES_TAG,
    params(
        ("id" = u64, Path, description = "Movie identifier"),
        ("Authorization" = String, Header, description = "Bearer token granting delete:movies"),
    ),
    responses(
        (status = 200, description = "Movie deleted", body = Success),
        (status = 422, description = "Movie does not exist")
    )
)]
pub(crate) async fn delete_movie(
    State(state): State<AppState>,
    Extension(authorized): Extension<Authorized>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Success>, ApiError> {
    let Path(id) = id?;
    match state.store.delete_movie(id).await {
        Ok(()) => {
            info!("Movie {id} deleted by {:?}", authorized.claims.subject);
            Ok(Json(Success::ok()))
        }
        Err(StoreError::MovieNotFound(_)) => Err(ApiError::unprocessable()),
        Err(err) => Err(err.into()),
    }
}

pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/movies", guarded(state, GET_MOVIES, get(list_movies)))
        .route("/movies", guarded(state, POST_MOVIES, post(create_movie)))
        .route("/movies/{id}", guarded(state, PATCH_MOVIES, patch(update_movie)))
        .route("/movies/{id}", guarded(state, DELETE_MOVIES, delete(delete_movie)))
}
