use crate::api::guard::guarded;
use crate::errors::ApiError;
use crate::models::{ActorList, ActorPatch, NewActor, Success};
use crate::openapi::ACTORS_TAG;
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

pub(crate) const GET_ACTORS: &str = "get:actors";
pub(crate) const POST_ACTORS: &str = "post:actors";
pub(crate) const PATCH_ACTORS: &str = "patch:actors";
pub(crate) const DELETE_ACTORS: &str = "delete:actors";

#[utoipa::path(
    get,
    path = "/actors",
    tag = ACTORS_TAG,
    params(
        ("Authorization" = String, Header, description = "Bearer token granting get:actors"),
    ),
    responses(
        (status = 200, description = "All actors", body = ActorList),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Permission not granted")
    )
)]
pub(crate) async fn list_actors(State(state): State<AppState>) -> Result<Json<ActorList>, ApiError> {
    let actors = state.store.list_actors().await?;
    Ok(Json(ActorList {
        success: true,
        actors,
    }))
}

#[utoipa::path(
    post,
    path = "/actors",
    tag = ACTORS_TAG,
    request_body = NewActor,
    params(
        ("Authorization" = String, Header, description = "Bearer token granting post:actors"),
    ),
    responses(
        (status = 200, description = "Actor created", body = Success),
        (status = 404, description = "Linked movie does not exist"),
        (status = 422, description = "Invalid request payload")
    )
)]
pub(crate) async fn create_actor(
    State(state): State<AppState>,
    Extension(authorized): Extension<Authorized>,
    payload: Result<Json<NewActor>, JsonRejection>,
) -> Result<Json<Success>, ApiError> {
    let Json(actor) = payload?;
    let created = state.store.create_actor(actor).await?;
    info!(
        "Actor {} created by {:?}",
        created.id, authorized.claims.subject
    );
    Ok(Json(Success::ok()))
}

#[utoipa::path(
    patch,
    path = "/actors/{id}",
    tag = ACTORS_TAG,
    request_body = ActorPatch,
    params(
        ("id" = u64, Path, description = "Actor identifier"),
        ("Authorization" = String, Header, description = "Bearer token granting patch:actors"),
    ),
    responses(
        (status = 200, description = "Actor updated", body = Success),
        (status = 404, description = "Actor does not exist"),
        (status = 422, description = "Invalid request payload")
    )
)]
pub(crate) async fn update_actor(
    State(state): State<AppState>,
    Extension(authorized): Extension<Authorized>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<ActorPatch>, JsonRejection>,
) -> Result<Json<Success>, ApiError> {
    let Path(id) = id?;
    let Json(patch) = payload?;
    state.store.update_actor(id, patch).await?;
    info!("Actor {id} updated by {:?}", authorized.claims.subject);
    Ok(Json(Success::ok()))
}

#[utoipa::path(
    delete,
    path = "/actors/{id}",
    tag = ACTORS_TAG,
    params(
        ("id" = u64, Path, description = "Actor identifier"),
        ("Authorization" = String, Header, description = "Bearer token granting delete:actors"),
    ),
    responses(
        (status = 200, description = "Actor deleted", body = Success),
        (status = 422, description = "Actor does not exist")
    )
)]
pub(crate) async fn delete_actor(
    State(state): State<AppState>,
    Extension(authorized): Extension<Authorized>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Success>, ApiError> {
    let Path(id) = id?;
    match state.store.delete_actor(id).await {
        Ok(()) => {
            info!("Actor {id} deleted by {:?}", authorized.claims.subject);
            Ok(Json(Success::ok()))
        }
        Err(StoreError::ActorNotFound(_)) => Err(ApiError::unprocessable()),
        Err(err) => Err(err.into()),
    }
}

pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/actors", guarded(state, GET_ACTORS, get(list_actors)))
        .route("/actors", guarded(state, POST_ACTORS, post(create_actor)))
        .route("/actors/{id}", guarded(state, PATCH_ACTORS, patch(update_actor)))
        .route("/actors/{id}", guarded(state, DELETE_ACTORS, delete(delete_actor)))
}
