pub(crate) mod actors;
mod cors;
mod guard;
pub(crate) mod health;
pub(crate) mod movies;

use crate::api::cors::cors_middleware;
use crate::errors::ApiError;
use crate::state::AppState;
use axum::{middleware, routing::get, Json, Router};

const WELCOME: &str = "Welcome to the Casting Agency";

/// Public landing route
#[utoipa::path(
    get,
    path = "/",
    tag = crate::openapi::HEALTH_TAG,
    responses(
        (status = 200, description = "Greeting", body = String)
    )
)]
pub(crate) async fn welcome() -> Json<&'static str> {
    Json(WELCOME)
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

/// Combines all API routes into a single router
pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .merge(health::router())
        .merge(actors::router(state))
        .merge(movies::router(state))
        .fallback(not_found)
        // layer rather than route_layer so preflights and the fallback get the headers too
        .layer(middleware::from_fn(cors_middleware))
}
