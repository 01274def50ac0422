use crate::errors::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};
use casting_auth::AuthorizationGate;
use http::header::AUTHORIZATION;
use std::sync::Arc;

/// The gate together with the one permission a route requires
#[derive(Clone)]
pub(crate) struct PermissionGuard {
    gate: Arc<AuthorizationGate>,
    permission: &'static str,
}

impl PermissionGuard {
    pub(crate) fn new(state: &AppState, permission: &'static str) -> Self {
        Self {
            gate: state.gate.clone(),
            permission,
        }
    }
}

/// Protects `route` with `permission`.
///
/// The guard runs before extractors, so denied requests never have their body parsed or reach
/// the store.
pub(crate) fn guarded(
    state: &AppState,
    permission: &'static str,
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn_with_state(
        PermissionGuard::new(state, permission),
        require_permission,
    ))
}

/// Authorizes the request and hands the [`casting_auth::Authorized`] value to the handler
/// through request extensions
pub(crate) async fn require_permission(
    State(guard): State<PermissionGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request.headers().get(AUTHORIZATION).cloned();
    match guard
        .gate
        .authorize_header(header.as_ref(), guard.permission)
        .await
    {
        Ok(authorized) => {
            request.extensions_mut().insert(authorized);
            next.run(request).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}
