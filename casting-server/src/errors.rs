use crate::store::StoreError;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::response::IntoResponse;
use axum::Json;
use casting_auth::AuthError;
use http::StatusCode;
use serde_json::json;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub message: String,
    pub status_code: StatusCode,
    /// Machine readable reason, set for authorization failures
    pub code: Option<&'static str>,
}

impl ApiError {
    /// Create a new ApiError with a message and status code
    pub fn new<S: ToString>(message: S, status_code: StatusCode) -> Self {
        Self {
            message: message.to_string(),
            status_code,
            code: None,
        }
    }

    /// Create new Not Found Error (404)
    pub fn not_found() -> Self {
        Self::new("Not found", StatusCode::NOT_FOUND)
    }

    /// Create new Unprocessable Entity Error (422)
    pub fn unprocessable() -> Self {
        Self::new("Unprocessable request", StatusCode::UNPROCESSABLE_ENTITY)
    }

    /// Create new Bad Request Error (400)
    pub fn bad_request() -> Self {
        Self::new("Bad request", StatusCode::BAD_REQUEST)
    }

    /// Create new Internal Server Error (500)
    pub fn internal() -> Self {
        Self::new("Internal server error", StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code;
        let mut body = json!({
            "success": false,
            "error": status_code.as_u16(),
            "message": self.message,
        });
        if let Some(code) = self.code {
            body["code"] = json!(code);
        }
        (status_code, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self {
            message: err.to_string(),
            status_code: err.status_code(),
            code: Some(err.code()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ActorNotFound(_) | StoreError::MovieNotFound(_) => Self::not_found(),
            StoreError::Unavailable(reason) => {
                log::error!("Resource store failed: {reason}");
                Self::internal()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        log::debug!("Rejected request body: {rejection}");
        match rejection {
            JsonRejection::JsonDataError(_) => Self::unprocessable(),
            _ => Self::bad_request(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        log::debug!("Rejected request path: {rejection}");
        Self::not_found()
    }
}
