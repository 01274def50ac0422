use http::StatusCode;
use thiserror::Error;

/// Every way an authorization attempt can fail.
///
/// Each kind maps to exactly one HTTP status and one machine-readable code so that
/// callers can tell authentication failures (401) apart from authorization failures
/// (403) and from an unavailable key source (500).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header is expected")]
    MissingHeader,

    #[error("Authorization header must be of the form 'Bearer <token>': {0}")]
    MalformedHeader(String),

    #[error("Unable to parse authentication token: {0}")]
    MalformedToken(String),

    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Unable to find the appropriate key: {0}")]
    KeyNotFound(String),

    #[error("Token signature is invalid")]
    SignatureInvalid,

    #[error("Token expired")]
    TokenExpired,

    #[error("Incorrect claims, please check the audience and issuer: {0}")]
    InvalidClaims(String),

    #[error("Permissions not included in token: {0}")]
    ClaimsMalformed(String),

    #[error("Permission not found: {0}")]
    PermissionDenied(String),

    #[error("Signing keys are unavailable: {0}")]
    KeySourceUnavailable(String),
}

impl AuthError {
    /// HTTP status the failure should surface as
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingHeader
            | Self::MalformedHeader(_)
            | Self::MalformedToken(_)
            | Self::UnsupportedAlgorithm(_)
            | Self::KeyNotFound(_)
            | Self::SignatureInvalid
            | Self::TokenExpired
            | Self::InvalidClaims(_) => StatusCode::UNAUTHORIZED,
            Self::ClaimsMalformed(_) => StatusCode::BAD_REQUEST,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::KeySourceUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable snake_case code for response bodies and logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingHeader => "authorization_header_missing",
            Self::MalformedHeader(_) => "invalid_header",
            Self::MalformedToken(_) => "invalid_token",
            Self::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            Self::KeyNotFound(_) => "key_not_found",
            Self::SignatureInvalid => "invalid_signature",
            Self::TokenExpired => "token_expired",
            Self::InvalidClaims(_) => "invalid_claims",
            Self::ClaimsMalformed(_) => "claims_malformed",
            Self::PermissionDenied(_) => "unauthorized",
            Self::KeySourceUnavailable(_) => "key_source_unavailable",
        }
    }
}

/// Failures of the key resolver, kept apart so that "no such key" is never
/// confused with "could not ask the issuer".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("no signing key with kid '{0}'")]
    NotFound(String),

    #[error("{0}")]
    Unavailable(String),
}

impl From<KeyError> for AuthError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::NotFound(kid) => AuthError::KeyNotFound(kid),
            KeyError::Unavailable(detail) => AuthError::KeySourceUnavailable(detail),
        }
    }
}
