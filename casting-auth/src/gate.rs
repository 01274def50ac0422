use crate::claims::{extract_permissions, Claims, PermissionSet};
use crate::enforcer::enforce;
use crate::error::AuthError;
use crate::verifier::TokenVerifier;
use http::HeaderValue;
use log::{debug, error, warn};

const BEARER: &str = "bearer";

/// Outcome of a successful authorization
#[derive(Debug, Clone)]
pub struct Authorized {
    pub claims: Claims,
    pub permissions: PermissionSet,
}

pub type AuthDecision = Result<Authorized, AuthError>;

/// Entry point for protected operations.
///
/// Runs header parsing, token verification, permission extraction and enforcement in that
/// order and stops at the first failure. Nothing is cached between calls.
pub struct AuthorizationGate {
    verifier: TokenVerifier,
}

impl AuthorizationGate {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }

    pub async fn authorize(&self, header: Option<&str>, required: &str) -> AuthDecision {
        let decision = self.evaluate(header, required).await;
        match &decision {
            Ok(authorized) => debug!(
                "Authorized {:?} for '{required}'",
                authorized.claims.subject
            ),
            Err(err @ AuthError::KeySourceUnavailable(_)) => {
                error!("Authorization for '{required}' failed: {err}")
            }
            Err(err) => warn!("Authorization for '{required}' denied ({}): {err}", err.code()),
        }
        decision
    }

    /// Like [`Self::authorize`] but takes the raw header value, rejecting non-ASCII values
    pub async fn authorize_header(
        &self,
        header: Option<&HeaderValue>,
        required: &str,
    ) -> AuthDecision {
        let value = match header.map(HeaderValue::to_str).transpose() {
            Ok(value) => value,
            Err(_) => {
                let err = AuthError::MalformedHeader("header value is not visible ASCII".into());
                warn!("Authorization for '{required}' denied ({}): {err}", err.code());
                return Err(err);
            }
        };
        self.authorize(value, required).await
    }

    async fn evaluate(&self, header: Option<&str>, required: &str) -> AuthDecision {
        let token = bearer_token(header)?;
        let claims = self.verifier.verify(token).await?;
        let permissions = extract_permissions(&claims)?;
        enforce(&permissions, required)?;
        Ok(Authorized {
            claims,
            permissions,
        })
    }
}

/// Extracts `<token>` from `Bearer <token>` without touching the token itself
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingHeader)?;
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case(BEARER) => Ok(token),
        (Some(scheme), _, _) if !scheme.eq_ignore_ascii_case(BEARER) => Err(
            AuthError::MalformedHeader("authorization header must start with 'Bearer'".into()),
        ),
        (_, None, _) => Err(AuthError::MalformedHeader("token not found".into())),
        _ => Err(AuthError::MalformedHeader(
            "authorization header must be bearer token".into(),
        )),
    }
}
