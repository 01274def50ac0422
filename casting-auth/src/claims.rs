use crate::error::AuthError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

const PERMISSIONS_CLAIM: &str = "permissions";

/// The verified payload of a bearer token.
///
/// Only produced by [`crate::TokenVerifier::verify`], after signature, expiry, issuer and
/// audience checks have passed.
#[derive(Debug, Clone)]
pub struct Claims {
    pub issuer: Option<String>,
    pub audience: Vec<String>,
    pub subject: Option<String>,
    pub expires_at: DateTime<Utc>,
    /// Every claim outside the registered ones, `permissions` included
    pub extra: Map<String, Value>,
}

/// Payload shape as it appears on the wire
#[derive(Debug, Deserialize)]
pub(crate) struct RawClaims {
    iss: Option<String>,
    sub: Option<String>,
    aud: Option<Audience>,
    exp: i64,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl TryFrom<RawClaims> for Claims {
    type Error = AuthError;

    fn try_from(raw: RawClaims) -> Result<Self, Self::Error> {
        let expires_at = DateTime::from_timestamp(raw.exp, 0)
            .ok_or_else(|| AuthError::MalformedToken(format!("exp {} is out of range", raw.exp)))?;
        let audience = match raw.aud {
            Some(Audience::Single(aud)) => vec![aud],
            Some(Audience::Multiple(aud)) => aud,
            None => Vec::new(),
        };
        Ok(Self {
            issuer: raw.iss,
            audience,
            subject: raw.sub,
            expires_at,
            extra: raw.extra,
        })
    }
}

/// Permissions granted by a token. Order is irrelevant and duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet(HashSet<String>);

impl PermissionSet {
    pub fn contains(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Pulls the permission set out of verified claims.
///
/// The `permissions` claim must be an array of strings. A missing claim or any other shape is
/// [`AuthError::ClaimsMalformed`], never an empty grant.
pub fn extract_permissions(claims: &Claims) -> Result<PermissionSet, AuthError> {
    let value = claims
        .extra
        .get(PERMISSIONS_CLAIM)
        .ok_or_else(|| AuthError::ClaimsMalformed("'permissions' claim is missing".into()))?;

    let entries = value.as_array().ok_or_else(|| {
        AuthError::ClaimsMalformed("'permissions' claim must be an array".into())
    })?;

    entries
        .iter()
        .map(|entry| {
            entry.as_str().ok_or_else(|| {
                AuthError::ClaimsMalformed("'permissions' entries must be strings".into())
            })
        })
        .collect()
}
