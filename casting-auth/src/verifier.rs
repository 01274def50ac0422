//! Bearer token verification.
//!
//! A token is only trusted once every check below passes, in this order:
//!
//! 1. three dot-separated segments with a decodable header carrying `alg` and `kid`
//! 2. `alg` is on the allow-list (checked on the raw string, before any key is chosen)
//! 3. the key named by `kid` resolves
//! 4. the RS256 signature verifies against that key
//! 5. `exp` lies in the future, then issuer and audience match when configured
//!
//! The first failing check decides the [`AuthError`] kind.

use crate::claims::{Claims, RawClaims};
use crate::error::AuthError;
use crate::keys::{KeyResolver, SigningAlgorithm};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Validation;
use log::debug;
use serde::Deserialize;
use std::sync::Arc;

/// Source of the current time, injectable so expiry can be tested deterministically
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Claim expectations beyond the signature
#[derive(Debug, Clone, Default)]
pub struct VerifierOptions {
    /// Expected `iss`, skipped when `None`
    pub issuer: Option<String>,
    /// Expected member of `aud`, skipped when `None`
    pub audience: Option<String>,
    /// Seconds of tolerance after `exp`
    pub leeway: u64,
}

/// Token header, decoded without verification.
///
/// Only used to pick the verification key; the signature check decodes it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    pub algorithm: SigningAlgorithm,
    pub key_id: String,
}

#[derive(Deserialize)]
struct RawHeader {
    alg: Option<String>,
    kid: Option<String>,
}

impl TokenHeader {
    pub fn decode_unverified(token: &str) -> Result<Self, AuthError> {
        let mut segments = token.split('.');
        let (Some(header), Some(_), Some(_), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(AuthError::MalformedToken(
                "expected three dot-separated segments".into(),
            ));
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(header)
            .map_err(|e| AuthError::MalformedToken(format!("header is not base64url: {e}")))?;
        let raw: RawHeader = serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::MalformedToken(format!("header is not a JSON object: {e}")))?;

        let alg = raw
            .alg
            .ok_or_else(|| AuthError::MalformedToken("header is missing 'alg'".into()))?;
        let algorithm =
            SigningAlgorithm::from_name(&alg).ok_or(AuthError::UnsupportedAlgorithm(alg))?;
        let key_id = raw
            .kid
            .ok_or_else(|| AuthError::MalformedToken("header is missing 'kid'".into()))?;

        Ok(Self { algorithm, key_id })
    }
}

/// Verifies bearer tokens against keys from a [`KeyResolver`]
pub struct TokenVerifier {
    resolver: Arc<dyn KeyResolver>,
    clock: Arc<dyn Clock>,
    options: VerifierOptions,
}

impl TokenVerifier {
    pub fn new(resolver: Arc<dyn KeyResolver>, options: VerifierOptions) -> Self {
        Self::with_clock(resolver, options, Arc::new(SystemClock))
    }

    pub fn with_clock(
        resolver: Arc<dyn KeyResolver>,
        options: VerifierOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            resolver,
            clock,
            options,
        }
    }

    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MalformedToken("token is empty".into()));
        }

        let header = TokenHeader::decode_unverified(token)?;
        let key = self.resolver.resolve(&header.key_id).await?;
        if key.kid() != header.key_id || key.algorithm() != header.algorithm {
            return Err(AuthError::KeyNotFound(header.key_id));
        }

        let data = jsonwebtoken::decode::<RawClaims>(
            token,
            key.decoding_key(),
            &signature_validation(header.algorithm),
        )
        .map_err(classify)?;

        // re-check the header that was actually verified
        if data.header.kid.as_deref() != Some(key.kid()) {
            return Err(AuthError::SignatureInvalid);
        }

        let claims = Claims::try_from(data.claims)?;
        self.check_claims(&claims)?;
        debug!(
            "Verified token for subject {:?} signed with key '{}'",
            claims.subject, header.key_id
        );
        Ok(claims)
    }

    fn check_claims(&self, claims: &Claims) -> Result<(), AuthError> {
        let now = self.clock.now().timestamp();
        let leeway = i64::try_from(self.options.leeway).unwrap_or(i64::MAX);
        if now >= claims.expires_at.timestamp().saturating_add(leeway) {
            return Err(AuthError::TokenExpired);
        }

        if let Some(expected) = &self.options.issuer {
            if claims.issuer.as_ref() != Some(expected) {
                return Err(AuthError::InvalidClaims(format!(
                    "issuer {:?} does not match",
                    claims.issuer
                )));
            }
        }

        if let Some(expected) = &self.options.audience {
            if !claims.audience.iter().any(|aud| aud == expected) {
                return Err(AuthError::InvalidClaims(format!(
                    "audience {:?} does not contain '{expected}'",
                    claims.audience
                )));
            }
        }

        Ok(())
    }
}

/// The library only checks the algorithm and signature; time and claim checks happen in
/// [`TokenVerifier::check_claims`] so they use the injected clock.
fn signature_validation(algorithm: SigningAlgorithm) -> Validation {
    let mut validation = Validation::new(algorithm.jwt_algorithm());
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidRsaKey(_) => AuthError::SignatureInvalid,
        ErrorKind::InvalidAlgorithm => AuthError::UnsupportedAlgorithm(err.to_string()),
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
            AuthError::InvalidClaims(err.to_string())
        }
        _ => AuthError::MalformedToken(err.to_string()),
    }
}
