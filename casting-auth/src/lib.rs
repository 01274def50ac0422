//! Bearer token authorization for the casting agency API.
//!
//! A request is allowed when its `Authorization: Bearer <token>` header carries an RS256 token
//! signed by a key from the identity provider's JWKS, the token is unexpired and addressed to
//! this API, and its `permissions` claim contains the permission the operation requires.
//!
//! [`AuthorizationGate`] composes the pieces; each piece is usable on its own:
//!
//! - [`keys`] fetches and caches signing keys
//! - [`verifier`] validates a token and yields its [`Claims`]
//! - [`claims`] extracts the [`PermissionSet`]
//! - [`enforcer`] decides whether a permission is granted

pub mod claims;
pub mod enforcer;
pub mod error;
pub mod gate;
pub mod keys;
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;
pub mod verifier;

pub use claims::{extract_permissions, Claims, PermissionSet};
pub use enforcer::enforce;
pub use error::{AuthError, KeyError};
pub use gate::{bearer_token, AuthDecision, AuthorizationGate, Authorized};
pub use keys::{
    HttpKeySource, JwksResolver, KeyResolver, KeySet, KeySource, SigningAlgorithm, SigningKey,
    StaticKeyResolver, MAX_CACHE_TTL,
};
pub use verifier::{Clock, SystemClock, TokenHeader, TokenVerifier, VerifierOptions};
