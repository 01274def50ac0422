//! Fixture keys, token minting and fakes shared by the test suites.

use crate::error::KeyError;
use crate::keys::{KeyResolver, KeySet, SigningKey};
use crate::verifier::Clock;
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const TEST_ISSUER: &str = "https://casting.test/";
pub const TEST_AUDIENCE: &str = "casting";

const PRIMARY_PEM: &str = include_str!("../testdata/primary.pem");
const PRIMARY_MODULUS: &str = "n0eawPwoOfZCWj_53RDFpOat3A6fZzsk85kpGdQa_pj5DHIJ2PoQfP7uFE-hunJ_S5AyM75OqgDqkJK4I6VfTd23RMpKanPrQTSKQ1dlvvQw61sDkELpHsYiMJYAk6Wwn4NDD9l_RnV48RDCi4aZiTwfnMn7gIzXGDMvKrF1nhLZI6fSgXcDFVvvxIrR4XE6bz_7Fk7ncmEYjCefmk6-Lct6gjKBq3MOsrsBU_c71q4wNYXBMZqPfZbFM60DEkOUwRs9WLcfRLR30loEcQfWFy53Uce9Cpe3GFPqcXcO4CUMrUQLKEedvvF79qtdJt6Izce62IJ0d_T44cRq1dZtZQ";

const ROGUE_PEM: &str = include_str!("../testdata/rogue.pem");
const ROGUE_MODULUS: &str = "ySUdQJyCejtTcQNWwJU-qgKulBmwQAtVgwCorarf2lqMJSf9pSnjnUAu7fKY_JuSOTpJO6mazhClrtXLZf75hv9uhUs25BI6trFkZDKpuWvtwiO95aO7MWAhMvwyvpXii7HwMlC2XdlqxRsOBu4_oJcQC-aEIUp3LRfVowRw3bFwsW7o_5yszOmIMY2gwvPOzed7-OQqennw-ssZXgsIdpCUqYrau4eqmChqJpetYB95AW4pkZCrxk5lT8G2V4AHxWQd_zIqeOywuJEvtBa70dlK0BHCPMlI7heGYyUUTUdiW4a5JI1_eIBsTbZE1NORHgZYD72U4PMzOvnG9P_mmQ";

const EXPONENT: &str = "AQAB";

/// An RSA key pair announced under a chosen key identifier
#[derive(Debug, Clone)]
pub struct TestKey {
    pub kid: String,
    pem: &'static str,
    modulus: &'static str,
}

impl TestKey {
    pub fn primary(kid: impl Into<String>) -> Self {
        Self {
            kid: kid.into(),
            pem: PRIMARY_PEM,
            modulus: PRIMARY_MODULUS,
        }
    }

    /// A second, unrelated key pair
    pub fn rogue(kid: impl Into<String>) -> Self {
        Self {
            kid: kid.into(),
            pem: ROGUE_PEM,
            modulus: ROGUE_MODULUS,
        }
    }

    pub fn signing_key(&self) -> SigningKey {
        SigningKey::from_rsa_components(&self.kid, self.modulus, EXPONENT)
            .expect("fixture key components are valid")
    }

    /// The public half as a JWKS entry
    pub fn jwk(&self) -> Value {
        json!({
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "kid": self.kid,
            "n": self.modulus,
            "e": EXPONENT,
        })
    }

    /// Signs `claims` with RS256, putting this key's `kid` in the header
    pub fn sign(&self, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.kid.clone());
        let key = EncodingKey::from_rsa_pem(self.pem.as_bytes()).expect("fixture PEM is valid");
        encode(&header, claims, &key).expect("signing fixture token")
    }
}

/// A JWKS document holding the given keys
pub fn jwks(keys: &[&TestKey]) -> Value {
    json!({ "keys": keys.iter().map(|key| key.jwk()).collect::<Vec<_>>() })
}

pub fn key_set(keys: &[&TestKey]) -> KeySet {
    KeySet::new(keys.iter().map(|key| key.signing_key()))
}

/// A payload accepted by a verifier configured with [`TEST_ISSUER`] and [`TEST_AUDIENCE`]
pub fn payload(permissions: &[&str], exp: i64) -> Value {
    json!({
        "iss": TEST_ISSUER,
        "sub": "auth0|casting-director",
        "aud": TEST_AUDIENCE,
        "iat": exp - 3600,
        "exp": exp,
        "permissions": permissions,
    })
}

/// A payload expiring one hour from now
pub fn fresh_payload(permissions: &[&str]) -> Value {
    payload(permissions, Utc::now().timestamp() + 3600)
}

/// Assembles a token from arbitrary header and payload with a junk signature
pub fn unsigned_token(header: &Value, payload: &Value) -> String {
    let encode_part = |value: &Value| {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).expect("serializing fixture"))
    };
    format!(
        "{}.{}.{}",
        encode_part(header),
        encode_part(payload),
        URL_SAFE_NO_PAD.encode(b"not-a-signature")
    )
}

/// A clock stuck at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn at(timestamp: i64) -> Self {
        Self(DateTime::from_timestamp(timestamp, 0).expect("timestamp in range"))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Wraps a resolver and counts lookups
pub struct CountingResolver {
    inner: Arc<dyn KeyResolver>,
    calls: AtomicUsize,
}

impl CountingResolver {
    pub fn new(inner: Arc<dyn KeyResolver>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyResolver for CountingResolver {
    async fn resolve(&self, kid: &str) -> Result<SigningKey, KeyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve(kid).await
    }
}
