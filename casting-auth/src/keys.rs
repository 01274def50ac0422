//! Resolution of the issuer's public signing keys.
//!
//! The issuer publishes a JSON Web Key Set. [`JwksResolver`] keeps the last fetched set in a
//! process-wide cache and replaces it whole whenever a token names a key identifier the
//! cached set does not contain, which is how issuer key rotation is picked up without a
//! restart.

use crate::error::KeyError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey};
use log::{debug, info};
use moka::future::Cache as MokaCache;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

const KEY_SET: &str = "jwks";

/// Longest time a fetched key set may be cached
pub const MAX_CACHE_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Signing algorithms tokens may declare. Anything else is rejected before key lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    RS256,
}

impl SigningAlgorithm {
    /// Matches a raw `alg` header value against the allow-list
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "RS256" => Some(Self::RS256),
            _ => None,
        }
    }

    pub(crate) fn jwt_algorithm(&self) -> Algorithm {
        match self {
            Self::RS256 => Algorithm::RS256,
        }
    }
}

/// A public key published by the issuer
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    algorithm: SigningAlgorithm,
    decoding_key: DecodingKey,
}

impl SigningKey {
    /// Builds an RS256 key from base64url encoded modulus and exponent
    pub fn from_rsa_components(
        kid: impl Into<String>,
        modulus: &str,
        exponent: &str,
    ) -> Result<Self, jsonwebtoken::errors::Error> {
        Ok(Self {
            kid: kid.into(),
            algorithm: SigningAlgorithm::RS256,
            decoding_key: DecodingKey::from_rsa_components(modulus, exponent)?,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// JSON Web Key Set document as served by the issuer
#[derive(Debug, Clone, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

/// A single entry of a key set. Only the members needed for RSA signature keys are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(rename = "use")]
    pub key_use: Option<String>,
    pub alg: Option<String>,
    pub kid: Option<String>,
    pub n: Option<String>,
    pub e: Option<String>,
}

impl Jwk {
    fn to_signing_key(&self) -> Result<SigningKey, String> {
        if !self.kty.eq_ignore_ascii_case("RSA") {
            return Err(format!("unsupported key type '{}'", self.kty));
        }
        if let Some(key_use) = self.key_use.as_deref().filter(|u| *u != "sig") {
            return Err(format!("key use '{key_use}' is not 'sig'"));
        }
        if let Some(alg) = self.alg.as_deref() {
            if SigningAlgorithm::from_name(alg).is_none() {
                return Err(format!("algorithm '{alg}' is not allowed"));
            }
        }
        let kid = self.kid.as_deref().ok_or("missing kid")?;
        let (Some(n), Some(e)) = (self.n.as_deref(), self.e.as_deref()) else {
            return Err("missing RSA modulus or exponent".to_string());
        };
        SigningKey::from_rsa_components(kid, n, e).map_err(|e| format!("invalid RSA key: {e}"))
    }
}

/// An immutable snapshot of the issuer's keys, indexed by key identifier
#[derive(Debug, Clone)]
pub struct KeySet {
    keys: HashMap<String, SigningKey>,
    fetched_at: DateTime<Utc>,
}

impl KeySet {
    pub fn new(keys: impl IntoIterator<Item = SigningKey>) -> Self {
        Self {
            keys: keys
                .into_iter()
                .map(|key| (key.kid.clone(), key))
                .collect(),
            fetched_at: Utc::now(),
        }
    }

    /// Keeps the entries usable as RS256 verification keys and skips the rest
    pub fn from_jwks(jwks: &JwkSet) -> Self {
        let keys = jwks.keys.iter().filter_map(|jwk| match jwk.to_signing_key() {
            Ok(key) => Some(key),
            Err(reason) => {
                debug!(
                    "Skipping key '{}' from key set: {reason}",
                    jwk.kid.as_deref().unwrap_or("<none>")
                );
                None
            }
        });
        Self::new(keys)
    }

    pub fn get(&self, kid: &str) -> Option<&SigningKey> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

/// Where key sets come from. One call is one retrieval of the complete set.
#[async_trait]
pub trait KeySource: Send + Sync {
    async fn fetch(&self) -> Result<KeySet, KeyError>;
}

/// Fetches the key set from the issuer's published JWKS endpoint
#[derive(Clone)]
pub struct HttpKeySource {
    client: Client,
    url: Url,
}

impl HttpKeySource {
    /// Creates a key source with a bounded request timeout
    pub fn new(url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(2)))
            .build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl KeySource for HttpKeySource {
    async fn fetch(&self) -> Result<KeySet, KeyError> {
        debug!("Fetching signing keys from {}", self.url);
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| KeyError::Unavailable(format!("request to {} failed: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeyError::Unavailable(format!(
                "{} responded with status {status}",
                self.url
            )));
        }

        let jwks: JwkSet = response.json().await.map_err(|e| {
            KeyError::Unavailable(format!("invalid key set from {}: {e}", self.url))
        })?;
        Ok(KeySet::from_jwks(&jwks))
    }
}

/// Looks up the key a token claims to be signed with
#[async_trait]
pub trait KeyResolver: Send + Sync {
    async fn resolve(&self, kid: &str) -> Result<SigningKey, KeyError>;
}

/// Resolver backed by a [`KeySource`] with a whole-set cache.
///
/// Readers share the cached `Arc<KeySet>` without blocking each other; a refresh inserts a
/// new set in one step, so a lookup sees either the old set or the new one. Misses that race
/// each other are served by a single refresh.
pub struct JwksResolver {
    source: Arc<dyn KeySource>,
    cache: MokaCache<&'static str, Arc<KeySet>>,
    refresh_lock: Mutex<()>,
    min_refresh_interval: Duration,
}

impl JwksResolver {
    /// `ttl` bounds how long a fetched set is used before it is fetched again on next use.
    /// Values above [`MAX_CACHE_TTL`] are capped.
    pub fn new(source: Arc<dyn KeySource>, ttl: Duration) -> Self {
        Self {
            source,
            cache: MokaCache::builder()
                .time_to_live(ttl.min(MAX_CACHE_TTL))
                .build(),
            refresh_lock: Mutex::new(()),
            min_refresh_interval: Duration::ZERO,
        }
    }

    /// A miss on a set younger than `interval` is answered from that set without a fetch
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Returns the cached set, fetching it on first use. The flag is true when this call
    /// performed the fetch.
    async fn current(&self) -> Result<(Arc<KeySet>, bool), KeyError> {
        let entry = self
            .cache
            .entry(KEY_SET)
            .or_try_insert_with(self.load())
            .await
            .map_err(|e| (*e).clone())?;
        let fresh = entry.is_fresh();
        Ok((entry.into_value(), fresh))
    }

    async fn load(&self) -> Result<Arc<KeySet>, KeyError> {
        let keys = self.source.fetch().await?;
        info!(
            "Loaded {} signing key(s), fetched at {}",
            keys.len(),
            keys.fetched_at()
        );
        Ok(Arc::new(keys))
    }

    /// Fetches a replacement set and swaps it in
    pub async fn refresh(&self) -> Result<Arc<KeySet>, KeyError> {
        let keys = self.load().await?;
        self.cache.insert(KEY_SET, keys.clone()).await;
        Ok(keys)
    }

    /// Refreshes in place of `stale` unless another task already replaced it
    async fn refresh_after(&self, stale: &Arc<KeySet>) -> Result<Arc<KeySet>, KeyError> {
        let _guard = self.refresh_lock.lock().await;
        if let Some(current) = self.cache.get(KEY_SET).await {
            if !Arc::ptr_eq(&current, stale) {
                debug!("Key set was replaced by a concurrent refresh");
                return Ok(current);
            }
        }
        self.refresh().await
    }

    fn refresh_allowed(&self, keys: &KeySet) -> bool {
        let age = (Utc::now() - keys.fetched_at()).to_std().unwrap_or_default();
        age >= self.min_refresh_interval
    }
}

#[async_trait]
impl KeyResolver for JwksResolver {
    async fn resolve(&self, kid: &str) -> Result<SigningKey, KeyError> {
        let (keys, fresh) = self.current().await?;
        if let Some(key) = keys.get(kid) {
            return Ok(key.clone());
        }
        if fresh {
            return Err(KeyError::NotFound(kid.to_string()));
        }
        if !self.refresh_allowed(&keys) {
            debug!(
                "Signing key '{kid}' is not in the key set fetched at {}, too soon to refresh",
                keys.fetched_at()
            );
            return Err(KeyError::NotFound(kid.to_string()));
        }

        info!("Signing key '{kid}' is not in the cached key set, refreshing");
        self.refresh_after(&keys)
            .await?
            .get(kid)
            .cloned()
            .ok_or_else(|| KeyError::NotFound(kid.to_string()))
    }
}

/// Resolver over a fixed key set, for pinned keys and tests
#[derive(Debug, Clone)]
pub struct StaticKeyResolver {
    keys: Arc<KeySet>,
}

impl StaticKeyResolver {
    pub fn new(keys: KeySet) -> Self {
        Self {
            keys: Arc::new(keys),
        }
    }
}

#[async_trait]
impl KeyResolver for StaticKeyResolver {
    async fn resolve(&self, kid: &str) -> Result<SigningKey, KeyError> {
        self.keys
            .get(kid)
            .cloned()
            .ok_or_else(|| KeyError::NotFound(kid.to_string()))
    }
}
