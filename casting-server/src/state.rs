use crate::config::Settings;
use crate::store::{MemoryStore, ResourceStore};
use casting_auth::{
    AuthorizationGate, HttpKeySource, JwksResolver, TokenVerifier, VerifierOptions, MAX_CACHE_TTL,
};
use log::info;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("invalid JWKS URL: {0}")]
    JwksUrl(#[from] url::ParseError),
    #[error("failed to create JWKS client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("JWKS cache TTL of {0:?} exceeds the one year maximum")]
    CacheTtl(Duration),
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub gate: Arc<AuthorizationGate>,
    pub store: Arc<dyn ResourceStore>,
}

impl AppState {
    /// Wires the gate to the configured JWKS endpoint and starts with an empty store
    pub fn new(settings: Settings) -> Result<Self, StateError> {
        let gate = Self::create_gate(&settings)?;
        Ok(Self::with_parts(
            settings,
            Arc::new(gate),
            Arc::new(MemoryStore::new()),
        ))
    }

    pub fn with_parts(
        settings: Settings,
        gate: Arc<AuthorizationGate>,
        store: Arc<dyn ResourceStore>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            gate,
            store,
        }
    }

    fn create_gate(settings: &Settings) -> Result<AuthorizationGate, StateError> {
        let auth = &settings.auth;
        let jwks_url = auth.jwks_url()?;
        let ttl = auth.jwks_cache_ttl();
        if ttl > MAX_CACHE_TTL {
            return Err(StateError::CacheTtl(ttl));
        }
        info!(
            "Signing keys from {jwks_url}, issuer '{}', audience '{}'",
            auth.issuer(),
            auth.audience
        );

        // Keys are fetched lazily on the first protected request
        let source = HttpKeySource::new(jwks_url, auth.jwks_timeout())?;
        let resolver = JwksResolver::new(Arc::new(source), ttl)
            .with_min_refresh_interval(auth.jwks_min_refresh());
        let verifier = TokenVerifier::new(
            Arc::new(resolver),
            VerifierOptions {
                issuer: Some(auth.issuer()),
                audience: Some(auth.audience.clone()),
                leeway: auth.leeway,
            },
        );
        Ok(AuthorizationGate::new(verifier))
    }
}
