//! Identity provider configuration

use confique::Config;
use std::time::Duration;
use url::Url;

const JWKS_PATH: &str = ".well-known/jwks.json";

/// Where signing keys come from and what a token must be issued for
#[derive(Debug, Config, Clone)]
pub struct AuthConfig {
    /// Tenant domain of the identity provider, e.g. `casting.eu.auth0.com`
    #[config(env = "CASTING_AUTH_DOMAIN")]
    pub domain: String,

    /// Expected `aud` claim
    #[config(env = "CASTING_AUTH_AUDIENCE")]
    pub audience: String,

    /// JWKS endpoint (default: https://<domain>/.well-known/jwks.json)
    #[config(env = "CASTING_AUTH_JWKS_URL")]
    pub jwks_url: Option<String>,

    /// Expected `iss` claim (default: https://<domain>/)
    #[config(env = "CASTING_AUTH_ISSUER")]
    pub issuer: Option<String>,

    /// Seconds a token is still accepted after `exp` (default: 0)
    #[config(env = "CASTING_AUTH_LEEWAY", default = 0)]
    pub leeway: u64,

    /// Timeout in seconds for fetching the key set (default: 5)
    #[config(env = "CASTING_AUTH_JWKS_TIMEOUT", default = 5)]
    pub jwks_timeout: u64,

    /// Seconds a fetched key set is used before it is fetched again (default: 3600)
    #[config(env = "CASTING_AUTH_JWKS_CACHE_TTL", default = 3600)]
    pub jwks_cache_ttl: u64,

    /// Minimum age in seconds of the cached key set before an unknown key triggers a
    /// refetch (default: 0, every miss refetches)
    #[config(env = "CASTING_AUTH_JWKS_MIN_REFRESH", default = 0)]
    pub jwks_min_refresh: u64,
}

impl AuthConfig {
    fn tenant_url(&self) -> String {
        format!("https://{}/", self.domain.trim_end_matches('/'))
    }

    pub fn jwks_url(&self) -> Result<Url, url::ParseError> {
        match &self.jwks_url {
            Some(url) => Url::parse(url),
            None => Url::parse(&self.tenant_url())?.join(JWKS_PATH),
        }
    }

    pub fn issuer(&self) -> String {
        self.issuer.clone().unwrap_or_else(|| self.tenant_url())
    }

    pub fn jwks_timeout(&self) -> Duration {
        Duration::from_secs(self.jwks_timeout)
    }

    pub fn jwks_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_cache_ttl)
    }

    pub fn jwks_min_refresh(&self) -> Duration {
        Duration::from_secs(self.jwks_min_refresh)
    }
}
