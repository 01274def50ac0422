pub(crate) use crate::config::auth::AuthConfig;
use confique::Config;

pub mod auth;

/// Main configuration structure for the casting server
#[derive(Debug, Config, Clone)]
pub struct Settings {
    /// The port the server will listen to (default: 8080)
    #[config(env = "CASTING_PORT", default = 8080)]
    pub port: u16,

    /// Identity provider configuration
    #[config(nested)]
    pub auth: AuthConfig,
}

impl Settings {
    /// Loads the configuration from `CASTING_*` environment variables
    pub fn new() -> Result<Self, confique::Error> {
        Self::builder().env().load()
    }

    #[cfg(test)]
    pub fn for_test() -> Self {
        use casting_auth::testutil::{TEST_AUDIENCE, TEST_ISSUER};

        Self {
            port: 0, // Let the OS choose a port
            auth: AuthConfig {
                domain: "casting.test".to_string(),
                audience: TEST_AUDIENCE.to_string(),
                jwks_url: None,
                issuer: Some(TEST_ISSUER.to_string()),
                leeway: 0,
                jwks_timeout: 2,
                jwks_cache_ttl: 3600,
                jwks_min_refresh: 0,
            },
        }
    }

    #[cfg(test)]
    pub fn for_test_with_mock(jwks_mock: &wiremock::MockServer) -> Self {
        let mut settings = Self::for_test();
        settings.auth.jwks_url = Some(format!("{}/.well-known/jwks.json", jwks_mock.uri()));
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 9] = [
        "CASTING_PORT",
        "CASTING_AUTH_DOMAIN",
        "CASTING_AUTH_AUDIENCE",
        "CASTING_AUTH_JWKS_URL",
        "CASTING_AUTH_ISSUER",
        "CASTING_AUTH_LEEWAY",
        "CASTING_AUTH_JWKS_TIMEOUT",
        "CASTING_AUTH_JWKS_CACHE_TTL",
        "CASTING_AUTH_JWKS_MIN_REFRESH",
    ];

    fn clear_env() {
        for name in VARS {
            std::env::remove_var(name);
        }
    }

    // Single test so the environment is not mutated concurrently
    #[test]
    fn test_load_from_env() {
        clear_env();
        assert!(Settings::new().is_err(), "domain and audience are required");

        std::env::set_var("CASTING_AUTH_DOMAIN", "casting.eu.auth0.com");
        std::env::set_var("CASTING_AUTH_AUDIENCE", "casting");
        let settings = Settings::new().unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.auth.domain, "casting.eu.auth0.com");
        assert_eq!(settings.auth.audience, "casting");
        assert_eq!(settings.auth.jwks_url, None);
        assert_eq!(settings.auth.leeway, 0);
        assert_eq!(settings.auth.jwks_timeout, 5);
        assert_eq!(settings.auth.jwks_cache_ttl, 3600);
        assert_eq!(settings.auth.jwks_min_refresh, 0);

        std::env::set_var("CASTING_PORT", "9090");
        std::env::set_var("CASTING_AUTH_LEEWAY", "30");
        std::env::set_var("CASTING_AUTH_JWKS_URL", "http://localhost:9000/keys");
        std::env::set_var("CASTING_AUTH_JWKS_MIN_REFRESH", "10");
        let settings = Settings::new().unwrap();
        assert_eq!(settings.port, 9090);
        assert_eq!(settings.auth.jwks_min_refresh, 10);
        assert_eq!(settings.auth.leeway, 30);
        assert_eq!(
            settings.auth.jwks_url().unwrap().as_str(),
            "http://localhost:9000/keys"
        );

        std::env::set_var("CASTING_PORT", "not-a-port");
        assert!(Settings::new().is_err());

        clear_env();
    }
}
