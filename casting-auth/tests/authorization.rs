use casting_auth::testutil::{fresh_payload, jwks, TestKey, TEST_AUDIENCE, TEST_ISSUER};
use casting_auth::{
    AuthError, AuthorizationGate, HttpKeySource, JwksResolver, TokenVerifier, VerifierOptions,
};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JWKS_PATH: &str = "/.well-known/jwks.json";

fn gate_for(url: &str) -> AuthorizationGate {
    let _ = env_logger::builder().is_test(true).try_init();
    let url = Url::parse(url).unwrap().join(JWKS_PATH).unwrap();
    let source = HttpKeySource::new(url, Duration::from_secs(2)).unwrap();
    let resolver = JwksResolver::new(Arc::new(source), Duration::from_secs(3600));
    AuthorizationGate::new(TokenVerifier::new(
        Arc::new(resolver),
        VerifierOptions {
            issuer: Some(TEST_ISSUER.into()),
            audience: Some(TEST_AUDIENCE.into()),
            leeway: 0,
        },
    ))
}

async fn serve_keys(server: &MockServer, keys: &[&TestKey]) {
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks(keys)))
        .mount(server)
        .await;
}

fn bearer(key: &TestKey, permissions: &[&str]) -> String {
    format!("Bearer {}", key.sign(&fresh_payload(permissions)))
}

#[tokio::test]
async fn test_unknown_kid_is_key_not_found() {
    let server = MockServer::start().await;
    serve_keys(&server, &[&TestKey::primary("abc")]).await;
    let gate = gate_for(&server.uri());

    let header = bearer(&TestKey::primary("xyz"), &["get:movies"]);
    let err = gate.authorize(Some(&header), "get:movies").await.unwrap_err();

    assert_eq!(err, AuthError::KeyNotFound("xyz".into()));
    assert_eq!(err.status_code(), http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_permission_is_forbidden() {
    let server = MockServer::start().await;
    let key = TestKey::primary("abc");
    serve_keys(&server, &[&key]).await;
    let gate = gate_for(&server.uri());

    let err = gate
        .authorize(Some(&bearer(&key, &["get:movies"])), "delete:movies")
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::PermissionDenied("delete:movies".into()));
    assert_eq!(err.status_code(), http::StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_granted_permission_is_authorized() {
    let server = MockServer::start().await;
    let key = TestKey::primary("abc");
    serve_keys(&server, &[&key]).await;
    let gate = gate_for(&server.uri());

    let authorized = gate
        .authorize(
            Some(&bearer(&key, &["get:movies", "delete:movies"])),
            "delete:movies",
        )
        .await
        .unwrap();

    assert_eq!(authorized.permissions.len(), 2);
    assert_eq!(authorized.claims.issuer.as_deref(), Some(TEST_ISSUER));
}

#[tokio::test]
async fn test_foreign_signature_is_rejected() {
    let server = MockServer::start().await;
    serve_keys(&server, &[&TestKey::primary("abc")]).await;
    let gate = gate_for(&server.uri());

    let header = bearer(&TestKey::rogue("abc"), &["get:movies"]);
    assert_eq!(
        gate.authorize(Some(&header), "get:movies").await.unwrap_err(),
        AuthError::SignatureInvalid
    );
}

#[tokio::test]
async fn test_unreachable_key_source() {
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let gate = gate_for(&uri);

    let header = bearer(&TestKey::primary("abc"), &["get:movies"]);
    let err = gate.authorize(Some(&header), "get:movies").await.unwrap_err();

    assert!(matches!(err, AuthError::KeySourceUnavailable(_)));
    assert_eq!(err.status_code(), http::StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_key_source_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let gate = gate_for(&server.uri());

    let header = bearer(&TestKey::primary("abc"), &["get:movies"]);
    assert!(matches!(
        gate.authorize(Some(&header), "get:movies").await,
        Err(AuthError::KeySourceUnavailable(_))
    ));
}

#[tokio::test]
async fn test_rotated_key_triggers_single_refresh() {
    let server = MockServer::start().await;
    let old = TestKey::primary("old");
    let new = TestKey::rogue("new");

    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks(&[&old])))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks(&[&old, &new])))
        .with_priority(2)
        .expect(1)
        .mount(&server)
        .await;
    let gate = gate_for(&server.uri());

    assert!(gate
        .authorize(Some(&bearer(&old, &["get:actors"])), "get:actors")
        .await
        .is_ok());
    assert!(gate
        .authorize(Some(&bearer(&new, &["get:actors"])), "get:actors")
        .await
        .is_ok());
    assert!(gate
        .authorize(Some(&bearer(&old, &["get:actors"])), "get:actors")
        .await
        .is_ok());

    server.verify().await;
}

#[tokio::test]
async fn test_cached_keys_are_reused() {
    let server = MockServer::start().await;
    let key = TestKey::primary("abc");
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks(&[&key])))
        .expect(1)
        .mount(&server)
        .await;
    let gate = gate_for(&server.uri());

    for permission in ["get:actors", "get:movies", "get:actors"] {
        let header = bearer(&key, &["get:actors", "get:movies"]);
        assert!(gate.authorize(Some(&header), permission).await.is_ok());
    }

    server.verify().await;
}
