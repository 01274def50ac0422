use crate::config::Settings;
use crate::create_app;
use crate::models::{Actor, ActorPatch, Movie, MoviePatch, NewActor, NewMovie};
use crate::state::AppState;
use crate::store::{MemoryStore, ResourceStore, StoreError};
use async_trait::async_trait;
use axum::body::Body;
use axum::Router;
use casting_auth::testutil::{fresh_payload, key_set, TestKey, TEST_AUDIENCE, TEST_ISSUER};
use casting_auth::{AuthorizationGate, StaticKeyResolver, TokenVerifier, VerifierOptions};
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

const TEST_KID: &str = "casting-test-key";

/// Test fixture for exercising routes in-process.
///
/// The gate trusts a single fixture key so tokens can be minted with [`TestFixture::token`],
/// and the store records how often it was called so tests can assert that denied requests
/// never reached it.
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///     let token = fixture.token(&["get:actors"]);
///
///     let response = fixture.get("/actors", Some(&token)).await;
///
///     response.assert_ok();
///     assert_eq!(response.json["Actors"], json!([]));
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Key the gate trusts
    pub key: TestKey,
    /// Store behind the routes
    pub store: Arc<RecordingStore>,
}

impl TestFixture {
    pub async fn new() -> Self {
        // Initialize test logger
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();

        let settings = Settings::for_test();
        let key = TestKey::primary(TEST_KID);
        let gate = AuthorizationGate::new(TokenVerifier::new(
            Arc::new(StaticKeyResolver::new(key_set(&[&key]))),
            VerifierOptions {
                issuer: Some(TEST_ISSUER.to_string()),
                audience: Some(TEST_AUDIENCE.to_string()),
                leeway: 0,
            },
        ));
        let store = Arc::new(RecordingStore::default());
        let state = AppState::with_parts(settings, Arc::new(gate), store.clone());

        Self {
            app: create_app(state),
            key,
            store,
        }
    }

    /// A valid token for the fixture key granting `permissions`
    pub fn token(&self, permissions: &[&str]) -> String {
        self.key.sign(&fresh_payload(permissions))
    }

    pub fn request_builder(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        token: Option<&str>,
    ) -> http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri.as_ref());
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        builder.header("Content-Type", "application/json")
    }

    pub async fn get(&self, uri: impl AsRef<str>, token: Option<&str>) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri, token)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    /// GET with a verbatim Authorization header
    pub async fn get_with_header(&self, uri: impl AsRef<str>, authorization: &str) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri, None)
            .header("Authorization", authorization)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn post<T: Serialize>(
        &self,
        uri: impl AsRef<str>,
        body: &T,
        token: Option<&str>,
    ) -> TestResponse {
        self.send_json(Method::POST, uri, body, token).await
    }

    /// POST with a body that is sent as-is
    pub async fn post_raw(
        &self,
        uri: impl AsRef<str>,
        body: &'static str,
        token: Option<&str>,
    ) -> TestResponse {
        let request = self
            .request_builder(Method::POST, uri, token)
            .body(Body::from(body))
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn patch<T: Serialize>(
        &self,
        uri: impl AsRef<str>,
        body: &T,
        token: Option<&str>,
    ) -> TestResponse {
        self.send_json(Method::PATCH, uri, body, token).await
    }

    pub async fn delete(&self, uri: impl AsRef<str>, token: Option<&str>) -> TestResponse {
        let request = self
            .request_builder(Method::DELETE, uri, token)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn options(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(uri.as_ref())
            .header("Origin", "https://casting.test")
            .header("Access-Control-Request-Method", "POST")
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    async fn send_json<T: Serialize>(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        body: &T,
        token: Option<&str>,
    ) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = self
            .request_builder(method, uri, token)
            .body(Body::from(json_body))
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        // Try to parse as JSON, defaulting to empty object if parsing fails or empty body
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };

        TestResponse {
            status,
            headers,
            json,
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: Value,
}

impl TestResponse {
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }
}

/// [`MemoryStore`] that counts every call made to it
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
}

impl RecordingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) -> &MemoryStore {
        self.calls.fetch_add(1, Ordering::SeqCst);
        &self.inner
    }
}

#[async_trait]
impl ResourceStore for RecordingStore {
    async fn list_actors(&self) -> Result<Vec<Actor>, StoreError> {
        self.record().list_actors().await
    }

    async fn create_actor(&self, actor: NewActor) -> Result<Actor, StoreError> {
        self.record().create_actor(actor).await
    }

    async fn update_actor(&self, id: u64, patch: ActorPatch) -> Result<Actor, StoreError> {
        self.record().update_actor(id, patch).await
    }

    async fn delete_actor(&self, id: u64) -> Result<(), StoreError> {
        self.record().delete_actor(id).await
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError> {
        self.record().list_movies().await
    }

    async fn create_movie(&self, movie: NewMovie) -> Result<Movie, StoreError> {
        self.record().create_movie(movie).await
    }

    async fn update_movie(&self, id: u64, patch: MoviePatch) -> Result<Movie, StoreError> {
        self.record().update_movie(id, patch).await
    }

    async fn delete_movie(&self, id: u64) -> Result<(), StoreError> {
        self.record().delete_movie(id).await
    }
}
