//! Router harness over in-memory stores

use crate::cache::{InMemoryCache, RecipeCache};
use crate::config::{AppConfig, AuthStrategyKind, PasswordAlgorithm};
use crate::repositories::InMemoryRecipeStore;
use crate::routes::create_router;
use crate::state::{AppState, Backends};
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "router-test-secret";

/// A credential as a client would replay it
#[derive(Debug, Clone)]
pub enum Credential {
    Bearer(String),
    Cookie(String),
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The credential this response handed out, if any
    pub fn credential(&self) -> Option<Credential> {
        if let Some(token) = self.body.get("token").and_then(Value::as_str) {
            return Some(Credential::Bearer(token.to_string()));
        }
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|pair| Credential::Cookie(pair.to_string()))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub fn test_config(strategy: AuthStrategyKind) -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.strategy = strategy;
    config.auth.jwt_secret = TEST_SECRET.to_string();
    config.password.algorithm = PasswordAlgorithm::Bcrypt;
    config.password.bcrypt_cost = 4;
    config
}

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub recipes: Arc<InMemoryRecipeStore>,
    pub cache: Arc<InMemoryCache>,
}

impl TestApp {
    pub fn new(strategy: AuthStrategyKind) -> Self {
        let recipes = Arc::new(InMemoryRecipeStore::new());
        let cache = Arc::new(InMemoryCache::new());
        let backends = Backends {
            recipes: recipes.clone(),
            cache: RecipeCache::new(cache.clone()),
            ..Backends::in_memory()
        };
        let state = AppState::new(test_config(strategy), backends).unwrap();

        Self {
            app: create_router(state.clone()),
            state,
            recipes,
            cache,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        credential: Option<&Credential>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        match credential {
            Some(Credential::Bearer(token)) => {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            Some(Credential::Cookie(pair)) => {
                builder = builder.header(header::COOKIE, pair.as_str());
            }
            None => {}
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn signup(&self, username: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/api/v1/auth/signup",
            Some(json!({ "username": username, "password": password })),
            None,
        )
        .await
    }

    pub async fn signin(&self, username: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/api/v1/auth/signin",
            Some(json!({ "username": username, "password": password })),
            None,
        )
        .await
    }

    /// Sign up and return the issued credential
    pub async fn register(&self, username: &str, password: &str) -> Credential {
        let response = self.signup(username, password).await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.credential().unwrap()
    }

    pub async fn create_recipe(&self, name: &str, tags: &[&str], credential: &Credential) -> TestResponse {
        self.request(
            Method::POST,
            "/api/v1/recipes",
            Some(json!({
                "name": name,
                "tags": tags,
                "ingredients": ["water"],
                "instructions": ["boil"],
            })),
            Some(credential),
        )
        .await
    }

    pub async fn list_recipes(&self) -> TestResponse {
        self.request(Method::GET, "/api/v1/recipes", None, None).await
    }
}
