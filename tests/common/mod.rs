//! Shared fixtures for the HTTP tests.

#![allow(dead_code)]

use axum::{routing::get, Router};
use axum_test::TestServer;
use quill::{
    api::routes::{create_router, restrict},
    AppState, AuthUser, InMemoryUserStore, QuillConfig, Role,
};
use std::sync::Arc;

pub const TEST_SECRET: &[u8] = b"test_jwt_secret_key_for_testing_only";

/// A running test server plus handles into its state.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub store: Arc<InMemoryUserStore>,
}

async fn author_ping(AuthUser(claims): AuthUser) -> String {
    format!("hello {}", claims.username)
}

/// Builds the API router plus an author-only route used to exercise role checks.
pub fn create_test_app() -> (Router, AppState, Arc<InMemoryUserStore>) {
    let config = QuillConfig::default();
    let tokens = config
        .auth
        .token_service(TEST_SECRET)
        .expect("valid token config");
    let store = Arc::new(InMemoryUserStore::new());
    let state = AppState::new(config, store.clone(), tokens).expect("state should build");

    let author_routes = restrict(
        Router::new().route("/author/ping", get(author_ping)),
        state.authenticator.clone(),
        Role::Author,
    );

    let app = Router::new()
        .route("/health", get(quill::api::handlers::health::health))
        .nest(
            "/api/v1",
            create_router(state.authenticator.clone()).merge(author_routes),
        )
        .with_state(state.clone());

    (app, state, store)
}

pub fn create_test_server() -> TestApp {
    let (app, state, store) = create_test_app();
    let server = TestServer::new(app).expect("Failed to create test server");
    TestApp {
        server,
        state,
        store,
    }
}

/// Seeds a user with the given role directly in the store and returns a token for it.
pub fn seed_user(app: &TestApp, username: &str, email: &str, password: &str, role: Role) -> String {
    let hash = app.state.hasher.hash(password).expect("should hash");
    let user = app
        .store
        .insert_with_role(username, email, &hash, role)
        .expect("should insert");
    app.state
        .tokens
        .issue(user.id, &user.email, &user.username, user.role)
        .expect("should issue")
}
