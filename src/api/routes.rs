use crate::api::handlers;
use crate::auth::claims::Role;
use crate::auth::middleware::{authenticate, require_role, Authenticator};
use crate::utils::config::QuillConfig;
use crate::AppState;
use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// Requires a valid token on every route in `router`.
pub fn protect<S>(router: Router<S>, authenticator: Arc<Authenticator>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(authenticator, authenticate))
}

/// Requires a valid token carrying `required` (or admin) on every route in `router`.
pub fn restrict<S>(
    router: Router<S>,
    authenticator: Arc<Authenticator>,
    required: Role,
) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    // Layers run outermost-last: authentication wraps the role check.
    let router = router.route_layer(middleware::from_fn_with_state(required, require_role));
    protect(router, authenticator)
}

/// Routes served under `/api/v1`.
pub fn create_router(authenticator: Arc<Authenticator>) -> Router<AppState> {
    let public_routes = Router::new()
        // Public routes (no auth required)
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login));

    let protected_routes = protect(
        Router::new().route("/profile", get(handlers::auth::profile)),
        authenticator.clone(),
    );

    let admin_routes = restrict(
        Router::new().route("/admin/users/{id}", get(handlers::admin::get_user)),
        authenticator,
        Role::Admin,
    );

    public_routes.merge(protected_routes).merge(admin_routes)
}

/// CORS policy: the configured origins, else any origin in `local` and none elsewhere.
fn cors_layer(config: &QuillConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    } else if config.is_local() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    }
}

/// Full application: API routes, health endpoints, tracing and CORS.
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let app = Router::new()
        .route("/", get(handlers::health::hello))
        .route("/health", get(handlers::health::health))
        .nest("/api/v1", create_router(state.authenticator.clone()))
        .with_state(state);

    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", crate::api::ApiDoc::openapi()),
        )
    };

    app.layer(cors).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::InMemoryUserStore;
    use axum::{
        body::Body,
        http::{header, Method, Request},
    };
    use tower::ServiceExt;

    async fn preflight_allow_origin(config: QuillConfig) -> Option<HeaderValue> {
        let tokens = config
            .auth
            .token_service(b"routes-test-secret")
            .expect("valid token config");
        let state = AppState::new(config, Arc::new(InMemoryUserStore::new()), tokens)
            .expect("state should build");

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/auth/login")
            .header(header::ORIGIN, "https://evil.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let response = create_app(state).oneshot(request).await.unwrap();
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .cloned()
    }

    #[tokio::test]
    async fn test_local_without_origins_is_permissive() {
        let config = QuillConfig::default();
        assert!(config.is_local());

        assert_eq!(
            preflight_allow_origin(config).await,
            Some(HeaderValue::from_static("*"))
        );
    }

    #[tokio::test]
    async fn test_production_without_origins_allows_no_cross_origin() {
        let mut config = QuillConfig::default();
        config.environment = "production".to_string();

        assert_eq!(preflight_allow_origin(config).await, None);
    }

    #[tokio::test]
    async fn test_configured_origins_are_honoured_everywhere() {
        let mut config = QuillConfig::default();
        config.environment = "production".to_string();
        config.server.cors_origins = vec!["https://evil.example".to_string()];

        assert_eq!(
            preflight_allow_origin(config).await,
            Some(HeaderValue::from_static("https://evil.example"))
        );
    }
}
