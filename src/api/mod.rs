//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for Quill, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route groups and router configuration
//!
//! # API Endpoints
//!
//! ## Authentication (`/api/v1/auth`)
//! - `POST /api/v1/auth/register` - Register new user, returns a token
//! - `POST /api/v1/auth/login` - Login and receive a token
//!
//! ## Authenticated
//! - `GET /api/v1/profile` - Caller's own profile
//!
//! ## Admin
//! - `GET /api/v1/admin/users/{id}` - Look up any user
//!
//! ## Health
//! - `GET /health` - Health check endpoint
//!
//! # Authentication
//!
//! Protected endpoints accept the token in the `Authorization` header or in
//! the `jwt` cookie:
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! # OpenAPI Documentation
//!
//! When the `swagger-ui` feature is enabled, interactive API documentation
//! is available at `/swagger-ui/`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

/// OpenAPI description of the HTTP surface.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::profile,
        handlers::admin::get_user,
        handlers::health::health,
    ),
    components(schemas(
        crate::types::RegisterRequest,
        crate::types::LoginRequest,
        crate::types::AuthResponse,
        crate::types::UserResponse,
        crate::types::HealthResponse,
        crate::auth::claims::Role,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration, login and profile"),
        (name = "admin", description = "Admin-only endpoints"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
