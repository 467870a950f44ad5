//! Authentication and Authorization
//!
//! This module guards the Quill API: it hashes credentials, issues and
//! verifies bearer tokens, and gates requests by role before they reach
//! handlers.
//!
//! # Module Structure
//!
//! - [`auth::password`](crate::auth::password) - Argon2id credential hashing
//! - [`auth::claims`](crate::auth::claims) - Token claims and the closed role set
//! - [`auth::jwt`](crate::auth::jwt) - Token issuance and verification
//! - [`auth::middleware`](crate::auth::middleware) - Axum middleware and extractors
//!
//! # Request Pipeline
//!
//! A protected request passes through [`authenticate`](middleware::authenticate)
//! (is the token valid?), then optionally [`require_role`](middleware::require_role)
//! (does the subject hold the role?), then the handler, which reads the
//! caller through [`AuthUser`](middleware::AuthUser):
//!
//! ```ignore
//! use axum::{middleware, routing::get, Router};
//! use quill::auth::{claims::Role, middleware::{authenticate, require_role}};
//!
//! let authors = Router::new()
//!     .route("/posts", get(list_posts))
//!     .route_layer(middleware::from_fn_with_state(Role::Author, require_role))
//!     .route_layer(middleware::from_fn_with_state(authenticator, authenticate));
//! ```
//!
//! Tokens are looked up in `Authorization: Bearer <token>` first, then in the
//! `jwt` cookie. `admin` passes every role check.
//!
//! # Configuration
//!
//! Configure via `quill.toml`:
//! ```toml
//! [auth]
//! jwt_secret_env = "JWT_SECRET"  # Env var holding the signing secret
//! token_ttl_secs = 86400         # Token validity duration
//! issuer = "quill-api"
//! cookie_name = "jwt"
//! ```

/// Token claims and roles.
pub mod claims;
/// Token issuance and verification.
pub mod jwt;
/// Authentication and authorization middleware and extractors.
pub mod middleware;
/// Password hashing.
pub mod password;

pub use claims::{Claims, Role};
pub use jwt::{TokenError, TokenService};
pub use middleware::{current_identity, AuthUser, Authenticator};
pub use password::CredentialHasher;
