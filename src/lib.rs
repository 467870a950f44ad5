//! # Quill
//!
//! Blog backend built in Rust whose core is a bearer-token authentication and
//! role-based authorization layer.
//!
//! ## Overview
//!
//! Quill can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `quill-server` binary
//! 2. **As a library** - Reuse the auth core in your own axum application
//!
//! ### Guarding Your Own Routes
//!
//! ```rust,ignore
//! use quill::{api::routes::restrict, auth::{Authenticator, Role, TokenService}};
//! use std::sync::Arc;
//!
//! let tokens = Arc::new(TokenService::new(secret.as_bytes(), "my-api", 86_400)?);
//! let authenticator = Arc::new(Authenticator::new(tokens, "jwt"));
//!
//! let posts = restrict(
//!     Router::new().route("/posts", post(create_post)),
//!     authenticator,
//!     Role::Author,
//! );
//! ```
//!
//! ## Modules
//!
//! - [`auth`] - Credential hashing, tokens, middleware and extractors
//! - [`api`] - REST API handlers and routes
//! - [`db`] - User persistence interface and in-memory store
//! - [`types`] - Request/response types and error handling
//! - [`utils`] - Configuration

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
#[allow(missing_docs)]
pub mod api;
/// Authentication and role-based authorization.
#[allow(missing_docs)]
pub mod auth;
/// Command-line interface for the server binary.
pub mod cli;
/// User persistence.
pub mod db;
/// Core types (requests, responses, errors).
#[allow(missing_docs)]
pub mod types;
/// Configuration utilities.
#[allow(missing_docs)]
pub mod utils;

// Re-export commonly used types
pub use auth::{AuthUser, Authenticator, Claims, CredentialHasher, Role, TokenService};
pub use db::{InMemoryUserStore, UserStore};
pub use types::{AppError, Result};
pub use utils::config::QuillConfig;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<QuillConfig>,
    /// User persistence
    pub users: Arc<dyn UserStore>,
    /// Password hashing
    pub hasher: Arc<CredentialHasher>,
    /// Token issuance and verification
    pub tokens: Arc<TokenService>,
    /// Token lookup and verification for the authentication middleware
    pub authenticator: Arc<Authenticator>,
}

impl AppState {
    /// Wires the auth core around a user store.
    pub fn new(
        config: QuillConfig,
        users: Arc<dyn UserStore>,
        tokens: TokenService,
    ) -> Result<Self> {
        let tokens = Arc::new(tokens);
        let authenticator = Arc::new(Authenticator::new(
            tokens.clone(),
            config.auth.cookie_name.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            users,
            hasher: Arc::new(CredentialHasher::new()?),
            tokens,
            authenticator,
        })
    }
}
