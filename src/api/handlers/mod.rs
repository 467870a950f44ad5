//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Admin-only user management handlers.
pub mod admin;
/// Authentication handlers (register, login, profile).
pub mod auth;
/// Health and root handlers.
pub mod health;
