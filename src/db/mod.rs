//! User persistence.
//!
//! This module provides:
//! - **[`UserStore`]**: the lookup/create interface the auth handlers consume
//! - **[`InMemoryUserStore`]**: a process-local implementation used by the
//!   server binary and by tests

#![allow(missing_docs)]

pub mod memory;
pub mod traits;

pub use memory::InMemoryUserStore;
pub use traits::{User, UserStore};
