//! CLI module for Quill
//!
//! Provides command-line interface parsing for the quill-server binary.
//! Uses clap for argument parsing.

use crate::auth::claims::Role;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quill - blog backend with token authentication and role-based access
#[derive(Parser, Debug)]
#[command(
    name = "quill-server",
    version,
    about = "Quill - blog backend with token authentication and role-based access",
    after_help = "EXAMPLES:\n    \
                  quill-server                           # Start the server (reads quill.toml)\n    \
                  quill-server --config prod.toml        # Use a custom config file\n    \
                  quill-server token 1 a@x.com alice --role admin\n    \
                  echo -n 'pw' | quill-server hash-password"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "quill.toml", global = true)]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand to execute (defaults to serving)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve,

    /// Issue a token with the configured secret, for local testing
    Token {
        /// Subject user id
        user_id: i64,

        /// Email claim
        email: String,

        /// Username claim
        username: String,

        /// Role claim
        #[arg(long, default_value = "user", value_parser = parse_role)]
        role: Role,
    },

    /// Hash a password read from stdin
    HashPassword,
}

fn parse_role(raw: &str) -> Result<Role, String> {
    raw.parse().map_err(|e: crate::auth::claims::UnknownRole| e.to_string())
}
