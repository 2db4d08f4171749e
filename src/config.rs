//! Configuration management for QuizMaker.
//!
//! This module provides the command-line interface:
//! - `serve` (default) runs the HTTP server
//! - `token` mints a session token for scripting and admin work
//! - `check` verifies store connectivity
//!
//! Every server option can also be set through its environment variable.
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL` - Store project URL (required)
//! - `SUPABASE_KEY` - Store API key (required)
//! - `JWT_SECRET` - Session token signing secret (required)
//! - `ALLOWED_ORIGINS` - Comma-separated CORS allow-list (default: any)
//! - `HOST` - Server bind address (default: 0.0.0.0)
//! - `PORT` - Server port (default: 1030)
//! - `QUIZ_BUCKET` - Storage bucket for quiz images (default: quiz-assets)
//! - `STORE_TIMEOUT_SECS` - Store request timeout (default: 10)

use clap::{Args, Parser, Subcommand, ValueEnum};
use url::Url;

use crate::store::DEFAULT_STORE_TIMEOUT_SECS;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 1030;

/// Default storage bucket for quiz images.
pub const DEFAULT_QUIZ_BUCKET: &str = "quiz-assets";

// =============================================================================
// CLI Arguments
// =============================================================================

/// QuizMaker - create, manage and host quizzes.
#[derive(Parser, Debug, Clone)]
#[command(name = "quizmaker")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Server options when no subcommand is given.
    #[command(flatten)]
    pub serve: ServeConfig,
}

impl Cli {
    /// Resolve the command to run; no subcommand means `serve`.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve(ServeConfig),

    /// Mint a session token
    Token(TokenConfig),

    /// Check store connectivity
    Check(CheckConfig),
}

// =============================================================================
// Serve
// =============================================================================

/// Options for the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    // =========================================================================
    // Store Configuration
    // =========================================================================
    /// Supabase project URL (e.g. https://abc.supabase.co).
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Supabase API key. Also handed to the browser through /config.js.
    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    pub supabase_key: Option<String>,

    /// Storage bucket for quiz images.
    #[arg(long, default_value = DEFAULT_QUIZ_BUCKET, env = "QUIZ_BUCKET")]
    pub quiz_bucket: String,

    /// Timeout for each store request, in seconds.
    #[arg(long, default_value_t = DEFAULT_STORE_TIMEOUT_SECS, env = "STORE_TIMEOUT_SECS")]
    pub store_timeout_secs: u64,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Secret key for signing session tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        validate_store(self.supabase_url.as_deref(), self.supabase_key.as_deref())?;

        if self.jwt_secret.as_deref().unwrap_or("").is_empty() {
            return Err(
                "No token secret provided. Set --jwt-secret or JWT_SECRET".to_string(),
            );
        }

        if self.quiz_bucket.is_empty() {
            return Err("quiz_bucket must not be empty".to_string());
        }

        if self.store_timeout_secs == 0 {
            return Err("store_timeout_secs must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// CORS allow-list with blank entries removed.
    pub fn cors_origins(&self) -> Option<Vec<String>> {
        self.allowed_origins.as_ref().map(|origins| {
            origins
                .iter()
                .map(|o| o.trim())
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

// =============================================================================
// Token
// =============================================================================

/// Output format for the `token` command.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenOutputFormat {
    /// Bare token
    #[default]
    Token,

    /// JSON with the token and its claims
    Json,
}

/// Options for the `token` command.
#[derive(Args, Debug, Clone)]
pub struct TokenConfig {
    /// Account name to put in the token.
    #[arg(long)]
    pub username: String,

    /// Grant admin rights.
    #[arg(long, default_value_t = false)]
    pub admin: bool,

    /// Secret key for signing session tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    #[arg(long, value_enum, default_value_t = TokenOutputFormat::Token)]
    pub format: TokenOutputFormat,
}

impl TokenConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.username.is_empty() {
            return Err("username must not be empty".to_string());
        }
        if self.jwt_secret.is_empty() {
            return Err("No token secret provided. Set --jwt-secret or JWT_SECRET".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Check
// =============================================================================

/// Options for the `check` command.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    pub supabase_key: Option<String>,

    #[arg(long, default_value_t = DEFAULT_STORE_TIMEOUT_SECS, env = "STORE_TIMEOUT_SECS")]
    pub store_timeout_secs: u64,

    /// Print every quiz slug.
    #[arg(long, default_value_t = false)]
    pub list_quizzes: bool,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl CheckConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_store(self.supabase_url.as_deref(), self.supabase_key.as_deref())
    }
}

/// Store URL must be an absolute http(s) URL and the key must be present.
fn validate_store(url: Option<&str>, key: Option<&str>) -> Result<(), String> {
    let url = match url {
        Some(u) if !u.is_empty() => u,
        _ => return Err("Store URL is required. Set --supabase-url or SUPABASE_URL".to_string()),
    };

    let parsed = Url::parse(url).map_err(|e| format!("Invalid store URL '{}': {}", url, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(format!("Store URL must use http or https, got '{}'", parsed.scheme()));
    }

    if key.unwrap_or("").is_empty() {
        return Err("Store key is required. Set --supabase-key or SUPABASE_KEY".to_string());
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
