//! # QuizMaker
//!
//! A quiz authoring and hosting server backed by Supabase.
//!
//! Users register and log in, create quizzes that get a shareable slug,
//! append questions with answers, and open play, host and leaderboard pages.
//! Admins can rename slugs. Persistence goes through the Supabase REST API.
//!
//! ## Architecture
//!
//! - [`slug`] - URL-safe quiz identifiers
//! - [`auth`] - Password hashing and signed session tokens
//! - [`store`] - Storage trait and the Supabase REST client
//! - [`quiz`] - Account, quiz and question operations
//! - [`server`] - Axum routes, handlers, token gate and pages
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use quizmaker::{create_router, ClientConfig, RouterConfig, SupabaseStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SupabaseStore::new(
//!         "https://abc.supabase.co",
//!         "anon-key",
//!         Duration::from_secs(10),
//!     )?;
//!
//!     let client = ClientConfig {
//!         supabase_url: "https://abc.supabase.co".to_string(),
//!         supabase_key: "anon-key".to_string(),
//!         quiz_bucket: "quiz-assets".to_string(),
//!     };
//!     let router = create_router(store, RouterConfig::new("secret", client));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:1030").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod quiz;
pub mod server;
pub mod slug;
pub mod store;

// Re-export commonly used types
pub use auth::{hash_password, verify_password, Claims, SessionTokenAuth, TokenError, SESSION_TTL};
pub use config::{CheckConfig, Cli, Command, ServeConfig, TokenConfig, TokenOutputFormat};
pub use error::{QuizError, StoreError};
pub use quiz::{AnswerDraft, LoginOutcome, QuestionDraft, QuizService};
pub use server::{
    create_router, AppState, AuthError, ClientConfig, ErrorResponse, Identity, RouterConfig,
};
pub use slug::{generate_slug, slugify};
pub use store::{
    Account, Answer, NewAccount, NewAnswer, NewQuestion, NewQuiz, Question, QuestionWithAnswers,
    Quiz, QuizSlug, QuizStore, QuizWithQuestions, RecordId, Settings, SupabaseStore,
};
