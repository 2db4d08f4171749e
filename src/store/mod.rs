//! Data access layer.
//!
//! All persistence is delegated to an external Supabase project. This module
//! defines the [`QuizStore`] trait that the quiz service talks to, and the
//! PostgREST-backed implementation used in production:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Quiz Service               │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            QuizStore Trait              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │             SupabaseStore               │
//! │   (PostgREST over HTTPS via reqwest)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! There are no transactions. Operations that touch several tables (a
//! question and then its answers) are separate requests.

mod models;
mod supabase;

use async_trait::async_trait;

use crate::error::StoreError;

pub use models::{
    Account, Answer, NewAccount, NewAnswer, NewQuestion, NewQuiz, Question, QuestionWithAnswers,
    Quiz, QuizSlug, QuizWithQuestions, RecordId, Settings, DEFAULT_QUESTION_TIMEOUT_SECS,
};
pub use supabase::{SupabaseStore, DEFAULT_STORE_TIMEOUT_SECS};

/// Table-level operations the application needs from its store.
///
/// Implementations must be cheap to share across request handlers.
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Cheap round trip used to verify connectivity and credentials.
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Insert a new account. Duplicate usernames surface as a store error.
    async fn insert_account(&self, account: NewAccount) -> Result<(), StoreError>;

    /// Look up an account by exact username.
    async fn find_account(&self, username: &str) -> Result<Option<Account>, StoreError>;

    /// Insert a quiz and return the stored row.
    async fn insert_quiz(&self, quiz: NewQuiz) -> Result<Quiz, StoreError>;

    /// All quizzes, newest first.
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StoreError>;

    /// Look up a quiz by slug.
    async fn find_quiz_by_slug(&self, slug: &str) -> Result<Option<Quiz>, StoreError>;

    /// Questions of a quiz ordered by `ord`, each with answers ordered by `ord`.
    async fn list_questions(&self, quiz_id: RecordId)
        -> Result<Vec<QuestionWithAnswers>, StoreError>;

    /// Number of questions currently attached to a quiz.
    async fn count_questions(&self, quiz_id: RecordId) -> Result<u64, StoreError>;

    /// Insert a question and return the stored row.
    async fn insert_question(&self, question: NewQuestion) -> Result<Question, StoreError>;

    /// Insert a batch of answers.
    async fn insert_answers(&self, answers: Vec<NewAnswer>) -> Result<(), StoreError>;

    /// `{id, slug}` of a quiz by id.
    async fn find_quiz_slug(&self, id: RecordId) -> Result<Option<QuizSlug>, StoreError>;

    /// Replace the slug of a quiz. Returns `None` when no quiz has that id.
    async fn update_quiz_slug(
        &self,
        id: RecordId,
        slug: &str,
    ) -> Result<Option<QuizSlug>, StoreError>;
}
