//! Row types exchanged with the store.
//!
//! Field names follow the Rust side; `serde` renames map them onto the table
//! columns (`password`, `admin`, `timeout`, ...). The same types are returned
//! by the JSON API, so API clients see the column names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a quiz, question or answer row.
pub type RecordId = i64;

/// Free-form quiz settings (e.g. `{"image": "https://..."}`).
pub type Settings = serde_json::Map<String, serde_json::Value>;

/// Time limit applied to a question when none is given.
pub const DEFAULT_QUESTION_TIMEOUT_SECS: u32 = 30;

// =============================================================================
// Accounts
// =============================================================================

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,

    /// Argon2 PHC string
    #[serde(rename = "password")]
    pub password_hash: String,

    #[serde(rename = "admin", default)]
    pub is_admin: bool,
}

/// Insert payload for `accounts`.
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub username: String,

    #[serde(rename = "password")]
    pub password_hash: String,

    #[serde(rename = "admin")]
    pub is_admin: bool,
}

// =============================================================================
// Quizzes
// =============================================================================

/// A quiz row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: RecordId,
    pub name: String,
    pub slug: String,

    #[serde(default)]
    pub settings: Option<Settings>,

    pub created_at: DateTime<Utc>,
}

/// Insert payload for `quizzes`.
#[derive(Debug, Clone, Serialize)]
pub struct NewQuiz {
    pub name: String,
    pub slug: String,
    pub settings: Settings,
}

/// The `{id, slug}` projection used by slug management.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSlug {
    pub id: RecordId,
    pub slug: String,
}

/// A quiz together with its ordered questions.
#[derive(Debug, Clone, Serialize)]
pub struct QuizWithQuestions {
    #[serde(flatten)]
    pub quiz: Quiz,

    pub questions: Vec<QuestionWithAnswers>,
}

// =============================================================================
// Questions and Answers
// =============================================================================

/// A question row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: RecordId,
    pub quiz_id: RecordId,

    /// Zero-based position within the quiz
    pub ord: i64,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(rename = "timeout", default = "default_timeout")]
    pub timeout_seconds: u32,

    #[serde(default)]
    pub double_points: bool,
}

fn default_timeout() -> u32 {
    DEFAULT_QUESTION_TIMEOUT_SECS
}

/// Insert payload for `questions`.
#[derive(Debug, Clone, Serialize)]
pub struct NewQuestion {
    pub quiz_id: RecordId,
    pub ord: i64,
    pub text: String,
    pub image_url: Option<String>,

    #[serde(rename = "timeout")]
    pub timeout_seconds: u32,

    pub double_points: bool,
}

/// An answer row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: RecordId,
    pub question_id: RecordId,

    /// Zero-based position within the question
    pub ord: i64,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(default)]
    pub is_correct: bool,
}

/// Insert payload for `answers`.
#[derive(Debug, Clone, Serialize)]
pub struct NewAnswer {
    pub question_id: RecordId,
    pub ord: i64,
    pub text: String,
    pub image_url: Option<String>,
    pub is_correct: bool,
}

/// A question with its ordered answers (the nested `answers(*)` select).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionWithAnswers {
    #[serde(flatten)]
    pub question: Question,

    #[serde(default)]
    pub answers: Vec<Answer>,
}
