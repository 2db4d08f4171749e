//! Quiz service: account, quiz and question operations.
//!
//! The service sits between the HTTP handlers and the store. It validates
//! input, hashes passwords, issues session tokens, allocates slugs and
//! assigns ordinals, then forwards to the [`QuizStore`].

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::auth::{hash_password, verify_password, SessionTokenAuth};
use crate::error::QuizError;
use crate::slug::generate_slug;
use crate::store::{
    NewAccount, NewAnswer, NewQuestion, NewQuiz, Question, Quiz, QuizSlug, QuizStore,
    QuizWithQuestions, RecordId, Settings, DEFAULT_QUESTION_TIMEOUT_SECS,
};

/// How many slug candidates are tried before giving up.
pub const MAX_SLUG_ATTEMPTS: usize = 5;

// =============================================================================
// Inputs and Outputs
// =============================================================================

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Signed session token
    pub token: String,

    /// Whether the account has admin rights
    pub admin: bool,
}

/// A question to append to a quiz. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionDraft {
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,

    /// Time limit in seconds; missing or zero means the default
    #[serde(default)]
    pub timeout: Option<u32>,

    #[serde(default)]
    pub double_points: Option<bool>,

    #[serde(default)]
    pub answers: Option<Vec<AnswerDraft>>,
}

/// An answer submitted with a question.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnswerDraft {
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(default)]
    pub is_correct: Option<bool>,
}

// =============================================================================
// Quiz Service
// =============================================================================

/// Application operations over a [`QuizStore`].
pub struct QuizService<S: QuizStore> {
    store: S,
    tokens: SessionTokenAuth,
}

impl<S: QuizStore> QuizService<S> {
    /// Create a service over `store`, signing session tokens with `tokens`.
    pub fn new(store: S, tokens: SessionTokenAuth) -> Self {
        Self { store, tokens }
    }

    /// Register a new (non-admin) account.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), QuizError> {
        if username.is_empty() || password.is_empty() {
            return Err(QuizError::validation("username & password required"));
        }

        let password_hash = hash_password(password).await?;
        self.store
            .insert_account(NewAccount {
                username: username.to_string(),
                password_hash,
                is_admin: false,
            })
            .await?;

        info!(username = %username, "account registered");
        Ok(())
    }

    /// Check credentials and issue a session token.
    ///
    /// Unknown usernames and wrong passwords fail identically with
    /// [`QuizError::InvalidCredentials`].
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, QuizError> {
        if username.is_empty() || password.is_empty() {
            return Err(QuizError::validation("username & password required"));
        }

        let Some(account) = self.store.find_account(username).await? else {
            debug!(username = %username, "login for unknown account");
            return Err(QuizError::InvalidCredentials);
        };

        if !verify_password(password, &account.password_hash).await {
            debug!(username = %username, "login with wrong password");
            return Err(QuizError::InvalidCredentials);
        }

        let token = self.tokens.issue(&account.username, account.is_admin);
        info!(username = %account.username, admin = account.is_admin, "login succeeded");

        Ok(LoginOutcome {
            token,
            admin: account.is_admin,
        })
    }

    /// All quizzes, newest first.
    pub async fn list_quizzes(&self) -> Result<Vec<Quiz>, QuizError> {
        Ok(self.store.list_quizzes().await?)
    }

    /// Create a quiz with a freshly generated slug.
    pub async fn create_quiz(
        &self,
        name: &str,
        settings: Option<Settings>,
    ) -> Result<Quiz, QuizError> {
        if name.is_empty() {
            return Err(QuizError::validation("name required"));
        }

        let slug = self.allocate_slug(name).await?;
        let quiz = self
            .store
            .insert_quiz(NewQuiz {
                name: name.to_string(),
                slug,
                settings: settings.unwrap_or_default(),
            })
            .await?;

        info!(quiz_id = quiz.id, slug = %quiz.slug, "quiz created");
        Ok(quiz)
    }

    /// Pick a slug for `name` that no existing quiz uses.
    async fn allocate_slug(&self, name: &str) -> Result<String, QuizError> {
        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let candidate = generate_slug(name);
            if self.store.find_quiz_by_slug(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            warn!(slug = %candidate, attempt, "slug already taken, retrying");
        }

        Err(QuizError::SlugCollision {
            attempts: MAX_SLUG_ATTEMPTS,
        })
    }

    /// Fetch a quiz with its ordered questions and answers.
    pub async fn get_quiz(&self, slug: &str) -> Result<QuizWithQuestions, QuizError> {
        let quiz = self
            .store
            .find_quiz_by_slug(slug)
            .await?
            .ok_or(QuizError::QuizNotFound)?;

        let questions = self.store.list_questions(quiz.id).await?;

        Ok(QuizWithQuestions { quiz, questions })
    }

    /// Append a question (and its answers) to the quiz identified by `slug`.
    ///
    /// The ordinal is the number of questions the quiz already has. Counting
    /// and inserting are separate store calls, so concurrent additions to the
    /// same quiz may receive the same ordinal.
    ///
    /// Answers are inserted after the question. If that insert fails the
    /// question is kept and the failure is only logged.
    pub async fn add_question(
        &self,
        slug: &str,
        draft: QuestionDraft,
    ) -> Result<Question, QuizError> {
        let quiz = self
            .store
            .find_quiz_by_slug(slug)
            .await?
            .ok_or(QuizError::QuizNotFound)?;

        let ord = self.store.count_questions(quiz.id).await? as i64;

        let timeout_seconds = match draft.timeout {
            Some(t) if t > 0 => t,
            _ => DEFAULT_QUESTION_TIMEOUT_SECS,
        };

        let question = self
            .store
            .insert_question(NewQuestion {
                quiz_id: quiz.id,
                ord,
                text: draft.text.unwrap_or_default(),
                image_url: non_empty(draft.image_url),
                timeout_seconds,
                double_points: draft.double_points.unwrap_or(false),
            })
            .await?;

        if let Some(answers) = draft.answers {
            let rows = answer_rows(question.id, answers);
            let count = rows.len();
            if let Err(e) = self.store.insert_answers(rows).await {
                warn!(
                    question_id = question.id,
                    error = %e,
                    "failed to insert answers, question left without answers"
                );
            } else {
                debug!(question_id = question.id, count, "answers inserted");
            }
        }

        info!(quiz_id = quiz.id, question_id = question.id, ord, "question added");
        Ok(question)
    }

    /// Look up the slug of a quiz by id.
    pub async fn get_slug(&self, id: RecordId) -> Result<QuizSlug, QuizError> {
        self.store
            .find_quiz_slug(id)
            .await?
            .ok_or(QuizError::QuizNotFound)
    }

    /// Replace the slug of a quiz.
    pub async fn set_slug(&self, id: RecordId, slug: Option<&str>) -> Result<QuizSlug, QuizError> {
        let slug = match slug {
            Some(s) if !s.is_empty() => s,
            _ => return Err(QuizError::validation("slug required")),
        };

        let updated = self
            .store
            .update_quiz_slug(id, slug)
            .await?
            .ok_or(QuizError::QuizNotFound)?;

        info!(quiz_id = id, slug = %updated.slug, "slug updated");
        Ok(updated)
    }
}

/// Number answers by their position in the submitted list.
fn answer_rows(question_id: RecordId, answers: Vec<AnswerDraft>) -> Vec<NewAnswer> {
    answers
        .into_iter()
        .enumerate()
        .map(|(idx, a)| NewAnswer {
            question_id,
            ord: idx as i64,
            text: a.text.unwrap_or_default(),
            image_url: non_empty(a.image_url),
            is_correct: a.is_correct.unwrap_or(false),
        })
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
