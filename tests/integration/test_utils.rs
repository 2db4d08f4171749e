//! Test utilities for integration tests.
//!
//! Provides an in-memory [`QuizStore`] and helpers for driving the router
//! with `tower::ServiceExt::oneshot`.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use quizmaker::error::StoreError;
use quizmaker::store::{
    Account, Answer, NewAccount, NewAnswer, NewQuestion, NewQuiz, Question, QuestionWithAnswers,
    Quiz, QuizSlug, QuizStore, RecordId,
};
use quizmaker::{create_router, hash_password, ClientConfig, RouterConfig, SessionTokenAuth};

pub const TEST_SECRET: &str = "test-secret-key-for-session-tokens";

// =============================================================================
// Mock Store
// =============================================================================

#[derive(Default)]
struct MockData {
    accounts: Vec<Account>,
    quizzes: Vec<Quiz>,
    questions: Vec<Question>,
    answers: Vec<Answer>,
    next_id: RecordId,
    fail_answers: bool,
    unreachable: bool,
    slugs_taken: bool,
    slug_lookups: usize,
}

impl MockData {
    fn next_id(&mut self) -> RecordId {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory store with the same ordering and uniqueness rules as the real
/// tables. Clones share data, so a test can keep a handle after building the
/// router.
#[derive(Clone, Default)]
pub struct MockStore {
    data: Arc<Mutex<MockData>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every answer insert fail.
    pub fn with_failing_answers(self) -> Self {
        self.lock().fail_answers = true;
        self
    }

    /// Make every call fail as if the store were down.
    pub fn unreachable(self) -> Self {
        self.lock().unreachable = true;
        self
    }

    /// Report every slug as already in use.
    pub fn with_all_slugs_taken(self) -> Self {
        self.lock().slugs_taken = true;
        self
    }

    /// Number of `find_quiz_by_slug` calls so far.
    pub fn slug_lookups(&self) -> usize {
        self.lock().slug_lookups
    }

    /// Add an account directly, bypassing the API.
    pub async fn add_account(&self, username: &str, password: &str, admin: bool) {
        let password_hash = hash_password(password).await.unwrap();
        self.lock().accounts.push(Account {
            username: username.to_string(),
            password_hash,
            is_admin: admin,
        });
    }

    /// Add an account whose password was hashed with bcrypt.
    pub fn add_bcrypt_account(&self, username: &str, password: &str) {
        let password_hash = bcrypt::hash(password, 4).unwrap();
        self.lock().accounts.push(Account {
            username: username.to_string(),
            password_hash,
            is_admin: false,
        });
    }

    pub fn account(&self, username: &str) -> Option<Account> {
        self.lock()
            .accounts
            .iter()
            .find(|a| a.username == username)
            .cloned()
    }

    pub fn answer_count(&self) -> usize {
        self.lock().answers.len()
    }

    fn lock(&self) -> MutexGuard<'_, MockData> {
        self.data.lock().unwrap()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.lock().unreachable {
            return Err(StoreError::Connection("connection refused".to_string()));
        }
        Ok(())
    }
}

fn unique_violation(constraint: &str) -> StoreError {
    StoreError::Api {
        status: 409,
        code: Some("23505".to_string()),
        message: format!(
            "duplicate key value violates unique constraint \"{}\"",
            constraint
        ),
    }
}

#[async_trait]
impl QuizStore for MockStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.check()
    }

    async fn insert_account(&self, account: NewAccount) -> Result<(), StoreError> {
        self.check()?;
        let mut data = self.lock();
        if data.accounts.iter().any(|a| a.username == account.username) {
            return Err(unique_violation("accounts_username_key"));
        }
        data.accounts.push(Account {
            username: account.username,
            password_hash: account.password_hash,
            is_admin: account.is_admin,
        });
        Ok(())
    }

    async fn find_account(&self, username: &str) -> Result<Option<Account>, StoreError> {
        self.check()?;
        Ok(self.account(username))
    }

    async fn insert_quiz(&self, quiz: NewQuiz) -> Result<Quiz, StoreError> {
        self.check()?;
        let mut data = self.lock();
        if data.quizzes.iter().any(|q| q.slug == quiz.slug) {
            return Err(unique_violation("quizzes_slug_key"));
        }

        let id = data.next_id();
        // One second apart so "newest first" is deterministic
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let row = Quiz {
            id,
            name: quiz.name,
            slug: quiz.slug,
            settings: Some(quiz.settings),
            created_at: base + Duration::seconds(id),
        };
        data.quizzes.push(row.clone());
        Ok(row)
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StoreError> {
        self.check()?;
        let mut quizzes = self.lock().quizzes.clone();
        quizzes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(quizzes)
    }

    async fn find_quiz_by_slug(&self, slug: &str) -> Result<Option<Quiz>, StoreError> {
        self.check()?;
        let mut data = self.lock();
        data.slug_lookups += 1;
        if data.slugs_taken {
            return Ok(Some(Quiz {
                id: 0,
                name: "taken".to_string(),
                slug: slug.to_string(),
                settings: None,
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            }));
        }
        Ok(data.quizzes.iter().find(|q| q.slug == slug).cloned())
    }

    async fn list_questions(
        &self,
        quiz_id: RecordId,
    ) -> Result<Vec<QuestionWithAnswers>, StoreError> {
        self.check()?;
        let data = self.lock();

        let mut questions: Vec<_> = data
            .questions
            .iter()
            .filter(|q| q.quiz_id == quiz_id)
            .map(|q| {
                let mut answers: Vec<_> = data
                    .answers
                    .iter()
                    .filter(|a| a.question_id == q.id)
                    .cloned()
                    .collect();
                answers.sort_by_key(|a| a.ord);
                QuestionWithAnswers {
                    question: q.clone(),
                    answers,
                }
            })
            .collect();
        questions.sort_by_key(|q| q.question.ord);
        Ok(questions)
    }

    async fn count_questions(&self, quiz_id: RecordId) -> Result<u64, StoreError> {
        self.check()?;
        Ok(self
            .lock()
            .questions
            .iter()
            .filter(|q| q.quiz_id == quiz_id)
            .count() as u64)
    }

    async fn insert_question(&self, question: NewQuestion) -> Result<Question, StoreError> {
        self.check()?;
        let mut data = self.lock();
        let row = Question {
            id: data.next_id(),
            quiz_id: question.quiz_id,
            ord: question.ord,
            text: question.text,
            image_url: question.image_url,
            timeout_seconds: question.timeout_seconds,
            double_points: question.double_points,
        };
        data.questions.push(row.clone());
        Ok(row)
    }

    async fn insert_answers(&self, answers: Vec<NewAnswer>) -> Result<(), StoreError> {
        self.check()?;
        let mut data = self.lock();
        if data.fail_answers {
            return Err(StoreError::Api {
                status: 400,
                code: Some("23502".to_string()),
                message: "null value in column \"text\"".to_string(),
            });
        }
        for answer in answers {
            let id = data.next_id();
            data.answers.push(Answer {
                id,
                question_id: answer.question_id,
                ord: answer.ord,
                text: answer.text,
                image_url: answer.image_url,
                is_correct: answer.is_correct,
            });
        }
        Ok(())
    }

    async fn find_quiz_slug(&self, id: RecordId) -> Result<Option<QuizSlug>, StoreError> {
        self.check()?;
        Ok(self
            .lock()
            .quizzes
            .iter()
            .find(|q| q.id == id)
            .map(|q| QuizSlug {
                id: q.id,
                slug: q.slug.clone(),
            }))
    }

    async fn update_quiz_slug(
        &self,
        id: RecordId,
        slug: &str,
    ) -> Result<Option<QuizSlug>, StoreError> {
        self.check()?;
        let mut data = self.lock();
        if data.quizzes.iter().any(|q| q.slug == slug && q.id != id) {
            return Err(unique_violation("quizzes_slug_key"));
        }
        Ok(data.quizzes.iter_mut().find(|q| q.id == id).map(|q| {
            q.slug = slug.to_string();
            QuizSlug {
                id: q.id,
                slug: q.slug.clone(),
            }
        }))
    }
}

// =============================================================================
// Router Helpers
// =============================================================================

pub fn client_config() -> ClientConfig {
    ClientConfig {
        supabase_url: "https://test-project.supabase.co".to_string(),
        supabase_key: "test-anon-key".to_string(),
        quiz_bucket: "quiz-assets".to_string(),
    }
}

pub fn test_config() -> RouterConfig {
    RouterConfig::new(TEST_SECRET, client_config()).with_tracing(false)
}

/// Router over `store` with tracing disabled.
pub fn test_router(store: MockStore) -> Router {
    create_router(store, test_config())
}

/// Token signed with the router's secret.
pub fn token_for(username: &str, admin: bool) -> String {
    SessionTokenAuth::new(TEST_SECRET).issue(username, admin)
}

/// Send a JSON request and decode the JSON response.
pub async fn send_json(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Send a request built by the caller and return status, content type and body text.
pub async fn send_raw(router: &Router, request: Request<Body>) -> (StatusCode, String, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8_lossy(&bytes).into_owned())
}

/// GET `uri` and return status, content type and body text.
pub async fn get_text(router: &Router, uri: &str) -> (StatusCode, String, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send_raw(router, request).await
}

/// Create a quiz through the API and return its JSON.
pub async fn create_quiz(router: &Router, name: &str) -> Value {
    let (status, body) = send_json(
        router,
        Method::POST,
        "/api/quizzes",
        Some(serde_json::json!({ "name": name })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create quiz failed: {}", body);
    body["quiz"].clone()
}

/// True if `slug` is `<base>-` followed by six lowercase letters or digits.
pub fn has_slug_shape(slug: &str, base: &str) -> bool {
    match slug.strip_prefix(base).and_then(|rest| rest.strip_prefix('-')) {
        Some(suffix) => {
            suffix.len() == 6
                && suffix
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        }
        None => false,
    }
}
