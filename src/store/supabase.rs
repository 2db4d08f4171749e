//! Supabase (PostgREST) implementation of [`QuizStore`].
//!
//! Each table is exposed at `{SUPABASE_URL}/rest/v1/{table}`. Filters and
//! ordering are query parameters (`slug=eq.abc`, `order=ord.asc`) and every
//! request authenticates with the project's public key, sent both as the
//! `apikey` header and as a bearer token.

use std::time::Duration;

use async_trait::async_trait;
use http::header::{AUTHORIZATION, CONTENT_RANGE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::models::{
    Account, NewAccount, NewAnswer, NewQuestion, NewQuiz, Question, QuestionWithAnswers, Quiz,
    QuizSlug, RecordId,
};
use super::QuizStore;
use crate::error::StoreError;

/// Default timeout for a single store request, in seconds.
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

const ACCOUNTS: &str = "accounts";
const QUIZZES: &str = "quizzes";
const QUESTIONS: &str = "questions";
const ANSWERS: &str = "answers";

/// PostgREST error body.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Serialize)]
struct SlugPatch<'a> {
    slug: &'a str,
}

/// Store client for a Supabase project.
#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    rest_url: Url,
    api_key: String,
}

impl SupabaseStore {
    /// Create a store client for the project at `project_url`.
    ///
    /// # Arguments
    /// * `project_url` - Project URL, e.g. `https://abcd.supabase.co`
    /// * `api_key` - Public (anon) API key
    /// * `timeout` - Per-request timeout
    pub fn new(
        project_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let rest_url = rest_base_url(project_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            rest_url,
            api_key: api_key.into(),
        })
    }

    /// Base URL of the REST API (`.../rest/v1/`).
    pub fn rest_url(&self) -> &str {
        self.rest_url.as_str()
    }

    fn table_url(&self, table: &str) -> Result<Url, StoreError> {
        self.rest_url
            .join(table)
            .map_err(|e| StoreError::Connection(format!("invalid table url: {}", e)))
    }

    fn request(&self, method: Method, table: &str) -> Result<RequestBuilder, StoreError> {
        let url = self.table_url(table)?;
        Ok(self
            .client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key)))
    }

    /// Send a request and turn non-success responses into [`StoreError::Api`].
    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(api_error(status.as_u16(), &body))
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Vec<T>, StoreError> {
        self.send(request)
            .await?
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn fetch_single<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, StoreError> {
        self.fetch_rows::<T>(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("expected one row, got none".to_string()))
    }
}

#[async_trait]
impl QuizStore for SupabaseStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        let request = self
            .request(Method::GET, QUIZZES)?
            .query(&[("select", "id"), ("limit", "1")]);
        self.send(request).await.map(|_| ())
    }

    async fn insert_account(&self, account: NewAccount) -> Result<(), StoreError> {
        debug!(username = %account.username, "inserting account");
        let request = self
            .request(Method::POST, ACCOUNTS)?
            .header("Prefer", "return=minimal")
            .json(&[account]);
        self.send(request).await.map(|_| ())
    }

    async fn find_account(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let request = self.request(Method::GET, ACCOUNTS)?.query(&[
            ("select", "*".to_string()),
            ("username", eq(username)),
            ("limit", "1".to_string()),
        ]);
        Ok(self.fetch_rows::<Account>(request).await?.into_iter().next())
    }

    async fn insert_quiz(&self, quiz: NewQuiz) -> Result<Quiz, StoreError> {
        debug!(slug = %quiz.slug, "inserting quiz");
        let request = self
            .request(Method::POST, QUIZZES)?
            .query(&[("select", "*")])
            .header("Prefer", "return=representation")
            .json(&[quiz]);
        self.fetch_single(request).await
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StoreError> {
        let request = self
            .request(Method::GET, QUIZZES)?
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        self.fetch_rows(request).await
    }

    async fn find_quiz_by_slug(&self, slug: &str) -> Result<Option<Quiz>, StoreError> {
        let request = self.request(Method::GET, QUIZZES)?.query(&[
            ("select", "*".to_string()),
            ("slug", eq(slug)),
            ("limit", "1".to_string()),
        ]);
        Ok(self.fetch_rows::<Quiz>(request).await?.into_iter().next())
    }

    async fn list_questions(
        &self,
        quiz_id: RecordId,
    ) -> Result<Vec<QuestionWithAnswers>, StoreError> {
        let request = self.request(Method::GET, QUESTIONS)?.query(&[
            ("select", "*,answers(*)".to_string()),
            ("quiz_id", eq(quiz_id)),
            ("order", "ord.asc".to_string()),
            ("answers.order", "ord.asc".to_string()),
        ]);
        self.fetch_rows(request).await
    }

    async fn count_questions(&self, quiz_id: RecordId) -> Result<u64, StoreError> {
        let request = self
            .request(Method::HEAD, QUESTIONS)?
            .query(&[("select", "id".to_string()), ("quiz_id", eq(quiz_id))])
            .header("Prefer", "count=exact");
        let response = self.send(request).await?;

        let range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| StoreError::Decode("missing Content-Range header".to_string()))?;

        content_range_total(range)
            .ok_or_else(|| StoreError::Decode(format!("unparsable Content-Range: {}", range)))
    }

    async fn insert_question(&self, question: NewQuestion) -> Result<Question, StoreError> {
        debug!(quiz_id = question.quiz_id, ord = question.ord, "inserting question");
        let request = self
            .request(Method::POST, QUESTIONS)?
            .query(&[("select", "*")])
            .header("Prefer", "return=representation")
            .json(&[question]);
        self.fetch_single(request).await
    }

    async fn insert_answers(&self, answers: Vec<NewAnswer>) -> Result<(), StoreError> {
        if answers.is_empty() {
            return Ok(());
        }
        let request = self
            .request(Method::POST, ANSWERS)?
            .header("Prefer", "return=minimal")
            .json(&answers);
        self.send(request).await.map(|_| ())
    }

    async fn find_quiz_slug(&self, id: RecordId) -> Result<Option<QuizSlug>, StoreError> {
        let request = self
            .request(Method::GET, QUIZZES)?
            .query(&[("select", "id,slug".to_string()), ("id", eq(id))]);
        Ok(self.fetch_rows::<QuizSlug>(request).await?.into_iter().next())
    }

    async fn update_quiz_slug(
        &self,
        id: RecordId,
        slug: &str,
    ) -> Result<Option<QuizSlug>, StoreError> {
        let request = self
            .request(Method::PATCH, QUIZZES)?
            .query(&[("select", "id,slug".to_string()), ("id", eq(id))])
            .header("Prefer", "return=representation")
            .json(&SlugPatch { slug });
        Ok(self.fetch_rows::<QuizSlug>(request).await?.into_iter().next())
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Build the `rest/v1/` base from a project URL.
fn rest_base_url(project_url: &str) -> Result<Url, StoreError> {
    let mut base = Url::parse(project_url)
        .map_err(|e| StoreError::Connection(format!("invalid store url '{}': {}", project_url, e)))?;

    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join("rest/v1/")
        .map_err(|e| StoreError::Connection(format!("invalid store url '{}': {}", project_url, e)))
}

/// PostgREST equality filter value.
fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

/// Total row count from a PostgREST `Content-Range` header (`0-9/42`, `*/0`).
fn content_range_total(header: &str) -> Option<u64> {
    let (_, total) = header.rsplit_once('/')?;
    total.trim().parse().ok()
}

fn api_error(status: u16, body: &str) -> StoreError {
    match serde_json::from_str::<PostgrestError>(body) {
        Ok(err) => StoreError::Api {
            status,
            code: err.code,
            message: err
                .message
                .unwrap_or_else(|| format!("store returned status {}", status)),
        },
        Err(_) if !body.trim().is_empty() => StoreError::Api {
            status,
            code: None,
            message: body.trim().to_string(),
        },
        Err(_) => StoreError::Api {
            status,
            code: None,
            message: format!("store returned status {}", status),
        },
    }
}

// =============================================================================
// Tests
// =============================================================================
