//! HTTP request handlers for the QuizMaker JSON API.
//!
//! # Endpoints
//!
//! - `POST /api/register` - Create an account
//! - `POST /api/login` - Exchange credentials for a session token
//! - `GET /api/quizzes` - List quizzes, newest first
//! - `POST /api/quizzes` - Create a quiz
//! - `GET /api/quizzes/{slug}` - Quiz with ordered questions and answers
//! - `POST /api/quizzes/{slug}/questions` - Append a question
//! - `GET /supa/slug/{id}` - Read a quiz slug (admin)
//! - `PUT /supa/slug/{id}` - Replace a quiz slug (admin)
//! - `GET /api/ping` - Health check

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::QuizError;
use crate::quiz::{QuestionDraft, QuizService};
use crate::store::{Question, Quiz, QuizSlug, QuizStore, QuizWithQuestions, RecordId, Settings};

use super::auth::Identity;
use super::pages::ClientConfig;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the quiz service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S: QuizStore> {
    /// The quiz service for processing API requests
    pub quiz_service: Arc<QuizService<S>>,

    /// Values exposed to the browser through `/config.js`
    pub client_config: Arc<ClientConfig>,
}

impl<S: QuizStore> AppState<S> {
    /// Create a new application state.
    pub fn new(quiz_service: QuizService<S>, client_config: ClientConfig) -> Self {
        Self {
            quiz_service: Arc::new(quiz_service),
            client_config: Arc::new(client_config),
        }
    }
}

impl<S: QuizStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            quiz_service: Arc::clone(&self.quiz_service),
            client_config: Arc::clone(&self.client_config),
        }
    }
}

// =============================================================================
// Request Bodies
// =============================================================================

/// JSON body extractor whose rejections are reported as [`QuizError::Validation`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(QuizError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for QuizError {
    fn from(rejection: JsonRejection) -> Self {
        QuizError::Validation(rejection.body_text())
    }
}

/// Body of `/api/register` and `/api/login`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

/// Body of `POST /api/quizzes`.
#[derive(Debug, Deserialize)]
pub struct CreateQuizRequest {
    #[serde(default)]
    pub name: Option<String>,

    /// Free-form settings object (e.g. `{"image": "..."}`)
    #[serde(default)]
    pub settings: Option<Settings>,
}

/// Body of `PUT /supa/slug/{id}`.
#[derive(Debug, Deserialize)]
pub struct SetSlugRequest {
    #[serde(default)]
    pub slug: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(error: impl Into<String>, status: StatusCode) -> Self {
        Self {
            error: error.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Bare success flag.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Response from `/api/login`.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,

    /// Signed session token, sent back as `Authorization: Bearer <token>`
    pub token: String,

    /// Whether the account has admin rights
    pub admin: bool,
}

/// Response carrying a single quiz (or quiz projection).
#[derive(Debug, Serialize)]
pub struct QuizResponse<T> {
    pub success: bool,
    pub quiz: T,
}

/// Response from `GET /api/quizzes`.
#[derive(Debug, Serialize)]
pub struct QuizListResponse {
    pub success: bool,
    pub quizzes: Vec<Quiz>,
}

/// Response from `POST /api/quizzes/{slug}/questions`.
#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub success: bool,
    pub question: Question,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct PingResponse {
    /// Always true
    pub pong: bool,

    /// Server time (RFC 3339, UTC)
    pub time: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert QuizError to HTTP response.
///
/// Store failures keep their detail (status, code) in the log only; the
/// response carries the store's message text.
impl IntoResponse for QuizError {
    fn into_response(self) -> Response {
        let status = match &self {
            QuizError::Validation(_) | QuizError::InvalidCredentials => StatusCode::BAD_REQUEST,
            QuizError::QuizNotFound => StatusCode::NOT_FOUND,
            QuizError::SlugCollision { .. }
            | QuizError::Credential(_)
            | QuizError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            QuizError::SlugCollision { .. } => "could not allocate a unique slug".to_string(),
            QuizError::Credential(_) => "failed to hash password".to_string(),
            other => other.to_string(),
        };

        // Log errors based on severity
        if status.is_server_error() {
            let store_status = match &self {
                QuizError::Store(e) => e.status(),
                _ => None,
            };
            error!(
                status = status.as_u16(),
                store_status = ?store_status,
                error = ?self,
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(status = status.as_u16(), "Resource not found: {}", message);
        } else {
            warn!(status = status.as_u16(), "Client error: {}", message);
        }

        let error_response = ErrorResponse::with_status(message, status);
        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle account registration.
///
/// # Endpoint
///
/// `POST /api/register` with `{"username": "...", "password": "..."}`
///
/// # Response
///
/// - `201 Created`: `{"success": true}`
/// - `400 Bad Request`: missing username or password
/// - `500 Internal Server Error`: store failure (including duplicate username)
pub async fn register_handler<S: QuizStore>(
    State(state): State<AppState<S>>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<SuccessResponse>), QuizError> {
    let username = body.username.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    state.quiz_service.register(&username, &password).await?;

    Ok((StatusCode::CREATED, Json(SuccessResponse { success: true })))
}

/// Handle login.
///
/// # Endpoint
///
/// `POST /api/login` with `{"username": "...", "password": "..."}`
///
/// # Response
///
/// - `200 OK`: `{"success": true, "token": "...", "admin": false}`
/// - `400 Bad Request`: missing fields, or `"invalid credentials"` for both an
///   unknown username and a wrong password
pub async fn login_handler<S: QuizStore>(
    State(state): State<AppState<S>>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<Json<LoginResponse>, QuizError> {
    let username = body.username.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    let outcome = state.quiz_service.login(&username, &password).await?;

    Ok(Json(LoginResponse {
        success: true,
        token: outcome.token,
        admin: outcome.admin,
    }))
}

/// Handle quiz listing.
///
/// `GET /api/quizzes` returns every quiz ordered by creation time, newest first.
pub async fn list_quizzes_handler<S: QuizStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<QuizListResponse>, QuizError> {
    let quizzes = state.quiz_service.list_quizzes().await?;
    Ok(Json(QuizListResponse {
        success: true,
        quizzes,
    }))
}

/// Handle quiz creation.
///
/// # Endpoint
///
/// `POST /api/quizzes` with `{"name": "...", "settings": {...}}`
///
/// # Response
///
/// - `200 OK`: `{"success": true, "quiz": {...}}` including the generated slug
/// - `400 Bad Request`: missing name
/// - `500 Internal Server Error`: store failure
pub async fn create_quiz_handler<S: QuizStore>(
    State(state): State<AppState<S>>,
    ApiJson(body): ApiJson<CreateQuizRequest>,
) -> Result<Json<QuizResponse<Quiz>>, QuizError> {
    let name = body.name.unwrap_or_default();
    let quiz = state.quiz_service.create_quiz(&name, body.settings).await?;

    Ok(Json(QuizResponse {
        success: true,
        quiz,
    }))
}

/// Handle quiz lookup.
///
/// # Endpoint
///
/// `GET /api/quizzes/{slug}`
///
/// # Response
///
/// - `200 OK`: quiz with `questions` ordered by `ord`, each carrying `answers`
///   ordered by `ord`
/// - `404 Not Found`: no quiz has that slug
pub async fn get_quiz_handler<S: QuizStore>(
    State(state): State<AppState<S>>,
    Path(slug): Path<String>,
) -> Result<Json<QuizResponse<QuizWithQuestions>>, QuizError> {
    let quiz = state.quiz_service.get_quiz(&slug).await?;
    Ok(Json(QuizResponse {
        success: true,
        quiz,
    }))
}

/// Handle question creation.
///
/// # Endpoint
///
/// `POST /api/quizzes/{slug}/questions`
///
/// ```json
/// {
///   "text": "Capital of France?",
///   "image_url": null,
///   "timeout": 20,
///   "double_points": false,
///   "answers": [{"text": "Paris", "is_correct": true}, {"text": "Rome"}]
/// }
/// ```
///
/// # Response
///
/// - `200 OK`: `{"success": true, "question": {...}}`
/// - `404 Not Found`: no quiz has that slug
pub async fn add_question_handler<S: QuizStore>(
    State(state): State<AppState<S>>,
    Path(slug): Path<String>,
    ApiJson(draft): ApiJson<QuestionDraft>,
) -> Result<Json<QuestionResponse>, QuizError> {
    let question = state.quiz_service.add_question(&slug, draft).await?;
    Ok(Json(QuestionResponse {
        success: true,
        question,
    }))
}

/// Handle admin slug lookup.
///
/// `GET /supa/slug/{id}` returns `{"success": true, "quiz": {"id": .., "slug": ..}}`.
/// Runs behind the admin gate; an id that is not a number is treated as unmatched.
pub async fn get_slug_handler<S: QuizStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<QuizResponse<QuizSlug>>, QuizError> {
    let id = parse_record_id(&id)?;
    let quiz = state.quiz_service.get_slug(id).await?;
    Ok(Json(QuizResponse {
        success: true,
        quiz,
    }))
}

/// Handle admin slug replacement.
///
/// `PUT /supa/slug/{id}` with `{"slug": "new-slug"}`.
///
/// # Errors
///
/// - `400 Bad Request`: missing slug
/// - `404 Not Found`: no quiz has that id
pub async fn set_slug_handler<S: QuizStore>(
    State(state): State<AppState<S>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<SetSlugRequest>,
) -> Result<Json<QuizResponse<QuizSlug>>, QuizError> {
    let id = parse_record_id(&id)?;
    let quiz = state
        .quiz_service
        .set_slug(id, body.slug.as_deref())
        .await?;

    info!(admin = %identity.username, quiz_id = quiz.id, slug = %quiz.slug, "admin changed slug");

    Ok(Json(QuizResponse {
        success: true,
        quiz,
    }))
}

/// Handle health check requests.
///
/// `GET /api/ping` returns `{"pong": true, "time": "2025-01-01T00:00:00.000Z"}`.
pub async fn ping_handler() -> Json<PingResponse> {
    Json(PingResponse {
        pong: true,
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

fn parse_record_id(raw: &str) -> Result<RecordId, QuizError> {
    raw.parse::<RecordId>().map_err(|_| QuizError::QuizNotFound)
}

// =============================================================================
// Tests
// =============================================================================
