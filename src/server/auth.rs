//! Session token gate for QuizMaker.
//!
//! Protected routes are wrapped in two middlewares that must run in order:
//!
//! 1. [`require_auth`] reads `Authorization: Bearer <token>`, verifies the
//!    token and stores an [`Identity`] in the request extensions (401 on
//!    failure).
//! 2. [`require_admin`] reads that [`Identity`] and rejects non-admins (403).
//!
//! In axum, the layer added last runs first, so `require_admin` is layered
//! before `require_auth`:
//!
//! ```ignore
//! use axum::{middleware, routing::get, Router};
//! use quizmaker::auth::SessionTokenAuth;
//! use quizmaker::server::auth::{require_admin, require_auth};
//!
//! let tokens = SessionTokenAuth::new("secret-key");
//! let admin = Router::new()
//!     .route("/supa/slug/{id}", get(handler))
//!     .layer(middleware::from_fn(require_admin))
//!     .layer(middleware::from_fn_with_state(tokens, require_auth));
//! ```

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, warn};

use super::handlers::ErrorResponse;
use crate::auth::{SessionTokenAuth, TokenError};

// =============================================================================
// Types
// =============================================================================

/// The authenticated caller, inserted into request extensions by [`require_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub is_admin: bool,
}

/// Authentication and authorization failures.
#[derive(Debug, Clone)]
pub enum AuthError {
    /// No `Authorization` header
    MissingHeader,

    /// Header present but carries no token
    MalformedHeader,

    /// Token failed verification (bad signature, malformed or expired)
    InvalidToken(TokenError),

    /// Valid token without admin rights
    Forbidden,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingHeader => write!(f, "No authorization header"),
            AuthError::MalformedHeader => write!(f, "Invalid auth header"),
            AuthError::InvalidToken(_) => write!(f, "Invalid or expired token"),
            AuthError::Forbidden => write!(f, "Admin access required"),
        }
    }
}

impl AuthError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        // A bad signature may be forgery; expiry and missing headers are routine
        match &self {
            AuthError::InvalidToken(TokenError::InvalidSignature) => {
                warn!(status = status.as_u16(), "Authentication failed: bad token signature");
            }
            AuthError::InvalidToken(reason) => {
                debug!(status = status.as_u16(), reason = %reason, "Authentication failed");
            }
            AuthError::Forbidden => {
                warn!(status = status.as_u16(), "Authorization failed: {}", message);
            }
            _ => {
                debug!(status = status.as_u16(), "Authentication failed: {}", message);
            }
        }

        let error_response = ErrorResponse::with_status(message, status);
        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// Extract the token from an `Authorization` header value.
///
/// The scheme word is not checked; the token is the second space-separated part.
fn bearer_token(header: &str) -> Option<&str> {
    header.split(' ').nth(1).filter(|t| !t.is_empty())
}

/// Verify the session token and attach the caller's [`Identity`].
pub async fn require_auth(
    State(tokens): State<SessionTokenAuth>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?;

    let header = header.to_str().map_err(|_| AuthError::MalformedHeader)?;
    let token = bearer_token(header).ok_or(AuthError::MalformedHeader)?;

    let claims = tokens.verify(token).map_err(AuthError::InvalidToken)?;

    request.extensions_mut().insert(Identity {
        username: claims.username,
        is_admin: claims.admin,
    });

    Ok(next.run(request).await)
}

/// Reject callers whose [`Identity`] lacks the admin flag.
///
/// Must run after [`require_auth`]; a request without an identity is treated
/// as not authorized.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AuthError> {
    match request.extensions().get::<Identity>() {
        Some(identity) if identity.is_admin => Ok(next.run(request).await),
        _ => Err(AuthError::Forbidden),
    }
}

// =============================================================================
// Tests
// =============================================================================
