//! Router configuration for QuizMaker.
//!
//! This module defines the HTTP routes and applies middleware for
//! authentication, body limits and CORS.
//!
//! # Route Structure
//!
//! ```text
//! /api/ping                         - Health check (public)
//! /api/register, /api/login         - Accounts (public)
//! /api/quizzes                      - List / create quizzes (public)
//! /api/quizzes/{slug}               - Quiz with questions (public)
//! /api/quizzes/{slug}/questions     - Add question (public)
//! /supa/slug/{id}                   - Read / replace slug (admin token)
//! /config.js                        - Browser client configuration
//! /, /quizmaker, /quiz/{slug}, ...  - Pages
//! *                                 - Fallback (home page, or 404), also
//!                                     for known paths with another method
//! ```
//!
//! # Example
//!
//! ```ignore
//! use quizmaker::server::routes::{create_router, RouterConfig};
//! use quizmaker::server::ClientConfig;
//! use quizmaker::store::SupabaseStore;
//!
//! let store = SupabaseStore::new(&url, &key, timeout)?;
//! let config = RouterConfig::new("my-secret-key", client_config)
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(store, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:1030").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::{require_admin, require_auth};
use super::handlers::{
    add_question_handler, create_quiz_handler, get_quiz_handler, get_slug_handler,
    list_quizzes_handler, login_handler, ping_handler, register_handler, set_slug_handler,
    AppState,
};
use super::pages::{
    config_js_handler, fallback_handler, home_page, host_page, leaderboard_page, login_page,
    make_page, manage_page, play_page, register_page, ClientConfig, ASSETS,
};
use crate::auth::SessionTokenAuth;
use crate::quiz::QuizService;
use crate::store::QuizStore;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Secret key for signing and verifying session tokens
    pub auth_secret: String,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Values served to the browser from `/config.js`
    pub client: ClientConfig,
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default CORS allows any origin and tracing is enabled.
    pub fn new(auth_secret: impl Into<String>, client: ClientConfig) -> Self {
        Self {
            auth_secret: auth_secret.into(),
            cors_origins: None,
            enable_tracing: true,
            client,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router over `store`.
///
/// The same secret signs tokens at login and verifies them on admin routes.
pub fn create_router<S>(store: S, config: RouterConfig) -> Router
where
    S: QuizStore + 'static,
{
    let tokens = SessionTokenAuth::new(&config.auth_secret);
    let service = QuizService::new(store, tokens.clone());
    let app_state = AppState::new(service, config.client.clone());

    let cors = build_cors_layer(&config);

    let router = Router::new()
        .merge(api_routes(app_state.clone()))
        .merge(admin_routes(app_state.clone(), tokens))
        .merge(page_routes(app_state))
        .fallback(fallback_handler)
        .method_not_allowed_fallback(fallback_handler)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors);

    // Add tracing if enabled
    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Public JSON API.
fn api_routes<S>(app_state: AppState<S>) -> Router
where
    S: QuizStore + 'static,
{
    Router::new()
        .route("/api/ping", get(ping_handler))
        .route("/api/register", post(register_handler::<S>))
        .route("/api/login", post(login_handler::<S>))
        .route(
            "/api/quizzes",
            get(list_quizzes_handler::<S>).post(create_quiz_handler::<S>),
        )
        .route("/api/quizzes/{slug}", get(get_quiz_handler::<S>))
        .route(
            "/api/quizzes/{slug}/questions",
            post(add_question_handler::<S>),
        )
        .with_state(app_state)
}

/// Admin routes behind the session token and admin gates.
fn admin_routes<S>(app_state: AppState<S>, tokens: SessionTokenAuth) -> Router
where
    S: QuizStore + 'static,
{
    // Layers run last-added first: require_auth, then require_admin
    Router::new()
        .route(
            "/supa/slug/{id}",
            get(get_slug_handler::<S>).put(set_slug_handler::<S>),
        )
        .with_state(app_state)
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(tokens, require_auth))
}

/// Pages, embedded assets and `/config.js`.
fn page_routes<S>(app_state: AppState<S>) -> Router
where
    S: QuizStore + 'static,
{
    let mut router: Router<AppState<S>> = Router::new()
        .route("/", get(home_page))
        .route("/quizmaker", get(home_page))
        .route("/quizmaker/make", get(make_page))
        .route("/quizmaker/my/{slug}", get(manage_page))
        .route("/host/{slug}", get(host_page))
        .route("/quiz/{slug}/leaderboard", get(leaderboard_page))
        .route("/quiz/{slug}", get(play_page))
        .route("/login", get(login_page))
        .route("/register", get(register_page))
        .route("/config.js", get(config_js_handler::<S>));

    for asset in ASSETS {
        let asset = *asset;
        router = router.route(asset.path, get(move || async move { asset.into_response() }));
    }

    router.with_state(app_state)
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
