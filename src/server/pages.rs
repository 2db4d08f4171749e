//! Browser pages, static assets and the client configuration script.
//!
//! Pages and assets are compiled into the binary from `public/` and served
//! both at their file paths (e.g. `/quizmaker.html`) and through the friendly
//! routes (`/`, `/quiz/{slug}`, ...). Anything unmatched falls through to
//! [`fallback_handler`].

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Json,
};
use tracing::debug;

use super::handlers::{AppState, ErrorResponse};
use crate::store::QuizStore;

const HTML: &str = "text/html; charset=utf-8";
const JAVASCRIPT: &str = "application/javascript; charset=utf-8";
const CSS: &str = "text/css; charset=utf-8";

/// A file compiled into the binary.
#[derive(Debug, Clone, Copy)]
pub struct Asset {
    /// Request path the file is served at
    pub path: &'static str,

    /// `Content-Type` header value
    pub content_type: &'static str,

    pub body: &'static str,
}

impl IntoResponse for Asset {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

pub const HOME_PAGE: Asset = Asset {
    path: "/quizmaker.html",
    content_type: HTML,
    body: include_str!("../../public/quizmaker.html"),
};

pub const MAKE_PAGE: Asset = Asset {
    path: "/quizmaker/make.html",
    content_type: HTML,
    body: include_str!("../../public/quizmaker/make.html"),
};

pub const MANAGE_PAGE: Asset = Asset {
    path: "/quizmaker/my/template.html",
    content_type: HTML,
    body: include_str!("../../public/quizmaker/my/template.html"),
};

pub const HOST_PAGE: Asset = Asset {
    path: "/host/template.html",
    content_type: HTML,
    body: include_str!("../../public/host/template.html"),
};

pub const PLAY_PAGE: Asset = Asset {
    path: "/quiz/template.html",
    content_type: HTML,
    body: include_str!("../../public/quiz/template.html"),
};

pub const LEADERBOARD_PAGE: Asset = Asset {
    path: "/quiz/leaderboard.html",
    content_type: HTML,
    body: include_str!("../../public/quiz/leaderboard.html"),
};

pub const LOGIN_PAGE: Asset = Asset {
    path: "/login.html",
    content_type: HTML,
    body: include_str!("../../public/login.html"),
};

pub const REGISTER_PAGE: Asset = Asset {
    path: "/register.html",
    content_type: HTML,
    body: include_str!("../../public/register.html"),
};

/// Every embedded file, each served at its own path.
pub const ASSETS: &[Asset] = &[
    HOME_PAGE,
    MAKE_PAGE,
    MANAGE_PAGE,
    HOST_PAGE,
    PLAY_PAGE,
    LEADERBOARD_PAGE,
    LOGIN_PAGE,
    REGISTER_PAGE,
    Asset {
        path: "/app.js",
        content_type: JAVASCRIPT,
        body: include_str!("../../public/app.js"),
    },
    Asset {
        path: "/style.css",
        content_type: CSS,
        body: include_str!("../../public/style.css"),
    },
];

/// Values handed to the browser through `/config.js`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// BaaS project URL used by the browser client
    pub supabase_url: String,

    /// Public (anon) key; never the service key
    pub supabase_key: String,

    /// Storage bucket for uploaded quiz images
    pub quiz_bucket: String,
}

impl ClientConfig {
    /// Render the `/config.js` body.
    pub fn to_script(&self) -> String {
        format!(
            "window.__SUPABASE_URL__ = {};\nwindow.__SUPABASE_KEY__ = {};\nwindow.__QUIZ_BUCKET__ = {};\n",
            js_string(&self.supabase_url),
            js_string(&self.supabase_key),
            js_string(&self.quiz_bucket),
        )
    }
}

/// Quote `s` as a JavaScript string literal.
///
/// JSON string syntax is valid JavaScript; `<` is escaped as well so the
/// script can also be inlined into a page.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string())
        .to_string()
        .replace('<', "\\u003c")
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /` and `/quizmaker`.
pub async fn home_page() -> Html<&'static str> {
    Html(HOME_PAGE.body)
}

/// `GET /quizmaker/make`.
pub async fn make_page() -> Html<&'static str> {
    Html(MAKE_PAGE.body)
}

/// `GET /quizmaker/my/{slug}`. The page reads the slug from its own URL.
pub async fn manage_page() -> Html<&'static str> {
    Html(MANAGE_PAGE.body)
}

/// `GET /host/{slug}`.
pub async fn host_page() -> Html<&'static str> {
    Html(HOST_PAGE.body)
}

/// `GET /quiz/{slug}`.
pub async fn play_page() -> Html<&'static str> {
    Html(PLAY_PAGE.body)
}

/// `GET /quiz/{slug}/leaderboard`.
pub async fn leaderboard_page() -> Html<&'static str> {
    Html(LEADERBOARD_PAGE.body)
}

pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE.body)
}

pub async fn register_page() -> Html<&'static str> {
    Html(REGISTER_PAGE.body)
}

/// `GET /config.js`.
pub async fn config_js_handler<S: QuizStore>(State(state): State<AppState<S>>) -> Response {
    (
        [(header::CONTENT_TYPE, JAVASCRIPT)],
        state.client_config.to_script(),
    )
        .into_response()
}

/// Catch-all for unmatched paths.
///
/// - `/api/...` gets a JSON 404
/// - a missing `.js` or `.css` file gets a plain-text 404
/// - anything else gets the home page, so client-side links always land
pub async fn fallback_handler(uri: Uri) -> Response {
    let path = uri.path();

    if path == "/api" || path.starts_with("/api/") {
        debug!(path = %path, "unknown API route");
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("API not found")),
        )
            .into_response();
    }

    if path.ends_with(".js") || path.ends_with(".css") {
        debug!(path = %path, "unknown static file");
        return (StatusCode::NOT_FOUND, "File not found").into_response();
    }

    Html(HOME_PAGE.body).into_response()
}

// =============================================================================
// Tests
// =============================================================================
