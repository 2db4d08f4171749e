//! HTTP server layer for QuizMaker.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │     /api/*  (JSON)     /supa/slug/{id} (admin)     pages        │
//! │                                                                 │
//! │  ┌───────────┐  ┌──────────────┐  ┌─────────┐  ┌────────────┐   │
//! │  │ handlers  │  │     auth     │  │  pages  │  │   routes   │   │
//! │  │ (API)     │  │ (token gate) │  │ (HTML)  │  │ (router)   │   │
//! │  └───────────┘  └──────────────┘  └─────────┘  └────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod handlers;
pub mod pages;
pub mod routes;

pub use auth::{require_admin, require_auth, AuthError, Identity};
pub use handlers::{
    AppState, CreateQuizRequest, CredentialsRequest, ErrorResponse, LoginResponse, PingResponse,
    QuestionResponse, QuizListResponse, QuizResponse, SetSlugRequest, SuccessResponse,
};
pub use pages::{fallback_handler, ClientConfig};
pub use routes::{create_router, RouterConfig, MAX_BODY_BYTES};
