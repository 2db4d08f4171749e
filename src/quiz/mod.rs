//! Quiz operations.

mod service;

pub use service::{AnswerDraft, LoginOutcome, QuestionDraft, QuizService, MAX_SLUG_ATTEMPTS};
