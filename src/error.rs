use thiserror::Error;

/// Errors returned by the backing store (Supabase PostgREST)
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store answered with a non-success status
    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Response body did not have the expected shape
    #[error("Unexpected store response: {0}")]
    Decode(String),
}

impl StoreError {
    /// HTTP status reported by the store, if the failure came from the store itself.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors produced by quiz and account operations
#[derive(Debug, Clone, Error)]
pub enum QuizError {
    /// A required field is missing or the request body is malformed
    #[error("{0}")]
    Validation(String),

    /// Unknown username or wrong password (deliberately indistinguishable)
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No quiz matches the given slug or id
    #[error("quiz not found")]
    QuizNotFound,

    /// Every generated slug candidate was already taken
    #[error("could not allocate a unique slug after {attempts} attempts")]
    SlugCollision { attempts: usize },

    /// Password hashing failed
    #[error("failed to hash password: {0}")]
    Credential(String),

    /// Underlying store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QuizError {
    pub fn validation(message: impl Into<String>) -> Self {
        QuizError::Validation(message.into())
    }
}
