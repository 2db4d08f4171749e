//! Signed session tokens.
//!
//! A session token asserts a username and an admin flag for a limited time.
//! It is verified without any server-side lookup:
//!
//! ```text
//! payload   = hex(json({"username": .., "admin": .., "iat": .., "exp": ..}))
//! signature = hex(HMAC-SHA256(secret_key, payload))
//! token     = "{payload}.{signature}"
//! ```
//!
//! # Security Properties
//!
//! - **Tamper evident**: any change to the payload invalidates the signature
//! - **Time-limited**: tokens expire [`SESSION_TTL`] after issuance
//! - **Constant-time comparison**: signatures are compared with `subtle`
//! - **No revocation**: a leaked token stays valid until it expires
//!
//! # Example
//!
//! ```rust
//! use quizmaker::auth::SessionTokenAuth;
//!
//! let auth = SessionTokenAuth::new("my-secret-key");
//! let token = auth.issue("alice", false);
//!
//! let claims = auth.verify(&token).unwrap();
//! assert_eq!(claims.username, "alice");
//! assert!(!claims.admin);
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// HMAC-SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Lifetime of a session token.
pub const SESSION_TTL: Duration = Duration::from_secs(6 * 60 * 60);

// =============================================================================
// Types
// =============================================================================

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account the token was issued to
    pub username: String,

    /// Whether the account has admin rights
    pub admin: bool,

    /// Issued-at (Unix epoch seconds)
    pub iat: u64,

    /// Expiry (Unix epoch seconds)
    pub exp: u64,
}

/// Token verification failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Token is not `payload.signature` or either part is not hex
    #[error("Malformed token")]
    Malformed,

    /// Signature does not match the payload
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Signature is valid but the payload is not a claims object
    #[error("Malformed token payload")]
    MalformedPayload,

    /// Token has expired
    #[error("Token expired at {expired_at} (current time: {current_time})")]
    Expired { expired_at: u64, current_time: u64 },
}

// =============================================================================
// Session Token Authentication
// =============================================================================

/// Issues and verifies session tokens with a server-held secret.
#[derive(Clone)]
pub struct SessionTokenAuth {
    /// Secret key for HMAC computation
    secret_key: Vec<u8>,
}

impl SessionTokenAuth {
    /// Create a new authenticator with the given secret key.
    pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
        Self {
            secret_key: secret_key.as_ref().to_vec(),
        }
    }

    /// Issue a token valid for [`SESSION_TTL`] from now.
    pub fn issue(&self, username: &str, admin: bool) -> String {
        self.issue_at(username, admin, now_secs())
    }

    /// Issue a token as if the current time were `issued_at`.
    pub fn issue_at(&self, username: &str, admin: bool, issued_at: u64) -> String {
        let claims = Claims {
            username: username.to_string(),
            admin,
            iat: issued_at,
            exp: issued_at + SESSION_TTL.as_secs(),
        };

        // Serializing a struct of strings, bools and integers cannot fail
        let json = serde_json::to_vec(&claims).unwrap_or_default();
        let payload = hex::encode(json);
        let signature = self.compute_signature(&payload);

        format!("{}.{}", payload, signature)
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, now_secs())
    }

    /// Verify a token as if the current time were `current_time`.
    pub fn verify_at(&self, token: &str, current_time: u64) -> Result<Claims, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        if payload.is_empty() || signature.contains('.') {
            return Err(TokenError::Malformed);
        }

        let provided_sig = hex::decode(signature).map_err(|_| TokenError::Malformed)?;
        let expected_sig = self.compute_mac(payload);

        if !bool::from(provided_sig.ct_eq(&expected_sig)) {
            return Err(TokenError::InvalidSignature);
        }

        let json = hex::decode(payload).map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&json).map_err(|_| TokenError::MalformedPayload)?;

        if current_time > claims.exp {
            return Err(TokenError::Expired {
                expired_at: claims.exp,
                current_time,
            });
        }

        Ok(claims)
    }

    fn compute_mac(&self, payload: &str) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret_key).expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    fn compute_signature(&self, payload: &str) -> String {
        hex::encode(self.compute_mac(payload))
    }
}

impl std::fmt::Debug for SessionTokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenAuth")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// =============================================================================
// Tests
// =============================================================================
