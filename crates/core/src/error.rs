use crate::billing::PaymentStatus;
use crate::types::DbId;

/// Why a bearer token was rejected.
///
/// The variants exist for server-side logging only. At the HTTP boundary
/// every variant collapses into the same 401 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("token does not match the expected format")]
    MalformedToken,

    #[error("no token with this prefix")]
    NotFound,

    #[error("token has been revoked")]
    Revoked,

    #[error("token owner is inactive")]
    UserInactive,

    #[error("token owner has not verified their email")]
    EmailUnverified,

    #[error("secret does not match stored hash")]
    BadSecret,
}

impl AuthFailure {
    /// Stable snake_case label used as a structured log field.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthFailure::MalformedToken => "malformed_token",
            AuthFailure::NotFound => "not_found",
            AuthFailure::Revoked => "revoked",
            AuthFailure::UserInactive => "user_inactive",
            AuthFailure::EmailUnverified => "email_unverified",
            AuthFailure::BadSecret => "bad_secret",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthFailure),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Cannot transition billing period from '{from}' to '{to}': {reason}")]
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
        reason: &'static str,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}
