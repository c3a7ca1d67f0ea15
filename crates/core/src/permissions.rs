//! Capability predicates evaluated against an authenticated principal.
//!
//! Each rule is a plain `fn(&Principal) -> bool`. Handlers combine the rules
//! they need with [`require`] instead of inheriting a permission class.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

/// How the caller proved their identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Short-lived login JWT.
    Session,
    /// Long-lived API bearer token.
    ApiToken { token_id: DbId },
}

/// The authenticated caller as seen by permission checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: DbId,
    pub is_active: bool,
    pub is_staff: bool,
    pub email_verified: bool,
    pub method: AuthMethod,
}

impl Principal {
    /// The API token used for this request, if any.
    pub fn token_id(&self) -> Option<DbId> {
        match self.method {
            AuthMethod::ApiToken { token_id } => Some(token_id),
            AuthMethod::Session => None,
        }
    }
}

/// A single named capability rule.
pub type Rule = (fn(&Principal) -> bool, &'static str);

pub fn is_active(p: &Principal) -> bool {
    p.is_active
}

pub fn is_email_verified(p: &Principal) -> bool {
    p.email_verified
}

pub fn is_token_authenticated(p: &Principal) -> bool {
    matches!(p.method, AuthMethod::ApiToken { .. })
}

pub fn is_staff(p: &Principal) -> bool {
    p.is_staff
}

pub const ACTIVE: Rule = (is_active, "Account is deactivated");
pub const EMAIL_VERIFIED: Rule = (is_email_verified, "Email address is not verified");
pub const TOKEN_AUTHENTICATED: Rule = (
    is_token_authenticated,
    "This endpoint requires API token authentication",
);
pub const STAFF: Rule = (is_staff, "Staff access required");

/// Evaluate `rules` in order; the first failing rule becomes a 403.
pub fn require(principal: &Principal, rules: &[Rule]) -> Result<(), CoreError> {
    match rules.iter().find(|(check, _)| !check(principal)) {
        Some((_, message)) => Err(CoreError::Forbidden((*message).to_string())),
        None => Ok(()),
    }
}
