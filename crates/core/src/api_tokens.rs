//! API token format, generation, and verification.
//!
//! A token looks like `tok_` followed by [`SECRET_LENGTH`] alphanumeric
//! characters. The first [`PREFIX_LENGTH`] characters (marker included) are
//! stored in the clear as the lookup prefix; the full string is stored only
//! as an Argon2id hash.

use rand::Rng;

use crate::error::AuthFailure;
use crate::hashing::{hash_secret, verify_secret};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Fixed marker every token starts with.
pub const TOKEN_MARKER: &str = "tok_";

/// Number of random characters after the marker.
pub const SECRET_LENGTH: usize = 43;

/// Total length of a plaintext token.
pub const TOKEN_LENGTH: usize = TOKEN_MARKER.len() + SECRET_LENGTH;

/// Length of the unhashed lookup prefix (marker + 8 random characters).
pub const PREFIX_LENGTH: usize = 12;

/// Maximum length of a token's display name.
pub const MAX_NAME_LENGTH: usize = 100;

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// The result of minting a new token.
pub struct GeneratedToken {
    /// The plaintext token (shown to the user exactly once, never stored).
    pub plaintext: String,
    /// The first [`PREFIX_LENGTH`] characters, stored for indexed lookup.
    pub prefix: String,
    /// The Argon2id PHC hash of the full plaintext.
    pub hash: String,
}

impl std::fmt::Debug for GeneratedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedToken")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Generate a new random token using the thread-local CSPRNG.
pub fn generate_token() -> Result<GeneratedToken, argon2::password_hash::Error> {
    let secret: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(SECRET_LENGTH)
        .map(char::from)
        .collect();

    let plaintext = format!("{TOKEN_MARKER}{secret}");
    let prefix = plaintext[..PREFIX_LENGTH].to_string();
    let hash = hash_secret(&plaintext)?;

    Ok(GeneratedToken {
        plaintext,
        prefix,
        hash,
    })
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Check the shape of a presented bearer string without touching storage.
///
/// Returns the lookup prefix on success.
pub fn parse_bearer(token: &str) -> Result<&str, AuthFailure> {
    let well_formed = token.len() == TOKEN_LENGTH
        && token.starts_with(TOKEN_MARKER)
        && token[TOKEN_MARKER.len()..]
            .bytes()
            .all(|b| b.is_ascii_alphanumeric());

    if well_formed {
        Ok(&token[..PREFIX_LENGTH])
    } else {
        Err(AuthFailure::MalformedToken)
    }
}

/// Whether a bearer string claims to be an API token (as opposed to a
/// session JWT). Only the marker is inspected.
pub fn looks_like_api_token(bearer: &str) -> bool {
    bearer.starts_with(TOKEN_MARKER)
}

/// Verify a presented token against its stored hash.
///
/// An unparseable stored hash is treated as a mismatch.
pub fn verify_token(plaintext: &str, stored_hash: &str) -> Result<(), AuthFailure> {
    match verify_secret(plaintext, stored_hash) {
        Ok(true) => Ok(()),
        Ok(false) | Err(_) => Err(AuthFailure::BadSecret),
    }
}

/// Validate a caller-supplied token name.
pub fn validate_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Token name must not be empty".into());
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(format!(
            "Token name must be at most {MAX_NAME_LENGTH} characters"
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- Generation --------------------------------------------------------

    #[test]
    fn generated_token_has_fixed_shape() {
        let token = generate_token().unwrap();
        assert_eq!(token.plaintext.len(), TOKEN_LENGTH);
        assert!(token.plaintext.starts_with(TOKEN_MARKER));
        assert_eq!(token.prefix.len(), PREFIX_LENGTH);
        assert_eq!(&token.plaintext[..PREFIX_LENGTH], token.prefix);
    }

    #[test]
    fn generated_token_passes_format_check() {
        let token = generate_token().unwrap();
        assert_eq!(parse_bearer(&token.plaintext), Ok(token.prefix.as_str()));
    }

    #[test]
    fn generated_tokens_differ() {
        let a = generate_token().unwrap();
        let b = generate_token().unwrap();
        assert_ne!(a.plaintext, b.plaintext);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn debug_output_hides_plaintext_and_hash() {
        let token = generate_token().unwrap();
        let debug = format!("{token:?}");
        assert!(!debug.contains(&token.plaintext));
        assert!(!debug.contains(&token.hash));
    }

    // -- Round trip --------------------------------------------------------

    #[test]
    fn fresh_plaintext_verifies_against_its_hash() {
        let token = generate_token().unwrap();
        assert_eq!(verify_token(&token.plaintext, &token.hash), Ok(()));
    }

    #[test]
    fn other_strings_do_not_verify() {
        let token = generate_token().unwrap();
        let other = generate_token().unwrap();

        let mut flipped = token.plaintext.clone();
        let last = flipped.pop().unwrap();
        flipped.push(if last == 'a' { 'b' } else { 'a' });

        for candidate in [other.plaintext.as_str(), flipped.as_str(), "", "tok_"] {
            assert_eq!(
                verify_token(candidate, &token.hash),
                Err(AuthFailure::BadSecret),
                "{candidate:?} must not verify"
            );
        }
    }

    #[test]
    fn corrupt_stored_hash_is_bad_secret() {
        let token = generate_token().unwrap();
        assert_eq!(
            verify_token(&token.plaintext, "corrupt"),
            Err(AuthFailure::BadSecret)
        );
    }

    // -- Format check ------------------------------------------------------

    #[test]
    fn wrong_marker_is_malformed() {
        let body = "a".repeat(SECRET_LENGTH);
        assert_eq!(
            parse_bearer(&format!("key_{body}")),
            Err(AuthFailure::MalformedToken)
        );
    }

    #[test]
    fn wrong_length_is_malformed() {
        let short = format!("{TOKEN_MARKER}{}", "a".repeat(SECRET_LENGTH - 1));
        let long = format!("{TOKEN_MARKER}{}", "a".repeat(SECRET_LENGTH + 1));
        assert_eq!(parse_bearer(&short), Err(AuthFailure::MalformedToken));
        assert_eq!(parse_bearer(&long), Err(AuthFailure::MalformedToken));
        assert_eq!(parse_bearer(""), Err(AuthFailure::MalformedToken));
    }

    #[test]
    fn non_alphanumeric_body_is_malformed() {
        let mut body = "a".repeat(SECRET_LENGTH - 1);
        body.push('-');
        assert_eq!(
            parse_bearer(&format!("{TOKEN_MARKER}{body}")),
            Err(AuthFailure::MalformedToken)
        );
    }

    #[test]
    fn multibyte_input_is_malformed_not_a_panic() {
        let body = "é".repeat(SECRET_LENGTH / 2) + "a";
        let token = format!("{TOKEN_MARKER}{body}");
        assert_eq!(parse_bearer(&token), Err(AuthFailure::MalformedToken));
    }

    #[test]
    fn marker_detection() {
        assert!(looks_like_api_token("tok_abc"));
        assert!(!looks_like_api_token("eyJhbGciOiJIUzI1NiJ9.x.y"));
    }

    // -- Names -------------------------------------------------------------

    #[test]
    fn name_validation() {
        assert!(validate_name("ci").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LENGTH)).is_ok());
        assert!(validate_name(&"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }
}
