//! One-time registration invite codes.

use rand::Rng;

use crate::types::Timestamp;

/// Length of a generated invite code.
pub const CODE_LENGTH: usize = 8;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a random upper-case alphanumeric invite code.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}

/// Whether a code can still be redeemed at `now`.
pub fn is_redeemable(
    is_active: bool,
    expires_at: Option<Timestamp>,
    used_at: Option<Timestamp>,
    now: Timestamp,
) -> bool {
    is_active && used_at.is_none() && expires_at.map_or(true, |exp| exp > now)
}
