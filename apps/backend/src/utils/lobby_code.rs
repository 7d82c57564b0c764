//! Lobby code generation.
//!
//! Codes are short enough to read aloud: six characters from `A-Z0-9`.
//! Uniqueness against live lobbies is enforced by the coordinator, which
//! retries on collision.

use rand::Rng;

use crate::domain::rules::{LOBBY_CODE_ALPHABET, LOBBY_CODE_LEN};

/// Generate a lobby code from a caller-supplied RNG.
///
/// # Example
/// ```
/// use backend::utils::lobby_code::generate_lobby_code_with;
///
/// let code = generate_lobby_code_with(&mut rand::rng());
/// assert_eq!(code.len(), 6);
/// assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
/// ```
pub fn generate_lobby_code_with<R: Rng>(rng: &mut R) -> String {
    (0..LOBBY_CODE_LEN)
        .map(|_| LOBBY_CODE_ALPHABET[rng.random_range(0..LOBBY_CODE_ALPHABET.len())] as char)
        .collect()
}
