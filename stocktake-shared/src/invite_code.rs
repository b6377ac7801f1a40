//! Invite code generation
//!
//! Invite codes are short tokens that people read off a screen and type into
//! another phone, so the alphabet leaves out characters that are easy to
//! confuse (`0`/`O`, `1`/`I`).
//!
//! # Format
//!
//! 6 characters from a 32-symbol alphabet: 32^6 ≈ 1.07 billion codes.
//!
//! A generated code is random, not unique. Callers pair it with a uniqueness
//! check and retry up to [`INVITE_CODE_MAX_ATTEMPTS`] times.
//!
//! # Example
//!
//! ```
//! use stocktake_shared::invite_code::{generate_invite_code, is_valid_invite_code, normalize_invite_code};
//!
//! let code = generate_invite_code();
//! assert_eq!(code.len(), 6);
//! assert!(is_valid_invite_code(&code));
//!
//! // Lookups are case-insensitive
//! assert_eq!(normalize_invite_code(&code.to_lowercase()), code);
//! ```

use rand::Rng;

/// Symbols an invite code is drawn from
pub const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of an invite code
pub const INVITE_CODE_LENGTH: usize = 6;

/// Attempts made to find an unused code before giving up
pub const INVITE_CODE_MAX_ATTEMPTS: usize = 10;

/// Generates a random invite code
pub fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();

    (0..INVITE_CODE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..INVITE_CODE_ALPHABET.len());
            INVITE_CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Normalizes user input into the stored form (trimmed, upper-case)
pub fn normalize_invite_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Checks that a code has the right length and only alphabet symbols
///
/// Input is normalized first, so lower-case codes are accepted.
pub fn is_valid_invite_code(code: &str) -> bool {
    let code = normalize_invite_code(code);

    code.len() == INVITE_CODE_LENGTH
        && code.bytes().all(|b| INVITE_CODE_ALPHABET.contains(&b))
}
