//! Short code generation and validation utilities.
//!
//! Codes are drawn from the OS CSPRNG and encoded as URL-safe base64 without
//! padding, so they cannot be enumerated and never need escaping in a path.

use base64::Engine as _;

/// Default number of characters in a generated short code.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Upper bound on code length accepted anywhere in the service.
pub const MAX_CODE_LENGTH: usize = 32;

/// Codes that would shadow fixed routes.
const RESERVED_CODES: &[&str] = &["api", "health"];

#[derive(Debug, thiserror::Error)]
pub enum CodeGenerationError {
    #[error("entropy source unavailable: {0}")]
    EntropySourceUnavailable(String),
}

/// Generates a random short code of exactly `length` characters.
///
/// Enough bytes are drawn to give every character a full 6 bits of entropy;
/// the encoded string is then cut to `length`.
///
/// # Errors
///
/// Returns [`CodeGenerationError::EntropySourceUnavailable`] if the system
/// random number generator fails. This is not retried here.
///
/// # Examples
///
/// ```ignore
/// let code = generate_code(6)?;
/// assert_eq!(code.len(), 6);
/// assert!(code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
/// ```
pub fn generate_code(length: usize) -> Result<String, CodeGenerationError> {
    let mut buffer = vec![0u8; (length * 6).div_ceil(8)];

    getrandom::fill(&mut buffer)
        .map_err(|e| CodeGenerationError::EntropySourceUnavailable(e.to_string()))?;

    let mut code = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&buffer);
    code.truncate(length);
    Ok(code)
}

/// Returns true if `code` could have been produced by [`generate_code`].
///
/// Used to answer junk paths with 404 without a store round-trip.
pub fn is_well_formed(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_CODE_LENGTH
        && code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Returns true if `code` must never be handed out.
pub fn is_reserved(code: &str) -> bool {
    RESERVED_CODES.contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_code_has_requested_length() {
        for length in [4, 6, 7, 8, 12, 32] {
            let code = generate_code(length).unwrap();
            assert_eq!(code.len(), length);
        }
    }

    #[test]
    fn test_generate_code_url_safe_characters() {
        for _ in 0..100 {
            let code = generate_code(DEFAULT_CODE_LENGTH).unwrap();
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
                "unexpected character in {code}"
            );
            assert!(!code.contains('='));
            assert!(is_well_formed(&code));
        }
    }

    #[test]
    fn test_generate_code_produces_distinct_codes() {
        let codes: HashSet<String> = (0..1000)
            .map(|_| generate_code(12).unwrap())
            .collect();

        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn test_well_formed_rejects_junk() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("abc/def"));
        assert!(!is_well_formed("abc def"));
        assert!(!is_well_formed("abc%20"));
        assert!(!is_well_formed(&"a".repeat(MAX_CODE_LENGTH + 1)));
        assert!(is_well_formed("aB3-_z"));
    }

    #[test]
    fn test_reserved_codes() {
        assert!(is_reserved("health"));
        assert!(is_reserved("api"));
        assert!(!is_reserved("abc123"));
    }
}
