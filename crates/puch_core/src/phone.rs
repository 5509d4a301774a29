//! Phone number normalization and message id derivation.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{7,15}$").expect("static regex"))
}

/// Normalize a user-supplied phone number to bare digits.
///
/// Accepts:
/// - `919876543210` -> `919876543210`
/// - `+91 98765-43210` -> `919876543210`
/// - `(91) 98765 43210` -> `919876543210`
///
/// Returns `None` unless the result is 7-15 digits.
pub fn normalize_phone(s: &str) -> Option<String> {
    let trimmed = s.trim();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    digits_re().is_match(&cleaned).then_some(cleaned)
}

/// Build the `msg_{phone}_{n}` receipt id, with `n` derived from a SHA-256 of the message.
pub fn message_id(phone: &str, message: &str) -> String {
    let digest = Sha256::digest(message.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    format!("msg_{}_{}", phone, u64::from_be_bytes(head) % 10_000)
}
