//! SQL identifier validation.
//!
//! Table and column names reach SQL text unquoted, so every name that comes
//! from a request must match `^[A-Za-z_][A-Za-z0-9_]*$` before use.

/// Maximum identifier length accepted (MySQL's own limit).
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Check whether `name` is a safe, unquoted SQL identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= MAX_IDENTIFIER_LEN && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
