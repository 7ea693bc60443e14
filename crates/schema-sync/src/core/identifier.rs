//! Identifier quoting and type literal validation for DDL synthesis.
//!
//! Table and column names cannot be bound as statement parameters, so every
//! identifier that lands in DDL is validated and double-quoted here. Type
//! literals are structural (they are not quoted), so they are checked against
//! an allow-pattern instead: one or more words, an optional `(p)` or `(p, s)`
//! parameter list, optional trailing words, and an optional `[]` suffix.
//! Anything else is rejected before it reaches a statement.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Upper bound on identifier length across engines. Dialects narrow it:
/// - PostgreSQL: 63 bytes (longer names are silently truncated)
/// - H2: 256 characters
pub const MAX_IDENTIFIER_LENGTH: usize = 256;

/// Maximum type literal length.
const MAX_TYPE_LITERAL_LENGTH: usize = 64;

static TYPE_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z_][A-Za-z0-9_]*(?: [A-Za-z_][A-Za-z0-9_]*)*(?:\s*\(\s*\d+\s*(?:,\s*\d+\s*)?\))?(?: [A-Za-z_][A-Za-z0-9_]*)*(?:\[\])?$",
    )
    .expect("type literal pattern is valid")
});

/// Reasons an identifier or type literal is refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("identifier cannot be empty")]
    Empty,

    #[error("identifier contains null byte (possible injection attempt): {0:?}")]
    NullByte(String),

    #[error("identifier exceeds maximum length of {max} bytes (got {len} bytes)")]
    TooLong { max: usize, len: usize },

    #[error("type literal {0:?} is not an allowed type")]
    TypeLiteral(String),
}

/// Validate an identifier for security issues.
///
/// Rejects empty names, names containing null bytes and names longer than
/// [`MAX_IDENTIFIER_LENGTH`].
pub fn validate_identifier(name: &str) -> Result<(), IdentifierError> {
    validate_identifier_len(name, MAX_IDENTIFIER_LENGTH)
}

/// Like [`validate_identifier`], with an engine-specific byte limit.
pub fn validate_identifier_len(name: &str, max: usize) -> Result<(), IdentifierError> {
    let max = max.min(MAX_IDENTIFIER_LENGTH);
    if name.is_empty() {
        return Err(IdentifierError::Empty);
    }

    if name.contains('\0') {
        return Err(IdentifierError::NullByte(name.to_string()));
    }

    if name.len() > max {
        return Err(IdentifierError::TooLong {
            max,
            len: name.len(),
        });
    }

    Ok(())
}

/// Quote an identifier with double quotes, doubling embedded quotes.
///
/// Both supported dialects use SQL-standard delimited identifiers.
///
/// ```ignore
/// assert_eq!(quote_ident("users")?, "\"users\"");
/// assert_eq!(quote_ident("table\"name")?, "\"table\"\"name\"");
/// ```
pub fn quote_ident(name: &str) -> Result<String, IdentifierError> {
    quote_ident_len(name, MAX_IDENTIFIER_LENGTH)
}

/// Quote an identifier, refusing names longer than `max` bytes.
pub fn quote_ident_len(name: &str, max: usize) -> Result<String, IdentifierError> {
    validate_identifier_len(name, max)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Validate a column type literal against the allow-pattern.
///
/// Returns the trimmed literal on success.
pub fn validate_type_literal(literal: &str) -> Result<&str, IdentifierError> {
    let trimmed = literal.trim();
    if trimmed.is_empty()
        || trimmed.len() > MAX_TYPE_LITERAL_LENGTH
        || !TYPE_LITERAL.is_match(trimmed)
    {
        return Err(IdentifierError::TypeLiteral(literal.to_string()));
    }
    Ok(trimmed)
}
