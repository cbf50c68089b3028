//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! Every failure names the offending field in `details.field`.

use shared::error::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product, category, table location, role, user, currency, etc.
pub const MAX_NAME_LEN: usize = 200;

/// Notes, descriptions, reasons (order note, movement reason, etc.)
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: product code, username, slugs, color codes, symbols
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

// ── Validation helpers (CRUD handlers) ──────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::invalid_field(
            field,
            format!("{field} must not be empty"),
        ));
    }
    if value.len() > max_len {
        return Err(AppError::invalid_field(
            field,
            format!("{field} is too long ({} chars, max {max_len})", value.len()),
        ));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::invalid_field(
            field,
            format!("{field} is too long ({} chars, max {max_len})", v.len()),
        ));
    }
    Ok(())
}

/// Validate a `#rrggbb` / `#rgb` color
pub fn validate_color(value: &Option<String>, field: &str) -> Result<(), AppError> {
    let Some(color) = value else {
        return Ok(());
    };
    let hex = color.strip_prefix('#').unwrap_or("");
    let valid = matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(AppError::invalid_field(
            field,
            format!("{field} must be a hex color like #ff6600"),
        ));
    }
    Ok(())
}

/// Validate a slug (`[a-z0-9_:-]+`), used for role slugs and permissions
pub fn validate_slug(value: &str, field: &str) -> Result<(), AppError> {
    validate_required_text(value, field, MAX_SHORT_TEXT_LEN)?;
    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | ':' | '*'))
    {
        return Err(AppError::invalid_field(
            field,
            format!("{field} may only contain lowercase letters, digits, '_', '-', ':' and '*'"),
        ));
    }
    Ok(())
}
