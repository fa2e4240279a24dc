//! Utility functions for validating and sanitizing model identifiers

/// Check whether an identifier is valid for serialized models.
///
/// Valid identifiers start with a letter or underscore and contain only
/// letters, digits, and underscores.
pub fn is_valid_id(id: &str) -> bool {
    let mut chars = id.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

/// Format an identifier so that [`is_valid_id`] holds.
///
/// A run of invalid characters collapses into a single underscore, and an
/// identifier starting with a digit gains a leading underscore.
///
/// # Examples
/// ```rust
/// use genrecon_core::utils::ids::sanitize_id;
/// assert_eq!(sanitize_id("a_valid_id"), "a_valid_id");
/// assert_eq!(sanitize_id("an invalid--id #3"), "an_invalid_id_3");
/// assert_eq!(sanitize_id("3-atp"), "_3_atp");
/// ```
pub fn sanitize_id(id: &str) -> String {
    let mut sanitized = String::with_capacity(id.len() + 1);
    if id.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        sanitized.push('_');
    }
    let mut in_invalid_run = false;
    for c in id.chars() {
        if c == '_' || c.is_alphanumeric() {
            sanitized.push(c);
            in_invalid_run = false;
        } else if !in_invalid_run {
            sanitized.push('_');
            in_invalid_run = true;
        }
    }
    sanitized
}
