//! Validation of user-supplied names before they reach the filesystem or
//! the check registry.

use std::path::Path;

use regex::Regex;

/// Maximum allowed length of a script name.
pub const MAX_SCRIPT_NAME_LENGTH: usize = 128;

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Validates that a script file stem is identifier-like.
///
/// Scripts are named after the page or resource they exercise, so only
/// `[a-zA-Z]\w*` is accepted.
///
/// ```
/// use rexsl::validation::validate_script_name;
///
/// assert!(validate_script_name("HomePage").is_ok());
/// assert!(validate_script_name("2fast").is_err());
/// assert!(validate_script_name("../etc").is_err());
/// ```
pub fn validate_script_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("script name cannot be empty".to_string());
    }
    if name.len() > MAX_SCRIPT_NAME_LENGTH {
        return Err(format!(
            "script name too long: {} characters (max {MAX_SCRIPT_NAME_LENGTH})",
            name.len()
        ));
    }
    if !is_identifier(name) {
        return Err(format!(
            "script name '{name}' is not an identifier, use a letter followed by letters, digits or underscores"
        ));
    }
    Ok(())
}

/// Stem of a script path, validated with [`validate_script_name`].
pub fn script_name(path: &Path) -> Result<String, String> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| format!("'{}' has no usable file name", path.display()))?;
    validate_script_name(stem)?;
    Ok(stem.to_string())
}

/// Clap value parser for check lists: must not be blank.
pub fn clap_check_validator(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("check list cannot be empty".to_string());
    }
    Ok(trimmed.to_string())
}

/// Clap value parser for scope expressions: must compile as a regex.
pub fn clap_scope_validator(s: &str) -> Result<String, String> {
    Regex::new(s).map_err(|e| format!("invalid scope expression: {e}"))?;
    Ok(s.to_string())
}
