use crate::error::extguard_error::ExtguardError;
use crate::error::extguard_error_enums::{ExtguardErrorKind, InvalidInputError};
use crate::policy::extension_policy::{MAX_EXTENSION_NAME_LENGTH, MAX_FILE_SIZE_LIMIT_MB};

/// Checks a custom extension name and returns it lower-cased.
/// Length is checked before format, so an empty name is a length error.
pub fn validate_custom_extension(raw: &str) -> Result<String, ExtguardError> {
    if raw.is_empty() || raw.chars().count() > MAX_EXTENSION_NAME_LENGTH {
        return Err(ExtguardError::invalid_input(InvalidInputError::ExtensionLength));
    }

    if !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ExtguardError::invalid_input(InvalidInputError::ExtensionFormat));
    }

    Ok(raw.to_ascii_lowercase())
}

pub fn validate_size_limit(limit_mb: i64) -> Result<i64, ExtguardError> {
    if !(0..=MAX_FILE_SIZE_LIMIT_MB).contains(&limit_mb) {
        return Err(ExtguardError::new(
            ExtguardErrorKind::InvalidInput(InvalidInputError::SizeLimitRange),
            format!("Size limit {} is outside 0-{}", limit_mb, MAX_FILE_SIZE_LIMIT_MB),
        ));
    }
    Ok(limit_mb)
}

/// Extension names coming from paths and fixed lookups are only normalized, not validated
pub fn normalize_extension_name(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_prefix('.').unwrap_or(trimmed).to_ascii_lowercase()
}
