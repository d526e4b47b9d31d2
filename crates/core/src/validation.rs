//! Input validation utilities.
//!
//! This module contains functions for validating user inputs before they reach the
//! credential gate or the filesystem.

use crate::constants::MIN_PASSWORD_CHARS;
use crate::{CoreError, CoreResult};
use std::path::Path;

/// Validates a password against the length policy.
///
/// Length is counted in characters, not bytes, so `"пароль"` is six characters long.
///
/// # Errors
///
/// Returns `CoreError::PasswordTooShort` if the password has fewer than
/// [`MIN_PASSWORD_CHARS`] characters.
pub fn validate_password_policy(password: &str) -> CoreResult<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(CoreError::PasswordTooShort {
            min: MIN_PASSWORD_CHARS,
        });
    }
    Ok(())
}

/// Validates that a configured data directory is usable as a path.
///
/// # Errors
///
/// Returns `CoreError::InvalidInput` if the path is empty or names an existing
/// non-directory.
pub fn validate_data_dir(path: &Path) -> CoreResult<()> {
    if path.as_os_str().is_empty() {
        return Err(CoreError::InvalidInput(
            "data directory cannot be empty".into(),
        ));
    }

    if path.exists() && !path.is_dir() {
        return Err(CoreError::InvalidInput(format!(
            "data directory is not a directory: {}",
            path.display()
        )));
    }

    Ok(())
}
