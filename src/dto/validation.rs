//! Validation helpers for DTOs.

use validator::ValidationError;

const MAX_NAME_LENGTH: usize = 30;

/// Validates a leaderboard name: non-blank, at most 30 characters, no
/// control characters.
pub fn validate_leaderboard_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("leaderboard_name_blank");
        err.message = Some("Leaderboard name must not be blank".into());
        return Err(err);
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        let mut err = ValidationError::new("leaderboard_name_length");
        err.message = Some(
            format!(
                "Leaderboard name must be at most {MAX_NAME_LENGTH} characters (got {})",
                name.chars().count()
            )
            .into(),
        );
        return Err(err);
    }

    if name.chars().any(char::is_control) {
        let mut err = ValidationError::new("leaderboard_name_format");
        err.message = Some("Leaderboard name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}
