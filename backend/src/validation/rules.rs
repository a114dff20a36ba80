//! Common validation rules shared across request payloads.

use std::borrow::Cow;

use validator::ValidationError;

use crate::utils::time::parse_weekday_name;

pub const REASON_MIN_CHARS: usize = 10;
pub const REASON_MAX_CHARS: usize = 500;

fn error_with_message(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Validates employee codes.
///
/// Requirements:
/// - 1-50 characters
/// - Letters, digits, `-` and `_` only
pub fn validate_employee_code(code: &str) -> Result<(), ValidationError> {
    if code.is_empty() || code.chars().count() > 50 {
        return Err(error_with_message(
            "employee_code_invalid_length",
            "Employee ID must be 1-50 characters.",
        ));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(error_with_message(
            "employee_code_invalid_characters",
            "Employee ID may only contain letters, digits, '-' and '_'.",
        ));
    }
    Ok(())
}

/// Validates a weekend selection: at least one day, every entry a full day name.
pub fn validate_weekend_days(days: &[String]) -> Result<(), ValidationError> {
    if days.is_empty() {
        return Err(error_with_message(
            "weekend_days_empty",
            "Select at least one weekend day.",
        ));
    }
    if days.iter().any(|day| parse_weekday_name(day).is_none()) {
        return Err(error_with_message(
            "weekend_days_invalid",
            "Weekend days must be full day names such as 'friday'.",
        ));
    }
    Ok(())
}

/// Validates the justification attached to an attendance override.
pub fn validate_override_reason(reason: &str) -> Result<(), ValidationError> {
    let length = reason.trim().chars().count();
    if length == 0 {
        return Err(error_with_message(
            "reason_required",
            "A reason is required for any attendance override.",
        ));
    }
    if length < REASON_MIN_CHARS {
        return Err(error_with_message(
            "reason_too_short",
            "Please provide a detailed reason (at least 10 characters).",
        ));
    }
    if length > REASON_MAX_CHARS {
        return Err(error_with_message(
            "reason_too_long",
            "The reason may not be greater than 500 characters.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employee_code_accepts_common_formats() {
        assert!(validate_employee_code("EMP-0042").is_ok());
        assert!(validate_employee_code("ops_7").is_ok());
    }

    #[test]
    fn employee_code_rejects_spaces_and_empty() {
        assert!(validate_employee_code("").is_err());
        assert!(validate_employee_code("EMP 1").is_err());
        assert!(validate_employee_code(&"X".repeat(51)).is_err());
    }

    #[test]
    fn weekend_days_require_known_names() {
        assert!(validate_weekend_days(&["friday".into(), "Saturday".into()]).is_ok());
        assert!(validate_weekend_days(&["monday".into()]).is_ok());
        assert!(validate_weekend_days(&[]).is_err());
        assert!(validate_weekend_days(&["sat".into()]).is_err());
    }

    #[test]
    fn override_reason_boundaries() {
        let missing = validate_override_reason("   ").unwrap_err();
        assert_eq!(missing.code, "reason_required");

        let short = validate_override_reason("too short").unwrap_err();
        assert_eq!(short.code, "reason_too_short");

        assert!(validate_override_reason("Forgot badge").is_ok());
        assert!(validate_override_reason(&"a".repeat(500)).is_ok());
        assert_eq!(
            validate_override_reason(&"a".repeat(501)).unwrap_err().code,
            "reason_too_long"
        );
    }
}
