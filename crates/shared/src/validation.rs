//! Common validation utilities.

use validator::ValidationError;

use crate::clock::parse_calendar_date;

/// Validates that a string is non-empty after trimming.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates a `YYYY-MM-DD` calendar date string.
pub fn validate_calendar_date(value: &str) -> Result<(), ValidationError> {
    match parse_calendar_date(value) {
        Ok(_) => Ok(()),
        Err(_) => {
            let mut err = ValidationError::new("calendar_date");
            err.message = Some("Date must be a valid YYYY-MM-DD calendar date".into());
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("VIP guest").is_ok());
        assert!(validate_not_blank("  x  ").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("\t\n").is_err());
    }

    #[test]
    fn test_validate_not_blank_error_message() {
        let err = validate_not_blank("  ").unwrap_err();
        assert_eq!(err.message.unwrap().to_string(), "Value must not be blank");
    }

    #[test]
    fn test_validate_calendar_date() {
        assert!(validate_calendar_date("2025-03-15").is_ok());
        assert!(validate_calendar_date("2024-02-29").is_ok());
        assert!(validate_calendar_date("2025-02-30").is_err());
        assert!(validate_calendar_date("2025-13-01").is_err());
        assert!(validate_calendar_date("tomorrow").is_err());
    }

    #[test]
    fn test_validate_calendar_date_error_message() {
        let err = validate_calendar_date("2025-02-30").unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Date must be a valid YYYY-MM-DD calendar date"
        );
    }
}
