use validator::ValidateEmail;

use super::FieldError;

pub const MAX_EMAIL_LENGTH: usize = 255;

/// Validate a single mailbox address and return it trimmed.
pub fn validate_email(raw: &str) -> Result<String, FieldError> {
    let candidate = raw.trim().to_string();

    if candidate.chars().count() > MAX_EMAIL_LENGTH {
        return Err(FieldError::EmailTooLong);
    }

    if !candidate.validate_email() {
        return Err(FieldError::InvalidEmail);
    }

    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_addresses() {
        assert_eq!(
            validate_email("lead1@example.com").unwrap(),
            "lead1@example.com"
        );
        assert_eq!(
            validate_email("  maria.silva+crm@clinic.com.br ").unwrap(),
            "maria.silva+crm@clinic.com.br"
        );
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(validate_email("not-an-email"), Err(FieldError::InvalidEmail));
        assert_eq!(validate_email("a@"), Err(FieldError::InvalidEmail));
        assert_eq!(
            validate_email("one@example.com, two@example.com"),
            Err(FieldError::InvalidEmail)
        );
    }

    #[test]
    fn test_rejects_too_long() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(validate_email(&long), Err(FieldError::EmailTooLong));
    }
}
