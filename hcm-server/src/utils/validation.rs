//! Input validation helpers
//!
//! Text length limits and the glue between `validator` derive errors and
//! [`AppError`]. SQLite TEXT has no built-in length enforcement.

use validator::Validate;

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Names: people, departments, designations, documents
pub const MAX_NAME_LEN: usize = 200;

/// Reasons, notes, rejection reasons
pub const MAX_NOTE_LEN: usize = 1000;

/// Short identifiers: employee code, phone, currency, country
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// URLs (documents, avatars)
pub const MAX_URL_LEN: usize = 2048;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
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
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Validate an amount of money: finite and not negative
pub fn validate_amount(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}

/// Minimal email shape check for fields outside `validator` DTOs
pub fn validate_email(value: &str, field: &str) -> Result<(), AppError> {
    validate_required_text(value, field, MAX_EMAIL_LEN)?;
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AppError::validation(format!("{field} is not a valid email"))),
    }
}

/// Run `validator` derive rules, folding field errors into one message
///
/// Each field's first message lands in `details` under the field name.
pub fn validate_dto<T: Validate>(dto: &T) -> Result<(), AppError> {
    let Err(errors) = dto.validate() else {
        return Ok(());
    };

    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let mut err = AppError::validation("Validation failed");
    let mut first_message = None;
    for (field, field_errors) in fields {
        let message = field_errors
            .first()
            .and_then(|e| e.message.as_ref())
            .map(|m| m.to_string())
            .unwrap_or_else(|| format!("{field} is invalid"));
        if first_message.is_none() {
            first_message = Some(message.clone());
        }
        err = err.with_detail(field.to_string(), message);
    }
    if let Some(message) = first_message {
        err.message = message;
    }
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::LoginRequest;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Engineering", "department", MAX_NAME_LEN).is_ok());
        assert!(validate_required_text("   ", "department", MAX_NAME_LEN).is_err());
        let long = "x".repeat(MAX_SHORT_TEXT_LEN + 1);
        assert!(validate_required_text(&long, "employee_code", MAX_SHORT_TEXT_LEN).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(&None, "notes", MAX_NOTE_LEN).is_ok());
        let long = Some("x".repeat(MAX_NOTE_LEN + 1));
        assert!(validate_optional_text(&long, "notes", MAX_NOTE_LEN).is_err());
    }

    #[test]
    fn test_amount() {
        assert!(validate_amount(0.0, "basic_salary").is_ok());
        assert!(validate_amount(-1.0, "basic_salary").is_err());
        assert!(validate_amount(f64::NAN, "basic_salary").is_err());
        assert!(validate_amount(f64::INFINITY, "basic_salary").is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("asha@acme.test", "email").is_ok());
        assert!(validate_email("asha", "email").is_err());
        assert!(validate_email("@acme.test", "email").is_err());
    }

    #[test]
    fn test_validate_dto_collects_fields() {
        let req = LoginRequest {
            email: "nope".into(),
            password: "".into(),
        };
        let err = validate_dto(&req).unwrap_err();
        assert_eq!(err.code, shared::ErrorCode::ValidationFailed);
        assert_eq!(err.message, "Invalid email address");
        let details = err.details.unwrap();
        assert!(details.contains_key("email"));
        assert!(details.contains_key("password"));
    }
}
