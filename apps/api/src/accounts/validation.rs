use crate::auth::password::validate_password_strength;
use crate::errors::AppError;

/// Lower-cased and trimmed, as stored.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// One `@`, a non-empty local part and a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

pub fn validate_registration(name: &str, email: &str, password: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    if !is_valid_email(email) {
        return Err(AppError::Validation(
            "Please include a valid email".to_string(),
        ));
    }
    validate_password_strength(password).map_err(AppError::Validation)
}

pub fn validate_login(email: &str, password: &str) -> Result<(), AppError> {
    if !is_valid_email(email) {
        return Err(AppError::Validation(
            "Please include a valid email".to_string(),
        ));
    }
    if password.is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }
    Ok(())
}
