// Règles de validation partagées (email, mot de passe, téléphone, dates)

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::ApiError;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MIN_PHONE_LENGTH: usize = 10;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn ensure_email(email: &str) -> Result<(), ApiError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(ApiError::validation("Invalid email format"))
    }
}

/// Au moins 8 caractères, une majuscule et un chiffre
pub fn ensure_strong_password(password: &str) -> Result<(), ApiError> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LENGTH;
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && has_upper && has_digit {
        Ok(())
    } else {
        Err(ApiError::validation(
            "Password must contain at least 8 characters, one uppercase letter and one digit",
        ))
    }
}

pub fn ensure_phone(phone: &str) -> Result<(), ApiError> {
    if phone.chars().count() >= MIN_PHONE_LENGTH {
        Ok(())
    } else {
        Err(ApiError::validation("Invalid phone number (at least 10 characters)"))
    }
}

/// Date au format "YYYY-MM-DD"
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("{} must be a date (YYYY-MM-DD)", field)))
}
