// src/models/user.rs

use chrono::{Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// Represents the 'user_table' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub country_code: Option<String>,

    pub date_of_birth: NaiveDate,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new user (Registration).
///
/// Field validators run independently; `validate()` merges every violation
/// so the caller sees all of them in one response.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_contact))]
pub struct RegisterRequest {
    #[validate(length(
        min = 4,
        max = 50,
        message = "Username must be at least 4 characters long."
    ))]
    pub username: String,

    #[validate(email(message = "Invalid email format."))]
    pub email: Option<String>,

    #[validate(custom(function = validate_phone_number, message = "Invalid phone number format."))]
    pub phone_number: Option<String>,

    pub country_code: Option<String>,

    #[validate(custom(function = validate_date_of_birth))]
    pub date_of_birth: NaiveDate,

    #[validate(custom(function = validate_password_strength))]
    pub password: String,
}

/// DTO for user login. The identifier accepts an email address or a phone
/// number; anything containing '@' is treated as an email.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email_or_phone: String,
    pub password: String,
}

/// DTO for password reset. The target account comes from the verified
/// token principal, never from the body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(custom(function = validate_password_strength))]
    pub new_password: String,
}

/// At least one of {email, phone} must be present.
fn validate_contact(req: &RegisterRequest) -> Result<(), ValidationError> {
    if req.email.is_none() && req.phone_number.is_none() {
        return Err(ValidationError::new("contact_required")
            .with_message("Either email or phone number must be provided.".into()));
    }
    Ok(())
}

/// Complexity policy: at least 8 characters with an uppercase letter,
/// a digit, and one of `!@#$%^&*`. Checked character-wise since the
/// regex crate has no lookahead.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let long_enough = password.chars().count() >= 8;
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| "!@#$%^&*".contains(c));

    if long_enough && has_upper && has_digit && has_special {
        Ok(())
    } else {
        Err(ValidationError::new("weak_password").with_message(
            "Password must be at least 8 characters long, contain an uppercase letter, a special character, and a digit."
                .into(),
        ))
    }
}

/// International format: '+' followed by 7 to 15 digits.
pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    let mut chars = phone.chars();
    let plus = chars.next() == Some('+');
    let digits = chars.as_str();
    let digit_count = digits.chars().count();

    if plus && (7..=15).contains(&digit_count) && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone"))
    }
}

/// Registrants must be at least 16 years old.
pub fn validate_date_of_birth(date_of_birth: &NaiveDate) -> Result<(), ValidationError> {
    let today = Utc::now().date_naive();
    let sixteenth_birthday = date_of_birth
        .checked_add_months(Months::new(16 * 12))
        .unwrap_or(NaiveDate::MAX);

    if sixteenth_birthday > today {
        return Err(ValidationError::new("too_young")
            .with_message("You must be at least 16 years old.".into()));
    }
    Ok(())
}
