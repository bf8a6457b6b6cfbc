//! Input checks run before a request is sent. They mirror the backend rules so
//! obvious mistakes are reported without a round trip; the backend still
//! validates everything.

use regex::Regex;
use thiserror::Error;

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 50;
pub const PASSWORD_MIN_CHARS: usize = 8;
pub const TOTP_DIGITS: usize = 6;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Username must be between {} and {} characters", USERNAME_MIN_CHARS, USERNAME_MAX_CHARS)]
    UsernameLength,
    #[error("Invalid email format")]
    Email,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least {} characters long", PASSWORD_MIN_CHARS)]
    PasswordTooShort,
    #[error("Password must contain at least one digit")]
    PasswordMissingDigit,
    #[error("Password must contain at least one lowercase letter")]
    PasswordMissingLowercase,
    #[error("Password must contain at least one uppercase letter")]
    PasswordMissingUppercase,
    #[error("Code must be {} digits", TOTP_DIGITS)]
    TotpCode,
}

/// # Errors
/// Returns [`ValidationError::UsernameLength`] outside 3..=50 characters.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let length = username.trim().chars().count();
    if (USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&length) {
        Ok(())
    } else {
        Err(ValidationError::UsernameLength)
    }
}

/// Normalizes (trim, lowercase) and checks an email address.
///
/// # Errors
/// Returns [`ValidationError::Email`] if the address is malformed.
pub fn normalize_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim().to_lowercase();
    if Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .is_ok_and(|regex| regex.is_match(&email))
    {
        Ok(email)
    } else {
        Err(ValidationError::Email)
    }
}

/// Checks the password policy, reporting the first rule that fails.
///
/// # Errors
/// Returns the failing rule.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < PASSWORD_MIN_CHARS {
        return Err(ValidationError::PasswordTooShort);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PasswordMissingDigit);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ValidationError::PasswordMissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::PasswordMissingUppercase);
    }
    Ok(())
}

/// Validates the registration form. The confirmation is compared before the
/// password policy is applied. Returns the normalized email.
///
/// # Errors
/// Returns the first failing check.
pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<String, ValidationError> {
    validate_username(username)?;
    let email = normalize_email(email)?;
    if password != confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    validate_password(password)?;
    Ok(email)
}

/// Trims a TOTP code and checks it is six digits.
///
/// # Errors
/// Returns [`ValidationError::TotpCode`] otherwise.
pub fn normalize_totp_code(code: &str) -> Result<String, ValidationError> {
    let code: String = code.chars().filter(|c| !c.is_whitespace()).collect();
    if code.len() == TOTP_DIGITS && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(code)
    } else {
        Err(ValidationError::TotpCode)
    }
}
