//! Credential validation and phone number canonicalization.
//!
//! Phone numbers are canonicalized to one fixed international form
//! (`+90` followed by the national digits) before they ever reach the
//! network. Validation runs strictly before the login request, so invalid
//! input never produces a network side effect.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Country calling code for Türkiye.
const COUNTRY_CODE: &str = "90";
/// Digits in a national subscriber number (`5XX XXX XX XX`).
const NATIONAL_DIGITS: usize = 10;
/// Upper bound on user-entered digits (trunk zero + national number).
const MAX_INPUT_DIGITS: usize = 11;

/// A phone number in its single canonical form, e.g. `+905551234567`.
///
/// Re-normalizing a canonical value yields the same value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedPhone(String);

impl NormalizedPhone {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw login input as entered by the user.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub phone: String,
    pub password: String,
}

/// Client-side input rejection. Never reaches the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Phone field is empty.
    MissingPhone,
    /// Password field is empty.
    MissingPassword,
    /// Cleaned digit count is below the national number length.
    PhoneTooShort,
    /// No digits at all, or more digits than any valid input can carry.
    InvalidPhone,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingPhone => write!(f, "Please enter your phone number"),
            ValidationError::MissingPassword => write!(f, "Please enter your password"),
            ValidationError::PhoneTooShort => write!(f, "Please enter a valid phone number"),
            ValidationError::InvalidPhone => write!(f, "Phone number is not valid"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Canonicalizes a user-entered phone number.
///
/// Strips every non-digit character, drops the national trunk `0`, and
/// prefixes the country calling code. A 12-digit string that already
/// starts with `90` is treated as canonical, which makes normalization
/// idempotent on its own output.
pub fn normalize_phone(raw: &str) -> Result<NormalizedPhone, ValidationError> {
    let cleaned: String = raw.chars().filter(char::is_ascii_digit).collect();

    if cleaned.is_empty() {
        return Err(ValidationError::InvalidPhone);
    }

    // Already carries the country code (e.g. a pasted "+90 555 123 45 67").
    if let Some(rest) = cleaned.strip_prefix(COUNTRY_CODE)
        && rest.len() == NATIONAL_DIGITS
    {
        return Ok(NormalizedPhone(format!("+{cleaned}")));
    }

    if cleaned.len() > MAX_INPUT_DIGITS {
        return Err(ValidationError::InvalidPhone);
    }

    let national = cleaned.strip_prefix('0').unwrap_or(&cleaned);
    Ok(NormalizedPhone(format!("+{COUNTRY_CODE}{national}")))
}

/// Validates raw credentials before any network call.
pub fn validate(credentials: &Credentials) -> Result<(), ValidationError> {
    if credentials.phone.trim().is_empty() {
        return Err(ValidationError::MissingPhone);
    }
    if credentials.password.trim().is_empty() {
        return Err(ValidationError::MissingPassword);
    }

    let digits = credentials
        .phone
        .chars()
        .filter(char::is_ascii_digit)
        .count();
    if digits < NATIONAL_DIGITS {
        return Err(ValidationError::PhoneTooShort);
    }

    Ok(())
}
