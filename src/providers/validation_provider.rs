use std::borrow::Cow;

use validator::{Validate, ValidationError};

use crate::errors::InternalError;
use crate::types::internal::FieldErrors;

const PASSWORD_SYMBOLS: &str = "@$!%*#?&";

/// Password must mix upper and lower case letters, a digit and a symbol
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));

    if has_upper && has_lower && has_digit && has_symbol {
        return Ok(());
    }

    let mut error = ValidationError::new("password_strength");
    error.message = Some(Cow::Borrowed(
        "The new password must contain an uppercase letter, a lowercase letter, a number and a symbol (@$!%*#?&).",
    ));
    Err(error)
}

/// Run derive rules on a request and convert failures to field errors
pub fn validate_request<T: Validate>(request: &T) -> Result<(), InternalError> {
    request
        .validate()
        .map_err(|errors| InternalError::Validation(FieldErrors::from(errors)))
}

/// Same as `validate_request` but keeps collecting into an existing map
pub fn collect_request_errors<T: Validate>(request: &T, errors: &mut FieldErrors) {
    if let Err(validation) = request.validate() {
        errors.merge(FieldErrors::from(validation));
    }
}

/// Trim and drop empty optional text
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
