use validator::{Validate, ValidateEmail, ValidateLength, ValidationErrors};

use crate::error::{AppError, AppResult};

/// Widest `VARCHAR` column: names, emails, titles, usernames.
pub const TEXT_MAX: u64 = 255;
/// Ticket status and priority columns.
pub const LABEL_MAX: u64 = 50;

/// Runs the derived `#[validate(..)]` rules of a request body.
pub fn request<T: Validate>(value: &T) -> AppResult<()> {
    value
        .validate()
        .map_err(|errors| AppError::bad_request(describe(&errors)))
}

fn describe(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = match error.code.as_ref() {
                "email" => format!("{field} is not a valid email address"),
                "length" => format!("{field} is too long"),
                _ => format!("{field} is invalid"),
            };
            messages.push(message);
        }
    }
    messages.sort();
    messages.dedup();
    messages.join("; ")
}

/// Trims `value` and rejects it when nothing is left.
pub fn non_blank(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

pub fn max_length(field: &str, value: String, max: u64) -> AppResult<String> {
    if !value.validate_length(None, Some(max), None) {
        return Err(AppError::bad_request(format!("{field} is too long")));
    }
    Ok(value)
}

/// Email check for patched fields, where no request struct carries the rules.
pub fn email(value: String) -> AppResult<String> {
    if !value.validate_email() {
        return Err(AppError::bad_request("email is not a valid email address"));
    }
    max_length("email", value, TEXT_MAX)
}
