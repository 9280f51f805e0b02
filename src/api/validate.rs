//! Request-body validation for users and courses.
//!
//! Rules run all at once: every failed rule contributes one human-readable
//! message, in field-declaration order, presence before format. Callers get
//! either the fully-validated fields or the complete message list.

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};

use crate::api::handlers::{courses::CoursePayload, users::UserPayload};

/// Validated account fields, ready for hashing and persistence.
#[derive(Debug)]
pub(crate) struct UserFields {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) email_address: String,
    pub(crate) password: SecretString,
}

/// Validated course fields, ready for persistence.
#[derive(Debug)]
pub(crate) struct CourseFields {
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) estimated_time: Option<String>,
    pub(crate) materials_needed: Option<String>,
    pub(crate) owner_id: i32,
}

pub(crate) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Validate an account payload.
///
/// # Errors
/// Returns the ordered message list when any rule fails.
pub(crate) fn user_fields(payload: UserPayload) -> Result<UserFields, Vec<String>> {
    let mut errors = Vec::new();

    let first_name = require(
        payload.first_name.as_deref(),
        "A first name is required",
        "Please provide a first name",
        &mut errors,
    );
    let last_name = require(
        payload.last_name.as_deref(),
        "A last name is required",
        "Please provide a last name",
        &mut errors,
    );
    let email_address = require(
        payload.email_address.as_deref(),
        "An email address is required",
        "Please provide an email address",
        &mut errors,
    );
    if let Some(email) = payload.email_address.as_deref() {
        if !valid_email(email) {
            errors.push("Please provide a valid email address".to_string());
        }
    }

    match payload.password.as_ref() {
        None => errors.push("A password is required".to_string()),
        Some(password) if password.expose_secret().is_empty() => {
            errors.push("Please provide a password".to_string());
        }
        Some(_) => {}
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    // All fields are present and non-empty once the error list is empty.
    Ok(UserFields {
        first_name: first_name.unwrap_or_default().to_string(),
        last_name: last_name.unwrap_or_default().to_string(),
        email_address: email_address.unwrap_or_default().to_string(),
        password: payload.password.unwrap_or_else(|| SecretString::from(String::new())),
    })
}

/// Validate a course payload.
///
/// # Errors
/// Returns the ordered message list when any rule fails.
pub(crate) fn course_fields(payload: CoursePayload) -> Result<CourseFields, Vec<String>> {
    let mut errors = Vec::new();

    let title = require(
        payload.title.as_deref(),
        "A title is required",
        "Please provide a title",
        &mut errors,
    );
    let description = require(
        payload.description.as_deref(),
        "A description is required",
        "Please provide a description",
        &mut errors,
    );

    if payload.owner_id.is_none() {
        errors.push("An owner ID is required".to_string());
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(CourseFields {
        title: title.unwrap_or_default().to_string(),
        description: description.unwrap_or_default().to_string(),
        estimated_time: payload.estimated_time,
        materials_needed: payload.materials_needed,
        owner_id: payload.owner_id.unwrap_or_default(),
    })
}

/// Presence then non-empty check; pushes at most one message per rule.
fn require<'a>(
    value: Option<&'a str>,
    missing: &str,
    empty: &str,
    errors: &mut Vec<String>,
) -> Option<&'a str> {
    match value {
        None => {
            errors.push(missing.to_string());
            None
        }
        Some(s) if s.is_empty() => {
            errors.push(empty.to_string());
            Some(s)
        }
        Some(s) => Some(s),
    }
}
