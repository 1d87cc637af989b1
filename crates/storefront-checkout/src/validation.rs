//! Checkout form validation

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub const NAME_REQUIRED: &str = "Please enter your name or nickname";
pub const NAME_TOO_SHORT: &str = "Name must be at least 2 characters";
pub const EMAIL_REQUIRED: &str = "Please enter your email";
pub const EMAIL_INVALID: &str = "Please enter a valid email";

const MIN_NAME_CHARS: usize = 2;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Field-level form errors
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'static str>,
}

impl FormErrors {
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.name.into_iter().chain(self.email).collect();
        f.write_str(&messages.join("; "))
    }
}

pub fn validate_name(name: &str) -> Option<&'static str> {
    let name = name.trim();
    if name.is_empty() {
        Some(NAME_REQUIRED)
    } else if name.chars().count() < MIN_NAME_CHARS {
        Some(NAME_TOO_SHORT)
    } else {
        None
    }
}

pub fn validate_email(email: &str) -> Option<&'static str> {
    if email.trim().is_empty() {
        Some(EMAIL_REQUIRED)
    } else if !EMAIL_RE.is_match(email) {
        Some(EMAIL_INVALID)
    } else {
        None
    }
}

/// Validate both fields, collecting every failure
pub fn validate_form(name: &str, email: &str) -> Result<(), FormErrors> {
    let errors = FormErrors {
        name: validate_name(name),
        email: validate_email(email),
    };
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
