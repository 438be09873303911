//! Record validation.

use crate::models::{is_truthy, StudentRecord, REQUIRED_FIELDS};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$";

/// Why a record was excluded from the final set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Required fields that were absent or falsy.
    MissingFields(Vec<&'static str>),
    /// The email did not match the expected shape.
    InvalidEmail(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingFields(fields) => {
                write!(f, "missing required fields: {}", fields.join(", "))
            }
            RejectReason::InvalidEmail(email) => write!(f, "invalid email format: {}", email),
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email regex"))
}

/// Returns true if `email` has the shape `local@domain.tld`.
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Validates one record.
pub fn validate_student_record(record: &StudentRecord) -> Result<(), RejectReason> {
    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !record.get(field).map(is_truthy).unwrap_or(false))
        .collect();

    if !missing.is_empty() {
        return Err(RejectReason::MissingFields(missing));
    }

    match record.get_str("email") {
        Some(email) if is_valid_email(email) => Ok(()),
        Some(email) => Err(RejectReason::InvalidEmail(email.to_string())),
        None => Err(RejectReason::InvalidEmail(
            crate::models::display_value(record.get("email")),
        )),
    }
}
