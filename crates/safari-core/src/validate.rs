//! Field-level payload validation.
//!
//! Collects every violation instead of stopping at the first fault, so the
//! caller gets one complete picture of what to fix.

use std::sync::OnceLock;

use regex::Regex;

use safari_types::SafariRequest;

use crate::error::FieldViolation;

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("email pattern is valid")
    })
}

pub fn email_is_valid(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

/// Lowercased, trimmed identity used for storage keys and index scoping.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate a submitted payload. An empty result means the payload is
/// acceptable; otherwise every offending field is listed, wire-named.
pub fn validate_payload(payload: &SafariRequest) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    let dates = &payload.travel_dates;
    if dates.end_date < dates.start_date {
        violations.push(FieldViolation::new(
            "travelDates.endDate",
            "end date precedes start date",
        ));
    }

    if payload.travelers() == 0 {
        violations.push(FieldViolation::new(
            "group",
            "at least one traveler is required",
        ));
    }

    if !email_is_valid(&payload.email) {
        violations.push(FieldViolation::new(
            "email",
            "must be a valid email address",
        ));
    }

    if payload.interests.iter().all(|i| i.trim().is_empty()) {
        violations.push(FieldViolation::new(
            "interests",
            "at least one interest is required",
        ));
    }

    if payload.accommodation.trim().is_empty() {
        violations.push(FieldViolation::new(
            "accommodation",
            "accommodation preference is required",
        ));
    }

    if payload.travel_style.trim().is_empty() {
        violations.push(FieldViolation::new(
            "travelStyle",
            "travel style is required",
        ));
    }

    violations
}
