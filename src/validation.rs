//! Loose string checks shared by every lead-capture form.
//!
//! These are intentionally permissive: the email check only demands a single
//! `@` with a dot somewhere after it, and the phone check accepts anything
//! that strips down to 10-15 digits with an optional leading `+`. Stricter
//! validation is left to whoever reads the submissions.
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex");
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9]{10,15}$").expect("phone regex");
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Spaces, hyphens and parentheses are stripped before matching. The explicit
/// length check duplicates the regex bound on purpose.
pub fn is_valid_phone(phone: &str) -> bool {
    let cleaned: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    PHONE_RE.is_match(&cleaned) && cleaned.len() >= 10
}
