use std::sync::OnceLock;

use regex::Regex;

pub const MAX_NAME_LENGTH: usize = 500;

/// Strips control characters and angle brackets from a customer-supplied display name, collapses whitespace and caps
/// the result at [`MAX_NAME_LENGTH`] characters.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control() && *c != '<' && *c != '>')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_NAME_LENGTH)
        .collect()
}

pub fn is_valid_email(email: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^[^\s@<>]+@[^\s@<>]+\.[^\s@<>]+$").expect("email pattern is a valid regex")
        })
        .is_match(email)
}

/// Trims and lower-cases an email address. Anything that doesn't look like an email address becomes empty.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim().to_lowercase();
    if is_valid_email(&email) {
        email
    } else {
        String::default()
    }
}
