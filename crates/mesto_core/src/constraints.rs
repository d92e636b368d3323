//! crates/mesto_core/src/constraints.rs
//!
//! Field patterns and the record-level constraints every store adapter checks
//! before it writes a user or a card.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{NewCard, NewUser, ProfileUpdate};

//=========================================================================================
// Patterns
//=========================================================================================

/// http(s) URL with a dotted host and an optional path.
pub static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(https?://)(www\.)?([a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}(/[a-zA-Z0-9\-._~:/?#\[\]@!$&'()*+,;=]*)?(#)?$",
    )
    .expect("URL pattern compiles")
});

/// Latin and Cyrillic letters, whitespace and hyphens.
pub static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Zа-яА-ЯёЁ\s-]+$").expect("name pattern compiles"));

pub static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

pub fn is_url(value: &str) -> bool {
    URL_PATTERN.is_match(value)
}

pub fn is_name(value: &str) -> bool {
    NAME_PATTERN.is_match(value)
}

pub fn is_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

/// At least one ASCII digit, one ASCII lowercase and one ASCII uppercase letter.
pub fn is_complex_password(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_uppercase())
}

//=========================================================================================
// Record constraints
//=========================================================================================

/// One failed record constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn check_length(
    violations: &mut Vec<FieldViolation>,
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> bool {
    let len = value.chars().count();
    if len < min {
        violations.push(FieldViolation::new(
            field,
            format!("{field} must be at least {min} characters"),
        ));
        false
    } else if len > max {
        violations.push(FieldViolation::new(
            field,
            format!("{field} must be at most {max} characters"),
        ));
        false
    } else {
        true
    }
}

fn check_name(violations: &mut Vec<FieldViolation>, field: &'static str, value: &str, max: usize) {
    if check_length(violations, field, value, 2, max) && !is_name(value) {
        violations.push(FieldViolation::new(
            field,
            format!("{field} may only contain letters, spaces and hyphens"),
        ));
    }
}

fn check_url(violations: &mut Vec<FieldViolation>, field: &'static str, value: &str) {
    if !is_url(value) {
        violations.push(FieldViolation::new(field, format!("{field} must be a valid URL")));
    }
}

fn finish(violations: Vec<FieldViolation>) -> Result<(), Vec<FieldViolation>> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

pub fn check_new_user(user: &NewUser) -> Result<(), Vec<FieldViolation>> {
    let mut violations = Vec::new();
    check_name(&mut violations, "name", &user.name, 30);
    check_name(&mut violations, "about", &user.about, 200);
    check_url(&mut violations, "avatar", &user.avatar);
    if !is_email(&user.email) {
        violations.push(FieldViolation::new("email", "email must be a valid email address"));
    }
    if user.hashed_password.is_empty() {
        violations.push(FieldViolation::new("password", "password is required"));
    }
    finish(violations)
}

pub fn check_profile(update: &ProfileUpdate) -> Result<(), Vec<FieldViolation>> {
    let mut violations = Vec::new();
    check_name(&mut violations, "name", &update.name, 30);
    check_name(&mut violations, "about", &update.about, 200);
    finish(violations)
}

pub fn check_avatar(avatar: &str) -> Result<(), Vec<FieldViolation>> {
    let mut violations = Vec::new();
    check_url(&mut violations, "avatar", avatar);
    finish(violations)
}

pub fn check_new_card(card: &NewCard) -> Result<(), Vec<FieldViolation>> {
    let mut violations = Vec::new();
    check_name(&mut violations, "name", &card.name, 30);
    check_url(&mut violations, "link", &card.link);
    finish(violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ObjectId;

    #[test]
    fn url_pattern_matches_http_and_https_links() {
        assert!(is_url("https://example.com/image.jpg"));
        assert!(is_url("http://www.pictures.s3.yandex.net/a-b_c~d?x=1#top"));
        assert!(!is_url("ftp://example.com/a.jpg"));
        assert!(!is_url("https://localhost"));
        assert!(!is_url("example.com"));
    }

    #[test]
    fn name_pattern_allows_letters_spaces_and_hyphens() {
        assert!(is_name("Jacques-Yves Cousteau"));
        assert!(is_name("Жак-Ив Кусто"));
        assert!(!is_name("R2-D2"));
        assert!(!is_name("name_with_underscore"));
    }

    #[test]
    fn password_complexity_needs_digit_lower_and_upper() {
        assert!(is_complex_password("Abcdef12"));
        assert!(!is_complex_password("abcdef12"));
        assert!(!is_complex_password("ABCDEF12"));
        assert!(!is_complex_password("Abcdefgh"));
    }

    #[test]
    fn password_complexity_counts_only_ascii_letters() {
        assert!(!is_complex_password("ÀÉÍÓÚ1ßß"));
        assert!(!is_complex_password("ÀÉÍÓÚ1ab"));
        assert!(!is_complex_password("ABCDE1ßß"));
        assert!(is_complex_password("ÜnicodE1a"));
    }

    #[test]
    fn card_constraints_report_every_failing_field() {
        let card = NewCard {
            name: "x".into(),
            link: "not a url".into(),
            owner: ObjectId::generate(),
        };
        let violations = check_new_card(&card).unwrap_err();
        let fields: Vec<_> = violations.iter().map(|v| v.field).collect();
        assert_eq!(fields, ["name", "link"]);
    }

    #[test]
    fn valid_profile_passes() {
        let update = ProfileUpdate {
            name: "Anna".into(),
            about: "Sailor and diver".into(),
        };
        assert!(check_profile(&update).is_ok());
    }
}
