//! services/api/src/web/schemas.rs
//!
//! Per-route input schemas and the typed values handlers receive once a
//! schema has accepted the input.

use mesto_core::constraints::{is_complex_password, EMAIL_PATTERN, NAME_PATTERN, URL_PATTERN};
use mesto_core::domain::OBJECT_ID_LEN;
use once_cell::sync::Lazy;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::web::validation::{Field, Schema};

const NAME_CHARSET: &str = "only letters, spaces and hyphens are allowed";
const FIELD_REQUIRED: &str = "field is required";
const INVALID_URL: &str = "must be a valid URL";

fn is_hex(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_hexdigit())
}

fn object_id(
    name: &'static str,
    invalid: &'static str,
    length: &'static str,
    required: &'static str,
) -> Field {
    Field::new(name)
        .required(required)
        .empty(required)
        .predicate(is_hex, invalid)
        .exact_chars(OBJECT_ID_LEN, length)
}

fn card_or_profile_name() -> Field {
    Field::new("name")
        .required(FIELD_REQUIRED)
        .empty(FIELD_REQUIRED)
        .min_chars(2, "minimum length is 2 characters")
        .max_chars(30, "maximum length is 30 characters")
        .pattern(&NAME_PATTERN, NAME_CHARSET)
}

fn url(name: &'static str) -> Field {
    Field::new(name)
        .required(FIELD_REQUIRED)
        .empty(FIELD_REQUIRED)
        .pattern(&URL_PATTERN, INVALID_URL)
}

//=========================================================================================
// Path Parameters
//=========================================================================================

pub static USER_ID: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![object_id(
        "userId",
        "invalid user id",
        "user id must be 24 characters long",
        "user id is required",
    )])
});

pub static CARD_ID: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![object_id(
        "cardId",
        "invalid card identifier",
        "card identifier must be 24 characters long",
        "card identifier is required",
    )])
});

#[derive(Debug, Deserialize)]
pub struct UserIdParam {
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CardIdParam {
    #[serde(rename = "cardId")]
    pub card_id: String,
}

//=========================================================================================
// Bodies
//=========================================================================================

pub static SIGNUP: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![
        Field::new("email")
            .required("email field is required")
            .empty("email is required")
            .pattern(&EMAIL_PATTERN, "enter a valid email")
            .lowercase(),
        Field::new("password")
            .required("password field is required")
            .empty("password is required")
            .min_chars(8, "password must be at least 8 characters")
            .predicate(
                is_complex_password,
                "password must contain digits, lowercase and uppercase letters",
            ),
        Field::new("name")
            .min_chars(2, "name must be at least 2 characters")
            .max_chars(30, "name must be at most 30 characters")
            .pattern(&NAME_PATTERN, "name may only contain letters, spaces and hyphens"),
        Field::new("about")
            .min_chars(2, "about must be at least 2 characters")
            .max_chars(200, "about must be at most 200 characters")
            .pattern(&NAME_PATTERN, "about may only contain letters, spaces and hyphens"),
        Field::new("avatar").pattern(&URL_PATTERN, "invalid avatar URL"),
    ])
});

pub static SIGNIN: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![
        Field::new("email")
            .required("email field must be filled")
            .empty("email is required")
            .lowercase(),
        Field::new("password")
            .required("password field must be filled")
            .empty("password is required"),
    ])
});

pub static CARD: Lazy<Schema> =
    Lazy::new(|| Schema::new(vec![card_or_profile_name(), url("link")]));

pub static PROFILE: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![
        card_or_profile_name(),
        Field::new("about")
            .required(FIELD_REQUIRED)
            .empty(FIELD_REQUIRED)
            .min_chars(2, "minimum length is 2 characters")
            .max_chars(200, "maximum length is 200 characters")
            .pattern(&NAME_PATTERN, NAME_CHARSET),
    ])
});

pub static AVATAR: Lazy<Schema> = Lazy::new(|| Schema::new(vec![url("avatar")]));

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub about: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CardRequest {
    pub name: String,
    pub link: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProfileRequest {
    pub name: String,
    pub about: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AvatarRequest {
    pub avatar: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn pair(field: &str, message: &str) -> (String, String) {
        (field.to_string(), message.to_string())
    }

    fn reported(schema: &Schema, input: Value) -> Vec<(String, String)> {
        schema
            .validate(&object(input))
            .unwrap_err()
            .translate()
            .fields
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn id_params_accept_exactly_24_hex_characters() {
        for id in ["5d8b8592978f8bd833ca8133", "ABCDEF0123456789abcdef01"] {
            assert!(CARD_ID.validate(&object(json!({ "cardId": id }))).is_ok());
            assert!(USER_ID.validate(&object(json!({ "userId": id }))).is_ok());
        }
    }

    #[test]
    fn id_params_reject_wrong_length_and_non_hex() {
        assert_eq!(
            reported(&CARD_ID, json!({ "cardId": "5d8b8592978f8bd833ca813" })),
            [pair("cardId", "card identifier must be 24 characters long")]
        );
        assert_eq!(
            reported(&CARD_ID, json!({ "cardId": "5d8b8592978f8bd833ca813z" })),
            [pair("cardId", "invalid card identifier")]
        );
        assert_eq!(
            reported(&USER_ID, json!({ "userId": "me-and-you" })),
            [pair("userId", "invalid user id")]
        );
    }

    #[test]
    fn signup_enforces_password_policy_before_hashing() {
        let fields = reported(&SIGNUP, json!({ "email": "a@b.com", "password": "abcdefgh" }));
        assert_eq!(
            fields,
            [pair("password", "password must contain digits, lowercase and uppercase letters")]
        );

        let fields = reported(&SIGNUP, json!({ "email": "a@b.com", "password": "Ab1" }));
        assert_eq!(fields[0].1, "password must be at least 8 characters");
    }

    #[test]
    fn signup_reports_email_and_optional_fields_together() {
        let fields = reported(
            &SIGNUP,
            json!({ "email": "nope", "password": "Abcdef12", "avatar": "not-a-url", "name": "X" }),
        );
        let names: Vec<_> = fields.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(names, ["avatar", "email", "name"]);
    }

    #[test]
    fn signup_lowercases_email() {
        let values = SIGNUP
            .validate(&object(json!({ "email": "Anna@Example.COM", "password": "Abcdef12" })))
            .unwrap();
        assert_eq!(values["email"], "anna@example.com");
    }

    #[test]
    fn signin_only_requires_both_fields() {
        assert!(SIGNIN
            .validate(&object(json!({ "email": "a@b.com", "password": "x" })))
            .is_ok());
        let fields = reported(&SIGNIN, json!({}));
        assert_eq!(
            fields,
            [
                pair("email", "email field must be filled"),
                pair("password", "password field must be filled"),
            ]
        );
    }

    #[test]
    fn card_body_checks_name_and_link() {
        assert!(CARD
            .validate(&object(json!({ "name": "Lake Baikal", "link": "https://example.com/b.jpg" })))
            .is_ok());
        let fields = reported(&CARD, json!({ "name": "Baikal 2", "link": "" }));
        assert_eq!(
            fields,
            [
                pair("link", FIELD_REQUIRED),
                pair("name", NAME_CHARSET),
            ]
        );
    }

    #[test]
    fn profile_and_avatar_bodies() {
        let long_about = "a".repeat(201);
        let fields = reported(&PROFILE, json!({ "name": "Anna", "about": long_about }));
        assert_eq!(fields, [pair("about", "maximum length is 200 characters")]);

        assert_eq!(
            reported(&AVATAR, json!({ "avatar": "ftp://example.com/a.png" })),
            [pair("avatar", INVALID_URL)]
        );
    }
}
