//! crates/mesto_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Identifiers
//=========================================================================================

/// Length of the textual form of an [`ObjectId`].
pub const OBJECT_ID_LEN: usize = 24;

/// Opaque, globally unique record identifier in its 24-hex-character form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

/// Returned when a string is not exactly 24 hexadecimal characters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed object id: {0:?}")]
pub struct MalformedObjectId(pub String);

impl ObjectId {
    /// Generates a fresh id: a big-endian seconds timestamp followed by random bits.
    pub fn generate() -> Self {
        let seconds = Utc::now().timestamp().clamp(0, i64::from(u32::MAX)) as u32;
        let random = Uuid::new_v4().simple().to_string();
        Self(format!("{:08x}{}", seconds, &random[..16]))
    }

    /// Parses and normalizes (to lower case) a textual id.
    pub fn parse(raw: &str) -> Result<Self, MalformedObjectId> {
        if is_object_id(raw) {
            Ok(Self(raw.to_ascii_lowercase()))
        } else {
            Err(MalformedObjectId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ObjectId {
    type Err = MalformedObjectId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// True when `raw` is exactly 24 ASCII hex digits.
pub fn is_object_id(raw: &str) -> bool {
    raw.len() == OBJECT_ID_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit())
}

//=========================================================================================
// Users
//=========================================================================================

pub const DEFAULT_USER_NAME: &str = "Jacques-Yves Cousteau";
pub const DEFAULT_USER_ABOUT: &str = "Explorer";
pub const DEFAULT_USER_AVATAR: &str =
    "https://pictures.s3.yandex.net/resources/jacques-cousteau_1604399756.png";

/// Public view of a user. Never carries the password digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: ObjectId,
    pub name: String,
    pub about: String,
    pub avatar: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for signin - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: ObjectId,
    pub email: String,
    pub name: String,
    pub hashed_password: String,
}

/// A user about to be inserted. `hashed_password` is already digested.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub about: String,
    pub avatar: String,
    pub email: String,
    pub hashed_password: String,
}

impl NewUser {
    /// Builds a new user, filling omitted profile fields with the defaults.
    pub fn with_defaults(
        email: String,
        hashed_password: String,
        name: Option<String>,
        about: Option<String>,
        avatar: Option<String>,
    ) -> Self {
        Self {
            name: name.unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
            about: about.unwrap_or_else(|| DEFAULT_USER_ABOUT.to_string()),
            avatar: avatar.unwrap_or_else(|| DEFAULT_USER_AVATAR.to_string()),
            email,
            hashed_password,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub name: String,
    pub about: String,
}

//=========================================================================================
// Cards
//=========================================================================================

/// A photo card. `likes` holds each identity at most once, in like order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: ObjectId,
    pub name: String,
    pub link: String,
    pub owner: ObjectId,
    pub likes: Vec<ObjectId>,
    pub created_at: DateTime<Utc>,
}

impl Card {
    pub fn is_owned_by(&self, identity: &ObjectId) -> bool {
        &self.owner == identity
    }
}

#[derive(Debug, Clone)]
pub struct NewCard {
    pub name: String,
    pub link: String,
    pub owner: ObjectId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_well_formed_and_distinct() {
        let a = ObjectId::generate();
        let b = ObjectId::generate();
        assert!(is_object_id(a.as_str()));
        assert_eq!(a.as_str(), a.as_str().to_ascii_lowercase());
        assert_ne!(a, b);
    }

    #[test]
    fn parse_accepts_exactly_24_hex_characters() {
        for raw in ["5d8b8592978f8bd833ca8133", "000000000000000000000000", "ABCDEFabcdef012345678901"] {
            let id = ObjectId::parse(raw).expect("valid id");
            assert_eq!(id.as_str(), raw.to_ascii_lowercase());
        }
    }

    #[test]
    fn parse_rejects_everything_else() {
        for raw in [
            "",
            "5d8b8592978f8bd833ca813",
            "5d8b8592978f8bd833ca81333",
            "5d8b8592978f8bd833ca813g",
            "5d8b8592978f8bd833ca813 ",
            "ффффффффффффффффффффффff",
        ] {
            assert_eq!(ObjectId::parse(raw), Err(MalformedObjectId(raw.to_string())));
        }
    }

    #[test]
    fn new_user_defaults_fill_only_missing_fields() {
        let user = NewUser::with_defaults(
            "a@b.com".into(),
            "digest".into(),
            Some("Anna".into()),
            None,
            None,
        );
        assert_eq!(user.name, "Anna");
        assert_eq!(user.about, DEFAULT_USER_ABOUT);
        assert_eq!(user.avatar, DEFAULT_USER_AVATAR);
    }
}
