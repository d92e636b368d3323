//! services/api/src/auth/mod.rs
//!
//! Credential services: password hashing and signed session tokens, plus the
//! `Identity` value the authenticator hands to handlers.

pub mod password;
pub mod token;

use mesto_core::ObjectId;

pub use password::{PasswordError, PasswordService};
pub use token::{Claims, TokenError, TokenService, SESSION_TTL_DAYS};

/// The authenticated caller, resolved from a verified session token.
///
/// Only ever constructed from a token subject; request bodies cannot supply it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(ObjectId);

impl Identity {
    pub(crate) fn new(id: ObjectId) -> Self {
        Self(id)
    }

    pub fn id(&self) -> &ObjectId {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}
