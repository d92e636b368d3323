//! crates/mesto_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage implementations.

use async_trait::async_trait;

use crate::constraints::FieldViolation;
use crate::domain::{Card, NewCard, NewUser, ProfileUpdate, User, UserCredentials};

//=========================================================================================
// Port Error and Result Types
//=========================================================================================

/// Typed outcome of every store operation. Adapters never leak raw driver errors.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// A record constraint rejected the write.
    #[error("Record validation failed: {}", describe(.0))]
    Validation(Vec<FieldViolation>),
    /// An identifier did not have the 24-hex-character shape.
    #[error("Malformed identifier: {0}")]
    MalformedId(String),
    /// A unique field already holds this value.
    #[error("Duplicate value for unique field {field}")]
    Duplicate { field: String },
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

fn describe(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistence for users and cards. Ids are passed in their raw textual form;
/// adapters answer a malformed one with [`PortError::MalformedId`].
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users ---
    async fn list_users(&self) -> PortResult<Vec<User>>;

    async fn find_user(&self, user_id: &str) -> PortResult<User>;

    async fn find_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_user(&self, user: NewUser) -> PortResult<User>;

    async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> PortResult<User>;

    async fn update_avatar(&self, user_id: &str, avatar: &str) -> PortResult<User>;

    // --- Cards ---
    async fn list_cards(&self) -> PortResult<Vec<Card>>;

    async fn find_card(&self, card_id: &str) -> PortResult<Card>;

    async fn create_card(&self, card: NewCard) -> PortResult<Card>;

    async fn delete_card(&self, card_id: &str) -> PortResult<()>;

    /// Adds `user_id` to the card's likes as one atomic set-union.
    async fn add_like(&self, card_id: &str, user_id: &str) -> PortResult<Card>;

    /// Removes `user_id` from the card's likes as one atomic set-removal.
    async fn remove_like(&self, card_id: &str, user_id: &str) -> PortResult<Card>;
}
