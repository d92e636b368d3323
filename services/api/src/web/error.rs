//! services/api/src/web/error.rs
//!
//! The request-pipeline error and its translator. Every failure a request can
//! hit is a `RequestError`; `IntoResponse` is the only place that turns one
//! into a status code and a body, and the only place that logs it.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mesto_core::ports::{PortError, PortResult};
use serde::Serialize;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::auth::PasswordError;

/// Client-facing message for every 5xx.
pub const INTERNAL_MESSAGE: &str = "a server error occurred";

//=========================================================================================
// Kinds and Operations
//=========================================================================================

/// Closed set of failure kinds, each mapped to exactly one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The endpoint a store call was made for. Store outcomes are worded per endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Signup,
    Signin,
    ListUsers,
    CurrentUser,
    GetUser,
    UpdateProfile,
    UpdateAvatar,
    ListCards,
    CreateCard,
    DeleteCard,
    LikeCard,
    UnlikeCard,
}

//=========================================================================================
// The Error
//=========================================================================================

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// A failure whose kind and message were decided where it was detected.
    #[error("{message}")]
    Rejected { kind: ErrorKind, message: String },

    /// Input validation failed; one message per offending field.
    #[error("{message}")]
    Invalid {
        message: String,
        fields: BTreeMap<String, String>,
    },

    /// A raw store outcome, worded by the translator using the operation.
    #[error("store failure during {operation:?}: {source}")]
    Store {
        operation: Operation,
        #[source]
        source: PortError,
    },

    /// Anything unanticipated. The detail is logged, never sent.
    #[error("{0}")]
    Internal(String),
}

impl RequestError {
    fn rejected(kind: ErrorKind, message: impl Into<String>) -> Self {
        RequestError::Rejected {
            kind,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::rejected(ErrorKind::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::rejected(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::rejected(ErrorKind::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::rejected(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::rejected(ErrorKind::Conflict, message)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        RequestError::Internal(detail.into())
    }

    /// Builds a validation failure from `(field, message)` pairs in report order.
    pub fn invalid(violations: Vec<(String, String)>) -> Self {
        let message = violations
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        RequestError::Invalid {
            message,
            fields: violations.into_iter().collect(),
        }
    }

    pub fn store(operation: Operation, source: PortError) -> Self {
        RequestError::Store { operation, source }
    }
}

impl From<PasswordError> for RequestError {
    fn from(err: PasswordError) -> Self {
        RequestError::Internal(err.to_string())
    }
}

/// Tags a store result with the operation it was made for.
pub trait StoreResultExt<T> {
    fn during(self, operation: Operation) -> Result<T, RequestError>;
}

impl<T> StoreResultExt<T> for PortResult<T> {
    fn during(self, operation: Operation) -> Result<T, RequestError> {
        self.map_err(|source| RequestError::store(operation, source))
    }
}

//=========================================================================================
// Translation
//=========================================================================================

/// What the client sees for a given error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translated {
    pub kind: ErrorKind,
    pub message: String,
    pub fields: Option<BTreeMap<String, String>>,
}

impl Translated {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: None,
        }
    }
}

impl RequestError {
    pub fn translate(&self) -> Translated {
        match self {
            RequestError::Rejected { kind, message } => Translated::new(*kind, message.clone()),
            RequestError::Invalid { message, fields } => Translated {
                kind: ErrorKind::BadRequest,
                message: message.clone(),
                fields: Some(fields.clone()),
            },
            RequestError::Store { operation, source } => translate_store(*operation, source),
            RequestError::Internal(_) => Translated::new(ErrorKind::Internal, INTERNAL_MESSAGE),
        }
    }
}

fn translate_store(operation: Operation, source: &PortError) -> Translated {
    use ErrorKind::*;
    use Operation::*;

    match source {
        PortError::Validation(violations) => {
            let message = match operation {
                Signup => {
                    let details = violations
                        .iter()
                        .map(|v| v.message.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("validation error: {details}")
                }
                UpdateProfile => "invalid data passed when updating profile".to_string(),
                UpdateAvatar => "invalid data passed when updating avatar".to_string(),
                CreateCard => "invalid data passed when creating card".to_string(),
                _ => "invalid data passed".to_string(),
            };
            Translated::new(BadRequest, message)
        }
        PortError::MalformedId(_) => {
            let message = match operation {
                DeleteCard => "invalid card id",
                LikeCard | UnlikeCard => "invalid like/unlike data",
                _ => "invalid user id",
            };
            Translated::new(BadRequest, message)
        }
        PortError::Duplicate { .. } => {
            let message = match operation {
                Signup => "a user with this email already exists",
                _ => "resource already exists",
            };
            Translated::new(Conflict, message)
        }
        PortError::NotFound(_) => {
            let message = match operation {
                CurrentUser => "user not found",
                GetUser | UpdateProfile | UpdateAvatar => "user with the given id not found",
                DeleteCard => "card with the given id not found",
                LikeCard | UnlikeCard => "nonexistent card id passed",
                _ => "resource not found",
            };
            Translated::new(NotFound, message)
        }
        PortError::Unexpected(_) => Translated::new(Internal, INTERNAL_MESSAGE),
    }
}

//=========================================================================================
// Response
//=========================================================================================

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<BTreeMap<String, String>>,
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let translated = self.translate();
        if translated.kind == ErrorKind::Internal {
            error!(error = ?self, "request failed");
        } else {
            warn!(kind = ?translated.kind, message = %translated.message, detail = %self, "request rejected");
        }

        let body = ErrorBody {
            message: translated.message,
            validation: translated.fields,
        };
        (translated.kind.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesto_core::FieldViolation;

    fn store(operation: Operation, source: PortError) -> Translated {
        RequestError::store(operation, source).translate()
    }

    fn violation(field: &'static str, message: &str) -> PortError {
        PortError::Validation(vec![FieldViolation {
            field,
            message: message.to_string(),
        }])
    }

    #[test]
    fn kinds_map_to_fixed_statuses() {
        assert_eq!(ErrorKind::BadRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorKind::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorKind::Internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn known_errors_keep_their_message() {
        let t = RequestError::forbidden("insufficient rights to delete card").translate();
        assert_eq!(t, Translated::new(ErrorKind::Forbidden, "insufficient rights to delete card"));
    }

    #[test]
    fn store_validation_is_worded_per_route() {
        let signup = store(Operation::Signup, violation("name", "name must be at least 2 characters"));
        assert_eq!(signup.message, "validation error: name must be at least 2 characters");

        let cases = [
            (Operation::UpdateProfile, "invalid data passed when updating profile"),
            (Operation::UpdateAvatar, "invalid data passed when updating avatar"),
            (Operation::CreateCard, "invalid data passed when creating card"),
        ];
        for (operation, expected) in cases {
            let t = store(operation, violation("name", "too short"));
            assert_eq!(t, Translated::new(ErrorKind::BadRequest, expected));
        }
    }

    #[test]
    fn malformed_ids_depend_on_the_card_operation() {
        let malformed = || PortError::MalformedId("123".into());
        assert_eq!(store(Operation::DeleteCard, malformed()).message, "invalid card id");
        assert_eq!(store(Operation::LikeCard, malformed()).message, "invalid like/unlike data");
        assert_eq!(store(Operation::UnlikeCard, malformed()).message, "invalid like/unlike data");
        assert_eq!(store(Operation::GetUser, malformed()).message, "invalid user id");
        assert_eq!(store(Operation::GetUser, malformed()).kind, ErrorKind::BadRequest);
    }

    #[test]
    fn duplicates_are_conflicts() {
        let t = store(Operation::Signup, PortError::Duplicate { field: "email".into() });
        assert_eq!(t, Translated::new(ErrorKind::Conflict, "a user with this email already exists"));
    }

    #[test]
    fn not_found_is_worded_per_route() {
        let missing = || PortError::NotFound("x".into());
        assert_eq!(store(Operation::CurrentUser, missing()).message, "user not found");
        assert_eq!(store(Operation::DeleteCard, missing()).message, "card with the given id not found");
        assert_eq!(store(Operation::LikeCard, missing()).message, "nonexistent card id passed");
        assert_eq!(store(Operation::ListCards, missing()).kind, ErrorKind::NotFound);
    }

    #[test]
    fn internals_never_leak() {
        let t = store(Operation::ListUsers, PortError::Unexpected("connection reset by 10.0.0.3".into()));
        assert_eq!(t, Translated::new(ErrorKind::Internal, INTERNAL_MESSAGE));

        let t = RequestError::internal("stack trace here").translate();
        assert_eq!(t.message, INTERNAL_MESSAGE);
    }

    #[test]
    fn validation_errors_enumerate_fields_in_order() {
        let err = RequestError::invalid(vec![
            ("name".into(), "minimum length is 2 characters".into()),
            ("link".into(), "must be a valid URL".into()),
        ]);
        let t = err.translate();
        assert_eq!(t.kind, ErrorKind::BadRequest);
        assert_eq!(t.message, "name: minimum length is 2 characters; link: must be a valid URL");
        assert_eq!(t.fields.unwrap().len(), 2);
    }
}
