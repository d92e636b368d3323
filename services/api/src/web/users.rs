//! services/api/src/web/users.rs
//!
//! Handlers for the `/users` resource and the public user representation.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use mesto_core::domain::{ProfileUpdate, User};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::Identity;
use crate::web::error::{ErrorBody, Operation, RequestError, StoreResultExt};
use crate::web::schemas::{AvatarRequest, ProfileRequest, UserIdParam};
use crate::web::state::AppState;
use crate::web::validation::Valid;

//=========================================================================================
// Response Structs
//=========================================================================================

/// A user as clients see it. There is no password field to leak.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub about: String,
    pub avatar: String,
    pub email: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name,
            about: user.about,
            avatar: user.avatar,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /users - List every user
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 401, description = "Missing or invalid session token", body = ErrorBody)
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    _identity: Identity,
) -> Result<Json<Vec<UserResponse>>, RequestError> {
    let users = state.db.list_users().await.during(Operation::ListUsers)?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /users/me - The authenticated user
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "The caller", body = UserResponse),
        (status = 401, description = "Missing or invalid session token", body = ErrorBody),
        (status = 404, description = "The caller's account no longer exists", body = ErrorBody)
    )
)]
pub async fn current_user_handler(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<UserResponse>, RequestError> {
    let user = state
        .db
        .find_user(identity.as_str())
        .await
        .during(Operation::CurrentUser)?;
    Ok(Json(user.into()))
}

/// GET /users/{userId} - A user by id
#[utoipa::path(
    get,
    path = "/users/{userId}",
    params(("userId" = String, Path, description = "24-character hex user id")),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 400, description = "Malformed user id", body = ErrorBody),
        (status = 401, description = "Missing or invalid session token", body = ErrorBody),
        (status = 404, description = "No such user", body = ErrorBody)
    )
)]
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    _identity: Identity,
    Valid(params): Valid<UserIdParam>,
) -> Result<Json<UserResponse>, RequestError> {
    let user = state
        .db
        .find_user(&params.user_id)
        .await
        .during(Operation::GetUser)?;
    Ok(Json(user.into()))
}

/// PATCH /users/me - Update the caller's name and about
#[utoipa::path(
    patch,
    path = "/users/me",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "The updated user", body = UserResponse),
        (status = 400, description = "Invalid profile data", body = ErrorBody),
        (status = 401, description = "Missing or invalid session token", body = ErrorBody),
        (status = 404, description = "The caller's account no longer exists", body = ErrorBody)
    )
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Valid(req): Valid<ProfileRequest>,
) -> Result<Json<UserResponse>, RequestError> {
    let update = ProfileUpdate {
        name: req.name,
        about: req.about,
    };
    let user = state
        .db
        .update_profile(identity.as_str(), update)
        .await
        .during(Operation::UpdateProfile)?;
    Ok(Json(user.into()))
}

/// PATCH /users/me/avatar - Replace the caller's avatar
#[utoipa::path(
    patch,
    path = "/users/me/avatar",
    request_body = AvatarRequest,
    responses(
        (status = 200, description = "The updated user", body = UserResponse),
        (status = 400, description = "Invalid avatar URL", body = ErrorBody),
        (status = 401, description = "Missing or invalid session token", body = ErrorBody),
        (status = 404, description = "The caller's account no longer exists", body = ErrorBody)
    )
)]
pub async fn update_avatar_handler(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Valid(req): Valid<AvatarRequest>,
) -> Result<Json<UserResponse>, RequestError> {
    let user = state
        .db
        .update_avatar(identity.as_str(), &req.avatar)
        .await
        .during(Operation::UpdateAvatar)?;
    Ok(Json(user.into()))
}
