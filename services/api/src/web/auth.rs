//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup and signin.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use mesto_core::domain::NewUser;
use mesto_core::ports::PortError;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::TokenService;
use crate::web::error::{ErrorBody, Operation, RequestError, StoreResultExt};
use crate::web::middleware::SESSION_COOKIE;
use crate::web::schemas::{SigninRequest, SignupRequest};
use crate::web::state::AppState;
use crate::web::users::UserResponse;
use crate::web::validation::Valid;

const BAD_CREDENTIALS: &str = "incorrect email or password";

//=========================================================================================
// Response Structs
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct SigninResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Builds the `Set-Cookie` value carrying a freshly issued session token.
fn session_cookie(token: &str, tokens: &TokenService, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        tokens.ttl().num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /signup - Create a new user account
#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid signup data", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Valid(req): Valid<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), RequestError> {
    // 1. Refuse known emails before paying for a hash
    match state.db.find_credentials_by_email(&req.email).await {
        Ok(_) => return Err(RequestError::conflict("a user with this email already exists")),
        Err(PortError::NotFound(_)) => {}
        Err(e) => return Err(RequestError::store(Operation::Signup, e)),
    }

    // 2. Hash the password
    let hashed_password = state.passwords.hash(&req.password).await?;

    // 3. Create the user; a concurrent signup still surfaces as a duplicate
    let new_user = NewUser::with_defaults(req.email, hashed_password, req.name, req.about, req.avatar);
    let user = state
        .db
        .create_user(new_user)
        .await
        .during(Operation::Signup)?;

    info!(user_id = %user.id, "user signed up");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /signin - Exchange credentials for a session cookie
#[utoipa::path(
    post,
    path = "/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Signed in; the session token is set as the `jwt` cookie", body = SigninResponse),
        (status = 400, description = "Missing fields", body = ErrorBody),
        (status = 401, description = "Incorrect email or password", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn signin_handler(
    State(state): State<Arc<AppState>>,
    Valid(req): Valid<SigninRequest>,
) -> Result<impl IntoResponse, RequestError> {
    // 1. Look the user up; an unknown email reads the same as a wrong password
    let credentials = match state.db.find_credentials_by_email(&req.email).await {
        Ok(credentials) => credentials,
        Err(PortError::NotFound(_)) => return Err(RequestError::unauthorized(BAD_CREDENTIALS)),
        Err(e) => return Err(RequestError::store(Operation::Signin, e)),
    };

    // 2. Verify the password
    if !state
        .passwords
        .verify(&req.password, &credentials.hashed_password)
        .await?
    {
        return Err(RequestError::unauthorized(BAD_CREDENTIALS));
    }

    // 3. Issue the session token
    let token = state
        .tokens
        .issue(&credentials.user_id)
        .map_err(|e| RequestError::internal(e.to_string()))?;
    let cookie = session_cookie(
        &token,
        &state.tokens,
        state.config.environment.is_production(),
    );

    info!(user_id = %credentials.user_id, "user signed in");
    let body = SigninResponse {
        id: credentials.user_id.to_string(),
        email: credentials.email,
        name: credentials.name,
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(body)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_carries_token_and_lifetime() {
        let tokens = TokenService::new("secret");
        let cookie = session_cookie("abc", &tokens, false);
        assert_eq!(cookie, "jwt=abc; HttpOnly; SameSite=Strict; Path=/; Max-Age=604800");
    }

    #[test]
    fn production_cookies_are_secure() {
        let tokens = TokenService::new("secret");
        assert!(session_cookie("abc", &tokens, true).ends_with("; Secure"));
    }
}
