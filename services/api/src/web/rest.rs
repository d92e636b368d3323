//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification. Shared by the Swagger
//! UI route and the `openapi` binary.

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::web::auth::{self, SigninResponse};
use crate::web::cards::{self, CardResponse, MessageResponse};
use crate::web::error::ErrorBody;
use crate::web::schemas::{AvatarRequest, CardRequest, ProfileRequest, SigninRequest, SignupRequest};
use crate::web::users::{self, UserResponse};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::signin_handler,
        users::list_users_handler,
        users::current_user_handler,
        users::get_user_handler,
        users::update_profile_handler,
        users::update_avatar_handler,
        cards::list_cards_handler,
        cards::create_card_handler,
        cards::delete_card_handler,
        cards::like_card_handler,
        cards::unlike_card_handler,
    ),
    components(
        schemas(
            SignupRequest,
            SigninRequest,
            ProfileRequest,
            AvatarRequest,
            CardRequest,
            UserResponse,
            SigninResponse,
            CardResponse,
            MessageResponse,
            ErrorBody,
        )
    ),
    modifiers(&SessionCookie),
    tags(
        (name = "Mesto API", description = "Users, photo cards and likes.")
    )
)]
pub struct ApiDoc;

/// Documents the `jwt` session cookie set by `/signin`.
struct SessionCookie;

impl Modify for SessionCookie {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("jwt"))),
        );
    }
}
