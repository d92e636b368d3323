//! services/api/src/web/mod.rs
//!
//! The HTTP surface: handlers, the request pipeline pieces they are built
//! from, and the router that wires them together.

pub mod auth;
pub mod cards;
pub mod error;
pub mod middleware;
pub mod rest;
pub mod schemas;
pub mod state;
pub mod users;
pub mod validation;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::ConfigError;
use crate::error::ApiError;
use auth::{signin_handler, signup_handler};
use cards::{
    create_card_handler, delete_card_handler, like_card_handler, list_cards_handler,
    unlike_card_handler,
};
use error::RequestError;
use middleware::{make_span, LogResponse};
use rest::ApiDoc;
use state::AppState;
use users::{
    current_user_handler, get_user_handler, list_users_handler, update_avatar_handler,
    update_profile_handler,
};
use validation::{validate_body, validate_params};

async fn route_not_found() -> RequestError {
    RequestError::not_found("resource not found")
}

fn cors_layer(origin: &str) -> Result<CorsLayer, ConfigError> {
    let origin = origin
        .parse::<HeaderValue>()
        .map_err(|e| ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string()))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]))
}

/// Builds the complete application: API routes with their validation layers,
/// Swagger UI, the not-found fallback, request tracing and CORS.
///
/// Validation is route-layered onto each method route, so it runs before the
/// handler's extractors and therefore before authentication, and never on a
/// request whose method the route does not serve. Unknown paths and
/// unsupported methods both fall through to the JSON not-found response.
pub fn router(state: Arc<AppState>) -> Result<Router, ApiError> {
    let cors = state.config.cors_origin.as_deref().map(cors_layer).transpose()?;

    // Public routes (no session token required)
    let public_routes = Router::new()
        .route(
            "/signup",
            post(signup_handler).route_layer(from_fn_with_state(&*schemas::SIGNUP, validate_body)),
        )
        .route(
            "/signin",
            post(signin_handler).route_layer(from_fn_with_state(&*schemas::SIGNIN, validate_body)),
        );

    // Protected routes (handlers take an `Identity`)
    let user_routes = Router::new()
        .route("/users", get(list_users_handler))
        .route(
            "/users/me",
            get(current_user_handler).merge(
                patch(update_profile_handler)
                    .route_layer(from_fn_with_state(&*schemas::PROFILE, validate_body)),
            ),
        )
        .route(
            "/users/me/avatar",
            patch(update_avatar_handler).route_layer(from_fn_with_state(&*schemas::AVATAR, validate_body)),
        )
        .route(
            "/users/{userId}",
            get(get_user_handler).route_layer(from_fn_with_state(&*schemas::USER_ID, validate_params)),
        );

    let card_routes = Router::new()
        .route(
            "/cards",
            get(list_cards_handler).merge(
                post(create_card_handler).route_layer(from_fn_with_state(&*schemas::CARD, validate_body)),
            ),
        )
        .route(
            "/cards/{cardId}",
            delete(delete_card_handler).route_layer(from_fn_with_state(&*schemas::CARD_ID, validate_params)),
        )
        .route(
            "/cards/{cardId}/likes",
            put(like_card_handler)
                .delete(unlike_card_handler)
                .route_layer(from_fn_with_state(&*schemas::CARD_ID, validate_params)),
        );

    let api_router = Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(card_routes)
        .with_state(state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(route_not_found)
        .method_not_allowed_fallback(route_not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_span)
                .on_response(LogResponse),
        );

    Ok(match cors {
        Some(cors) => app.layer(cors),
        None => app,
    })
}
