//! services/api/src/web/cards.rs
//!
//! Handlers for the `/cards` resource. Deletion is gated on ownership; likes
//! are set operations keyed by the caller's identity.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use mesto_core::domain::{Card, NewCard};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::Identity;
use crate::web::error::{ErrorBody, Operation, RequestError, StoreResultExt};
use crate::web::schemas::{CardIdParam, CardRequest};
use crate::web::state::AppState;
use crate::web::validation::Valid;

//=========================================================================================
// Response Structs
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct CardResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub link: String,
    pub owner: String,
    /// Ids of the users who liked the card, oldest like first.
    pub likes: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<Card> for CardResponse {
    fn from(card: Card) -> Self {
        Self {
            id: card.id.to_string(),
            name: card.name,
            link: card.link,
            owner: card.owner.to_string(),
            likes: card.likes.iter().map(ToString::to_string).collect(),
            created_at: card.created_at,
        }
    }
}

/// Confirmation body for deletions.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /cards - List every card
#[utoipa::path(
    get,
    path = "/cards",
    responses(
        (status = 200, description = "All cards", body = [CardResponse]),
        (status = 401, description = "Missing or invalid session token", body = ErrorBody)
    )
)]
pub async fn list_cards_handler(
    State(state): State<Arc<AppState>>,
    _identity: Identity,
) -> Result<Json<Vec<CardResponse>>, RequestError> {
    let cards = state.db.list_cards().await.during(Operation::ListCards)?;
    Ok(Json(cards.into_iter().map(CardResponse::from).collect()))
}

/// POST /cards - Create a card owned by the caller
#[utoipa::path(
    post,
    path = "/cards",
    request_body = CardRequest,
    responses(
        (status = 201, description = "Card created", body = CardResponse),
        (status = 400, description = "Invalid card data", body = ErrorBody),
        (status = 401, description = "Missing or invalid session token", body = ErrorBody)
    )
)]
pub async fn create_card_handler(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Valid(req): Valid<CardRequest>,
) -> Result<(StatusCode, Json<CardResponse>), RequestError> {
    let card = NewCard {
        name: req.name,
        link: req.link,
        owner: identity.id().clone(),
    };
    let created = state
        .db
        .create_card(card)
        .await
        .during(Operation::CreateCard)?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// DELETE /cards/{cardId} - Delete one of the caller's cards
#[utoipa::path(
    delete,
    path = "/cards/{cardId}",
    params(("cardId" = String, Path, description = "24-character hex card id")),
    responses(
        (status = 200, description = "Card deleted", body = MessageResponse),
        (status = 400, description = "Malformed card id", body = ErrorBody),
        (status = 401, description = "Missing or invalid session token", body = ErrorBody),
        (status = 403, description = "The card belongs to someone else", body = ErrorBody),
        (status = 404, description = "No such card", body = ErrorBody)
    )
)]
pub async fn delete_card_handler(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Valid(params): Valid<CardIdParam>,
) -> Result<Json<MessageResponse>, RequestError> {
    let card = state
        .db
        .find_card(&params.card_id)
        .await
        .during(Operation::DeleteCard)?;

    if !card.is_owned_by(identity.id()) {
        return Err(RequestError::forbidden("insufficient rights to delete card"));
    }

    state
        .db
        .delete_card(card.id.as_str())
        .await
        .during(Operation::DeleteCard)?;
    info!(card_id = %card.id, owner = %identity.id(), "card deleted");

    Ok(Json(MessageResponse {
        message: "card deleted".to_string(),
    }))
}

/// PUT /cards/{cardId}/likes - Like a card
#[utoipa::path(
    put,
    path = "/cards/{cardId}/likes",
    params(("cardId" = String, Path, description = "24-character hex card id")),
    responses(
        (status = 200, description = "The card with the caller among its likes", body = CardResponse),
        (status = 400, description = "Malformed card id", body = ErrorBody),
        (status = 401, description = "Missing or invalid session token", body = ErrorBody),
        (status = 404, description = "No such card", body = ErrorBody)
    )
)]
pub async fn like_card_handler(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Valid(params): Valid<CardIdParam>,
) -> Result<Json<CardResponse>, RequestError> {
    let card = state
        .db
        .add_like(&params.card_id, identity.as_str())
        .await
        .during(Operation::LikeCard)?;
    Ok(Json(card.into()))
}

/// DELETE /cards/{cardId}/likes - Withdraw a like
#[utoipa::path(
    delete,
    path = "/cards/{cardId}/likes",
    params(("cardId" = String, Path, description = "24-character hex card id")),
    responses(
        (status = 200, description = "The card without the caller among its likes", body = CardResponse),
        (status = 400, description = "Malformed card id", body = ErrorBody),
        (status = 401, description = "Missing or invalid session token", body = ErrorBody),
        (status = 404, description = "No such card", body = ErrorBody)
    )
)]
pub async fn unlike_card_handler(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Valid(params): Valid<CardIdParam>,
) -> Result<Json<CardResponse>, RequestError> {
    let card = state
        .db
        .remove_like(&params.card_id, identity.as_str())
        .await
        .during(Operation::UnlikeCard)?;
    Ok(Json(card.into()))
}
