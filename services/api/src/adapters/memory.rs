//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `DatabaseService` port. Used when no
//! `DATABASE_URL` is configured and throughout the test suite. Every mutation
//! happens under one write lock, so like/unlike are atomic set operations.

use async_trait::async_trait;
use chrono::Utc;
use mesto_core::constraints;
use mesto_core::domain::{Card, NewCard, NewUser, ObjectId, ProfileUpdate, User, UserCredentials};
use mesto_core::ports::{DatabaseService, PortError, PortResult};
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryState {
    users: Vec<StoredUser>,
    cards: Vec<Card>,
}

struct StoredUser {
    user: User,
    hashed_password: String,
}

/// A store adapter that keeps users and cards in memory.
#[derive(Default)]
pub struct MemoryAdapter {
    state: RwLock<MemoryState>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

fn parse_id(raw: &str) -> PortResult<ObjectId> {
    ObjectId::parse(raw).map_err(|e| PortError::MalformedId(e.0))
}

fn user_not_found(id: &ObjectId) -> PortError {
    PortError::NotFound(format!("User {} not found", id))
}

fn card_not_found(id: &ObjectId) -> PortError {
    PortError::NotFound(format!("Card {} not found", id))
}

impl MemoryState {
    fn user_mut(&mut self, id: &ObjectId) -> PortResult<&mut User> {
        self.users
            .iter_mut()
            .map(|stored| &mut stored.user)
            .find(|user| &user.id == id)
            .ok_or_else(|| user_not_found(id))
    }

    fn card_mut(&mut self, id: &ObjectId) -> PortResult<&mut Card> {
        self.cards
            .iter_mut()
            .find(|card| &card.id == id)
            .ok_or_else(|| card_not_found(id))
    }
}

#[async_trait]
impl DatabaseService for MemoryAdapter {
    async fn list_users(&self) -> PortResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().map(|stored| stored.user.clone()).collect())
    }

    async fn find_user(&self, user_id: &str) -> PortResult<User> {
        let id = parse_id(user_id)?;
        let state = self.state.read().await;
        state
            .users
            .iter()
            .find(|stored| stored.user.id == id)
            .map(|stored| stored.user.clone())
            .ok_or_else(|| user_not_found(&id))
    }

    async fn find_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let state = self.state.read().await;
        state
            .users
            .iter()
            .find(|stored| stored.user.email.eq_ignore_ascii_case(email))
            .map(|stored| UserCredentials {
                user_id: stored.user.id.clone(),
                email: stored.user.email.clone(),
                name: stored.user.name.clone(),
                hashed_password: stored.hashed_password.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User with email {} not found", email)))
    }

    async fn create_user(&self, user: NewUser) -> PortResult<User> {
        constraints::check_new_user(&user).map_err(PortError::Validation)?;

        let mut state = self.state.write().await;
        if state
            .users
            .iter()
            .any(|stored| stored.user.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(PortError::Duplicate {
                field: "email".to_string(),
            });
        }

        let created = User {
            id: ObjectId::generate(),
            name: user.name,
            about: user.about,
            avatar: user.avatar,
            email: user.email.to_lowercase(),
            created_at: Utc::now(),
        };
        state.users.push(StoredUser {
            user: created.clone(),
            hashed_password: user.hashed_password,
        });
        Ok(created)
    }

    async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> PortResult<User> {
        let id = parse_id(user_id)?;
        constraints::check_profile(&update).map_err(PortError::Validation)?;

        let mut state = self.state.write().await;
        let user = state.user_mut(&id)?;
        user.name = update.name;
        user.about = update.about;
        Ok(user.clone())
    }

    async fn update_avatar(&self, user_id: &str, avatar: &str) -> PortResult<User> {
        let id = parse_id(user_id)?;
        constraints::check_avatar(avatar).map_err(PortError::Validation)?;

        let mut state = self.state.write().await;
        let user = state.user_mut(&id)?;
        user.avatar = avatar.to_string();
        Ok(user.clone())
    }

    async fn list_cards(&self) -> PortResult<Vec<Card>> {
        Ok(self.state.read().await.cards.clone())
    }

    async fn find_card(&self, card_id: &str) -> PortResult<Card> {
        let id = parse_id(card_id)?;
        let state = self.state.read().await;
        state
            .cards
            .iter()
            .find(|card| card.id == id)
            .cloned()
            .ok_or_else(|| card_not_found(&id))
    }

    async fn create_card(&self, card: NewCard) -> PortResult<Card> {
        constraints::check_new_card(&card).map_err(PortError::Validation)?;

        let created = Card {
            id: ObjectId::generate(),
            name: card.name,
            link: card.link,
            owner: card.owner,
            likes: Vec::new(),
            created_at: Utc::now(),
        };
        self.state.write().await.cards.push(created.clone());
        Ok(created)
    }

    async fn delete_card(&self, card_id: &str) -> PortResult<()> {
        let id = parse_id(card_id)?;
        let mut state = self.state.write().await;
        let before = state.cards.len();
        state.cards.retain(|card| card.id != id);
        if state.cards.len() == before {
            return Err(card_not_found(&id));
        }
        Ok(())
    }

    async fn add_like(&self, card_id: &str, user_id: &str) -> PortResult<Card> {
        let card_id = parse_id(card_id)?;
        let user_id = parse_id(user_id)?;

        let mut state = self.state.write().await;
        let card = state.card_mut(&card_id)?;
        if !card.likes.contains(&user_id) {
            card.likes.push(user_id);
        }
        Ok(card.clone())
    }

    async fn remove_like(&self, card_id: &str, user_id: &str) -> PortResult<Card> {
        let card_id = parse_id(card_id)?;
        let user_id = parse_id(user_id)?;

        let mut state = self.state.write().await;
        let card = state.card_mut(&card_id)?;
        card.likes.retain(|liker| liker != &user_id);
        Ok(card.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser::with_defaults(email.to_string(), "$argon2id$digest".to_string(), None, None, None)
    }

    async fn seeded_card(store: &MemoryAdapter) -> Card {
        store
            .create_card(NewCard {
                name: "Baikal".into(),
                link: "https://example.com/baikal.jpg".into(),
                owner: ObjectId::generate(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn email_uniqueness_ignores_case() {
        let store = MemoryAdapter::new();
        store.create_user(new_user("a@b.com")).await.unwrap();
        let err = store.create_user(new_user("A@B.com")).await.unwrap_err();
        assert!(matches!(err, PortError::Duplicate { field } if field == "email"));
    }

    #[tokio::test]
    async fn credentials_are_found_by_email() {
        let store = MemoryAdapter::new();
        let user = store.create_user(new_user("a@b.com")).await.unwrap();
        let creds = store.find_credentials_by_email("a@b.com").await.unwrap();
        assert_eq!(creds.user_id, user.id);
        assert_eq!(creds.hashed_password, "$argon2id$digest");
    }

    #[tokio::test]
    async fn like_is_a_set_union_and_unlike_restores() {
        let store = MemoryAdapter::new();
        let card = seeded_card(&store).await;
        let liker = ObjectId::generate();

        let liked = store.add_like(card.id.as_str(), liker.as_str()).await.unwrap();
        let liked_again = store.add_like(card.id.as_str(), liker.as_str()).await.unwrap();
        assert_eq!(liked.likes, vec![liker.clone()]);
        assert_eq!(liked_again.likes.len(), 1);

        let unliked = store.remove_like(card.id.as_str(), liker.as_str()).await.unwrap();
        assert_eq!(unliked.likes, card.likes);
        let unliked_again = store.remove_like(card.id.as_str(), liker.as_str()).await.unwrap();
        assert!(unliked_again.likes.is_empty());
    }

    #[tokio::test]
    async fn malformed_and_missing_ids_are_distinguished() {
        let store = MemoryAdapter::new();
        let err = store.find_card("123").await.unwrap_err();
        assert!(matches!(err, PortError::MalformedId(raw) if raw == "123"));

        let missing = ObjectId::generate();
        let err = store.delete_card(missing.as_str()).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn constraint_violations_block_the_write() {
        let store = MemoryAdapter::new();
        let err = store
            .create_card(NewCard {
                name: "B".into(),
                link: "https://example.com/b.jpg".into(),
                owner: ObjectId::generate(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Validation(v) if v[0].field == "name"));
        assert!(store.list_cards().await.unwrap().is_empty());
    }
}
