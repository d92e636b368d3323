//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mesto_core::constraints::{self, FieldViolation};
use mesto_core::domain::{Card, NewCard, NewUser, ObjectId, ProfileUpdate, User, UserCredentials};
use mesto_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Waits for in-flight queries and closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

//=========================================================================================
// Error Mapping
//=========================================================================================

const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";

fn map_sqlx(e: sqlx::Error) -> PortError {
    if let sqlx::Error::Database(db) = &e {
        let constraint = db.constraint().unwrap_or_default();
        match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                let field = if constraint == "users_email_key" { "email" } else { "id" };
                return PortError::Duplicate {
                    field: field.to_string(),
                };
            }
            Some(CHECK_VIOLATION) => {
                let field = match constraint {
                    "users_name_length" | "cards_name_length" => "name",
                    "users_about_length" => "about",
                    _ => "id",
                };
                return PortError::Validation(vec![FieldViolation {
                    field,
                    message: format!("{field} violates constraint {constraint}"),
                }]);
            }
            _ => {}
        }
    }
    PortError::Unexpected(e.to_string())
}

fn parse_id(raw: &str) -> PortResult<ObjectId> {
    ObjectId::parse(raw).map_err(|e| PortError::MalformedId(e.0))
}

/// Ids read back from the database were written by us; a bad one is corruption.
fn stored_id(raw: String) -> PortResult<ObjectId> {
    ObjectId::parse(&raw).map_err(|e| PortError::Unexpected(e.to_string()))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const USER_COLUMNS: &str = "id, name, about, avatar, email, created_at";

const CARD_SELECT: &str = "SELECT c.id, c.name, c.link, c.owner_id, c.created_at, \
     COALESCE(ARRAY_AGG(l.user_id ORDER BY l.liked_at) FILTER (WHERE l.user_id IS NOT NULL), \
     ARRAY[]::TEXT[]) AS likes \
     FROM cards c LEFT JOIN card_likes l ON l.card_id = c.id";

#[derive(FromRow)]
struct UserRecord {
    id: String,
    name: String,
    about: String,
    avatar: String,
    email: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        Ok(User {
            id: stored_id(self.id)?,
            name: self.name,
            about: self.about,
            avatar: self.avatar,
            email: self.email,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: String,
    email: String,
    name: String,
    password_hash: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> PortResult<UserCredentials> {
        Ok(UserCredentials {
            user_id: stored_id(self.id)?,
            email: self.email,
            name: self.name,
            hashed_password: self.password_hash,
        })
    }
}

#[derive(FromRow)]
struct CardRecord {
    id: String,
    name: String,
    link: String,
    owner_id: String,
    created_at: DateTime<Utc>,
    likes: Vec<String>,
}
impl CardRecord {
    fn to_domain(self) -> PortResult<Card> {
        Ok(Card {
            id: stored_id(self.id)?,
            name: self.name,
            link: self.link,
            owner: stored_id(self.owner_id)?,
            likes: self
                .likes
                .into_iter()
                .map(stored_id)
                .collect::<PortResult<Vec<_>>>()?,
            created_at: self.created_at,
        })
    }
}

impl DbAdapter {
    async fn fetch_card(&self, id: &ObjectId) -> PortResult<Card> {
        let record = sqlx::query_as::<_, CardRecord>(&format!(
            "{CARD_SELECT} WHERE c.id = $1 GROUP BY c.id"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| PortError::NotFound(format!("Card {} not found", id)))?;
        record.to_domain()
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn list_users(&self) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        records.into_iter().map(UserRecord::to_domain).collect()
    }

    async fn find_user(&self, user_id: &str) -> PortResult<User> {
        let id = parse_id(user_id)?;
        sqlx::query_as::<_, UserRecord>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", id)))?
            .to_domain()
    }

    async fn find_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, name, password_hash FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| PortError::NotFound(format!("User with email {} not found", email)))?
        .to_domain()
    }

    async fn create_user(&self, user: NewUser) -> PortResult<User> {
        constraints::check_new_user(&user).map_err(PortError::Validation)?;

        sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (id, name, about, avatar, email, password_hash) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        ))
        .bind(ObjectId::generate().as_str())
        .bind(&user.name)
        .bind(&user.about)
        .bind(&user.avatar)
        .bind(user.email.to_lowercase())
        .bind(&user.hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?
        .to_domain()
    }

    async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> PortResult<User> {
        let id = parse_id(user_id)?;
        constraints::check_profile(&update).map_err(PortError::Validation)?;

        sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET name = $2, about = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(&update.name)
        .bind(&update.about)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", id)))?
        .to_domain()
    }

    async fn update_avatar(&self, user_id: &str, avatar: &str) -> PortResult<User> {
        let id = parse_id(user_id)?;
        constraints::check_avatar(avatar).map_err(PortError::Validation)?;

        sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET avatar = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(avatar)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", id)))?
        .to_domain()
    }

    async fn list_cards(&self) -> PortResult<Vec<Card>> {
        let records = sqlx::query_as::<_, CardRecord>(&format!(
            "{CARD_SELECT} GROUP BY c.id ORDER BY c.created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        records.into_iter().map(CardRecord::to_domain).collect()
    }

    async fn find_card(&self, card_id: &str) -> PortResult<Card> {
        let id = parse_id(card_id)?;
        self.fetch_card(&id).await
    }

    async fn create_card(&self, card: NewCard) -> PortResult<Card> {
        constraints::check_new_card(&card).map_err(PortError::Validation)?;

        sqlx::query_as::<_, CardRecord>(
            "INSERT INTO cards (id, name, link, owner_id) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, link, owner_id, created_at, ARRAY[]::TEXT[] AS likes",
        )
        .bind(ObjectId::generate().as_str())
        .bind(&card.name)
        .bind(&card.link)
        .bind(card.owner.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?
        .to_domain()
    }

    async fn delete_card(&self, card_id: &str) -> PortResult<()> {
        let id = parse_id(card_id)?;
        let result = sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Card {} not found", id)));
        }
        Ok(())
    }

    async fn add_like(&self, card_id: &str, user_id: &str) -> PortResult<Card> {
        let card = parse_id(card_id)?;
        let user = parse_id(user_id)?;

        sqlx::query(
            "INSERT INTO card_likes (card_id, user_id) SELECT id, $2 FROM cards WHERE id = $1 \
             ON CONFLICT (card_id, user_id) DO NOTHING",
        )
        .bind(card.as_str())
        .bind(user.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        self.fetch_card(&card).await
    }

    async fn remove_like(&self, card_id: &str, user_id: &str) -> PortResult<Card> {
        let card = parse_id(card_id)?;
        let user = parse_id(user_id)?;

        sqlx::query("DELETE FROM card_likes WHERE card_id = $1 AND user_id = $2")
            .bind(card.as_str())
            .bind(user.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        self.fetch_card(&card).await
    }
}
