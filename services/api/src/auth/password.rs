//! services/api/src/auth/password.rs
//!
//! One-way salted password hashing with argon2id. Hashing and verification run
//! on the blocking pool since both are deliberately expensive.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::config::HashCost;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Invalid hash cost: {0}")]
    Cost(String),
    #[error("Failed to hash password: {0}")]
    Hash(String),
    #[error("Stored password digest is malformed: {0}")]
    Digest(String),
    #[error("Hashing task failed: {0}")]
    Task(String),
}

#[derive(Clone, Debug)]
pub struct PasswordService {
    params: Params,
}

impl PasswordService {
    pub fn new(cost: HashCost) -> Result<Self, PasswordError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| PasswordError::Cost(e.to_string()))?;
        Ok(Self { params })
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Returns a PHC-format digest with a fresh random salt.
    pub async fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let hasher = self.hasher();
        let plaintext = plaintext.to_owned();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            hasher
                .hash_password(plaintext.as_bytes(), &salt)
                .map(|digest| digest.to_string())
                .map_err(|e| PasswordError::Hash(e.to_string()))
        })
        .await
        .map_err(|e| PasswordError::Task(e.to_string()))?
    }

    /// Checks `plaintext` against a stored digest. The cost recorded in the
    /// digest wins over the configured one.
    pub async fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, PasswordError> {
        let hasher = self.hasher();
        let plaintext = plaintext.to_owned();
        let digest = digest.to_owned();
        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&digest).map_err(|e| PasswordError::Digest(e.to_string()))?;
            Ok(hasher.verify_password(plaintext.as_bytes(), &parsed).is_ok())
        })
        .await
        .map_err(|e| PasswordError::Task(e.to_string()))?
    }
}
