//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::auth::{PasswordError, PasswordService, TokenService};
use crate::config::Config;
use mesto_core::ports::DatabaseService;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub passwords: PasswordService,
    pub tokens: TokenService,
}

impl AppState {
    /// Derives the credential services from `config` and wraps everything up
    /// for the router.
    pub fn new(db: Arc<dyn DatabaseService>, config: Arc<Config>) -> Result<Self, PasswordError> {
        let passwords = PasswordService::new(config.hash_cost)?;
        let tokens = TokenService::new(&config.jwt_secret);
        Ok(Self {
            db,
            config,
            passwords,
            tokens,
        })
    }
}
