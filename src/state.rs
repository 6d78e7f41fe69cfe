use std::sync::Arc;

use chrono::Duration;
use derive_more::{Display, Error, From};

use crate::auth::TokenService;
use crate::config::Config;
use crate::db::{CredentialStore, Database, ResourceStore, StoreError};
use crate::password::{HashError, PasswordHasher};

/// Everything a request handler needs, built once at startup and shared
/// read-only through `web::Data`.
pub struct AppState {
    pub users: Arc<dyn CredentialStore>,
    pub todos: Arc<dyn ResourceStore>,
    pub hasher: PasswordHasher,
    pub tokens: TokenService,
    pub token_ttl: Duration,
}

#[derive(Debug, Display, Error, From)]
pub enum StartupError {
    #[display("database: {_0}")]
    Store(StoreError),
    #[display("password hasher: {_0}")]
    Hasher(HashError),
}

impl AppState {
    pub fn new(
        db: Arc<Database>,
        hasher: PasswordHasher,
        tokens: TokenService,
        token_ttl: Duration,
    ) -> Self {
        Self {
            users: db.clone(),
            todos: db,
            hasher,
            tokens,
            token_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let db = Arc::new(Database::open(&config.database_url)?);
        let hasher = PasswordHasher::new(config.bcrypt_cost)?;
        let tokens = TokenService::new(config.jwt_secret.as_bytes());
        Ok(Self::new(db, hasher, tokens, config.token_ttl))
    }
}
