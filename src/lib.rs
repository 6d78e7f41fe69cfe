pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod password;
pub mod routes;
pub mod service;
pub mod state;

pub use auth::{IssuedToken, TokenError, TokenService};
pub use config::{Config, ConfigError};
pub use db::{CredentialStore, Database, ResourceStore, StoreError};
pub use errors::ApiError;
pub use middleware::{authorize, AuthenticatedUser};
pub use password::{HashError, PasswordHasher};
pub use routes::{configure, ApiDoc};
pub use state::{AppState, StartupError};
