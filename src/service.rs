//! Account and todo operations, independent of the HTTP layer.
//!
//! Every todo operation takes the caller's [`AuthenticatedUser`]; a todo
//! owned by someone else is reported as `Forbidden` and its contents are
//! never returned.

use crate::auth::IssuedToken;
use crate::errors::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::{
    LoginRequest, NewUser, RegisterRequest, TodoItem, TodoItemRequest, UserProfile,
    VALID_STATUSES,
};
use crate::password::MAX_PASSWORD_BYTES;
use crate::state::AppState;

const MAX_USERNAME_LEN: usize = 64;
const MAX_EMAIL_LEN: usize = 254;

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_registration(req: &RegisterRequest) -> Result<(String, String), ApiError> {
    let username = req.username.trim();
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::invalid("username"));
    }

    let email = normalize_email(&req.email);
    let valid_email = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        None => false,
    };
    if !valid_email || email.len() > MAX_EMAIL_LEN {
        return Err(ApiError::invalid("email"));
    }

    if req.password.is_empty() || req.password.len() > MAX_PASSWORD_BYTES {
        return Err(ApiError::invalid("password"));
    }

    Ok((username.to_string(), email))
}

fn validate_todo(req: &TodoItemRequest) -> Result<(), ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::invalid("title"));
    }
    if req.description.trim().is_empty() {
        return Err(ApiError::invalid("description"));
    }
    if !VALID_STATUSES.contains(&req.status.as_str()) {
        return Err(ApiError::invalid("status"));
    }
    Ok(())
}

/// Create an account and return its id.
pub fn register(state: &AppState, req: &RegisterRequest) -> Result<i64, ApiError> {
    let (username, email) = validate_registration(req)?;
    let password_hash = state.hasher.hash(&req.password)?;
    let id = state.users.insert_user(&NewUser {
        username,
        email,
        password_hash,
    })?;
    log::info!("registered user {}", id);
    Ok(id)
}

/// Check credentials and issue a token. Unknown email and wrong password
/// produce the same error.
pub fn login(state: &AppState, req: &LoginRequest) -> Result<IssuedToken, ApiError> {
    let email = normalize_email(&req.email);
    if email.is_empty() {
        return Err(ApiError::invalid("email"));
    }
    if req.password.is_empty() {
        return Err(ApiError::invalid("password"));
    }

    let Some(user) = state.users.find_by_email(&email)? else {
        state.hasher.verify_dummy(&req.password);
        log::debug!("login failed: unknown email");
        return Err(ApiError::Unauthorized);
    };

    if !state.hasher.verify(&req.password, &user.password_hash)? {
        log::debug!("login failed for user {}: bad password", user.id);
        return Err(ApiError::Unauthorized);
    }

    let issued = state.tokens.issue(user.id, state.token_ttl)?;
    log::info!("user {} logged in", user.id);
    Ok(issued)
}

pub fn profile(state: &AppState, caller: AuthenticatedUser) -> Result<UserProfile, ApiError> {
    // A valid token for a since-deleted account is no longer a credential.
    let user = state
        .users
        .find_by_id(caller.id)?
        .ok_or(ApiError::Unauthorized)?;
    Ok(user.into())
}

pub fn list_todos(state: &AppState, caller: AuthenticatedUser) -> Result<Vec<TodoItem>, ApiError> {
    Ok(state.todos.list_by_owner(caller.id)?)
}

pub fn create_todo(
    state: &AppState,
    caller: AuthenticatedUser,
    req: &TodoItemRequest,
) -> Result<TodoItem, ApiError> {
    validate_todo(req)?;
    let item = state.todos.create_todo(caller.id, req)?;
    log::info!("user {} created todo {}", caller.id, item.id);
    Ok(item)
}

/// Fetch a todo the caller owns.
pub fn get_todo(
    state: &AppState,
    caller: AuthenticatedUser,
    id: &str,
) -> Result<TodoItem, ApiError> {
    let item = state.todos.get_todo(id)?.ok_or(ApiError::NotFound)?;
    if item.owner_id != caller.id {
        log::warn!("user {} denied access to todo {}", caller.id, id);
        return Err(ApiError::Forbidden);
    }
    Ok(item)
}

pub fn update_todo(
    state: &AppState,
    caller: AuthenticatedUser,
    id: &str,
    req: &TodoItemRequest,
) -> Result<TodoItem, ApiError> {
    get_todo(state, caller, id)?;
    validate_todo(req)?;
    state.todos.update_todo(id, req)?.ok_or(ApiError::NotFound)
}

pub fn delete_todo(state: &AppState, caller: AuthenticatedUser, id: &str) -> Result<(), ApiError> {
    get_todo(state, caller, id)?;
    if !state.todos.delete_todo(id)? {
        return Err(ApiError::NotFound);
    }
    log::info!("user {} deleted todo {}", caller.id, id);
    Ok(())
}
