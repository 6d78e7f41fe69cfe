use actix_web::{error, error::BlockingError, http::header, http::StatusCode, HttpResponse};
use derive_more::{Display, Error};
use serde_json::json;

use crate::auth::TokenError;
use crate::db::StoreError;
use crate::password::HashError;

/// Boundary error for every HTTP handler.
///
/// Client-facing messages are deliberately generic: store and hasher
/// failures are logged where they are converted and surface as `Internal`.
#[derive(Debug, Display, Error)]
pub enum ApiError {
    #[display("invalid input: {field}")]
    InputInvalid { field: String },

    #[display("username or email already registered")]
    Conflict,

    #[display("invalid email or password")]
    Unauthorized,

    #[display("{_0}")]
    Token(TokenError),

    #[display("forbidden")]
    Forbidden,

    #[display("not found")]
    NotFound,

    #[display("internal error")]
    Internal,
}

impl ApiError {
    pub fn invalid(field: impl Into<String>) -> Self {
        ApiError::InputInvalid {
            field: field.into(),
        }
    }
}

impl error::ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let mut res = HttpResponse::build(self.status_code());
        if let ApiError::Token(_) = self {
            res.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        res.json(json!({ "error": self.to_string() }))
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            ApiError::InputInvalid { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Unauthorized | ApiError::Token(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing { .. } => {
                log::error!("token signing failed: {}", err);
                ApiError::Internal
            }
            other => ApiError::Token(other),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { field } => {
                log::info!("registration rejected, duplicate {}", field);
                ApiError::Conflict
            }
            StoreError::Backend { .. } => {
                log::error!("store failure: {}", err);
                ApiError::Internal
            }
        }
    }
}

impl From<HashError> for ApiError {
    fn from(err: HashError) -> Self {
        log::error!("password hasher failure: {}", err);
        ApiError::Internal
    }
}

impl From<BlockingError> for ApiError {
    fn from(err: BlockingError) -> Self {
        log::error!("blocking task failed: {}", err);
        ApiError::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::invalid("email").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Token(TokenError::Expired).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_backend_detail_is_hidden() {
        let err: ApiError = StoreError::Backend {
            message: "disk I/O error at /var/lib/todo.db".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::Internal));
        assert_eq!(err.to_string(), "internal error");
    }

    #[test]
    fn test_token_errors_carry_bearer_challenge() {
        let res = ApiError::Token(TokenError::Unauthorized).error_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            res.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn test_signing_failure_is_internal() {
        let err: ApiError = TokenError::Signing {
            message: "bad key".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::Internal));
    }
}
