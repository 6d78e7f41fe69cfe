use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};

use crate::auth::{TokenError, TokenService};
use crate::errors::ApiError;
use crate::state::AppState;

/// Verified identity of the caller. Taking this as a handler argument is
/// what makes a route protected: extraction fails, and the handler body
/// never runs, unless a valid bearer token is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i64,
}

/// Pull the bearer token out of an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, TokenError> {
    let value = header.ok_or(TokenError::Unauthorized)?;
    let (scheme, token) = value.trim().split_once(' ').ok_or(TokenError::Malformed)?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(TokenError::Malformed);
    }
    Ok(token.trim())
}

/// Gate a protected operation on the `Authorization` header.
pub fn authorize(
    header: Option<&str>,
    tokens: &TokenService,
) -> Result<AuthenticatedUser, TokenError> {
    let token = bearer_token(header)?;
    let id = tokens.verify(token)?;
    Ok(AuthenticatedUser { id })
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            log::error!("AppState missing from app data");
            return ready(Err(ApiError::Internal));
        };

        // A header with non-visible-ASCII bytes cannot hold a token.
        let header = match req.headers().get(header::AUTHORIZATION) {
            Some(value) => match value.to_str() {
                Ok(s) => Some(s),
                Err(_) => return ready(Err(TokenError::Malformed.into())),
            },
            None => None,
        };

        let result = authorize(header, &state.tokens).map_err(|e| {
            log::debug!("rejected {} {}: {}", req.method(), req.path(), e);
            ApiError::from(e)
        });
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn tokens() -> TokenService {
        TokenService::new(b"gate-secret")
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        assert_eq!(authorize(None, &tokens()), Err(TokenError::Unauthorized));
    }

    #[test]
    fn test_wrong_scheme_is_malformed() {
        assert_eq!(
            authorize(Some("Basic dXNlcjpwYXNz"), &tokens()),
            Err(TokenError::Malformed)
        );
        assert_eq!(authorize(Some("Bearer"), &tokens()), Err(TokenError::Malformed));
    }

    #[test]
    fn test_blank_token_is_malformed() {
        assert_eq!(authorize(Some("Bearer   "), &tokens()), Err(TokenError::Malformed));
        assert_eq!(bearer_token(Some("Bearer  x")), Ok("x"));
    }

    #[test]
    fn test_valid_token_yields_subject() {
        let tokens = tokens();
        let issued = tokens.issue(7, Duration::minutes(5)).unwrap();
        let header = format!("Bearer {}", issued.token);
        assert_eq!(
            authorize(Some(&header), &tokens),
            Ok(AuthenticatedUser { id: 7 })
        );

        let lower = format!("bearer {}", issued.token);
        assert_eq!(authorize(Some(&lower), &tokens).map(|u| u.id), Ok(7));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = tokens();
        let issued = tokens.issue(7, Duration::zero()).unwrap();
        let header = format!("Bearer {}", issued.token);
        assert_eq!(authorize(Some(&header), &tokens), Err(TokenError::Expired));
    }
}
