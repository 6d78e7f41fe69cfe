use chrono::{DateTime, Duration, TimeZone, Utc};
use derive_more::{Display, Error};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::models::Claims;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[display("malformed token")]
    Malformed,

    #[display("missing or invalid token")]
    Unauthorized,

    #[display("token expired")]
    Expired,

    #[display("failed to sign token: {message}")]
    Signing { message: String },
}

/// A freshly signed token and the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HS256 tokens with the process-wide secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue(&self, user_id: i64, ttl: Duration) -> Result<IssuedToken, TokenError> {
        self.issue_at(user_id, ttl, Utc::now())
    }

    fn issue_at(
        &self,
        user_id: i64,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let iat = now.timestamp();
        let exp = iat + ttl.num_seconds();
        let claims = Claims {
            sub: user_id.to_string(),
            iat,
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(
            |e| TokenError::Signing {
                message: e.to_string(),
            },
        )?;
        let expires_at = Utc
            .timestamp_opt(exp, 0)
            .single()
            .ok_or_else(|| TokenError::Signing {
                message: format!("expiry {} out of range", exp),
            })?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Validate a token and return the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_)
                | ErrorKind::MissingRequiredClaim(_) => TokenError::Malformed,
                _ => TokenError::Unauthorized,
            }
        })?;

        // jsonwebtoken accepts exp == now; a token is only valid strictly before exp.
        if Utc::now().timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        data.claims
            .sub
            .parse::<i64>()
            .map_err(|_| TokenError::Malformed)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}
