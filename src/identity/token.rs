use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Principal, Role};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("Token could not be issued")]
    Issue(#[source] jsonwebtoken::errors::Error),
}

/// Claims carried by every bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 token issuer/verifier sharing one secret
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: std::time::Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::minutes(15)),
        }
    }

    pub fn issue(&self, principal: &Principal) -> Result<String, AuthError> {
        self.issue_at(principal, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        principal: &Principal,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: principal.user_id,
            role: principal.role,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(AuthError::Issue)
    }

    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(AuthError::InvalidToken)?;

        Ok(Principal {
            user_id: data.claims.sub,
            role: data.claims.role,
        })
    }
}

/// Extract the token from an `Authorization` header value.
/// Both `<token>` and `Bearer <token>` are accepted.
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let header = header.trim();
    let token = match header.strip_prefix("Bearer") {
        Some(rest) if rest.is_empty() || rest.starts_with(' ') => rest.trim(),
        _ => header,
    };

    if token.is_empty() {
        Err(AuthError::MissingToken)
    } else {
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", std::time::Duration::from_secs(900))
    }

    #[test]
    fn test_issued_token_resolves_to_same_principal() {
        let tokens = service();
        let principal = Principal::admin(Uuid::new_v4());

        let token = tokens.issue(&principal).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), principal);
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service();
        let principal = Principal::user(Uuid::new_v4());

        let token = tokens
            .issue_at(&principal, Utc::now() - Duration::hours(2))
            .unwrap();

        assert!(matches!(tokens.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let other = TokenService::new("another-secret", std::time::Duration::from_secs(900));
        let token = other.issue(&Principal::user(Uuid::new_v4())).unwrap();

        assert!(matches!(service().verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(service().verify("not-a-jwt").is_err());
    }

    #[test]
    fn test_bearer_prefix_is_optional() {
        assert_eq!(bearer_token("Bearer abc.def").unwrap(), "abc.def");
        assert_eq!(bearer_token("abc.def").unwrap(), "abc.def");
        assert!(matches!(bearer_token("Bearer "), Err(AuthError::MissingToken)));
        assert!(matches!(bearer_token(""), Err(AuthError::MissingToken)));
    }
}
