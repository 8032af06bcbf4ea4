use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::models::UserId;
use crate::routes::error::ApiError;
use crate::routes::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Claims carried by the bearer token
///
/// `sub` is the numeric user id as a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub role: Role,
    pub exp: i64,
}

/// Validates HS256 bearer tokens issued by the auth service
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, ApiError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => ApiError::Unauthorized("token has expired".to_string()),
            _ => ApiError::Unauthorized(format!("invalid token: {}", e)),
        })?;

        let id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| ApiError::Unauthorized("token subject is not a user id".to_string()))?;

        Ok(AuthenticatedUser {
            user_id: UserId(id),
            role: data.claims.role,
        })
    }
}

/// Caller identity resolved from the `Authorization` header
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::User => Err(ApiError::Forbidden("admin role required".to_string())),
        }
    }
}

fn extract_bearer_token(req: &HttpRequest) -> Result<&str, ApiError> {
    let header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| ApiError::Unauthorized("missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("invalid authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("authorization header must use Bearer scheme".to_string()))
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<AppState>>() {
            Some(state) => extract_bearer_token(req).and_then(|token| state.tokens.verify(token)),
            None => Err(ApiError::Unauthorized("token verification unavailable".to_string())),
        };
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, sub: &str, role: Role, exp_offset: i64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            role,
            exp: chrono::Utc::now().timestamp() + exp_offset,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_valid_token() {
        let verifier = TokenVerifier::new("secret");
        let user = verifier.verify(&token("secret", "42", Role::User, 600)).unwrap();
        assert_eq!(user.user_id, UserId(42));
        assert!(user.require_admin().is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = TokenVerifier::new("secret");
        assert!(matches!(
            verifier.verify(&token("other", "42", Role::User, 600)),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = TokenVerifier::new("secret");
        assert!(verifier.verify(&token("secret", "42", Role::Admin, -3600)).is_err());
    }

    #[test]
    fn test_non_numeric_subject_rejected() {
        let verifier = TokenVerifier::new("secret");
        assert!(verifier.verify(&token("secret", "alice", Role::User, 600)).is_err());
    }
}
