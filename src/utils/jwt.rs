// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError};

/// JWT Claims structure. The signed token is the only session state the
/// system keeps; everything a handler needs about the caller lives here.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - stores the User ID (as string).
    pub sub: String,
    pub email: String,
    pub name: String,
    /// User's role: 'user', 'seller' or 'admin'.
    pub role: String,
    /// Present only when the account has an active storefront.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<i64>,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    /// The numeric user id carried in `sub`.
    pub fn user_id(&self) -> i64 {
        self.sub.parse::<i64>().unwrap_or(0)
    }

    /// Seller id for ownership-gated routes.
    /// Accounts without a storefront get 403, not 401: they are
    /// authenticated, just not allowed here.
    pub fn require_seller(&self) -> Result<i64, AppError> {
        self.seller_id
            .ok_or_else(|| AppError::Forbidden("Seller account required".to_string()))
    }
}

/// Signs a new JWT for the user.
///
/// The payload mirrors what login computes from the users/sellers join;
/// expiry is `expiration_seconds` from now (one hour by default).
pub fn sign_jwt(
    id: i64,
    name: &str,
    email: &str,
    role: &str,
    seller_id: Option<i64>,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: id.to_string(),
        email: email.to_owned(),
        name: name.to_owned(),
        role: role.to_owned(),
        seller_id,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Both failure cases map to 401, but the message tells an expired token
/// apart from a forged or malformed one.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::AuthError("Token expired".to_string()),
        _ => AppError::AuthError("Invalid token".to_string()),
    })?;

    Ok(token_data.claims)
}

/// Extractor: authenticated caller.
///
/// Pulls the bearer token from the `Authorization` header and verifies it.
/// Handlers that need a login simply take a `claims: Claims` argument;
/// a missing or bad token never reaches the handler body.
impl<S> FromRequestParts<S> for Claims
where
    Config: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Config::from_ref(state);

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let token = match auth_header {
            Some(value) if value.starts_with("Bearer ") => &value[7..],
            _ => {
                return Err(AppError::AuthError(
                    "Authorization token required".to_string(),
                ));
            }
        };

        verify_jwt(token, &config.jwt_secret)
    }
}

/// Extractor: authenticated caller with the 'admin' role.
///
/// Builds on the `Claims` extractor; a valid token with the wrong role is
/// 403 Forbidden rather than 401.
pub struct AdminUser(pub Claims);

impl<S> FromRequestParts<S> for AdminUser
where
    Config: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = Claims::from_request_parts(parts, state).await?;

        if claims.role != "admin" {
            return Err(AppError::Forbidden(
                "Only administrators can access this resource".to_string(),
            ));
        }

        Ok(AdminUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn sign_then_verify_round_trips() {
        let token = sign_jwt(42, "Jane", "jane@example.com", "seller", Some(7), SECRET, 60)
            .expect("signing failed");

        let claims = verify_jwt(&token, SECRET).expect("verification failed");
        assert_eq!(claims.user_id(), 42);
        assert_eq!(claims.email, "jane@example.com");
        assert_eq!(claims.role, "seller");
        assert_eq!(claims.seller_id, Some(7));
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        // Far enough in the past to clear the default 60s leeway.
        let past = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as usize
            - 600;

        let claims = Claims {
            sub: "1".to_string(),
            email: "old@example.com".to_string(),
            name: "Old".to_string(),
            role: "user".to_string(),
            seller_id: None,
            exp: past,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        match verify_jwt(&token, SECRET) {
            Err(AppError::AuthError(msg)) => assert!(msg.contains("expired")),
            other => panic!("expected expired-token error, got {:?}", other),
        }
    }

    #[test]
    fn wrong_secret_is_rejected_as_invalid() {
        let token = sign_jwt(1, "A", "a@example.com", "user", None, SECRET, 60).unwrap();

        match verify_jwt(&token, "some-other-secret") {
            Err(AppError::AuthError(msg)) => assert_eq!(msg, "Invalid token"),
            other => panic!("expected invalid-token error, got {:?}", other),
        }
    }

    #[test]
    fn require_seller_rejects_plain_users() {
        let token = sign_jwt(9, "B", "b@example.com", "user", None, SECRET, 60).unwrap();
        let claims = verify_jwt(&token, SECRET).unwrap();

        assert!(matches!(
            claims.require_seller(),
            Err(AppError::Forbidden(_))
        ));
    }
}
