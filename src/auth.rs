use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};
use bcrypt::{hash, verify};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::ApiError;

/// Claims carried in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub exp: usize,
}

/// JWT service for token generation and validation.
#[derive(Clone)]
pub struct JwtService {
    secret: String,
    expiration_hours: u64,
}

impl JwtService {
    pub fn new(secret: String, expiration_hours: Option<u64>) -> Result<Self, ApiError> {
        if secret.len() < 32 {
            return Err(ApiError::internal(
                "JWT secret must be at least 32 characters long",
            ));
        }

        Ok(Self {
            secret,
            // Cap at 7 days
            expiration_hours: expiration_hours.unwrap_or(24).min(168),
        })
    }

    /// Create the service from `JWT_SECRET_KEY` / `JWT_EXPIRATION_HOURS`.
    pub fn from_env() -> Result<Self, ApiError> {
        let secret = std::env::var("JWT_SECRET_KEY")
            .map_err(|_| ApiError::internal("JWT_SECRET_KEY environment variable required"))?;

        let expiration_hours = std::env::var("JWT_EXPIRATION_HOURS")
            .ok()
            .and_then(|h| h.parse().ok())
            .unwrap_or(24);

        Self::new(secret, Some(expiration_hours))
    }

    pub fn generate_token(&self, user_id: &str, email: &str) -> Result<String, ApiError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| ApiError::internal("system clock before Unix epoch"))?
            .as_secs();

        let exp = now + (self.expiration_hours * 3600);

        let claims = Claims {
            sub: user_id.to_owned(),
            email: email.to_owned(),
            exp: exp as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|_| ApiError::internal("failed to sign access token"))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 30; // clock skew tolerance in seconds

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &validation,
        )
        .map_err(|e| {
            tracing::warn!("JWT validation failed: {e}");
            ApiError::unauthorized("Invalid or expired token")
        })?;

        Ok(token_data.claims)
    }
}

/// Password hashing and verification.
pub struct PasswordService;

impl PasswordService {
    pub fn hash_password(password: &str) -> Result<String, ApiError> {
        let cost = std::env::var("BCRYPT_COST")
            .ok()
            .and_then(|c| c.parse().ok())
            .unwrap_or(12)
            .clamp(10, 15);

        hash(password, cost).map_err(|e| {
            tracing::error!("password hashing failed: {e}");
            ApiError::internal("failed to hash password")
        })
    }

    pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
        verify(password, hash).map_err(|e| {
            tracing::warn!("password verification failed: {e}");
            ApiError::internal("failed to verify password")
        })
    }
}

/// Middleware guarding the authenticated portion of the API. Valid tokens
/// have their claims inserted into request extensions for handlers.
pub async fn auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => {
            header.strip_prefix("Bearer ").unwrap_or("")
        }
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    match jwt_service.validate_token(token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "this-is-a-test-secret-with-enough-length";

    #[test]
    fn jwt_service_rejects_short_secrets() {
        assert!(JwtService::new("short".to_string(), None).is_err());
        assert!(JwtService::new(TEST_SECRET.to_string(), Some(24)).is_ok());
    }

    #[test]
    fn expiration_is_capped_at_a_week() {
        let service = JwtService::new(TEST_SECRET.to_string(), Some(9000)).unwrap();
        assert_eq!(service.expiration_hours, 168);
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        let service = JwtService::new(TEST_SECRET.to_string(), Some(1)).unwrap();

        let token = service
            .generate_token("00000000-0000-0000-0000-000000000001", "analyst@forensics.io")
            .unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "00000000-0000-0000-0000-000000000001");
        assert_eq!(claims.email, "analyst@forensics.io");
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let service = JwtService::new(TEST_SECRET.to_string(), Some(1)).unwrap();
        let other = JwtService::new("another-secret-that-is-long-enough-too!".to_string(), Some(1))
            .unwrap();

        let token = service.generate_token("u1", "a@b.io").unwrap();
        assert!(other.validate_token(&token).is_err());
        assert!(service.validate_token("not.a.token").is_err());
    }

    #[test]
    fn password_hash_round_trip() {
        std::env::set_var("BCRYPT_COST", "10");
        let hash = PasswordService::hash_password("demo123").unwrap();

        assert!(PasswordService::verify_password("demo123", &hash).unwrap());
        assert!(!PasswordService::verify_password("wrong-password", &hash).unwrap());
    }
}
