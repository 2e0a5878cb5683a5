use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::auth::PasswordService;
use crate::errors::{ApiError, FieldError};
use crate::extract::AppJson;
use crate::models::{AuthUser, Role};
use crate::validation::is_valid_email;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl RegisterRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if !is_valid_email(&self.email) {
            errors.push(FieldError::new("email", "Invalid email address"));
        }
        if self.password.chars().count() < 6 {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 6 characters",
            ));
        }
        if self.name.chars().count() < 2 {
            errors.push(FieldError::new("name", "Name must be at least 2 characters"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(errors))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if !is_valid_email(&self.email) {
            errors.push(FieldError::new("email", "Invalid email address"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(errors))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: AuthUser,
}

/// POST /api/auth/register. New accounts always start as analysts.
pub async fn register(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    body.validate()?;

    if state.db.find_user_by_email(&body.email).await?.is_some() {
        return Err(ApiError::conflict("User already exists"));
    }

    let password_hash = PasswordService::hash_password(&body.password)?;
    let user = state
        .db
        .create_user(&body.email, &password_hash, &body.name, Role::Analyst)
        .await?;
    let token = state.jwt.generate_token(&user.id, &user.email)?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse { token, user: user.to_auth_user() }),
    ))
}

/// POST /api/auth/login. Unknown accounts and bad passwords are
/// indistinguishable from the outside.
pub async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    body.validate()?;

    let user = state
        .db
        .find_user_by_email(&body.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !PasswordService::verify_password(&body.password, &user.password_hash)? {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = state.jwt.generate_token(&user.id, &user.email)?;
    tracing::debug!(user_id = %user.id, "login succeeded");
    Ok(Json(AuthResponse { token, user: user.to_auth_user() }))
}
