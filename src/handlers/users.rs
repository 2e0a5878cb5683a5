use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::auth::{Claims, PasswordService};
use crate::errors::{ApiError, FieldError};
use crate::extract::AppJson;
use crate::handlers::MessageResponse;
use crate::models::{User, UserPublic};
use crate::AppState;

/// GET /api/users. Directory used for assignee pickers; no password hashes
/// leave this module.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<UserPublic>>, ApiError> {
    let users = state.db.list_users().await?;
    Ok(Json(users.iter().map(User::to_public).collect()))
}

/// GET /api/users/me.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserPublic>, ApiError> {
    let user = state
        .db
        .find_user_by_id(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user.to_public()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
}

/// PUT /api/users/me. Only the display name is editable.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(body): AppJson<UpdateProfileRequest>,
) -> Result<Json<UserPublic>, ApiError> {
    let user = match body.name {
        Some(name) => {
            if name.trim().chars().count() < 2 {
                return Err(ApiError::validation(vec![FieldError::new(
                    "name",
                    "Name must be at least 2 characters",
                )]));
            }
            state.db.update_user_name(&claims.sub, &name).await?
        }
        None => state
            .db
            .find_user_by_id(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?,
    };
    Ok(Json(user.to_public()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// PUT /api/users/me/password.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(body): AppJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut errors = Vec::new();
    if body.current_password.is_empty() {
        errors.push(FieldError::new(
            "currentPassword",
            "Current password is required",
        ));
    }
    if body.new_password.chars().count() < 6 {
        errors.push(FieldError::new(
            "newPassword",
            "Password must be at least 6 characters",
        ));
    }
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let user = state
        .db
        .find_user_by_id(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !PasswordService::verify_password(&body.current_password, &user.password_hash)? {
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    let password_hash = PasswordService::hash_password(&body.new_password)?;
    state.db.update_user_password(&user.id, &password_hash).await?;

    tracing::info!(user_id = %user.id, "password changed");
    Ok(Json(MessageResponse::new("Password updated successfully")))
}
