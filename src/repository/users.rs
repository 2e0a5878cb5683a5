use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{decode_enum, Database};
use crate::errors::ApiError;
use crate::models::{Role, User};

const USER_COLUMNS: &str = "id, email, password_hash, name, role, avatar, created_at";

impl Database {
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        role: Role,
    ) -> Result<User, ApiError> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            name: name.to_owned(),
            role,
            avatar: None,
            created_at: Utc::now(),
        };
        self.insert_user(&user).await?;
        Ok(user)
    }

    /// Inserts a fully-formed row, caller-supplied id included. The unique
    /// email index surfaces duplicates as a Conflict.
    pub async fn insert_user(&self, user: &User) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, name, role, avatar, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(&user.avatar)
        .bind(user.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await?;
        row.map(|r| map_user(&r)).transpose()
    }

    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, ApiError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.map(|r| map_user(&r)).transpose()
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(map_user).collect()
    }

    pub async fn update_user_name(&self, id: &str, name: &str) -> Result<User, ApiError> {
        let result = sqlx::query("UPDATE users SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("User not found"));
        }
        self.find_user_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    pub async fn update_user_password(
        &self,
        id: &str,
        password_hash: &str,
    ) -> Result<(), ApiError> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("User not found"));
        }
        Ok(())
    }
}

fn map_user(row: &SqliteRow) -> Result<User, ApiError> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        name: row.try_get("name")?,
        role: decode_enum::<Role>("role", &role)?,
        avatar: row.try_get("avatar")?,
        created_at: row.try_get("created_at")?,
    })
}
