// src/handlers/admin.rs

use axum::{extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::user::AdminUserRow,
    utils::{extract::Json, jwt::AdminUser},
};

/// Lists every account, with storefront info where one exists.
/// Admin only.
pub async fn list_users(
    State(pool): State<SqlitePool>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, AdminUserRow>(
        r#"
        SELECT
            u.id, u.name, u.email, u.role,
            s.shop_name, s.is_active
        FROM users u
        LEFT JOIN sellers s ON u.id = s.user_id
        ORDER BY u.role DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(users))
}
