use axum::{extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::user::{ChangePasswordRequest, MeResponse, ProfileResponse},
    utils::{
        extract::Json,
        hash::{hash_password, verify_password},
        jwt::Claims,
    },
};

/// Get the current user's identity block.
pub async fn get_me(
    State(pool): State<SqlitePool>,
    claims: Claims,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let row = sqlx::query_as::<_, (i64, String, String, String)>(
        "SELECT id, name, email, role FROM users WHERE id = ?1",
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    let seller_id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM sellers WHERE user_id = ?1 AND is_active = 1",
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?;

    let me = MeResponse {
        id: row.0,
        name: row.1,
        email: row.2,
        role: row.3,
        is_seller: seller_id.is_some(),
        seller_id,
    };

    Ok(Json(json!({ "user": me })))
}

/// Get the current user's profile.
///
/// Sellers pick up their shop fields through the LEFT JOIN; for plain
/// buyers those columns are NULL and drop out of the JSON.
pub async fn get_profile(
    State(pool): State<SqlitePool>,
    claims: Claims,
) -> Result<impl IntoResponse, AppError> {
    let profile = sqlx::query_as::<_, ProfileResponse>(
        r#"
        SELECT
            u.id, u.name, u.email, u.role,
            s.shop_name, s.bio, s.profile_pic, s.story, s.is_active
        FROM users u
        LEFT JOIN sellers s ON u.id = s.user_id
        WHERE u.id = ?1
        "#,
    )
    .bind(claims.user_id())
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User profile not found.".to_string()))?;

    Ok(Json(profile))
}

/// Change the current user's password.
///
/// Requires the current password; the new one must be at least 8 characters.
pub async fn change_password(
    State(pool): State<SqlitePool>,
    claims: Claims,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(current_password), Some(new_password)) =
        (payload.current_password, payload.new_password)
    else {
        return Err(AppError::BadRequest(
            "Current password and new password are required.".to_string(),
        ));
    };

    if new_password.len() < 8 {
        return Err(AppError::BadRequest(
            "New password must be at least 8 characters long.".to_string(),
        ));
    }

    let user_id = claims.user_id();

    let password_hash =
        sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&pool)
            .await?
            .ok_or(AppError::NotFound("User not found.".to_string()))?;

    if !verify_password(&current_password, &password_hash)? {
        return Err(AppError::AuthError(
            "Incorrect current password.".to_string(),
        ));
    }

    let new_hash = hash_password(&new_password)?;

    sqlx::query(
        r#"
        UPDATE users
        SET password_hash = ?1,
            updated_at = STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?2
        "#,
    )
    .bind(&new_hash)
    .bind(user_id)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update password: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(json!({ "message": "Password updated successfully." })))
}
