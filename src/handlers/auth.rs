// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::{
        seller::SellerSignUpRequest,
        user::{LoginRequest, MeResponse, SignUpRequest, User},
    },
    utils::{
        extract::Json,
        hash::{hash_password, verify_password},
        html::clean_html,
        jwt::sign_jwt,
    },
};

/// Registers a new buyer account.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with the new user id.
pub async fn sign_up(
    State(pool): State<SqlitePool>,
    Json(payload): Json<SignUpRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (name, email, password_hash)
        VALUES (?1, ?2, ?3)
        RETURNING id
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&hashed_password)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Email already registered.".to_string())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(json!({ "user_id": user_id }))))
}

/// Registers a seller: a user row with role 'seller' plus its storefront.
///
/// Both inserts run in one transaction so a seller row exists exactly when
/// its user row does.
pub async fn sign_up_seller(
    State(pool): State<SqlitePool>,
    Json(payload): Json<SellerSignUpRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;
    let bio = payload.bio.as_deref().map(clean_html);
    let story = payload.story.as_deref().map(clean_html);

    let mut tx = pool.begin().await?;

    // 1. Insert the user with role 'seller'
    let user_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (name, email, password_hash, role)
        VALUES (?1, ?2, ?3, 'seller')
        RETURNING id
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&hashed_password)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Email already registered.".to_string())
        } else {
            tracing::error!("Failed to register seller user: {:?}", e);
            AppError::from(e)
        }
    })?;

    // 2. Insert the storefront referencing the new user
    sqlx::query(
        r#"
        INSERT INTO sellers (user_id, shop_name, bio, profile_pic, story, is_active, approved_by)
        VALUES (?1, ?2, ?3, ?4, ?5, 1, NULL)
        "#,
    )
    .bind(user_id)
    .bind(&payload.shop_name)
    .bind(&bio)
    .bind(&payload.profile_pic)
    .bind(&story)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create seller profile: {:?}", e);
        AppError::from(e)
    })?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(json!({ "user_id": user_id }))))
}

/// Authenticates a user and returns a JWT token.
///
/// The same 401 message covers unknown email and wrong password, so the
/// response does not reveal which accounts exist.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    };

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, password_hash, role, created_at
        FROM users
        WHERE email = ?1
        "#,
    )
    .bind(&email)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    let is_valid = verify_password(&password, &user.password_hash)?;

    if !is_valid {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    // Sellers carry their storefront id in the token for ownership checks.
    let seller_id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM sellers WHERE user_id = ?1 AND is_active = 1",
    )
    .bind(user.id)
    .fetch_optional(&pool)
    .await?;

    let token = sign_jwt(
        user.id,
        &user.name,
        &user.email,
        &user.role,
        seller_id,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    let me = MeResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        is_seller: seller_id.is_some(),
        seller_id,
    };

    Ok(Json(json!({ "token": token, "user": me })))
}

/// Stateless logout acknowledgement.
///
/// The token is the only session state and is held client-side; there is
/// nothing to revoke here.
pub async fn logout() -> impl IntoResponse {
    Json(json!({ "message": "Logged out successfully." }))
}
