use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        product::ProductWithStats,
        seller::{Seller, SellerListRow, UpdateSellerRequest},
    },
    utils::{extract::Json, html::clean_html, jwt::Claims},
};

/// Lists all active sellers with their public shop info.
pub async fn list_sellers(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let sellers = sqlx::query_as::<_, SellerListRow>(
        r#"
        SELECT
            sellers.id, users.name, users.email,
            sellers.bio, sellers.profile_pic, sellers.story,
            sellers.shop_name, sellers.created_at
        FROM sellers
        JOIN users ON sellers.user_id = users.id
        WHERE sellers.is_active = 1
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list sellers: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(sellers))
}

/// Gets one seller's public profile.
pub async fn get_seller(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let seller = sqlx::query_as::<_, SellerListRow>(
        r#"
        SELECT
            sellers.id, users.name, users.email,
            sellers.bio, sellers.profile_pic, sellers.story,
            sellers.shop_name, sellers.created_at
        FROM sellers
        JOIN users ON sellers.user_id = users.id
        WHERE sellers.id = ?1 AND sellers.is_active = 1
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Seller not found".to_string()))?;

    Ok(Json(seller))
}

/// Lists one seller's products, with the same review statistics as the
/// main product listing.
pub async fn list_seller_products(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let products = sqlx::query_as::<_, ProductWithStats>(
        r#"
        SELECT
            p.id, p.seller_id, p.title, p.description, p.price,
            p.category, p.material, p.dimensions, p.image_url,
            s.shop_name,
            CAST(COALESCE(AVG(r.rating), 0) AS REAL) AS avg_rating,
            COUNT(r.id) AS rating_count,
            p.created_at
        FROM products p
        JOIN sellers s ON p.seller_id = s.id
        LEFT JOIN reviews r ON r.product_id = p.id
        WHERE p.seller_id = ?1
        GROUP BY p.id
        ORDER BY p.created_at DESC
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(products))
}

/// Partially updates a seller's own profile.
///
/// Only the four allow-listed fields can be written; whatever the payload
/// omits stays untouched. The path id must be the caller's own storefront.
pub async fn update_seller(
    State(pool): State<SqlitePool>,
    claims: Claims,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSellerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let seller_id = claims.require_seller()?;

    if id != seller_id {
        return Err(AppError::Forbidden(
            "You can only update your own profile".to_string(),
        ));
    }

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.is_empty() {
        return Err(AppError::BadRequest(
            "No update data provided".to_string(),
        ));
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE sellers SET ");
    let mut separated = builder.separated(", ");

    if let Some(shop_name) = payload.shop_name {
        separated.push("shop_name = ");
        separated.push_bind_unseparated(shop_name);
    }

    if let Some(bio) = payload.bio {
        separated.push("bio = ");
        separated.push_bind_unseparated(clean_html(&bio));
    }

    if let Some(story) = payload.story {
        separated.push("story = ");
        separated.push_bind_unseparated(clean_html(&story));
    }

    if let Some(profile_pic) = payload.profile_pic {
        separated.push("profile_pic = ");
        separated.push_bind_unseparated(profile_pic);
    }

    separated.push("updated_at = STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')");

    builder.push(" WHERE id = ");
    builder.push_bind(seller_id);
    builder.push(
        " RETURNING id, user_id, shop_name, bio, profile_pic, story, \
         is_active, approved_by, created_at, updated_at",
    );

    let seller = builder
        .build_query_as::<Seller>()
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update seller: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .ok_or(AppError::NotFound("Seller not found".to_string()))?;

    Ok(Json(seller))
}
