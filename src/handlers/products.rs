use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    handlers::uploads::{remove_stored_image, store_image},
    models::{
        product::{Product, ProductListParams, ProductWithStats},
        review::{CreateReviewRequest, Review, ReviewResponse},
    },
    utils::{extract::Json, html::clean_html, jwt::Claims},
};

/// Lists products with shop name and aggregated review statistics.
/// Supports optional category and title-keyword filters.
pub async fn list_products(
    State(pool): State<SqlitePool>,
    Query(params): Query<ProductListParams>,
) -> Result<impl IntoResponse, AppError> {
    let search_pattern = params.q.map(|k| format!("%{}%", k));

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
        WHERE (?1 IS NULL OR p.category = ?1)
          AND (?2 IS NULL OR p.title LIKE ?2)
        GROUP BY p.id
        ORDER BY p.created_at DESC
        "#,
    )
    .bind(params.category)
    .bind(search_pattern)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list products: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(products))
}

/// Gets a single product with its review statistics.
/// Any valid token suffices; there is no ownership requirement to read.
pub async fn get_product(
    State(pool): State<SqlitePool>,
    _claims: Claims,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let product = sqlx::query_as::<_, ProductWithStats>(
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
        WHERE p.id = ?1
        GROUP BY p.id
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

/// Replaces a product's title, description and price, and optionally its
/// image. Only the owning seller may update; the ownership check runs
/// before any of the multipart payload is read.
pub async fn update_product(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    claims: Claims,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let seller_id = claims.require_seller()?;

    // 1. Fetch the row and check ownership
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, seller_id, title, description, price,
               category, material, dimensions, image_url, created_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Product not found".to_string()))?;

    if product.seller_id != seller_id {
        return Err(AppError::Forbidden(
            "You do not own this product".to_string(),
        ));
    }

    // 2. Read the multipart payload
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut price: Option<f64> = None;
    let mut image: Option<(Option<String>, axum::body::Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => title = Some(field.text().await?),
            "description" => description = Some(field.text().await?),
            "price" => {
                let raw = field.text().await?;
                let parsed = raw.trim().parse::<f64>().map_err(|_| {
                    AppError::BadRequest("Price must be a number".to_string())
                })?;
                price = Some(parsed);
            }
            "image" => {
                let content_type = field.content_type().map(|ct| ct.to_string());
                let data = field.bytes().await?;
                image = Some((content_type, data));
            }
            _ => {}
        }
    }

    let title = title.ok_or(AppError::BadRequest("Title is required".to_string()))?;
    let description =
        description.ok_or(AppError::BadRequest("Description is required".to_string()))?;
    let price = price.ok_or(AppError::BadRequest("Price is required".to_string()))?;
    let description = clean_html(&description);

    // 3. Store the replacement image when one was sent; otherwise keep the old one
    let new_image = match image {
        Some((content_type, data)) if !data.is_empty() => {
            Some(store_image(&config.upload_dir, content_type.as_deref(), &data).await?)
        }
        _ => None,
    };
    let image_url = new_image.clone().unwrap_or(product.image_url);

    let result = sqlx::query(
        r#"
        UPDATE products
        SET title = ?1, description = ?2, price = ?3, image_url = ?4
        WHERE id = ?5
        "#,
    )
    .bind(&title)
    .bind(&description)
    .bind(price)
    .bind(&image_url)
    .bind(id)
    .execute(&pool)
    .await;

    if let Err(e) = result {
        tracing::error!("Failed to update product: {:?}", e);
        // A failed update must not leave the replacement file behind
        if let Some(url) = &new_image {
            remove_stored_image(&config.upload_dir, url).await;
        }
        return Err(AppError::from(e));
    }

    Ok(Json(json!({ "success": true })))
}

/// Deletes a product together with its reviews.
///
/// The two deletes run in one transaction: the schema declares no cascade,
/// and a crash between them must not leave orphaned reviews.
pub async fn delete_product(
    State(pool): State<SqlitePool>,
    claims: Claims,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let seller_id = claims.require_seller()?;

    let owner_id = sqlx::query_scalar::<_, i64>("SELECT seller_id FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Product not found".to_string()))?;

    if owner_id != seller_id {
        return Err(AppError::Forbidden(
            "You do not own this product".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM reviews WHERE product_id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM products WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to delete product {}: {:?}", id, e);
        AppError::from(e)
    })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Lists a product's reviews with reviewer names, newest first.
pub async fn list_reviews(
    State(pool): State<SqlitePool>,
    Path(product_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let reviews = sqlx::query_as::<_, ReviewResponse>(
        r#"
        SELECT
            r.id, r.product_id, r.user_id, u.name AS reviewer_name,
            r.rating, r.comment, r.created_at
        FROM reviews r
        JOIN users u ON r.user_id = u.id
        WHERE r.product_id = ?1
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(product_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(reviews))
}

/// Submits a review for a product.
///
/// The 1..=5 rating invariant is enforced here at the boundary; an invalid
/// rating is rejected before anything touches the database.
pub async fn create_review(
    State(pool): State<SqlitePool>,
    claims: Claims,
    Path(product_id): Path<i64>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let product_exists = sqlx::query_scalar::<_, i64>("SELECT id FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_optional(&pool)
        .await?;

    if product_exists.is_none() {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    let comment = payload.comment.as_deref().map(clean_html);

    let review = sqlx::query_as::<_, Review>(
        r#"
        INSERT INTO reviews (product_id, user_id, rating, comment)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id, product_id, user_id, rating, comment, created_at
        "#,
    )
    .bind(product_id)
    .bind(claims.user_id())
    .bind(payload.rating)
    .bind(&comment)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to save review: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(review)))
}
