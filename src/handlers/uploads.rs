use std::path::Path;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    config::{ALLOWED_IMAGE_TYPES, Config, MAX_UPLOAD_BYTES},
    error::AppError,
    utils::{extract::Json, html::clean_html, jwt::Claims},
};

/// Maps an accepted MIME type to the extension the file is stored under.
/// The extension never comes from the client filename.
fn extension_for(mime: &str) -> Option<&'static str> {
    ALLOWED_IMAGE_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == mime)
        .map(|(_, ext)| *ext)
}

/// Validates an image payload and writes it into the uploads directory
/// under a fresh UUID name. Returns the public `/uploads/...` path.
pub(crate) async fn store_image(
    upload_dir: &str,
    content_type: Option<&str>,
    data: &[u8],
) -> Result<String, AppError> {
    let ext = content_type.and_then(extension_for).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Unsupported image type '{}'; allowed: jpeg, png, webp, gif",
            content_type.unwrap_or("unknown")
        ))
    })?;

    if data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest(format!(
            "Image exceeds the {} MiB limit",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let filename = format!("{}.{}", Uuid::new_v4(), ext);
    let path = Path::new(upload_dir).join(&filename);

    tokio::fs::write(&path, data).await.map_err(|e| {
        tracing::error!("Failed to write upload {}: {:?}", path.display(), e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(format!("/uploads/{}", filename))
}

/// Removes a stored image by its public `/uploads/...` path. Failures are
/// logged, not propagated.
pub(crate) async fn remove_stored_image(upload_dir: &str, image_url: &str) {
    if let Some(filename) = image_url.strip_prefix("/uploads/") {
        let path = Path::new(upload_dir).join(filename);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Failed to remove stored image {}: {:?}", path.display(), e);
        }
    }
}

/// Creates a product from a multipart form: scalar fields plus one image.
/// Seller accounts only; the image is mandatory.
pub async fn upload_product(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    claims: Claims,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let seller_id = claims.require_seller()?;

    let mut title: Option<String> = None;
    let mut description = String::new();
    let mut category = String::new();
    let mut material = String::new();
    let mut dimensions = String::new();
    let mut price: Option<f64> = None;
    let mut image: Option<(Option<String>, axum::body::Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => title = Some(field.text().await?),
            "description" => description = field.text().await?,
            "category" => category = field.text().await?,
            "material" => material = field.text().await?,
            "dimensions" => dimensions = field.text().await?,
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
    let price = price.ok_or(AppError::BadRequest("Price is required".to_string()))?;

    let Some((content_type, data)) = image else {
        return Err(AppError::BadRequest("No image uploaded".to_string()));
    };
    if data.is_empty() {
        return Err(AppError::BadRequest("No image uploaded".to_string()));
    }

    let image_url = store_image(&config.upload_dir, content_type.as_deref(), &data).await?;
    let description = clean_html(&description);

    let product_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO products (seller_id, title, description, price, category, material, dimensions, image_url)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        RETURNING id
        "#,
    )
    .bind(seller_id)
    .bind(&title)
    .bind(&description)
    .bind(price)
    .bind(&category)
    .bind(&material)
    .bind(&dimensions)
    .bind(&image_url)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create product: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(json!({ "id": product_id }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_mime_types_map_to_extensions() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("image/gif"), Some("gif"));
    }

    #[test]
    fn disallowed_mime_types_are_rejected() {
        assert_eq!(extension_for("application/pdf"), None);
        assert_eq!(extension_for("image/svg+xml"), None);
        assert_eq!(extension_for(""), None);
    }

    #[tokio::test]
    async fn store_image_rejects_oversized_payloads() {
        let data = vec![0u8; MAX_UPLOAD_BYTES + 1];
        let result = store_image("/tmp/never-created", Some("image/png"), &data).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn store_image_writes_under_uuid_name() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_string_lossy().to_string();

        let url = store_image(&dir_str, Some("image/png"), b"not-really-a-png")
            .await
            .unwrap();

        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".png"));

        let filename = url.trim_start_matches("/uploads/");
        let written = std::fs::read(dir.path().join(filename)).unwrap();
        assert_eq!(written, b"not-really-a-png");
    }

    #[tokio::test]
    async fn remove_stored_image_deletes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_string_lossy().to_string();

        let url = store_image(&dir_str, Some("image/jpeg"), b"doomed")
            .await
            .unwrap();
        let filename = url.trim_start_matches("/uploads/").to_string();
        assert!(dir.path().join(&filename).exists());

        remove_stored_image(&dir_str, &url).await;
        assert!(!dir.path().join(&filename).exists());
    }
}
