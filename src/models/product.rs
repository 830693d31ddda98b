// src/models/product.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'products' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,

    /// The owning storefront. Mutations compare this against the
    /// seller id embedded in the caller's token.
    pub seller_id: i64,

    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub material: String,
    pub dimensions: String,

    /// Relative path under /uploads, recorded by the upload handler.
    pub image_url: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Listing/detail shape: the product joined with its shop name and the
/// aggregated review statistics (0/0 when unreviewed).
#[derive(Debug, Serialize, FromRow)]
pub struct ProductWithStats {
    pub id: i64,
    pub seller_id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub material: String,
    pub dimensions: String,
    pub image_url: String,
    pub shop_name: String,
    pub avg_rating: f64,
    pub rating_count: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ProductListParams {
    /// Exact category filter.
    pub category: Option<String>,

    /// Search keyword for title match.
    pub q: Option<String>,
}
