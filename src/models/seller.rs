// src/models/seller.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

/// Represents the 'sellers' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Seller {
    pub id: i64,

    /// The owning user account (role 'seller').
    pub user_id: i64,

    pub shop_name: String,

    pub bio: Option<String>,

    /// URL of the shop's profile picture.
    pub profile_pic: Option<String>,

    /// Long-form "about the maker" text.
    pub story: Option<String>,

    pub is_active: bool,

    /// Admin who approved the storefront, when moderation is in use.
    pub approved_by: Option<i64>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for seller registration: user credentials plus shop metadata,
/// inserted as one transaction.
#[derive(Debug, Deserialize, Validate)]
pub struct SellerSignUpRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required."))]
    pub name: String,

    #[validate(email(message = "A valid email address is required."))]
    pub email: String,

    #[validate(length(
        min = 8,
        max = 128,
        message = "Password length must be between 8 and 128 characters."
    ))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Shop name is required."))]
    pub shop_name: String,

    #[validate(length(max = 2000))]
    pub bio: Option<String>,

    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub profile_pic: Option<String>,

    #[validate(length(max = 20000))]
    pub story: Option<String>,
}

/// DTO for PATCH /api/sellers/{id}: the allow-listed partial update set.
/// Only supplied fields are written.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSellerRequest {
    #[validate(length(min = 1, max = 100))]
    pub shop_name: Option<String>,

    #[validate(length(max = 2000))]
    pub bio: Option<String>,

    #[validate(length(max = 20000))]
    pub story: Option<String>,

    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub profile_pic: Option<String>,
}

impl UpdateSellerRequest {
    pub fn is_empty(&self) -> bool {
        self.shop_name.is_none()
            && self.bio.is_none()
            && self.story.is_none()
            && self.profile_pic.is_none()
    }
}

/// Public listing row: seller joined with the owning user's name/email.
#[derive(Debug, Serialize, FromRow)]
pub struct SellerListRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    pub story: Option<String>,
    pub shop_name: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Validates that a string is a correctly formatted URL.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}
