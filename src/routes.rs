// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    config::MAX_UPLOAD_BYTES,
    handlers::{admin, auth, products, profile, sellers, uploads},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, profile, products, sellers, admin).
/// * Serves the uploads directory as static files under /uploads.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/sign-up", post(auth::sign_up))
        .route("/sign-up-seller", post(auth::sign_up_seller))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout));

    let profile_routes = Router::new()
        .route("/me", get(profile::get_me))
        .route(
            "/profile",
            get(profile::get_profile).patch(profile::change_password),
        );

    // Multipart bodies need headroom above the raw image ceiling for the
    // form framing; the 5 MiB image limit itself is enforced per field.
    let product_routes = Router::new()
        .route("/", get(products::list_products))
        .route(
            "/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route(
            "/{id}/reviews",
            get(products::list_reviews).post(products::create_review),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024));

    let seller_routes = Router::new()
        .route("/", get(sellers::list_sellers))
        .route(
            "/{id}",
            get(sellers::get_seller).patch(sellers::update_seller),
        )
        .route("/{id}/products", get(sellers::list_seller_products));

    let admin_routes = Router::new().route("/users", get(admin::list_users));

    let upload_routes = Router::new()
        .route("/upload", post(uploads::upload_product))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024));

    let api_routes = Router::new()
        .merge(auth_routes)
        .merge(profile_routes)
        .merge(upload_routes)
        .nest("/products", product_routes)
        .nest("/sellers", seller_routes)
        .nest("/admin", admin_routes);

    let upload_dir = state.config.upload_dir.clone();

    Router::new()
        .nest("/api", api_routes)
        .nest_service("/uploads", ServeDir::new(upload_dir))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
