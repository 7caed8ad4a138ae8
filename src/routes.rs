// src/routes.rs

use std::sync::Arc;

use axum::{
    Router, http::Method, middleware,
    routing::{get, post, put},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, blog, category, interaction, profile},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, blogs, categories, profile, admin).
/// * Applies global middleware (Trace, CORS) and rate limiting on auth.
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:5173".parse().unwrap(),
        "http://127.0.0.1:5173".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    // Credential endpoints are the only brute-forceable surface.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(5)
            .burst_size(20)
            .finish()
            .expect("valid governor configuration"),
    );

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(GovernorLayer::new(governor_conf));

    // Public reads; posting a comment or toggling a like demands a bearer
    // token via the Claims extractor rather than a router-level layer.
    let blog_routes = Router::new()
        .route("/", get(blog::list_blogs))
        .route("/{slug}", get(blog::get_blog_by_slug))
        .route(
            "/{slug}/comments",
            get(interaction::list_comments).post(interaction::create_comment),
        )
        .route(
            "/{slug}/like",
            get(interaction::like_status).post(interaction::toggle_like),
        );

    let category_routes = Router::new().route("/", get(category::list_categories));

    // The author dashboard: profile data plus management of own blogs.
    let profile_routes = Router::new()
        .route("/me", get(profile::get_me).put(profile::update_me))
        .route(
            "/blogs",
            get(profile::list_my_blogs).post(blog::create_blog),
        )
        .route(
            "/blogs/{id}",
            put(blog::update_blog).delete(blog::delete_blog),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/blogs/pending", get(admin::list_pending_blogs))
        .route("/blogs/{id}", get(admin::get_blog))
        .route("/blogs/{id}/approve", post(admin::approve_blog))
        .route("/blogs/{id}/reject", post(admin::reject_blog))
        .route("/blogs/{id}/hide", post(admin::hide_blog))
        .route("/blogs/{id}/feature", post(admin::toggle_featured))
        .route("/stats", get(admin::get_stats))
        .route("/users", get(admin::list_users))
        .route("/categories", post(admin::create_category))
        .route(
            "/categories/{id}",
            put(admin::update_category).delete(admin::delete_category),
        )
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/blogs", blog_routes)
        .nest("/api/categories", category_routes)
        .nest("/api/profile", profile_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
