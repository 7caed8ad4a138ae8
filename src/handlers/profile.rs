// src/handlers/profile.rs

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        blog::BlogWithAuthor,
        profile::{MeResponse, Profile, UpdateProfileRequest},
    },
    utils::jwt::Claims,
};

/// Get the current user's profile and writing statistics.
pub async fn get_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.profile_id();

    let profile = sqlx::query_as::<_, Profile>(
        r#"
        SELECT id, username, password, full_name, avatar_url, bio, is_admin,
               created_at, updated_at
        FROM profiles
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Profile not found".to_string()))?;

    // Subqueries keep this a single round trip; both columns are indexed.
    let (blogs_count, total_likes_received) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM blogs WHERE author_id = $1),
            (SELECT COUNT(*) FROM blog_likes bl JOIN blogs b ON bl.blog_id = b.id
             WHERE b.author_id = $1)
        "#,
    )
    .bind(user_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(MeResponse {
        id: profile.id,
        username: profile.username,
        full_name: profile.full_name,
        avatar_url: profile.avatar_url,
        bio: profile.bio,
        is_admin: profile.is_admin,
        created_at: profile.created_at,
        blogs_count,
        total_likes_received,
    }))
}

/// Update the current user's profile. Fields are optional.
pub async fn update_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if payload.full_name.is_none() && payload.avatar_url.is_none() && payload.bio.is_none() {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE profiles SET ");
    let mut separated = builder.separated(", ");

    if let Some(full_name) = payload.full_name {
        separated.push("full_name = ");
        separated.push_bind_unseparated(full_name);
    }

    if let Some(avatar_url) = payload.avatar_url {
        separated.push("avatar_url = ");
        separated.push_bind_unseparated(avatar_url);
    }

    if let Some(bio) = payload.bio {
        separated.push("bio = ");
        separated.push_bind_unseparated(bio);
    }

    separated.push("updated_at = NOW()");

    builder.push(" WHERE id = ");
    builder.push_bind(claims.profile_id());

    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update profile: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(StatusCode::OK)
}

/// List the current user's blogs across every lifecycle state, newest first.
/// Drives the author dashboard (drafts, review queue, rejections, published).
pub async fn list_my_blogs(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let blogs = sqlx::query_as::<_, BlogWithAuthor>(
        r#"
        SELECT b.id, b.author_id, b.category_id, b.title, b.slug, b.content,
               b.excerpt, b.featured_image, b.status, b.admin_feedback,
               b.is_featured, b.view_count, b.like_count, b.published_at,
               b.created_at,
               p.username AS author_username, p.full_name AS author_full_name,
               p.avatar_url AS author_avatar_url,
               c.name AS category_name, c.slug AS category_slug
        FROM blogs b
        JOIN profiles p ON b.author_id = p.id
        LEFT JOIN categories c ON b.category_id = c.id
        WHERE b.author_id = $1
        ORDER BY b.created_at DESC
        "#,
    )
    .bind(claims.profile_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(blogs))
}
