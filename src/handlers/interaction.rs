// src/handlers/interaction.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        blog::BlogStatus,
        comment::{Comment, CommentWithAuthor, CreateCommentRequest, build_comment_tree},
    },
    utils::{jwt::Claims, sanitize::clean_html},
};

/// Resolves a public (approved) blog's id from its slug.
/// Drafts, the review queue and hidden articles all read as absent.
async fn approved_blog_id(pool: &PgPool, slug: &str) -> Result<i64, AppError> {
    let blog = sqlx::query_as::<_, (i64, BlogStatus)>("SELECT id, status FROM blogs WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Blog not found".to_string()))?;

    match blog {
        (id, BlogStatus::Approved) => Ok(id),
        _ => Err(AppError::NotFound("Blog not found".to_string())),
    }
}

/// Toggle Like on a blog.
///
/// The like row and the denormalized like counter are written inside one
/// transaction, so a partial failure can never leave them out of step.
pub async fn toggle_like(
    State(pool): State<PgPool>,
    Path(slug): Path<String>,
    claims: Claims,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.profile_id();
    let blog_id = approved_blog_id(&pool, &slug).await?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    // 1. Check if already liked
    let existing = sqlx::query_scalar::<_, i32>(
        "SELECT 1 FROM blog_likes WHERE user_id = $1 AND blog_id = $2",
    )
    .bind(user_id)
    .bind(blog_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let is_liked = existing.is_some();

    if is_liked {
        // Unlike
        sqlx::query("DELETE FROM blog_likes WHERE user_id = $1 AND blog_id = $2")
            .bind(user_id)
            .bind(blog_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        sqlx::query("UPDATE blogs SET like_count = GREATEST(0, like_count - 1) WHERE id = $1")
            .bind(blog_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    } else {
        // Like
        sqlx::query("INSERT INTO blog_likes (user_id, blog_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(blog_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if e.to_string().contains("unique constraint") {
                    // Concurrent request handled gracefully
                    return AppError::Conflict("Already liked".to_string());
                }
                AppError::InternalServerError(e.to_string())
            })?;

        sqlx::query("UPDATE blogs SET like_count = like_count + 1 WHERE id = $1")
            .bind(blog_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    }

    tx.commit()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(serde_json::json!({ "liked": !is_liked })))
}

/// Whether the current user has liked the blog.
pub async fn like_status(
    State(pool): State<PgPool>,
    Path(slug): Path<String>,
    claims: Claims,
) -> Result<impl IntoResponse, AppError> {
    let blog_id = approved_blog_id(&pool, &slug).await?;

    let liked = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM blog_likes WHERE user_id = $1 AND blog_id = $2)",
    )
    .bind(claims.profile_id())
    .bind(blog_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(serde_json::json!({ "liked": liked })))
}

/// Create a new comment, optionally as a reply to another comment on the
/// same blog.
pub async fn create_comment(
    State(pool): State<PgPool>,
    Path(slug): Path<String>,
    claims: Claims,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Whitespace-only bodies are rejected before any database call.
    let content = payload.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::BadRequest(
            "Comment body must not be empty".to_string(),
        ));
    }
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let blog_id = approved_blog_id(&pool, &slug).await?;

    let mut tx = pool.begin().await?;

    if let Some(parent_id) = payload.parent_id {
        sqlx::query_scalar::<_, i64>("SELECT id FROM comments WHERE id = $1 AND blog_id = $2")
            .bind(parent_id)
            .bind(blog_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound("Parent comment not found".to_string()))?;
    }

    let comment = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (blog_id, user_id, parent_id, content)
        VALUES ($1, $2, $3, $4)
        RETURNING id, blog_id, user_id, parent_id, content, created_at
        "#,
    )
    .bind(blog_id)
    .bind(claims.profile_id())
    .bind(payload.parent_id)
    .bind(clean_html(&content))
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// List a blog's comments as a nested reply tree.
///
/// The flat result set is fetched in chronological order and rebuilt into a
/// tree on every request; nothing is patched incrementally.
pub async fn list_comments(
    State(pool): State<PgPool>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let blog_id = approved_blog_id(&pool, &slug).await?;

    let comments = sqlx::query_as::<_, CommentWithAuthor>(
        r#"
        SELECT c.id, c.blog_id, c.user_id, p.username, p.avatar_url,
               c.parent_id, c.content, c.created_at
        FROM comments c
        JOIN profiles p ON c.user_id = p.id
        WHERE c.blog_id = $1
        ORDER BY c.created_at ASC, c.id ASC
        "#,
    )
    .bind(blog_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(build_comment_tree(comments)))
}
