// src/handlers/blog.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::blog::{
        Actor, Blog, BlogAction, BlogListParams, BlogStatus, BlogWithAuthor, SaveBlogRequest,
        apply_transition, authorize,
    },
    utils::{jwt::Claims, sanitize::clean_html, slug::derive_slug},
};

const BLOG_WITH_AUTHOR_COLUMNS: &str = r#"
    b.id, b.author_id, b.category_id, b.title, b.slug, b.content, b.excerpt,
    b.featured_image, b.status, b.admin_feedback, b.is_featured, b.view_count,
    b.like_count, b.published_at, b.created_at,
    p.username AS author_username, p.full_name AS author_full_name,
    p.avatar_url AS author_avatar_url,
    c.name AS category_name, c.slug AS category_slug
"#;

/// List approved blogs (newest first).
/// Supports filtering by category slug, title keyword and the featured flag.
pub async fn list_blogs(
    State(pool): State<PgPool>,
    Query(params): Query<BlogListParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(20).min(100); // Default 20, max 100
    let search_pattern = params.q.map(|k| format!("%{}%", k));

    let blogs = sqlx::query_as::<_, BlogWithAuthor>(&format!(
        r#"
        SELECT {BLOG_WITH_AUTHOR_COLUMNS}
        FROM blogs b
        JOIN profiles p ON b.author_id = p.id
        LEFT JOIN categories c ON b.category_id = c.id
        WHERE b.status = $1
          AND ($2::TEXT IS NULL OR c.slug = $2)
          AND ($3::TEXT IS NULL OR b.title ILIKE $3)
          AND ($4::BOOLEAN IS NULL OR b.is_featured = $4)
        ORDER BY b.created_at DESC
        LIMIT $5
        "#
    ))
    .bind(BlogStatus::Approved)
    .bind(params.category)
    .bind(search_pattern)
    .bind(params.featured)
    .bind(limit)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list blogs: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(blogs))
}

/// Get a single approved blog by slug, with author and category inlined.
///
/// Every qualifying fetch bumps the view counter by exactly one; repeat
/// views by the same reader each count.
pub async fn get_blog_by_slug(
    State(pool): State<PgPool>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let blog = sqlx::query_as::<_, BlogWithAuthor>(&format!(
        r#"
        SELECT {BLOG_WITH_AUTHOR_COLUMNS}
        FROM blogs b
        JOIN profiles p ON b.author_id = p.id
        LEFT JOIN categories c ON b.category_id = c.id
        WHERE b.slug = $1 AND b.status = $2
        "#
    ))
    .bind(&slug)
    .bind(BlogStatus::Approved)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Blog not found".to_string()))?;

    sqlx::query("UPDATE blogs SET view_count = view_count + 1 WHERE id = $1")
        .bind(blog.id)
        .execute(&pool)
        .await?;

    Ok(Json(blog))
}

/// Create a new blog, either as a draft or submitted straight for review.
pub async fn create_blog(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SaveBlogRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let action = if payload.submit {
        BlogAction::SubmitForReview
    } else {
        BlogAction::SaveDraft
    };

    // The creating user is the author by construction.
    let actor = Actor {
        is_author: true,
        is_admin: claims.is_admin,
    };
    authorize(actor, action)?;
    let transition = apply_transition(None, action)?;

    if let Some(category_id) = payload.category_id {
        ensure_category_exists(&pool, category_id).await?;
    }

    let slug = unique_slug(&pool, &payload.title, None).await?;
    let content = clean_html(&payload.content);

    let blog_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO blogs (author_id, category_id, title, slug, content, excerpt,
                           featured_image, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(claims.profile_id())
    .bind(payload.category_id)
    .bind(&payload.title)
    .bind(&slug)
    .bind(&content)
    .bind(&payload.excerpt)
    .bind(&payload.featured_image)
    .bind(transition.new_status)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create blog: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": blog_id,
            "slug": slug,
            "status": transition.new_status,
        })),
    ))
}

/// Edit an existing blog.
///
/// Saving keeps a draft in draft; submitting moves a draft or a rejected
/// blog into the review queue (wiping any moderator feedback). Anything
/// else is an illegal transition.
pub async fn update_blog(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<SaveBlogRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let blog = fetch_blog(&pool, id).await?;

    let action = if payload.submit {
        BlogAction::SubmitForReview
    } else {
        BlogAction::SaveDraft
    };

    let actor = Actor {
        is_author: blog.author_id == claims.profile_id(),
        is_admin: claims.is_admin,
    };
    authorize(actor, action)?;
    let transition = apply_transition(Some(blog.status), action)?;

    if let Some(category_id) = payload.category_id {
        ensure_category_exists(&pool, category_id).await?;
    }

    let slug = unique_slug(&pool, &payload.title, Some(id)).await?;
    let content = clean_html(&payload.content);

    sqlx::query(
        r#"
        UPDATE blogs
        SET title = $1, slug = $2, content = $3, excerpt = $4, featured_image = $5,
            category_id = $6, status = $7,
            admin_feedback = CASE WHEN $8 THEN '' ELSE admin_feedback END,
            updated_at = NOW()
        WHERE id = $9
        "#,
    )
    .bind(&payload.title)
    .bind(&slug)
    .bind(&content)
    .bind(&payload.excerpt)
    .bind(&payload.featured_image)
    .bind(payload.category_id)
    .bind(transition.new_status)
    .bind(transition.clears_feedback)
    .bind(id)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update blog {}: {:?}", id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(serde_json::json!({
        "id": id,
        "slug": slug,
        "status": transition.new_status,
    })))
}

/// Delete one of the caller's own blogs.
/// Approved blogs stay up; they can only be hidden by an administrator.
pub async fn delete_blog(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let blog = fetch_blog(&pool, id).await?;

    if blog.author_id != claims.profile_id() {
        return Err(AppError::Forbidden(
            "Only the author may delete this blog".to_string(),
        ));
    }
    if blog.status == BlogStatus::Approved {
        return Err(AppError::InvalidTransition(
            "Cannot delete a blog in 'approved' state".to_string(),
        ));
    }

    // Comments and likes go with it via FK cascade.
    sqlx::query("DELETE FROM blogs WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_blog(pool: &PgPool, id: i64) -> Result<Blog, AppError> {
    sqlx::query_as::<_, Blog>(
        r#"
        SELECT id, author_id, category_id, title, slug, content, excerpt,
               featured_image, status, admin_feedback, is_featured, view_count,
               like_count, published_at, created_at, updated_at
        FROM blogs
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Blog not found".to_string()))
}

async fn ensure_category_exists(pool: &PgPool, category_id: i64) -> Result<(), AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM categories WHERE id = $1")
        .bind(category_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Category not found".to_string()))?;
    Ok(())
}

/// Derives the blog's slug from its title and disambiguates collisions with
/// a numeric suffix (my-title, my-title-2, ...). `exclude_id` lets an update
/// keep its own slug.
async fn unique_slug(
    pool: &PgPool,
    title: &str,
    exclude_id: Option<i64>,
) -> Result<String, AppError> {
    let mut base = derive_slug(title);
    if base.is_empty() {
        base = "untitled".to_string();
    }

    let taken: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT slug FROM blogs
        WHERE (slug = $1 OR slug LIKE $1 || '-%')
          AND ($2::BIGINT IS NULL OR id <> $2)
        "#,
    )
    .bind(&base)
    .bind(exclude_id)
    .fetch_all(pool)
    .await?;

    if !taken.iter().any(|s| *s == base) {
        return Ok(base);
    }

    let mut suffix = 2u32;
    loop {
        let candidate = format!("{}-{}", base, suffix);
        if !taken.iter().any(|s| *s == candidate) {
            return Ok(candidate);
        }
        suffix += 1;
    }
}
