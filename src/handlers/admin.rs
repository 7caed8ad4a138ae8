// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        blog::{
            Actor, BlogAction, BlogStatus, BlogWithAuthor, ModerateRequest, apply_transition,
            authorize,
        },
        category::{CreateCategoryRequest, UpdateCategoryRequest},
        profile::Profile,
    },
    utils::{jwt::Claims, slug::derive_slug},
};

const MODERATION_COLUMNS: &str = r#"
    b.id, b.author_id, b.category_id, b.title, b.slug, b.content, b.excerpt,
    b.featured_image, b.status, b.admin_feedback, b.is_featured, b.view_count,
    b.like_count, b.published_at, b.created_at,
    p.username AS author_username, p.full_name AS author_full_name,
    p.avatar_url AS author_avatar_url,
    c.name AS category_name, c.slug AS category_slug
"#;

/// The moderation queue: pending blogs, oldest submissions first.
pub async fn list_pending_blogs(
    State(pool): State<PgPool>,
) -> Result<impl IntoResponse, AppError> {
    let blogs = sqlx::query_as::<_, BlogWithAuthor>(&format!(
        r#"
        SELECT {MODERATION_COLUMNS}
        FROM blogs b
        JOIN profiles p ON b.author_id = p.id
        LEFT JOIN categories c ON b.category_id = c.id
        WHERE b.status = $1
        ORDER BY b.created_at ASC
        "#
    ))
    .bind(BlogStatus::Pending)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list pending blogs: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(blogs))
}

/// Preview any blog by id, regardless of status.
/// Unlike the public slug route this never touches the view counter.
pub async fn get_blog(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let blog = sqlx::query_as::<_, BlogWithAuthor>(&format!(
        r#"
        SELECT {MODERATION_COLUMNS}
        FROM blogs b
        JOIN profiles p ON b.author_id = p.id
        LEFT JOIN categories c ON b.category_id = c.id
        WHERE b.id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Blog not found".to_string()))?;

    Ok(Json(blog))
}

/// Approve a pending blog: it becomes publicly visible with its published
/// timestamp stamped and any earlier feedback wiped.
pub async fn approve_blog(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    moderate(&pool, &claims, id, BlogAction::Approve, None).await
}

/// Reject a pending blog, optionally attaching feedback for the author.
pub async fn reject_blog(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<ModerateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    moderate(&pool, &claims, id, BlogAction::Reject, payload.feedback).await
}

/// Take an approved blog off the public site.
pub async fn hide_blog(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    moderate(&pool, &claims, id, BlogAction::Hide, None).await
}

/// Shared moderation path: loads the row, runs the action through the
/// lifecycle table, and translates the resulting side effects into one
/// UPDATE.
async fn moderate(
    pool: &PgPool,
    claims: &Claims,
    id: i64,
    action: BlogAction,
    feedback: Option<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let blog = sqlx::query_as::<_, (i64, BlogStatus)>(
        "SELECT author_id, status FROM blogs WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Blog not found".to_string()))?;
    let (author_id, status) = blog;

    let actor = Actor {
        is_author: author_id == claims.profile_id(),
        is_admin: claims.is_admin,
    };
    authorize(actor, action)?;
    let transition = apply_transition(Some(status), action)?;

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE blogs SET status = ");
    builder.push_bind(transition.new_status);
    if transition.sets_published_at {
        builder.push(", published_at = NOW()");
    }
    if transition.clears_feedback {
        builder.push(", admin_feedback = ''");
    }
    if transition.stores_feedback {
        builder.push(", admin_feedback = ");
        builder.push_bind(feedback.unwrap_or_default());
    }
    builder.push(", updated_at = NOW() WHERE id = ");
    builder.push_bind(id);

    builder.build().execute(pool).await.map_err(|e| {
        tracing::error!("Failed to moderate blog {}: {:?}", id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(serde_json::json!({
        "id": id,
        "status": transition.new_status,
    })))
}

/// Toggle the home-page featured flag on a blog.
pub async fn toggle_featured(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let is_featured = sqlx::query_scalar::<_, bool>(
        "UPDATE blogs SET is_featured = NOT is_featured, updated_at = NOW()
         WHERE id = $1 RETURNING is_featured",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Blog not found".to_string()))?;

    Ok(Json(serde_json::json!({ "is_featured": is_featured })))
}

/// Dashboard counters shown on the admin landing page.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_users: i64,
    pub total_blogs: i64,
    pub pending_blogs: i64,
    pub total_comments: i64,
}

pub async fn get_stats(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let (total_users, total_blogs, pending_blogs, total_comments) =
        sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM profiles),
                (SELECT COUNT(*) FROM blogs),
                (SELECT COUNT(*) FROM blogs WHERE status = 'pending'),
                (SELECT COUNT(*) FROM comments)
            "#,
        )
        .fetch_one(&pool)
        .await?;

    Ok(Json(StatsResponse {
        total_users,
        total_blogs,
        pending_blogs,
        total_comments,
    }))
}

/// Lists all profiles in the system.
pub async fn list_users(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, Profile>(
        r#"
        SELECT id, username, password, full_name, avatar_url, bio, is_admin,
               created_at, updated_at
        FROM profiles
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(users))
}

/// Creates a new category. The slug is derived from the name.
pub async fn create_category(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let slug = derive_slug(&payload.name);
    if slug.is_empty() {
        return Err(AppError::BadRequest(
            "Category name must contain at least one alphanumeric character".to_string(),
        ));
    }

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO categories (name, slug, description)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(&payload.name)
    .bind(&slug)
    .bind(&payload.description)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict(format!("Category '{}' already exists", payload.name))
        } else {
            tracing::error!("Failed to create category: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id, "slug": slug })),
    ))
}

/// Updates a category by ID. Renaming re-derives the slug.
pub async fn update_category(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if payload.name.is_none() && payload.description.is_none() {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE categories SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = &payload.name {
        let slug = derive_slug(name);
        if slug.is_empty() {
            return Err(AppError::BadRequest(
                "Category name must contain at least one alphanumeric character".to_string(),
            ));
        }
        separated.push("name = ");
        separated.push_bind_unseparated(name.clone());
        separated.push("slug = ");
        separated.push_bind_unseparated(slug);
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(description);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict("Another category already uses that name".to_string())
        } else {
            tracing::error!("Failed to update category: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a category by ID. Blogs keep existing with their category unset.
pub async fn delete_category(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete category: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
