// src/handlers/category.rs

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::PgPool;

use crate::{error::AppError, models::category::Category};

/// Lists all categories, alphabetically.
pub async fn list_categories(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let categories = sqlx::query_as::<_, Category>(
        r#"
        SELECT id, name, slug, description, created_at
        FROM categories
        ORDER BY name ASC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(categories))
}
