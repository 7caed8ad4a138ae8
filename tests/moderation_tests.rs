// tests/moderation_tests.rs

use devnovate_backend::{config::Config, routes, state::AppState};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;

async fn spawn_app() -> String {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "moderation_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
    };

    let state = AppState { pool, config };
    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    address
}

/// Registers a user and returns their bearer token. When `admin` is set the
/// profile is promoted directly in the database, mirroring how operators
/// grant the flag.
async fn register_user(address: &str, client: &reqwest::Client, admin: bool) -> String {
    let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";

    client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({"username": username, "password": password}))
        .send()
        .await
        .expect("Register failed");

    if admin {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(&database_url)
            .await
            .unwrap();
        sqlx::query("UPDATE profiles SET is_admin = TRUE WHERE username = $1")
            .bind(&username)
            .execute(&pool)
            .await
            .unwrap();
    }

    let login = client
        .post(&format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"username": username, "password": password}))
        .send()
        .await
        .expect("Login failed")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login json");

    login["token"].as_str().expect("Token not found").to_string()
}

#[tokio::test]
async fn full_moderation_flow() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let author_token = register_user(&address, &client, false).await;
    let admin_token = register_user(&address, &client, true).await;

    let title = format!("Moderation Flow {}", &uuid::Uuid::new_v4().to_string()[..8]);

    // 1. Author creates a draft.
    let created: serde_json::Value = client
        .post(&format!("{}/api/profile/blogs", address))
        .header("Authorization", format!("Bearer {}", author_token))
        .json(&serde_json::json!({
            "title": title,
            "content": "<p>First version.</p>",
            "submit": false
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let blog_id = created["id"].as_i64().unwrap();
    assert_eq!(created["status"], "draft");

    // Drafts are invisible to the public.
    let public = client
        .get(&format!("{}/api/blogs/{}", address, created["slug"].as_str().unwrap()))
        .send()
        .await
        .unwrap();
    assert_eq!(public.status().as_u16(), 404);

    // 2. Author submits for review.
    let submitted: serde_json::Value = client
        .put(&format!("{}/api/profile/blogs/{}", address, blog_id))
        .header("Authorization", format!("Bearer {}", author_token))
        .json(&serde_json::json!({
            "title": title,
            "content": "<p>First version.</p>",
            "submit": true
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(submitted["status"], "pending");

    // Submitted blogs can no longer be edited by the author.
    let illegal_edit = client
        .put(&format!("{}/api/profile/blogs/{}", address, blog_id))
        .header("Authorization", format!("Bearer {}", author_token))
        .json(&serde_json::json!({
            "title": title,
            "content": "<p>Sneaky edit.</p>",
            "submit": false
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(illegal_edit.status().as_u16(), 409);

    // 3. Admin rejects with feedback.
    let rejected: serde_json::Value = client
        .post(&format!("{}/api/admin/blogs/{}/reject", address, blog_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&serde_json::json!({"feedback": "needs citations"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rejected["status"], "rejected");

    // The author sees the feedback on their dashboard.
    let my_blogs: Vec<serde_json::Value> = client
        .get(&format!("{}/api/profile/blogs", address))
        .header("Authorization", format!("Bearer {}", author_token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let mine = my_blogs
        .iter()
        .find(|b| b["id"].as_i64() == Some(blog_id))
        .unwrap();
    assert_eq!(mine["status"], "rejected");
    assert_eq!(mine["admin_feedback"], "needs citations");

    // 4. Author edits and resubmits; the feedback is wiped.
    let resubmitted: serde_json::Value = client
        .put(&format!("{}/api/profile/blogs/{}", address, blog_id))
        .header("Authorization", format!("Bearer {}", author_token))
        .json(&serde_json::json!({
            "title": title,
            "content": "<p>Now with citations.</p>",
            "submit": true
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resubmitted["status"], "pending");

    let my_blogs: Vec<serde_json::Value> = client
        .get(&format!("{}/api/profile/blogs", address))
        .header("Authorization", format!("Bearer {}", author_token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let mine = my_blogs
        .iter()
        .find(|b| b["id"].as_i64() == Some(blog_id))
        .unwrap();
    assert_eq!(mine["admin_feedback"], "");

    // 5. Admin approves: the article goes live with a publish timestamp.
    let approved: serde_json::Value = client
        .post(&format!("{}/api/admin/blogs/{}/approve", address, blog_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(approved["status"], "approved");

    let slug = resubmitted["slug"].as_str().unwrap();
    let detail: serde_json::Value = client
        .get(&format!("{}/api/blogs/{}", address, slug))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["status"], "approved");
    assert!(detail["published_at"].as_str().is_some());
    assert_eq!(detail["admin_feedback"], "");

    // Each public fetch counts one view; the previous request bumped it.
    let detail_again: serde_json::Value = client
        .get(&format!("{}/api/blogs/{}", address, slug))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail_again["view_count"], 1);

    // 6. Admin hides the published article.
    let hidden: serde_json::Value = client
        .post(&format!("{}/api/admin/blogs/{}/hide", address, blog_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(hidden["status"], "hidden");

    let gone = client
        .get(&format!("{}/api/blogs/{}", address, slug))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status().as_u16(), 404);
}

#[tokio::test]
async fn create_and_submit_in_one_step() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let author_token = register_user(&address, &client, false).await;

    let created: serde_json::Value = client
        .post(&format!("{}/api/profile/blogs", address))
        .header("Authorization", format!("Bearer {}", author_token))
        .json(&serde_json::json!({
            "title": format!("Straight to review {}", &uuid::Uuid::new_v4().to_string()[..8]),
            "content": "<p>Ready.</p>",
            "submit": true
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(created["status"], "pending");
}

#[tokio::test]
async fn moderation_requires_admin() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let author_token = register_user(&address, &client, false).await;

    let created: serde_json::Value = client
        .post(&format!("{}/api/profile/blogs", address))
        .header("Authorization", format!("Bearer {}", author_token))
        .json(&serde_json::json!({
            "title": format!("Self approval {}", &uuid::Uuid::new_v4().to_string()[..8]),
            "content": "<p>Pls approve.</p>",
            "submit": true
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let blog_id = created["id"].as_i64().unwrap();

    // The author cannot approve their own submission.
    let response = client
        .post(&format!("{}/api/admin/blogs/{}/approve", address, blog_id))
        .header("Authorization", format!("Bearer {}", author_token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn approving_a_draft_is_an_illegal_transition() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let author_token = register_user(&address, &client, false).await;
    let admin_token = register_user(&address, &client, true).await;

    let created: serde_json::Value = client
        .post(&format!("{}/api/profile/blogs", address))
        .header("Authorization", format!("Bearer {}", author_token))
        .json(&serde_json::json!({
            "title": format!("Still a draft {}", &uuid::Uuid::new_v4().to_string()[..8]),
            "content": "<p>WIP.</p>",
            "submit": false
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let blog_id = created["id"].as_i64().unwrap();

    let response = client
        .post(&format!("{}/api/admin/blogs/{}/approve", address, blog_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn only_the_author_may_edit_a_blog() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let author_token = register_user(&address, &client, false).await;
    let other_token = register_user(&address, &client, false).await;

    let created: serde_json::Value = client
        .post(&format!("{}/api/profile/blogs", address))
        .header("Authorization", format!("Bearer {}", author_token))
        .json(&serde_json::json!({
            "title": format!("Private draft {}", &uuid::Uuid::new_v4().to_string()[..8]),
            "content": "<p>Mine.</p>",
            "submit": false
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let blog_id = created["id"].as_i64().unwrap();

    let response = client
        .put(&format!("{}/api/profile/blogs/{}", address, blog_id))
        .header("Authorization", format!("Bearer {}", other_token))
        .json(&serde_json::json!({
            "title": "Hijacked",
            "content": "<p>Not yours.</p>",
            "submit": false
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn slug_collisions_get_a_numeric_suffix() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let author_token = register_user(&address, &client, false).await;

    let title = format!("Same Title {}", &uuid::Uuid::new_v4().to_string()[..8]);

    let first: serde_json::Value = client
        .post(&format!("{}/api/profile/blogs", address))
        .header("Authorization", format!("Bearer {}", author_token))
        .json(&serde_json::json!({"title": title, "content": "<p>one</p>", "submit": false}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let second: serde_json::Value = client
        .post(&format!("{}/api/profile/blogs", address))
        .header("Authorization", format!("Bearer {}", author_token))
        .json(&serde_json::json!({"title": title, "content": "<p>two</p>", "submit": false}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let first_slug = first["slug"].as_str().unwrap();
    let second_slug = second["slug"].as_str().unwrap();
    assert_ne!(first_slug, second_slug);
    assert_eq!(second_slug, format!("{}-2", first_slug));
}
