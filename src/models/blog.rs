// src/models/blog.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::AppError;

use super::validate_http_url;

/// Moderation status of a blog submission.
/// Stored as the 'blog_status' Postgres enum; exactly one state is active at
/// a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "blog_status", rename_all = "lowercase")]
pub enum BlogStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Hidden,
}

impl BlogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlogStatus::Draft => "draft",
            BlogStatus::Pending => "pending",
            BlogStatus::Approved => "approved",
            BlogStatus::Rejected => "rejected",
            BlogStatus::Hidden => "hidden",
        }
    }
}

/// Represents the 'blogs' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Blog {
    pub id: i64,
    pub author_id: i64,
    pub category_id: Option<i64>,

    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image: Option<String>,

    pub status: BlogStatus,
    /// Moderator note shown to the author. Set on rejection, cleared by any
    /// other transition that touches it.
    pub admin_feedback: String,
    pub is_featured: bool,

    pub view_count: i32,
    pub like_count: i32,

    /// Set exactly when the blog becomes approved, null otherwise.
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A blog row with its author's public profile and category inlined,
/// as rendered on listing pages and the article view.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BlogWithAuthor {
    pub id: i64,
    pub author_id: i64,
    pub category_id: Option<i64>,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image: Option<String>,
    pub status: BlogStatus,
    /// Empty for published articles; approval wipes it.
    pub admin_feedback: String,
    pub is_featured: bool,
    pub view_count: i32,
    pub like_count: i32,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,

    pub author_username: String,
    pub author_full_name: Option<String>,
    pub author_avatar_url: Option<String>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
}

/// DTO for creating or editing a blog. The same payload serves both the
/// "Save Draft" and "Submit for Review" buttons; `submit` selects the action.
#[derive(Debug, Deserialize, Validate)]
pub struct SaveBlogRequest {
    #[validate(length(
        min = 1,
        max = 150,
        message = "Title length must be between 1 and 150 characters."
    ))]
    pub title: String,

    #[validate(length(
        min = 1,
        max = 100000,
        message = "Content length must be between 1 and 100000 characters."
    ))]
    pub content: String,

    #[validate(length(max = 200, message = "Excerpt must be less than 200 characters."))]
    #[serde(default)]
    pub excerpt: String,

    pub category_id: Option<i64>,

    #[validate(custom(function = validate_http_url))]
    pub featured_image: Option<String>,

    /// When true the blog is submitted for review instead of staying a draft.
    #[serde(default)]
    pub submit: bool,
}

/// Query parameters for the public blog listing.
#[derive(Debug, Deserialize)]
pub struct BlogListParams {
    /// Filter by category slug.
    pub category: Option<String>,

    /// Search keyword for title match.
    pub q: Option<String>,

    /// Only admin-curated featured blogs.
    pub featured: Option<bool>,

    /// Number of items to return (default: 20, max: 100).
    pub limit: Option<i64>,
}

/// DTO for a moderation decision. Feedback is only meaningful on rejection.
#[derive(Debug, Deserialize, Validate)]
pub struct ModerateRequest {
    #[validate(length(max = 1000, message = "Feedback must be at most 1000 characters."))]
    pub feedback: Option<String>,
}

/// Who is attempting a lifecycle action, relative to the target blog.
///
/// Built explicitly from the JWT claims and the row's author_id at each call
/// site, so transition checks stay deterministic and unit-testable without a
/// live session.
#[derive(Debug, Clone, Copy, Default)]
pub struct Actor {
    pub is_author: bool,
    pub is_admin: bool,
}

/// The actions that drive the submission lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlogAction {
    SaveDraft,
    SubmitForReview,
    Approve,
    Reject,
    Hide,
}

impl BlogAction {
    /// Approve/Reject/Hide are moderator actions; the rest belong to the
    /// author.
    pub fn is_moderation(&self) -> bool {
        matches!(
            self,
            BlogAction::Approve | BlogAction::Reject | BlogAction::Hide
        )
    }

    fn describe(&self) -> &'static str {
        match self {
            BlogAction::SaveDraft => "save",
            BlogAction::SubmitForReview => "submit",
            BlogAction::Approve => "approve",
            BlogAction::Reject => "reject",
            BlogAction::Hide => "hide",
        }
    }
}

/// Declarative side effects of a legal transition. Handlers translate these
/// into column updates; the table itself never touches the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub new_status: BlogStatus,
    /// published_at is stamped with the current time.
    pub sets_published_at: bool,
    /// admin_feedback is reset to empty.
    pub clears_feedback: bool,
    /// admin_feedback is replaced with the moderator's text.
    pub stores_feedback: bool,
}

impl Transition {
    fn to(new_status: BlogStatus) -> Self {
        Self {
            new_status,
            sets_published_at: false,
            clears_feedback: false,
            stores_feedback: false,
        }
    }
}

/// The single authoritative transition table for the submission lifecycle.
///
/// `current` is `None` when the blog is being created. Every (state, action)
/// pair not listed here fails with `InvalidTransition`, which keeps all
/// status writes funneled through one auditable place instead of scattering
/// status strings across handlers.
pub fn apply_transition(
    current: Option<BlogStatus>,
    action: BlogAction,
) -> Result<Transition, AppError> {
    use BlogAction::*;
    use BlogStatus::*;

    let transition = match (current, action) {
        (None | Some(Draft), SaveDraft) => Transition::to(Draft),
        (None | Some(Draft), SubmitForReview) => Transition::to(Pending),
        // Resubmitting a rejected blog wipes the moderator's note.
        (Some(Rejected), SubmitForReview) => Transition {
            clears_feedback: true,
            ..Transition::to(Pending)
        },
        (Some(Pending), Approve) => Transition {
            sets_published_at: true,
            clears_feedback: true,
            ..Transition::to(Approved)
        },
        (Some(Pending), Reject) => Transition {
            stores_feedback: true,
            ..Transition::to(Rejected)
        },
        (Some(Approved), Hide) => Transition::to(Hidden),
        (current, action) => {
            return Err(AppError::InvalidTransition(format!(
                "Cannot {} a blog in '{}' state",
                action.describe(),
                status_label(current)
            )));
        }
    };

    Ok(transition)
}

/// Checks that the actor holds the rights the action requires.
/// Author actions demand authorship (admins do not bypass this); moderation
/// actions demand the admin flag.
pub fn authorize(actor: Actor, action: BlogAction) -> Result<(), AppError> {
    if action.is_moderation() {
        if !actor.is_admin {
            return Err(AppError::Forbidden(
                "Administrator rights required for this action".to_string(),
            ));
        }
    } else if !actor.is_author {
        return Err(AppError::Forbidden(
            "Only the author may modify this blog".to_string(),
        ));
    }
    Ok(())
}

/// True when the actor may perform the action AND the action is legal for
/// the blog's current status.
pub fn can_transition(current: Option<BlogStatus>, actor: Actor, action: BlogAction) -> bool {
    authorize(actor, action).is_ok() && apply_transition(current, action).is_ok()
}

fn status_label(status: Option<BlogStatus>) -> &'static str {
    match status {
        None => "unsaved",
        Some(s) => s.as_str(),
    }
}
