//! Data Transfer Objects - form payloads and view-context types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sign-up form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

/// Login form. `next` is where to go once authenticated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// `?next=` query of the login page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Comment form payload. A missing field counts as empty text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: Uuid,
    pub username: String,
}

/// Public view of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A post as shown in listings and on its detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostCard {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorRef,
    pub group: Option<GroupRef>,
    /// Stored image reference, e.g. `posts/small.gif`.
    pub image: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentCard {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorRef,
}
