//! Follow / unfollow.

use actix_web::{HttpResponse, web};

use yatube_core::DomainError;
use yatube_core::domain::User;

use super::redirect;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

async fn target(state: &AppState, username: &str) -> AppResult<User> {
    Ok(state
        .users
        .find_by_username(username)
        .await?
        .ok_or_else(|| DomainError::not_found("user", username))?)
}

fn profile_url(username: &str) -> String {
    format!("/profile/{username}/")
}

/// GET /profile/{username}/follow/
pub async fn profile_follow(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let author = target(&state, &path).await?;

    if author.id == identity.user_id {
        tracing::debug!(user = %identity.username, "Ignoring self-follow");
    } else {
        let (_, created) = state.follows.get_or_create(identity.user_id, author.id).await?;
        if created {
            tracing::info!(user = %identity.username, author = %author.username, "Followed author");
        }
    }

    Ok(redirect(&profile_url(&author.username)))
}

/// GET /profile/{username}/unfollow/
pub async fn profile_unfollow(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let author = target(&state, &path).await?;

    let removed = state.follows.delete_pair(identity.user_id, author.id).await?;
    if removed > 0 {
        tracing::info!(user = %identity.username, author = %author.username, "Unfollowed author");
    }

    Ok(redirect(&profile_url(&author.username)))
}
