//! Paginated post listings.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};

use yatube_core::DomainError;
use yatube_core::ports::PostFilter;

use super::context::{
    GroupContext, IndexContext, PageParam, ProfileContext, author_ref, fetch_page, group_ref,
    paginator_for, post_page,
};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::views::{View, rendered};

/// Keyed by the resolved page number, never the raw query value.
fn index_cache_key(number: u64) -> String {
    format!("index_page:{number}")
}

/// GET / - every post. The rendered page is cached for a short while.
pub async fn index(state: web::Data<AppState>, page: PageParam) -> AppResult<HttpResponse> {
    let paginator = paginator_for(&state, PostFilter::All).await?;
    let number = paginator.resolve(page.as_deref());

    let key = index_cache_key(number);
    if let Some(body) = state.cache.get(&key).await {
        tracing::debug!(%key, "Serving index from cache");
        return Ok(rendered(StatusCode::OK, body));
    }

    let page_obj = fetch_page(&state, PostFilter::All, paginator, number).await?;
    let body = View::new("posts/index.html", IndexContext { page_obj })?.body()?;

    if let Err(e) = state
        .cache
        .set(&key, &body, Some(state.settings.index_cache_ttl))
        .await
    {
        tracing::warn!(%key, error = %e, "Failed to cache index page");
    }

    Ok(rendered(StatusCode::OK, body))
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    page: PageParam,
) -> AppResult<View> {
    let slug = path.into_inner();
    let group = state
        .groups
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| DomainError::not_found("group", &slug))?;

    let page_obj = post_page(&state, PostFilter::Group(group.id), &page).await?;
    View::new(
        "posts/group_list.html",
        GroupContext {
            group: group_ref(&group),
            page_obj,
        },
    )
}

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<String>,
    page: PageParam,
) -> AppResult<View> {
    let username = path.into_inner();
    let author = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| DomainError::not_found("user", &username))?;

    let page_obj = post_page(&state, PostFilter::Author(author.id), &page).await?;
    let following = match viewer.user_id() {
        Some(viewer_id) => state.follows.exists(viewer_id, author.id).await?,
        None => false,
    };

    View::new(
        "posts/profile.html",
        ProfileContext {
            author: author_ref(&author),
            posts_count: page_obj.count,
            following,
            page_obj,
        },
    )
}

/// GET /follow/ - posts by the authors the viewer follows.
pub async fn follow_index(
    state: web::Data<AppState>,
    identity: Identity,
    page: PageParam,
) -> AppResult<View> {
    let page_obj = post_page(
        &state,
        PostFilter::FollowedBy(identity.user_id),
        &page,
    )
    .await?;
    View::new("posts/follow.html", IndexContext { page_obj })
}
