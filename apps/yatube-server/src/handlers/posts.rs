//! Post detail, creation, editing and comments.

use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use actix_web::{HttpResponse, web};
use uuid::Uuid;

use yatube_core::DomainError;
use yatube_core::domain::{Comment, Post};
use yatube_core::forms::{CommentForm, FormErrors, ImageUpload, PostForm};
use yatube_core::ports::{BaseRepository, PostFilter, StorageError};
use yatube_shared::dto::CommentRequest;

use super::context::{PostDetailContext, PostFormContext, comment_cards, group_ref, post_cards};
use super::redirect;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::views::View;

/// Multipart body of the create and edit forms.
#[derive(MultipartForm)]
pub struct PostUpload {
    text: Option<Text<String>>,
    group: Option<Text<String>>,
    #[multipart(limit = "5MB")]
    image: Option<TempFile>,
}

impl PostUpload {
    /// Split into the form to validate and the uploaded file, if any.
    /// A file part without bytes counts as no upload.
    fn into_parts(self) -> (PostForm, Option<TempFile>) {
        let image = self.image.filter(|file| file.size > 0);
        let form = PostForm {
            text: self.text.map(Text::into_inner).unwrap_or_default(),
            group: self.group.map(Text::into_inner).unwrap_or_default(),
            image: image.as_ref().map(|file| ImageUpload {
                file_name: file.file_name.clone().unwrap_or_default(),
                content_type: file.content_type.as_ref().map(ToString::to_string),
                size: file.size,
            }),
        };
        (form, image)
    }
}

fn post_url(id: Uuid) -> String {
    format!("/posts/{id}/")
}

/// Path ids that are not UUIDs name no post.
fn parse_post_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| DomainError::not_found("post", raw).into())
}

async fn load_post(state: &AppState, raw_id: &str) -> AppResult<Post> {
    let id = parse_post_id(raw_id)?;
    Ok(state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("post", id))?)
}

async fn store_image(state: &AppState, file: Option<TempFile>) -> AppResult<Option<String>> {
    let Some(file) = file else {
        return Ok(None);
    };
    let data = tokio::fs::read(file.file.path())
        .await
        .map_err(StorageError::from)?;
    let name = file.file_name.as_deref().unwrap_or("upload");
    let reference = state.images.save(name, data).await?;
    Ok(Some(reference))
}

/// Remove an image stored for a write that did not go through.
async fn discard_image(state: &AppState, reference: Option<&str>) {
    let Some(reference) = reference else {
        return;
    };
    if let Err(e) = state.images.delete(reference).await {
        tracing::warn!(%reference, error = %e, "Failed to remove orphaned image");
    }
}

async fn form_view(
    state: &AppState,
    form: PostForm,
    errors: FormErrors,
    post_id: Option<Uuid>,
) -> AppResult<View> {
    let groups = state.groups.list_all().await?;
    View::new(
        "posts/create_post.html",
        PostFormContext {
            form,
            errors,
            groups: groups.iter().map(group_ref).collect(),
            is_edit: post_id.is_some(),
            post_id,
        },
    )
}

/// GET /posts/{post_id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<View> {
    let post = load_post(&state, &path).await?;
    let posts_count = state.posts.count(PostFilter::Author(post.author_id)).await?;
    let comments = state.comments.list_for_post(post.id).await?;
    let comments = comment_cards(&state, comments).await?;
    let post = post_cards(&state, vec![post])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("post card missing".to_string()))?;

    View::new(
        "posts/post_detail.html",
        PostDetailContext {
            post,
            posts_count,
            comments,
            form: CommentForm::default(),
        },
    )
}

/// GET /create/
pub async fn create_form(state: web::Data<AppState>, _identity: Identity) -> AppResult<View> {
    form_view(&state, PostForm::default(), FormErrors::default(), None).await
}

/// POST /create/
pub async fn create_submit(
    state: web::Data<AppState>,
    identity: Identity,
    MultipartForm(upload): MultipartForm<PostUpload>,
) -> AppResult<HttpResponse> {
    let (form, file) = upload.into_parts();
    let groups = state.groups.list_all().await?;

    let cleaned = match form.validate(&groups) {
        Ok(cleaned) => cleaned,
        Err(errors) => {
            tracing::debug!(user = %identity.username, ?errors, "Rejected post form");
            return Ok(form_view(&state, form, errors, None).await?.into_response());
        }
    };

    let image = store_image(&state, file).await?;
    let post = match state
        .posts
        .insert(Post::new(
            identity.user_id,
            cleaned.text,
            cleaned.group_id,
            image.clone(),
        ))
        .await
    {
        Ok(post) => post,
        Err(e) => {
            discard_image(&state, image.as_deref()).await;
            return Err(e.into());
        }
    };
    tracing::info!(post_id = %post.id, author = %identity.username, "Post created");

    Ok(redirect(&format!("/profile/{}/", identity.username)))
}

/// GET /posts/{post_id}/edit/
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = load_post(&state, &path).await?;
    if !post.is_authored_by(identity.user_id) {
        return Ok(redirect(&post_url(post.id)));
    }

    let view = form_view(
        &state,
        PostForm::from_post(&post),
        FormErrors::default(),
        Some(post.id),
    )
    .await?;
    Ok(view.into_response())
}

/// POST /posts/{post_id}/edit/
pub async fn edit_submit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    MultipartForm(upload): MultipartForm<PostUpload>,
) -> AppResult<HttpResponse> {
    let mut post = load_post(&state, &path).await?;
    if !post.is_authored_by(identity.user_id) {
        tracing::debug!(post_id = %post.id, user = %identity.username, "Edit by non-author ignored");
        return Ok(redirect(&post_url(post.id)));
    }

    let (form, file) = upload.into_parts();
    let groups = state.groups.list_all().await?;
    let cleaned = match form.validate(&groups) {
        Ok(cleaned) => cleaned,
        Err(errors) => {
            return Ok(form_view(&state, form, errors, Some(post.id))
                .await?
                .into_response());
        }
    };

    post.text = cleaned.text;
    post.group_id = cleaned.group_id;
    let new_image = store_image(&state, file).await?;
    if let Some(reference) = &new_image {
        post.image = Some(reference.clone());
    }
    let post = match state.posts.update(post).await {
        Ok(post) => post,
        Err(e) => {
            discard_image(&state, new_image.as_deref()).await;
            return Err(e.into());
        }
    };
    tracing::info!(post_id = %post.id, author = %identity.username, "Post edited");

    Ok(redirect(&post_url(post.id)))
}

/// POST /posts/{post_id}/comment/ - invalid comments are dropped silently.
///
/// A body that cannot be read as a form (oversized, malformed) counts as
/// an invalid comment.
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: Result<web::Form<CommentRequest>, actix_web::Error>,
) -> AppResult<HttpResponse> {
    let post = load_post(&state, &path).await?;

    let form = match body {
        Ok(body) => CommentForm {
            text: body.into_inner().text,
        },
        Err(e) => {
            tracing::debug!(post_id = %post.id, error = %e, "Unreadable comment form dropped");
            CommentForm::default()
        }
    };
    if let Ok(text) = form.validate() {
        let comment = state
            .comments
            .insert(Comment::new(post.id, identity.user_id, text))
            .await?;
        tracing::info!(comment_id = %comment.id, post_id = %post.id, "Comment added");
    }

    Ok(redirect(&post_url(post.id)))
}
