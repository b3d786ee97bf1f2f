//! View contexts and the conversion of domain records into display cards.

use std::collections::HashMap;
use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload};
use serde::Serialize;
use uuid::Uuid;

use yatube_core::domain::{Comment, Group, Post, User};
use yatube_core::forms::{CommentForm, FormErrors, PostForm};
use yatube_core::pagination::{Page, Paginator};
use yatube_core::ports::{BaseRepository, PostFilter};
use yatube_shared::dto::{AuthorRef, CommentCard, GroupRef, PostCard};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

pub fn author_ref(user: &User) -> AuthorRef {
    AuthorRef {
        id: user.id,
        username: user.username.clone(),
    }
}

pub fn group_ref(group: &Group) -> GroupRef {
    GroupRef {
        id: group.id,
        title: group.title.clone(),
        slug: group.slug.clone(),
        description: group.description.clone(),
    }
}

/// Memoized author lookups while building a batch of cards.
struct Authors<'a> {
    state: &'a AppState,
    seen: HashMap<Uuid, AuthorRef>,
}

impl<'a> Authors<'a> {
    fn new(state: &'a AppState) -> Self {
        Self {
            state,
            seen: HashMap::new(),
        }
    }

    async fn get(&mut self, id: Uuid) -> AppResult<AuthorRef> {
        if let Some(author) = self.seen.get(&id) {
            return Ok(author.clone());
        }
        let user = self
            .state
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("author {id} is missing")))?;
        let author = author_ref(&user);
        self.seen.insert(id, author.clone());
        Ok(author)
    }
}

pub async fn post_cards(state: &AppState, posts: Vec<Post>) -> AppResult<Vec<PostCard>> {
    let mut authors = Authors::new(state);
    let mut groups: HashMap<Uuid, Option<GroupRef>> = HashMap::new();
    let mut cards = Vec::with_capacity(posts.len());

    for post in posts {
        let author = authors.get(post.author_id).await?;
        let group = match post.group_id {
            None => None,
            Some(group_id) => match groups.get(&group_id) {
                Some(cached) => cached.clone(),
                None => {
                    let found = state.groups.find_by_id(group_id).await?.map(|g| group_ref(&g));
                    groups.insert(group_id, found.clone());
                    found
                }
            },
        };
        let image_url = post.image.as_deref().map(|r| state.images.url(r));

        cards.push(PostCard {
            id: post.id,
            text: post.text,
            created_at: post.created_at,
            author,
            group,
            image: post.image,
            image_url,
        });
    }

    Ok(cards)
}

pub async fn comment_cards(
    state: &AppState,
    comments: Vec<Comment>,
) -> AppResult<Vec<CommentCard>> {
    let mut authors = Authors::new(state);
    let mut cards = Vec::with_capacity(comments.len());
    for comment in comments {
        cards.push(CommentCard {
            id: comment.id,
            author: authors.get(comment.author_id).await?,
            text: comment.text,
            created_at: comment.created_at,
        });
    }
    Ok(cards)
}

/// Raw `?page=` value of a listing request.
///
/// A repeated key does not fail the request: the last value wins.
#[derive(Debug, Clone, Default)]
pub struct PageParam(Option<String>);

impl PageParam {
    pub fn from_query(query: &str) -> Self {
        let page = query
            .split('&')
            .filter_map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_component(key).as_deref() == Some("page")).then(|| decode_component(value))
            })
            .last()
            .flatten();
        Self(page)
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

fn decode_component(raw: &str) -> Option<String> {
    urlencoding::decode(&raw.replace('+', " "))
        .ok()
        .map(|decoded| decoded.into_owned())
}

impl FromRequest for PageParam {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(Self::from_query(req.query_string())))
    }
}

/// Paginator over the posts matching `filter`.
pub async fn paginator_for(state: &AppState, filter: PostFilter) -> AppResult<Paginator> {
    let count = state.posts.count(filter).await?;
    Ok(Paginator::new(count, state.settings.posts_per_page))
}

/// Page `number` of the posts matching `filter`, newest first.
pub async fn fetch_page(
    state: &AppState,
    filter: PostFilter,
    paginator: Paginator,
    number: u64,
) -> AppResult<Page<PostCard>> {
    let (offset, limit) = paginator.window(number);
    let posts = state.posts.list(filter, offset, limit).await?;
    let cards = post_cards(state, posts).await?;
    Ok(paginator.page(number, cards))
}

/// One page of posts matching `filter`, picked by the raw `page` value.
pub async fn post_page(
    state: &AppState,
    filter: PostFilter,
    page: &PageParam,
) -> AppResult<Page<PostCard>> {
    let paginator = paginator_for(state, filter).await?;
    let number = paginator.resolve(page.as_deref());
    fetch_page(state, filter, paginator, number).await
}

#[derive(Serialize)]
pub struct IndexContext {
    pub page_obj: Page<PostCard>,
}

#[derive(Serialize)]
pub struct GroupContext {
    pub group: GroupRef,
    pub page_obj: Page<PostCard>,
}

#[derive(Serialize)]
pub struct ProfileContext {
    pub author: AuthorRef,
    pub posts_count: u64,
    pub following: bool,
    pub page_obj: Page<PostCard>,
}

#[derive(Serialize)]
pub struct PostDetailContext {
    pub post: PostCard,
    pub posts_count: u64,
    pub comments: Vec<CommentCard>,
    pub form: CommentForm,
}

#[derive(Serialize)]
pub struct PostFormContext {
    pub form: PostForm,
    pub errors: FormErrors,
    pub groups: Vec<GroupRef>,
    pub is_edit: bool,
    pub post_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_param_takes_last_value() {
        assert_eq!(PageParam::from_query("").as_deref(), None);
        assert_eq!(PageParam::from_query("page=2").as_deref(), Some("2"));
        assert_eq!(PageParam::from_query("page=1&page=2").as_deref(), Some("2"));
        assert_eq!(PageParam::from_query("sort=new&page").as_deref(), Some(""));
        assert_eq!(PageParam::from_query("pa%67e=%203").as_deref(), Some(" 3"));
        assert_eq!(PageParam::from_query("pages=4").as_deref(), None);
    }
}
