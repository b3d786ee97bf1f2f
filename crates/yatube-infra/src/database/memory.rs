//! In-memory repositories.
//!
//! One shared [`InMemoryStore`] implements every repository port, so
//! cascades and foreign keys behave the way the relational schema does:
//! deleting a user removes their posts, comments and follow links,
//! deleting a post removes its comments, deleting a group detaches its
//! posts.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use yatube_core::domain::{Comment, Follow, Group, Post, User};
use yatube_core::error::RepoError;
use yatube_core::ports::{
    BaseRepository, CommentRepository, FollowRepository, GroupRepository, PostFilter,
    PostRepository, UserRepository,
};

/// Rows are kept in insertion order.
#[derive(Default)]
struct Tables {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    follows: Vec<Follow>,
}

impl Tables {
    fn user_exists(&self, id: Uuid) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    fn check_post(&self, post: &Post) -> Result<(), RepoError> {
        if !self.user_exists(post.author_id) {
            return Err(RepoError::Constraint(format!(
                "post author {} does not exist",
                post.author_id
            )));
        }
        if let Some(group_id) = post.group_id {
            if !self.groups.iter().any(|g| g.id == group_id) {
                return Err(RepoError::Constraint(format!(
                    "group {group_id} does not exist"
                )));
            }
        }
        Ok(())
    }

    fn check_comment(&self, comment: &Comment) -> Result<(), RepoError> {
        if !self.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(RepoError::Constraint(format!(
                "post {} does not exist",
                comment.post_id
            )));
        }
        if !self.user_exists(comment.author_id) {
            return Err(RepoError::Constraint(format!(
                "comment author {} does not exist",
                comment.author_id
            )));
        }
        Ok(())
    }

    fn check_follow(&self, follow: &Follow) -> Result<(), RepoError> {
        if !self.user_exists(follow.user_id) || !self.user_exists(follow.author_id) {
            return Err(RepoError::Constraint(
                "follow refers to a missing user".to_string(),
            ));
        }
        let duplicate = self.follows.iter().any(|f| {
            f.id != follow.id && f.user_id == follow.user_id && f.author_id == follow.author_id
        });
        if duplicate {
            return Err(RepoError::Constraint(format!(
                "{} already follows {}",
                follow.user_id, follow.author_id
            )));
        }
        Ok(())
    }

    fn matches(&self, post: &Post, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(group_id) => post.group_id == Some(group_id),
            PostFilter::Author(author_id) => post.author_id == author_id,
            PostFilter::FollowedBy(user_id) => self
                .follows
                .iter()
                .any(|f| f.user_id == user_id && f.author_id == post.author_id),
        }
    }

    fn remove_post(&mut self, post_id: Uuid) {
        self.posts.retain(|p| p.id != post_id);
        self.comments.retain(|c| c.post_id != post_id);
    }
}

/// Process-local storage used when no database is configured, and in tests.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn replace<T>(rows: &mut [T], entity: T, same: impl Fn(&T) -> bool) -> Result<T, RepoError>
where
    T: Clone,
{
    let slot = rows.iter_mut().find(|row| same(row)).ok_or(RepoError::NotFound)?;
    *slot = entity.clone();
    Ok(entity)
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.id == user.id || u.username == user.username)
        {
            return Err(RepoError::Constraint(format!(
                "username {} is taken",
                user.username
            )));
        }
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(RepoError::Constraint(format!(
                "username {} is taken",
                user.username
            )));
        }
        let id = user.id;
        replace(&mut tables.users, user, |u| u.id == id)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.user_exists(id) {
            return Err(RepoError::NotFound);
        }
        tables.users.retain(|u| u.id != id);
        tables.follows.retain(|f| f.user_id != id && f.author_id != id);
        tables.comments.retain(|c| c.author_id != id);
        let authored: Vec<Uuid> = tables
            .posts
            .iter()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in authored {
            tables.remove_post(post_id);
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl BaseRepository<Group, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn insert(&self, group: Group) -> Result<Group, RepoError> {
        let mut tables = self.tables.write().await;
        if tables
            .groups
            .iter()
            .any(|g| g.id == group.id || g.slug == group.slug)
        {
            return Err(RepoError::Constraint(format!(
                "slug {} is taken",
                group.slug
            )));
        }
        tables.groups.push(group.clone());
        Ok(group)
    }

    async fn update(&self, group: Group) -> Result<Group, RepoError> {
        let mut tables = self.tables.write().await;
        if tables
            .groups
            .iter()
            .any(|g| g.id != group.id && g.slug == group.slug)
        {
            return Err(RepoError::Constraint(format!(
                "slug {} is taken",
                group.slug
            )));
        }
        let id = group.id;
        replace(&mut tables.groups, group, |g| g.id == id)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.groups.len();
        tables.groups.retain(|g| g.id != id);
        if tables.groups.len() == before {
            return Err(RepoError::NotFound);
        }
        for post in tables.posts.iter_mut().filter(|p| p.group_id == Some(id)) {
            post.group_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Group>, RepoError> {
        let tables = self.tables.read().await;
        let mut groups = tables.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.posts.iter().any(|p| p.id == post.id) {
            return Err(RepoError::Constraint(format!("post {} exists", post.id)));
        }
        tables.check_post(&post)?;
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        tables.check_post(&post)?;
        let id = post.id;
        replace(&mut tables.posts, post, |p| p.id == id)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == id) {
            return Err(RepoError::NotFound);
        }
        tables.remove_post(id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn count(&self, filter: PostFilter) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        let count = tables
            .posts
            .iter()
            .filter(|p| tables.matches(p, filter))
            .count();
        Ok(count as u64)
    }

    async fn list(
        &self,
        filter: PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables.read().await;
        // Reverse first so the stable sort puts later inserts ahead on equal timestamps.
        let mut posts: Vec<Post> = tables
            .posts
            .iter()
            .rev()
            .filter(|p| tables.matches(p, filter))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn insert(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.comments.iter().any(|c| c.id == comment.id) {
            return Err(RepoError::Constraint(format!(
                "comment {} exists",
                comment.id
            )));
        }
        tables.check_comment(&comment)?;
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn update(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        tables.check_comment(&comment)?;
        let id = comment.id;
        replace(&mut tables.comments, comment, |c| c.id == id)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        if tables.comments.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }
}

#[async_trait]
impl BaseRepository<Follow, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Follow>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.follows.iter().find(|f| f.id == id).cloned())
    }

    async fn insert(&self, follow: Follow) -> Result<Follow, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.follows.iter().any(|f| f.id == follow.id) {
            return Err(RepoError::Constraint(format!(
                "follow {} exists",
                follow.id
            )));
        }
        tables.check_follow(&follow)?;
        tables.follows.push(follow.clone());
        Ok(follow)
    }

    async fn update(&self, follow: Follow) -> Result<Follow, RepoError> {
        let mut tables = self.tables.write().await;
        tables.check_follow(&follow)?;
        let id = follow.id;
        replace(&mut tables.follows, follow, |f| f.id == id)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables.follows.retain(|f| f.id != id);
        if tables.follows.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl FollowRepository for InMemoryStore {
    async fn find_pair(
        &self,
        user_id: Uuid,
        author_id: Uuid,
    ) -> Result<Option<Follow>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .find(|f| f.user_id == user_id && f.author_id == author_id)
            .cloned())
    }

    async fn delete_pair(&self, user_id: Uuid, author_id: Uuid) -> Result<u64, RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        Ok((before - tables.follows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Repos {
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn GroupRepository>,
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        follows: Arc<dyn FollowRepository>,
    }

    fn repos() -> Repos {
        let store = InMemoryStore::new();
        Repos {
            users: Arc::new(store.clone()),
            groups: Arc::new(store.clone()),
            posts: Arc::new(store.clone()),
            comments: Arc::new(store.clone()),
            follows: Arc::new(store),
        }
    }

    async fn user(repos: &Repos, name: &str) -> User {
        repos
            .users
            .insert(User::new(name.to_string(), "hash".to_string()))
            .await
            .unwrap()
    }

    async fn group(repos: &Repos, slug: &str) -> Group {
        repos
            .groups
            .insert(Group::new(
                format!("Group {slug}"),
                slug.to_string(),
                String::new(),
            ))
            .await
            .unwrap()
    }

    async fn post(repos: &Repos, author: &User, group: Option<&Group>, text: &str) -> Post {
        repos
            .posts
            .insert(Post::new(
                author.id,
                text.to_string(),
                group.map(|g| g.id),
                None,
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_username_is_unique() {
        let repos = repos();
        user(&repos, "leo").await;
        let result = repos
            .users
            .insert(User::new("leo".to_string(), "other".to_string()))
            .await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_slug_is_unique() {
        let repos = repos();
        group(&repos, "cats").await;
        let result = repos
            .groups
            .insert(Group::new("Other".into(), "cats".into(), String::new()))
            .await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_post_needs_existing_author_and_group() {
        let repos = repos();
        let ghost = Post::new(Uuid::new_v4(), "text".into(), None, None);
        assert!(matches!(
            repos.posts.insert(ghost).await,
            Err(RepoError::Constraint(_))
        ));

        let author = user(&repos, "leo").await;
        let orphan = Post::new(author.id, "text".into(), Some(Uuid::new_v4()), None);
        assert!(matches!(
            repos.posts.insert(orphan).await,
            Err(RepoError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn test_listing_is_newest_first_with_insert_order_tiebreak() {
        let repos = repos();
        let author = user(&repos, "leo").await;
        let created_at = chrono::Utc::now();
        for text in ["first", "second", "third"] {
            let mut p = Post::new(author.id, text.into(), None, None);
            p.created_at = created_at;
            repos.posts.insert(p).await.unwrap();
        }

        let listed = repos.posts.list(PostFilter::All, 0, 10).await.unwrap();
        let texts: Vec<&str> = listed.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["third", "second", "first"]);

        let window = repos.posts.list(PostFilter::All, 1, 1).await.unwrap();
        assert_eq!(window[0].text, "second");
    }

    #[tokio::test]
    async fn test_filters() {
        let repos = repos();
        let leo = user(&repos, "leo").await;
        let ann = user(&repos, "ann").await;
        let reader = user(&repos, "reader").await;
        let cats = group(&repos, "cats").await;

        post(&repos, &leo, Some(&cats), "leo in cats").await;
        post(&repos, &leo, None, "leo alone").await;
        post(&repos, &ann, None, "ann alone").await;
        repos
            .follows
            .insert(Follow::new(reader.id, ann.id))
            .await
            .unwrap();

        assert_eq!(repos.posts.count(PostFilter::All).await.unwrap(), 3);
        assert_eq!(repos.posts.count(PostFilter::Group(cats.id)).await.unwrap(), 1);
        assert_eq!(repos.posts.count(PostFilter::Author(leo.id)).await.unwrap(), 2);

        let feed = repos
            .posts
            .list(PostFilter::FollowedBy(reader.id), 0, 10)
            .await
            .unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].text, "ann alone");
    }

    #[tokio::test]
    async fn test_deleting_group_detaches_posts() {
        let repos = repos();
        let leo = user(&repos, "leo").await;
        let cats = group(&repos, "cats").await;
        let p = post(&repos, &leo, Some(&cats), "text").await;

        repos.groups.delete(cats.id).await.unwrap();

        let kept = repos.posts.find_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(kept.group_id, None);
    }

    #[tokio::test]
    async fn test_deleting_user_cascades() {
        let repos = repos();
        let leo = user(&repos, "leo").await;
        let ann = user(&repos, "ann").await;
        let p = post(&repos, &leo, None, "text").await;
        let on_leo = repos
            .comments
            .insert(Comment::new(p.id, ann.id, "nice".into()))
            .await
            .unwrap();
        let ann_post = post(&repos, &ann, None, "ann").await;
        repos
            .comments
            .insert(Comment::new(ann_post.id, leo.id, "hi".into()))
            .await
            .unwrap();
        repos.follows.insert(Follow::new(ann.id, leo.id)).await.unwrap();

        repos.users.delete(leo.id).await.unwrap();

        assert!(repos.posts.find_by_id(p.id).await.unwrap().is_none());
        assert!(repos.comments.find_by_id(on_leo.id).await.unwrap().is_none());
        assert!(repos.comments.list_for_post(ann_post.id).await.unwrap().is_empty());
        assert!(!repos.follows.exists(ann.id, leo.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_deleting_post_removes_comments() {
        let repos = repos();
        let leo = user(&repos, "leo").await;
        let p = post(&repos, &leo, None, "text").await;
        repos
            .comments
            .insert(Comment::new(p.id, leo.id, "one".into()))
            .await
            .unwrap();

        repos.posts.delete(p.id).await.unwrap();

        assert!(repos.comments.list_for_post(p.id).await.unwrap().is_empty());
        assert!(matches!(
            repos.posts.delete(p.id).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_comments_oldest_first() {
        let repos = repos();
        let leo = user(&repos, "leo").await;
        let p = post(&repos, &leo, None, "text").await;
        let mut older = Comment::new(p.id, leo.id, "older".into());
        older.created_at -= chrono::TimeDelta::minutes(5);
        repos
            .comments
            .insert(Comment::new(p.id, leo.id, "newer".into()))
            .await
            .unwrap();
        repos.comments.insert(older).await.unwrap();

        let texts: Vec<String> = repos
            .comments
            .list_for_post(p.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["older", "newer"]);
    }

    #[tokio::test]
    async fn test_follow_get_or_create_is_idempotent() {
        let repos = repos();
        let leo = user(&repos, "leo").await;
        let ann = user(&repos, "ann").await;

        let (first, created) = repos.follows.get_or_create(ann.id, leo.id).await.unwrap();
        assert!(created);
        let (second, created) = repos.follows.get_or_create(ann.id, leo.id).await.unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);

        assert!(matches!(
            repos.follows.insert(Follow::new(ann.id, leo.id)).await,
            Err(RepoError::Constraint(_))
        ));

        assert_eq!(repos.follows.delete_pair(ann.id, leo.id).await.unwrap(), 1);
        assert_eq!(repos.follows.delete_pair(ann.id, leo.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_missing_post() {
        let repos = repos();
        let leo = user(&repos, "leo").await;
        let never_saved = Post::new(leo.id, "text".into(), None, None);
        assert!(matches!(
            repos.posts.update(never_saved).await,
            Err(RepoError::NotFound)
        ));
    }
}
