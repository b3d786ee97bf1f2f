use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Comment, Follow, Group, Post, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Persist a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID, along with whatever cascades from it.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

/// Which posts a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(Uuid),
    Author(Uuid),
    /// Posts whose author is followed by the given user.
    FollowedBy(Uuid),
}

/// Post repository. Listings are ordered newest first.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn count(&self, filter: PostFilter) -> Result<u64, RepoError>;

    async fn list(
        &self,
        filter: PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError>;
}

#[async_trait]
pub trait GroupRepository: BaseRepository<Group, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError>;

    /// All groups ordered by title.
    async fn list_all(&self) -> Result<Vec<Group>, RepoError>;
}

#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments of a post, oldest first.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;
}

#[async_trait]
pub trait FollowRepository: BaseRepository<Follow, Uuid> {
    async fn find_pair(&self, user_id: Uuid, author_id: Uuid)
    -> Result<Option<Follow>, RepoError>;

    /// Remove the (user, author) relationship; returns how many rows went away.
    async fn delete_pair(&self, user_id: Uuid, author_id: Uuid) -> Result<u64, RepoError>;

    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        Ok(self.find_pair(user_id, author_id).await?.is_some())
    }

    /// Idempotent create; the flag tells whether a new record was written.
    async fn get_or_create(
        &self,
        user_id: Uuid,
        author_id: Uuid,
    ) -> Result<(Follow, bool), RepoError> {
        if let Some(existing) = self.find_pair(user_id, author_id).await? {
            return Ok((existing, false));
        }
        match self.insert(Follow::new(user_id, author_id)).await {
            Ok(follow) => Ok((follow, true)),
            // Lost a race against a concurrent insert of the same pair.
            Err(RepoError::Constraint(msg)) => self
                .find_pair(user_id, author_id)
                .await?
                .map(|existing| (existing, false))
                .ok_or(RepoError::Constraint(msg)),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Simulates a concurrent writer: the pair shows up only after our insert fails.
    #[derive(Default)]
    struct RacingFollows {
        stored: Mutex<Option<Follow>>,
    }

    #[async_trait]
    impl BaseRepository<Follow, Uuid> for RacingFollows {
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Follow>, RepoError> {
            Ok(None)
        }

        async fn insert(&self, entity: Follow) -> Result<Follow, RepoError> {
            *self.stored.lock().unwrap() = Some(Follow::new(entity.user_id, entity.author_id));
            Err(RepoError::Constraint("follows_user_author_key".to_string()))
        }

        async fn update(&self, entity: Follow) -> Result<Follow, RepoError> {
            Ok(entity)
        }

        async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
            Ok(())
        }
    }

    #[async_trait]
    impl FollowRepository for RacingFollows {
        async fn find_pair(
            &self,
            _user_id: Uuid,
            _author_id: Uuid,
        ) -> Result<Option<Follow>, RepoError> {
            Ok(self.stored.lock().unwrap().clone())
        }

        async fn delete_pair(&self, _user_id: Uuid, _author_id: Uuid) -> Result<u64, RepoError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_get_or_create_recovers_from_lost_race() {
        let repo = RacingFollows::default();
        let (user, author) = (Uuid::new_v4(), Uuid::new_v4());

        let (follow, created) = repo.get_or_create(user, author).await.unwrap();

        assert!(!created);
        assert_eq!(follow.user_id, user);
        assert_eq!(follow.author_id, author);
    }
}
