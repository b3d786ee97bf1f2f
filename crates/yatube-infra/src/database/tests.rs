use chrono::Utc;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use uuid::Uuid;

use yatube_core::domain::{Follow, Post};
use yatube_core::error::RepoError;
use yatube_core::ports::{BaseRepository, FollowRepository, GroupRepository, PostFilter, PostRepository};

use crate::database::entity::{follow, group, post};
use crate::database::postgres_repo::{
    PostgresFollowRepository, PostgresGroupRepository, PostgresPostRepository,
};

fn post_model(author_id: Uuid, text: &str) -> post::Model {
    post::Model {
        id: Uuid::new_v4(),
        author_id,
        group_id: None,
        text: text.to_owned(),
        image: Some("posts/small.gif".to_owned()),
        created_at: Utc::now().into(),
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let author_id = Uuid::new_v4();
    let model = post_model(author_id, "Тестовый пост");
    let post_id = model.id;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![model]])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    let found: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    let found = found.unwrap();
    assert_eq!(found.id, post_id);
    assert_eq!(found.author_id, author_id);
    assert_eq!(found.image.as_deref(), Some("posts/small.gif"));
}

#[tokio::test]
async fn test_list_posts_issues_windowed_query() {
    let author_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![
            post_model(author_id, "newer"),
            post_model(author_id, "older"),
        ]])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    let posts = repo
        .list(PostFilter::Author(author_id), 10, 10)
        .await
        .unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].text, "newer");

    let log = repo.db.into_transaction_log();
    let sql = format!("{:?}", log[0]);
    assert!(sql.contains("ORDER BY"));
    assert!(sql.contains("LIMIT"));
    assert!(sql.contains("OFFSET"));
}

#[tokio::test]
async fn test_follow_feed_uses_subquery() {
    let reader = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<post::Model>::new()])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    let posts = repo.list(PostFilter::FollowedBy(reader), 0, 10).await.unwrap();
    assert!(posts.is_empty());

    let sql = format!("{:?}", repo.db.into_transaction_log()[0]);
    assert!(sql.contains("follows"));
}

#[tokio::test]
async fn test_find_group_by_slug() {
    let model = group::Model {
        id: Uuid::new_v4(),
        title: "Тестовая группа".to_owned(),
        slug: "test-slug".to_owned(),
        description: "Тестовое описание".to_owned(),
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![model.clone()]])
        .into_connection();
    let repo = PostgresGroupRepository::new(db);

    let found = repo.find_by_slug("test-slug").await.unwrap().unwrap();
    assert_eq!(found.id, model.id);
    assert_eq!(found.to_string(), "Тестовая группа");
}

#[tokio::test]
async fn test_get_or_create_returns_existing_follow() {
    let existing = follow::Model {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        author_id: Uuid::new_v4(),
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![existing.clone()]])
        .into_connection();
    let repo = PostgresFollowRepository::new(db);

    let (follow, created): (Follow, bool) = repo
        .get_or_create(existing.user_id, existing.author_id)
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(follow.id, existing.id);
}

#[tokio::test]
async fn test_delete_pair_reports_rows() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();
    let repo = PostgresFollowRepository::new(db);

    let removed = repo
        .delete_pair(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(removed, 1);
}

#[tokio::test]
async fn test_delete_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    let result = BaseRepository::<Post, Uuid>::delete(&repo, Uuid::new_v4()).await;
    assert!(matches!(result, Err(RepoError::NotFound)));
}
