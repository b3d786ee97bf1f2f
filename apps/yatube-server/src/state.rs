//! Application state - shared across all handlers.

use std::sync::Arc;

use yatube_core::ports::{
    Cache, CommentRepository, FollowRepository, GroupRepository, ImageStore, PostRepository,
    UserRepository,
};
use yatube_infra::cache::InMemoryCache;
use yatube_infra::database::InMemoryStore;
use yatube_infra::media::LocalImageStore;

#[cfg(feature = "postgres")]
use yatube_infra::database::{
    DatabaseConnections, PostgresCommentRepository, PostgresFollowRepository,
    PostgresGroupRepository, PostgresPostRepository, PostgresUserRepository, sync_schema,
};

use crate::config::{AppConfig, Settings};

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<dyn Cache>,
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub images: Arc<dyn ImageStore>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Build the state, using PostgreSQL when configured and reachable.
    pub async fn new(config: &AppConfig) -> Self {
        if let Some(state) = Self::connect_postgres(config).await {
            tracing::info!("Application state initialized (postgres)");
            return state;
        }

        tracing::info!("Application state initialized (in-memory)");
        Self::in_memory(config.settings.clone())
    }

    /// State backed by the in-memory store.
    pub fn in_memory(settings: Settings) -> Self {
        let store = InMemoryStore::new();
        Self {
            cache: Arc::new(InMemoryCache::new()),
            users: Arc::new(store.clone()),
            posts: Arc::new(store.clone()),
            groups: Arc::new(store.clone()),
            comments: Arc::new(store.clone()),
            follows: Arc::new(store),
            images: image_store(&settings),
            settings: Arc::new(settings),
        }
    }

    #[cfg(feature = "postgres")]
    async fn connect_postgres(config: &AppConfig) -> Option<Self> {
        let Some(db_config) = &config.database else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return None;
        };

        let connections = match DatabaseConnections::init(db_config).await {
            Ok(connections) => connections,
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                return None;
            }
        };

        if let Err(e) = sync_schema(&connections.main).await {
            tracing::error!("Failed to create tables: {}. Using in-memory fallback.", e);
            return None;
        }

        let db = connections.main;
        let settings = config.settings.clone();
        Some(Self {
            cache: Arc::new(InMemoryCache::new()),
            users: Arc::new(PostgresUserRepository::new(db.clone())),
            posts: Arc::new(PostgresPostRepository::new(db.clone())),
            groups: Arc::new(PostgresGroupRepository::new(db.clone())),
            comments: Arc::new(PostgresCommentRepository::new(db.clone())),
            follows: Arc::new(PostgresFollowRepository::new(db)),
            images: image_store(&settings),
            settings: Arc::new(settings),
        })
    }

    #[cfg(not(feature = "postgres"))]
    async fn connect_postgres(config: &AppConfig) -> Option<Self> {
        if config.database.is_some() {
            tracing::warn!("Built without postgres feature - ignoring DATABASE_URL");
        }
        None
    }
}

fn image_store(settings: &Settings) -> Arc<dyn ImageStore> {
    Arc::new(LocalImageStore::new(
        settings.media_root.clone(),
        settings.media_url.as_str(),
    ))
}
