//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use yatube_infra::auth::JwtConfig;
use yatube_infra::database::DatabaseConfig;

/// Process-level configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub settings: Settings,
}

/// Settings the handlers read at request time.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Page size of every listing.
    pub posts_per_page: u64,
    pub index_cache_ttl: Duration,
    pub media_root: PathBuf,
    pub media_url: String,
    pub login_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            posts_per_page: 10,
            index_cache_ttl: Duration::from_secs(20),
            media_root: PathBuf::from("media"),
            media_url: "/media/".to_string(),
            login_url: "/auth/login/".to_string(),
        }
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            posts_per_page: parsed::<u64>("POSTS_PER_PAGE")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.posts_per_page),
            index_cache_ttl: parsed("INDEX_CACHE_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.index_cache_ttl),
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_root),
            media_url: env::var("MEDIA_URL").unwrap_or(defaults.media_url),
            login_url: env::var("LOGIN_URL").unwrap_or(defaults.login_url),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parsed("PORT").unwrap_or(8080),
            database: DatabaseConfig::from_env(),
            jwt: JwtConfig::from_env(),
            settings: Settings::from_env(),
        }
    }
}
