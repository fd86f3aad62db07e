use std::env;
use std::time::Duration;

use anyhow::Result;
use flock_core::config::{ConfigManager, FlockAppConfig};

const DEFAULT_DATABASE: &str = "flock";
const DEFAULT_PAGE_SIZE: usize = 10;
const DEFAULT_MAX_LIST_LIMIT: usize = 50;
const DEFAULT_QUERY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3_000;

#[derive(Clone, Debug)]
pub struct FeedServiceSettings {
    pub mongo_url: Option<String>,
    pub mongo_database: String,
    pub posts_collection: String,
    pub users_collection: String,
    pub hashtags_collection: String,
    pub page_size: usize,
    pub max_list_limit: usize,
    pub query_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for FeedServiceSettings {
    fn default() -> Self {
        Self {
            mongo_url: None,
            mongo_database: DEFAULT_DATABASE.to_string(),
            posts_collection: "tweets".to_string(),
            users_collection: "users".to_string(),
            hashtags_collection: "hashtags".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_list_limit: DEFAULT_MAX_LIST_LIMIT,
            query_timeout: Duration::from_millis(DEFAULT_QUERY_TIMEOUT_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
        }
    }
}

impl FeedServiceSettings {
    /// 从应用配置加载，环境变量优先
    pub fn from_app_config(app: &FlockAppConfig) -> Result<Self> {
        Self::resolve(app, |key| env::var(key).ok())
    }

    fn resolve(app: &FlockAppConfig, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let service_config = app.feed_service();
        let profile = ConfigManager::select_mongo_profile(app, service_config.mongo.as_deref());

        let mongo_url = lookup("FEED_MONGO_URL")
            .or_else(|| profile.as_ref().map(|profile| profile.url.clone()))
            .filter(|url| !url.trim().is_empty());

        let mongo_database = lookup("FEED_MONGO_DATABASE")
            .or_else(|| profile.as_ref().and_then(|profile| profile.database.clone()))
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let page_size = lookup("FEED_PAGE_SIZE")
            .and_then(|v| v.parse::<usize>().ok())
            .or(service_config.page_size)
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let max_list_limit = lookup("FEED_MAX_LIST_LIMIT")
            .and_then(|v| v.parse::<usize>().ok())
            .or(service_config.max_list_limit)
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_MAX_LIST_LIMIT);

        let query_timeout_ms = lookup("FEED_QUERY_TIMEOUT_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .or(service_config.query_timeout_ms)
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_QUERY_TIMEOUT_MS);

        let defaults = Self::default();

        Ok(Self {
            mongo_url,
            mongo_database,
            posts_collection: service_config
                .posts_collection
                .unwrap_or(defaults.posts_collection),
            users_collection: service_config
                .users_collection
                .unwrap_or(defaults.users_collection),
            hashtags_collection: service_config
                .hashtags_collection
                .unwrap_or(defaults.hashtags_collection),
            page_size,
            max_list_limit,
            query_timeout: Duration::from_millis(query_timeout_ms),
            connect_timeout: service_config
                .connect_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.connect_timeout),
        })
    }
}
