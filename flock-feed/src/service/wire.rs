//! Wire 风格的依赖注入模块
//!
//! 按依赖顺序构建存储、领域服务、查询处理器和路由

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use flock_core::FlockAppConfig;
use tracing::{info, warn};

use crate::application::handlers::FeedQueryHandler;
use crate::config::FeedServiceSettings;
use crate::domain::repository::{
    HashtagRepository, PostRepository, SocialGraphReader, UserDirectory,
};
use crate::domain::service::FeedAssembler;
use crate::infrastructure::persistence::{InMemoryFeedStore, MongoFeedStore};
use crate::interface::http::{HttpState, feed_router};

/// 应用上下文 - 包含所有已初始化的组件
pub struct ApplicationContext {
    pub settings: FeedServiceSettings,
    pub query_handler: Arc<FeedQueryHandler>,
    pub router: Router,
}

/// 同一个存储实现提供的全部读取端口
struct FeedStores {
    posts: Arc<dyn PostRepository + Send + Sync>,
    social_graph: Arc<dyn SocialGraphReader + Send + Sync>,
    users: Arc<dyn UserDirectory + Send + Sync>,
    hashtags: Arc<dyn HashtagRepository + Send + Sync>,
}

impl FeedStores {
    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: PostRepository + SocialGraphReader + UserDirectory + HashtagRepository + Send + Sync + 'static,
    {
        Self {
            posts: store.clone(),
            social_graph: store.clone(),
            users: store.clone(),
            hashtags: store,
        }
    }
}

/// 构建应用上下文
pub async fn initialize(app_config: &FlockAppConfig) -> Result<ApplicationContext> {
    // 1. 服务配置
    let settings = FeedServiceSettings::from_app_config(app_config)
        .context("Failed to load feed service configuration")?;

    // 2. 存储：未配置 MongoDB 时回落到内存存储
    let stores = match MongoFeedStore::new(&settings)
        .await
        .context("Failed to create MongoDB feed store")?
    {
        Some(store) => {
            info!("Using MongoDB feed store");
            FeedStores::from_store(Arc::new(store))
        }
        None => {
            warn!("MongoDB URL not configured, using in-memory feed store");
            FeedStores::from_store(Arc::new(InMemoryFeedStore::new()))
        }
    };

    Ok(build_context(stores, settings))
}

/// 基于已有的内存存储构建上下文（集成测试和本地调试使用）
pub fn initialize_with_memory_store(
    store: InMemoryFeedStore,
    settings: FeedServiceSettings,
) -> ApplicationContext {
    build_context(FeedStores::from_store(Arc::new(store)), settings)
}

fn build_context(stores: FeedStores, settings: FeedServiceSettings) -> ApplicationContext {
    // 3. 领域服务
    let assembler = Arc::new(FeedAssembler::new(stores.posts, stores.users.clone()));

    // 4. 查询处理器
    let query_handler = Arc::new(FeedQueryHandler::new(
        assembler,
        stores.social_graph,
        stores.users,
        stores.hashtags,
        &settings,
    ));

    // 5. HTTP 路由
    let router = feed_router(HttpState {
        query_handler: query_handler.clone(),
        max_list_limit: settings.max_list_limit,
    });

    ApplicationContext {
        settings,
        query_handler,
        router,
    }
}
