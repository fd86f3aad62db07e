use anyhow::Result;
use flock_core::load_config;
use flock_core::tracing::init_tracing_from_config;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置并按配置初始化日志系统
    let app_config = load_config(Some("config"));
    init_tracing_from_config(Some(&app_config.logging));

    flock_feed::ApplicationBootstrap::run(app_config).await
}
