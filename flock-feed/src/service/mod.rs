use std::net::SocketAddr;

use anyhow::{Context, Result};
use flock_core::{FlockAppConfig, ServiceHelper};
use tokio::net::TcpListener;
use tracing::info;

mod wire;

pub use wire::{ApplicationContext, initialize, initialize_with_memory_store};

/// 应用启动器
pub struct ApplicationBootstrap;

impl ApplicationBootstrap {
    /// 运行应用的主入口点
    pub async fn run(app_config: &'static FlockAppConfig) -> Result<()> {
        let service_config = app_config.feed_service();
        let service_name = ServiceHelper::service_name(&service_config.runtime, "flock-feed");

        let address: SocketAddr =
            ServiceHelper::parse_server_addr(app_config, &service_config.runtime)
                .context("invalid feed server address")?;
        info!(address = %address, "Server address parsed successfully");

        let context = self::wire::initialize(app_config).await?;
        info!(
            service = %service_name,
            page_size = context.settings.page_size,
            query_timeout_ms = context.settings.query_timeout.as_millis() as u64,
            "Feed application context created"
        );

        Self::run_with_context(context, address).await
    }

    /// 启动 HTTP 服务，收到 Ctrl+C 后优雅停机
    async fn run_with_context(context: ApplicationContext, address: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(address)
            .await
            .with_context(|| format!("failed to bind {}", address))?;
        info!(address = %address, "Feed HTTP service is listening");

        axum::serve(listener, context.router)
            .with_graceful_shutdown(async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %err, "failed to listen for shutdown signal");
                }
                info!("shutdown signal received");
            })
            .await
            .context("feed HTTP server error")?;

        info!("feed service stopped");
        Ok(())
    }
}
