//! 辅助工具函数模块
//!
//! 提供服务启动时常用的辅助函数

use crate::config::{FlockAppConfig, ServiceRuntimeConfig};
use anyhow::{Context, Result};
use std::net::SocketAddr;

/// 服务启动辅助函数
pub struct ServiceHelper;

impl ServiceHelper {
    /// 从服务配置中解析服务器地址
    ///
    /// 服务级 `server` 配置优先，未配置的字段回落到全局 `[server]`。
    pub fn parse_server_addr(
        config: &FlockAppConfig,
        runtime: &ServiceRuntimeConfig,
    ) -> Result<SocketAddr> {
        let server = config.compose_server_config(runtime);
        let addr = format!("{}:{}", server.address, server.port)
            .parse()
            .with_context(|| {
                format!("invalid server address: {}:{}", server.address, server.port)
            })?;
        Ok(addr)
    }

    /// 服务名称，未配置时使用 `fallback_name`
    pub fn service_name(runtime: &ServiceRuntimeConfig, fallback_name: &str) -> String {
        runtime
            .service_name
            .as_ref()
            .filter(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(|| fallback_name.to_string())
    }
}
