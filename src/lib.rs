//! Flock Core 公共库
//!
//! 提供统一的配置加载、错误类型、日志初始化和分页工具

pub mod config;
pub mod error;
pub mod tracing;
pub mod utils;

pub use config::{
    ConfigManager, FeedServiceConfig, FlockAppConfig, LoggingConfig, MongoInstanceConfig,
    ServiceRuntimeConfig, load_config,
};
pub use error::*;
pub use utils::*;
