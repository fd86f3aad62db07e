//! 日志初始化模块
//!
//! 为各个服务提供统一的 tracing-subscriber 初始化入口。

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// 从配置初始化日志系统
///
/// 优先使用环境变量 RUST_LOG，否则使用配置中的日志级别（默认 info）。
///
/// # 示例
/// ```rust,ignore
/// use flock_core::config::LoggingConfig;
///
/// init_tracing_from_config(None);
///
/// let config = LoggingConfig {
///     level: "debug".to_string(),
///     json: true,
///     ..LoggingConfig::default()
/// };
/// init_tracing_from_config(Some(&config));
/// ```
pub fn init_tracing_from_config(logging_config: Option<&LoggingConfig>) {
    let default_config = LoggingConfig::default();
    let config = logging_config.unwrap_or(&default_config);

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(config.level.as_str()),
    };

    let builder = fmt::Subscriber::builder()
        .with_target(config.with_target)
        .with_thread_ids(config.with_thread_ids)
        .with_file(config.with_file)
        .with_line_number(config.with_line_number)
        .with_env_filter(env_filter);

    // 重复初始化（例如测试中）时忽略错误
    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(err) = result {
        eprintln!("tracing subscriber already initialised: {err}");
    }
}
