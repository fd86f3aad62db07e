//! Flock Core 配置模块
//!
//! 该模块提供了应用程序配置管理功能，包括：
//! - 配置文件或配置目录的加载和合并
//! - 环境特定配置覆盖
//! - 日志、MongoDB 及各服务配置定义

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use toml::Value;
use tracing::warn;

mod manager;
pub use manager::ConfigManager;

/// 全局应用配置实例，使用 OnceLock 确保只初始化一次
static APP_CONFIG: OnceLock<FlockAppConfig> = OnceLock::new();

const DEFAULT_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// 服务标识
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceInfoConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_service_version")]
    pub version: String,
}

impl Default for ServiceInfoConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            version: default_service_version(),
        }
    }
}

fn default_service_name() -> String {
    "flock".to_string()
}

fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// 监听地址配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub port: u16,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（RUST_LOG 优先）
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub with_target: bool,
    #[serde(default)]
    pub with_thread_ids: bool,
    #[serde(default)]
    pub with_file: bool,
    #[serde(default)]
    pub with_line_number: bool,
    /// 以 JSON 格式输出
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            with_target: true,
            with_thread_ids: false,
            with_file: false,
            with_line_number: false,
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// MongoDB 实例配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MongoInstanceConfig {
    /// MongoDB 连接 URL
    pub url: String,
    /// 数据库名称
    #[serde(default)]
    pub database: Option<String>,
}

/// 服务端点配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServiceEndpointConfig {
    pub address: Option<String>,
    pub port: Option<u16>,
}

/// 服务运行时配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServiceRuntimeConfig {
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub server: Option<ServiceEndpointConfig>,
}

/// 时间线服务配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FeedServiceConfig {
    #[serde(flatten)]
    pub runtime: ServiceRuntimeConfig,
    /// 引用的 MongoDB 配置名
    #[serde(default)]
    pub mongo: Option<String>,
    #[serde(default)]
    pub posts_collection: Option<String>,
    #[serde(default)]
    pub users_collection: Option<String>,
    #[serde(default)]
    pub hashtags_collection: Option<String>,
    /// 时间线每页条数
    #[serde(default)]
    pub page_size: Option<usize>,
    /// 标签、推荐用户列表的 limit 上限
    #[serde(default)]
    pub max_list_limit: Option<usize>,
    /// 单个请求的整体超时（毫秒）
    #[serde(default)]
    pub query_timeout_ms: Option<u64>,
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
}

/// 服务配置集合
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServicesConfig {
    #[serde(default)]
    pub feed: Option<FeedServiceConfig>,
}

/// Flock 应用配置主结构体
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FlockAppConfig {
    #[serde(default)]
    pub service: ServiceInfoConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// MongoDB 配置映射
    #[serde(default)]
    pub mongodb: HashMap<String, MongoInstanceConfig>,
    #[serde(default)]
    pub services: ServicesConfig,
}

impl FlockAppConfig {
    /// 获取 MongoDB 配置
    pub fn mongodb_profile(&self, name: &str) -> Option<&MongoInstanceConfig> {
        self.mongodb.get(name)
    }

    /// 获取时间线服务配置
    pub fn feed_service(&self) -> FeedServiceConfig {
        self.services.feed.clone().unwrap_or_default()
    }

    /// 组合服务监听配置：服务级配置覆盖全局配置
    pub fn compose_server_config(&self, runtime: &ServiceRuntimeConfig) -> ServerConfig {
        let mut server = self.server.clone();
        if let Some(endpoint) = runtime.server.as_ref() {
            if let Some(address) = endpoint.address.as_ref() {
                server.address = address.clone();
            }
            if let Some(port) = endpoint.port {
                server.port = port;
            }
        }
        server
    }

    /// 确保配置有默认值
    fn ensure_defaults(&mut self) {
        if self.server.address.is_empty() {
            self.server.address = DEFAULT_ADDRESS.to_string();
        }
        if self.server.port == 0 {
            self.server.port = DEFAULT_PORT;
        }
    }
}

/// 加载配置
pub fn load_config(path: Option<&str>) -> &'static FlockAppConfig {
    let candidates: Vec<PathBuf> = match path {
        Some(p) => vec![PathBuf::from(p)],
        None => vec![PathBuf::from("config"), PathBuf::from("config.toml")],
    };

    APP_CONFIG.get_or_init(|| load_with_fallback(&candidates))
}

/// 使用备选方案加载配置
fn load_with_fallback(candidates: &[PathBuf]) -> FlockAppConfig {
    for path in candidates {
        match load_config_from_source(path) {
            Ok(cfg) => return cfg,
            Err(err) => {
                warn!("failed to load config from {}: {err}", path.display());
            }
        }
    }

    warn!("no configuration source succeeded, falling back to defaults");
    default_config()
}

/// 从源加载配置
fn load_config_from_source(path: &Path) -> Result<FlockAppConfig> {
    if !path.exists() {
        return Err(anyhow!(
            "configuration path {} does not exist",
            path.display()
        ));
    }

    let metadata = path
        .metadata()
        .with_context(|| format!("unable to read metadata for {}", path.display()))?;

    let (mut merged, env_root) = if metadata.is_dir() {
        (load_directory_value(path)?, path.to_path_buf())
    } else {
        let root = path
            .parent()
            .map(|p| p.join("config"))
            .unwrap_or_else(|| PathBuf::from("config"));
        (load_toml_value(path)?, root)
    };

    // 加载环境特定配置
    if let Err(e) = ConfigManager::load_environment_config(&mut merged, &env_root) {
        warn!("failed to load environment config: {}", e);
    }

    let mut cfg: FlockAppConfig = merged
        .try_into()
        .with_context(|| format!("invalid configuration after merging {}", path.display()))?;
    cfg.ensure_defaults();
    Ok(cfg)
}

/// 从目录加载配置
fn load_directory_value(path: &Path) -> Result<Value> {
    let base_file = path.join("base.toml");
    if !base_file.exists() {
        return Err(anyhow!(
            "missing base configuration: {}",
            base_file.display()
        ));
    }

    let mut merged = load_toml_value(&base_file)?;

    if !merged.is_table() {
        return Err(anyhow!(
            "base configuration must be a table: {}",
            base_file.display()
        ));
    }

    merge_directory(&mut merged, &path.join("shared"))?;
    merge_directory(&mut merged, &path.join("services"))?;
    merge_directory(&mut merged, &path.join("overrides"))?;

    Ok(merged)
}

/// 合并目录中的配置
fn merge_directory(root: &mut Value, dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }

    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("unable to read config directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(OsStr::to_str)
                .map(|ext| ext.eq_ignore_ascii_case("toml"))
                .unwrap_or(false)
        })
        .collect::<Vec<_>>();

    entries.sort_by_key(|entry| entry.path());

    for entry in entries {
        let value = load_toml_value(&entry.path())?;
        merge_value(root, value);
    }

    Ok(())
}

/// 加载 TOML 值
fn load_toml_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read config fragment {}", path.display()))?;
    let value: Value = toml::from_str(&content)
        .with_context(|| format!("invalid TOML content in fragment {}", path.display()))?;
    Ok(value)
}

/// 合并值：表递归合并，其余类型直接覆盖
pub(crate) fn merge_value(base: &mut Value, overlay: Value) {
    match overlay {
        Value::Table(overlay_table) => {
            if let Value::Table(base_table) = base {
                for (key, overlay_value) in overlay_table.into_iter() {
                    match base_table.get_mut(&key) {
                        Some(base_value) => merge_value(base_value, overlay_value),
                        None => {
                            base_table.insert(key, overlay_value);
                        }
                    }
                }
            } else {
                *base = Value::Table(overlay_table);
            }
        }
        other => {
            *base = other;
        }
    }
}

/// 默认配置
fn default_config() -> FlockAppConfig {
    let mut cfg = FlockAppConfig::default();
    cfg.ensure_defaults();
    cfg
}
