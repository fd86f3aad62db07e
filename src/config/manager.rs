//! 配置管理器 - 负责处理不同环境下的配置选择和覆盖
//!
//! 该模块提供了配置管理功能，包括：
//! - 根据环境变量选择 MongoDB 配置
//! - 加载环境特定配置并合并

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use toml::Value;

use super::{FlockAppConfig, MongoInstanceConfig, merge_value};

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 选择 MongoDB 配置
    ///
    /// 优先级：
    /// 1. 环境变量 FLOCK_MONGO_PROFILE 指定的配置
    /// 2. 服务配置中引用的配置
    pub fn select_mongo_profile(
        config: &FlockAppConfig,
        profile_name: Option<&str>,
    ) -> Option<MongoInstanceConfig> {
        if let Ok(env_profile) = env::var("FLOCK_MONGO_PROFILE") {
            if let Some(profile) = config.mongodb_profile(&env_profile) {
                return Some(profile.clone());
            }
        }

        profile_name
            .and_then(|name| config.mongodb_profile(name))
            .cloned()
    }

    /// 获取当前环境名称，未设置 FLOCK_ENV 时为 "development"
    pub fn get_environment() -> String {
        env::var("FLOCK_ENV").unwrap_or_else(|_| "development".to_string())
    }

    /// 加载 `{root}/environments/{environment}.toml` 并合并到已加载的配置中
    pub fn load_environment_config(base: &mut Value, root: &Path) -> Result<()> {
        let env_config_path = root
            .join("environments")
            .join(format!("{}.toml", Self::get_environment()));

        if !env_config_path.exists() {
            return Ok(());
        }

        let content = fs::read_to_string(&env_config_path)
            .with_context(|| format!("unable to read environment config: {}", env_config_path.display()))?;
        let overlay: Value = toml::from_str(&content)
            .with_context(|| format!("invalid environment config: {}", env_config_path.display()))?;

        merge_value(base, overlay);
        Ok(())
    }
}
