//! Flock Core 错误模块
//!
//! - 统一定义各服务共享的错误类型
//! - 区分客户端错误（参数、身份）与服务端错误（存储、超时）

use thiserror::Error;

/// 错误分类，接口层据此决定对外状态码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Client,
    Unauthorized,
    Server,
    Timeout,
}

/// Flock 服务错误类型
#[derive(Debug, Error)]
pub enum FlockError {
    /// 无效的参数
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// 缺少调用方身份
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// 存储不可用
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// 请求超出截止时间
    #[error("Deadline exceeded after {0} ms")]
    DeadlineExceeded(u64),

    /// 其他错误
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Flock 服务结果类型
pub type Result<T> = std::result::Result<T, FlockError>;

impl FlockError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FlockError::InvalidParameter(_) => ErrorCategory::Client,
            FlockError::Unauthenticated(_) => ErrorCategory::Unauthorized,
            FlockError::DeadlineExceeded(_) => ErrorCategory::Timeout,
            FlockError::StoreUnavailable(_) | FlockError::Other(_) => ErrorCategory::Server,
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Client | ErrorCategory::Unauthorized
        )
    }

    /// 将基础设施错误包装为存储不可用
    pub fn store(err: impl std::fmt::Display) -> Self {
        FlockError::StoreUnavailable(err.to_string())
    }
}

/// 便捷宏：以参数错误提前返回
#[macro_export]
macro_rules! bail_invalid {
    ($($arg:tt)*) => {
        return Err($crate::error::FlockError::InvalidParameter(format!($($arg)*)))
    };
}

/// 便捷宏：将基础设施结果转换为存储错误并传播
#[macro_export]
macro_rules! try_store {
    ($expr:expr) => {
        $expr.map_err($crate::error::FlockError::store)?
    };
}
