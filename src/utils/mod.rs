//! 工具函数模块
//!
//! 提供分页参数解析、时间戳转换等通用工具函数

pub mod helpers;

pub use helpers::ServiceHelper;


use chrono::{DateTime, TimeZone, Utc};

use crate::error::{FlockError, Result};

/// 毫秒数转换为 DateTime
pub fn millis_to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// 分页请求（页号从 0 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub index: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn new(index: usize, size: usize) -> Self {
        Self { index, size }
    }

    /// 需要跳过的条目数
    pub fn offset(&self) -> usize {
        self.index.saturating_mul(self.size)
    }

    /// 从已排序的完整结果中截取本页
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items.into_iter().skip(self.offset()).take(self.size).collect()
    }
}

/// 解析路径中的页号
///
/// 只接受非负十进制整数，在访问存储之前调用。
pub fn parse_page_index(raw: &str) -> Result<usize> {
    parse_non_negative("skip", raw)
}

/// 解析列表接口的 limit，并限制在 `max` 以内
pub fn parse_list_limit(raw: &str, max: usize) -> Result<usize> {
    let limit = parse_non_negative("limit", raw)?;
    if limit == 0 {
        crate::bail_invalid!("limit must be greater than zero");
    }
    Ok(limit.min(max))
}

fn parse_non_negative(name: &str, raw: &str) -> Result<usize> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FlockError::InvalidParameter(format!(
            "{} must be a non-negative integer, got {:?}",
            name, raw
        )));
    }
    trimmed
        .parse::<usize>()
        .map_err(|_| FlockError::InvalidParameter(format!("{} is out of range: {}", name, raw)))
}
