//! 领域模型定义

mod filter;

pub use filter::{FeedFilter, PostClass, ProfileTab};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// 帖子
///
/// `original_post_id` 存在即为回复；否则为根帖。转推不会复制帖子，
/// 只会把转推者写入根帖的 `retweeted_by`。
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: String,
    pub creator_id: String,
    pub body: String,
    pub media: Vec<String>,
    pub original_post_id: Option<String>,
    pub liked_by: Vec<String>,
    pub saved_by: Vec<String>,
    pub retweeted_by: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn is_reply(&self) -> bool {
        self.original_post_id.is_some()
    }

    pub fn has_media(&self) -> bool {
        !self.media.is_empty()
    }
}

/// 候选阶段使用的帖子引用，只含排序与去重所需字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRef {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Post> for PostRef {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            created_at: post.created_at,
        }
    }
}

/// 用户资料（时间线只读取其中的公开字段和关注关系）
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub following: Vec<String>,
    pub followers: Vec<String>,
}

impl UserProfile {
    pub fn creator_summary(&self) -> CreatorSummary {
        CreatorSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// 作者的公开资料子集
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorSummary {
    pub id: String,
    pub name: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl CreatorSummary {
    /// 作者资料缺失时使用的占位作者，保留 id 以便客户端跳转
    pub fn placeholder(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: String::new(),
            username: String::new(),
            avatar_url: None,
        }
    }
}

/// 时间线条目（派生数据，不落库）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: String,
    pub creator: CreatorSummary,
    pub body: String,
    pub media: Vec<String>,
    pub liked_by_viewer: bool,
    pub retweeted_by_viewer: bool,
    pub saved_by_viewer: bool,
    pub like_count: u64,
    pub retweet_count: u64,
    pub saved_count: u64,
    pub reply_count: u64,
    pub is_reply_context: bool,
    pub created_at: DateTime<Utc>,
}

/// 热门标签
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hashtag {
    pub id: String,
    pub name: String,
    pub post_count: u64,
}

/// 推荐关注的用户
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSuggestion {
    pub id: String,
    pub name: String,
    pub username: String,
    pub avatar_url: Option<String>,
}
