//! 仓储接口定义（Port）
//!
//! 所有接口均为只读。对于 trait 对象（dyn Trait）使用 async_trait。

use std::collections::{HashMap, HashSet};

use anyhow::Result;

use crate::domain::model::{
    CreatorSummary, FeedFilter, Hashtag, PersonSuggestion, Post, PostRef,
};

#[async_trait::async_trait]
pub trait PostRepository: Send + Sync {
    /// 满足筛选条件的回复所引用的根帖 id（已去重）
    async fn reply_root_ids(&self, filter: &FeedFilter) -> Result<Vec<String>>;

    /// 满足筛选条件的根帖引用（只含 id 与创建时间）
    async fn root_post_refs(&self, filter: &FeedFilter) -> Result<Vec<PostRef>>;

    /// 按 id 批量读取帖子引用，不存在的 id 直接忽略
    async fn post_refs_by_ids(&self, ids: &[String]) -> Result<Vec<PostRef>>;

    /// 按 id 批量读取完整帖子，只用于当前页；不存在的 id 直接忽略
    async fn posts_by_ids(&self, ids: &[String]) -> Result<Vec<Post>>;

    /// 统计每个根帖在整个存储中的回复数
    ///
    /// 与候选集无关：关注关系之外的用户的回复同样计数。没有回复的 id 可以缺省。
    async fn reply_counts(&self, root_ids: &[String]) -> Result<HashMap<String, u64>>;
}

/// 关注关系读取
#[async_trait::async_trait]
pub trait SocialGraphReader: Send + Sync {
    /// 用户关注的 id 集合；未知用户返回空集合而不是错误
    async fn following_of(&self, user_id: &str) -> Result<HashSet<String>>;
}

/// 用户资料读取
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// 按 id 批量读取作者公开资料，不存在的 id 直接忽略
    async fn creators_by_ids(&self, ids: &[String]) -> Result<HashMap<String, CreatorSummary>>;

    /// 按粉丝数降序列出不在 `excluded` 中的用户
    async fn suggest_people(
        &self,
        excluded: &HashSet<String>,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<PersonSuggestion>>;
}

#[async_trait::async_trait]
pub trait HashtagRepository: Send + Sync {
    /// 按关联帖子数降序列出标签
    async fn popular_tags(&self, skip: usize, limit: usize) -> Result<Vec<Hashtag>>;
}
