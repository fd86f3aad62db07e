//! 查询结构体定义（Query DTO）
//!
//! 页号、limit 在进入应用层之前已完成解析。

use crate::domain::model::ProfileTab;

/// 首页时间线
#[derive(Debug, Clone)]
pub struct HomeTimelineQuery {
    pub viewer_id: String,
    pub page: usize,
}

/// 个人主页时间线（推文 / 回复 / 媒体 / 点赞）
#[derive(Debug, Clone)]
pub struct ProfileTimelineQuery {
    /// 匿名访问时为 None
    pub viewer_id: Option<String>,
    pub profile_user_id: String,
    pub tab: ProfileTab,
    pub page: usize,
}

/// 收藏列表
#[derive(Debug, Clone)]
pub struct BookmarksQuery {
    pub viewer_id: String,
    pub page: usize,
}

/// 热门标签，`skip` 为原始偏移量
#[derive(Debug, Clone)]
pub struct PopularTagsQuery {
    pub skip: usize,
    pub limit: usize,
}

/// 推荐关注
#[derive(Debug, Clone)]
pub struct PeopleSuggestionsQuery {
    pub viewer_id: String,
    pub skip: usize,
    pub limit: usize,
}
