//! 查询处理器（查询侧）
//!
//! 时间线经由领域服务组装；标签、推荐关注是简单的排序读取，直接调用仓储。
//! 每个请求整体受一个截止时间约束，超时后丢弃尚未完成的存储调用。

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use flock_core::{FlockError, PageRequest, Result, try_store};
use tracing::{instrument, warn};

use crate::application::queries::{
    BookmarksQuery, HomeTimelineQuery, PeopleSuggestionsQuery, PopularTagsQuery,
    ProfileTimelineQuery,
};
use crate::config::FeedServiceSettings;
use crate::domain::model::{FeedFilter, FeedItem, Hashtag, PersonSuggestion};
use crate::domain::repository::{HashtagRepository, SocialGraphReader, UserDirectory};
use crate::domain::service::FeedAssembler;

/// 时间线查询处理器
pub struct FeedQueryHandler {
    assembler: Arc<FeedAssembler>,
    social_graph: Arc<dyn SocialGraphReader + Send + Sync>,
    users: Arc<dyn UserDirectory + Send + Sync>,
    hashtags: Arc<dyn HashtagRepository + Send + Sync>,
    page_size: usize,
    query_timeout: Duration,
}

impl FeedQueryHandler {
    pub fn new(
        assembler: Arc<FeedAssembler>,
        social_graph: Arc<dyn SocialGraphReader + Send + Sync>,
        users: Arc<dyn UserDirectory + Send + Sync>,
        hashtags: Arc<dyn HashtagRepository + Send + Sync>,
        settings: &FeedServiceSettings,
    ) -> Self {
        Self {
            assembler,
            social_graph,
            users,
            hashtags,
            page_size: settings.page_size,
            query_timeout: settings.query_timeout,
        }
    }

    /// 首页：本人、关注者发布的以及关注者转推的帖子
    #[instrument(skip(self), fields(viewer_id = %query.viewer_id, page = query.page))]
    pub async fn handle_home_timeline(&self, query: HomeTimelineQuery) -> Result<Vec<FeedItem>> {
        require_viewer(&query.viewer_id)?;
        self.with_deadline(self.home_timeline(query)).await
    }

    /// 个人主页的四个标签页，允许匿名查看
    #[instrument(
        skip(self),
        fields(profile_user_id = %query.profile_user_id, tab = ?query.tab, page = query.page)
    )]
    pub async fn handle_profile_timeline(
        &self,
        query: ProfileTimelineQuery,
    ) -> Result<Vec<FeedItem>> {
        let filter = query.tab.filter_for(&query.profile_user_id);
        let viewer_id = query.viewer_id.as_deref().filter(|id| !id.is_empty());
        self.with_deadline(self.assemble(viewer_id, filter, query.page))
            .await
    }

    /// 收藏列表（只包含根帖）
    #[instrument(skip(self), fields(viewer_id = %query.viewer_id, page = query.page))]
    pub async fn handle_bookmarks(&self, query: BookmarksQuery) -> Result<Vec<FeedItem>> {
        require_viewer(&query.viewer_id)?;
        let filter = FeedFilter::Bookmarks {
            viewer_id: query.viewer_id.clone(),
        };
        self.with_deadline(self.assemble(Some(query.viewer_id.as_str()), filter, query.page))
            .await
    }

    /// 热门标签
    #[instrument(skip(self), fields(offset = query.skip, limit = query.limit))]
    pub async fn handle_popular_tags(&self, query: PopularTagsQuery) -> Result<Vec<Hashtag>> {
        self.with_deadline(self.popular_tags(query)).await
    }

    /// 推荐关注：排除本人和已关注的人
    #[instrument(skip(self), fields(viewer_id = %query.viewer_id, offset = query.skip, limit = query.limit))]
    pub async fn handle_people_suggestions(
        &self,
        query: PeopleSuggestionsQuery,
    ) -> Result<Vec<PersonSuggestion>> {
        require_viewer(&query.viewer_id)?;
        self.with_deadline(self.people_suggestions(query)).await
    }

    async fn home_timeline(&self, query: HomeTimelineQuery) -> Result<Vec<FeedItem>> {
        let following = try_store!(self.social_graph.following_of(&query.viewer_id).await);
        let filter = FeedFilter::Home {
            viewer_id: query.viewer_id.clone(),
            following,
        };
        self.assemble(Some(query.viewer_id.as_str()), filter, query.page)
            .await
    }

    async fn assemble(
        &self,
        viewer_id: Option<&str>,
        filter: FeedFilter,
        page: usize,
    ) -> Result<Vec<FeedItem>> {
        let page = PageRequest::new(page, self.page_size);
        Ok(try_store!(
            self.assembler.assemble(viewer_id, &filter, page).await
        ))
    }

    async fn popular_tags(&self, query: PopularTagsQuery) -> Result<Vec<Hashtag>> {
        Ok(try_store!(
            self.hashtags.popular_tags(query.skip, query.limit).await
        ))
    }

    async fn people_suggestions(
        &self,
        query: PeopleSuggestionsQuery,
    ) -> Result<Vec<PersonSuggestion>> {
        let mut excluded: HashSet<String> =
            try_store!(self.social_graph.following_of(&query.viewer_id).await);
        excluded.insert(query.viewer_id.clone());

        Ok(try_store!(
            self.users
                .suggest_people(&excluded, query.skip, query.limit)
                .await
        ))
    }

    async fn with_deadline<T>(&self, work: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.query_timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = self.query_timeout.as_millis() as u64;
                warn!(timeout_ms, "feed query exceeded deadline");
                Err(FlockError::DeadlineExceeded(timeout_ms))
            }
        }
    }
}

fn require_viewer(viewer_id: &str) -> Result<()> {
    if viewer_id.trim().is_empty() {
        return Err(FlockError::Unauthenticated(
            "viewer identity is required".to_string(),
        ));
    }
    Ok(())
}
