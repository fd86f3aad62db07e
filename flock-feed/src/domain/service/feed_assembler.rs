//! 时间线组装领域服务
//!
//! 所有时间线共用同一条流水线：
//! 选候选 → 回复解析为根帖 → 按根帖 id 去重 → 按创建时间倒序 → 分页 → 读取本页帖子并补全回复数与作者。
//!
//! 候选阶段只读取帖子引用（id 与创建时间），完整帖子只按当前页的 id 读取。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use flock_core::PageRequest;
use tracing::{debug, instrument, warn};

use crate::domain::model::{CreatorSummary, FeedFilter, FeedItem, Post, PostRef};
use crate::domain::repository::{PostRepository, UserDirectory};

/// 候选条目的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOrigin {
    /// 因为某条满足条件的回复而出现
    ViaReply,
    /// 根帖本身满足条件
    Direct,
}

/// 去重前的中间条目，`post` 总是根帖的引用
#[derive(Debug, Clone)]
pub struct Candidate {
    pub post: PostRef,
    pub origin: CandidateOrigin,
}

impl Candidate {
    pub fn via_reply(post: PostRef) -> Self {
        Self {
            post,
            origin: CandidateOrigin::ViaReply,
        }
    }

    pub fn direct(post: PostRef) -> Self {
        Self {
            post,
            origin: CandidateOrigin::Direct,
        }
    }
}

/// 按根帖 id 去重
///
/// 同一 id 只保留一个代表：ViaReply 优先于 Direct，与到达顺序无关。
/// 输出保持每个 id 第一次出现的位置。
pub fn merge_candidates(candidates: impl IntoIterator<Item = Candidate>) -> Vec<Candidate> {
    let mut merged: Vec<Candidate> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for candidate in candidates {
        match positions.get(&candidate.post.id) {
            Some(&index) => {
                if merged[index].origin == CandidateOrigin::Direct
                    && candidate.origin == CandidateOrigin::ViaReply
                {
                    merged[index] = candidate;
                }
            }
            None => {
                positions.insert(candidate.post.id.clone(), merged.len());
                merged.push(candidate);
            }
        }
    }

    merged
}

/// 按创建时间倒序排列，时间相同时按 id 倒序，保证结果确定
pub fn order_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.post
            .created_at
            .cmp(&a.post.created_at)
            .then_with(|| b.post.id.cmp(&a.post.id))
    });
}

/// 生成相对于查看者的时间线条目
///
/// 匿名查看者的三个标记均为 false。
pub fn project_item(
    post: Post,
    origin: CandidateOrigin,
    viewer_id: Option<&str>,
    reply_count: u64,
    creator: CreatorSummary,
) -> FeedItem {
    let contains_viewer =
        |users: &[String]| viewer_id.is_some_and(|viewer| users.iter().any(|u| u == viewer));

    FeedItem {
        liked_by_viewer: contains_viewer(&post.liked_by),
        retweeted_by_viewer: contains_viewer(&post.retweeted_by),
        saved_by_viewer: contains_viewer(&post.saved_by),
        like_count: post.liked_by.len() as u64,
        retweet_count: post.retweeted_by.len() as u64,
        saved_count: post.saved_by.len() as u64,
        reply_count,
        is_reply_context: origin == CandidateOrigin::ViaReply,
        creator,
        id: post.id,
        body: post.body,
        media: post.media,
        created_at: post.created_at,
    }
}

/// 时间线组装器
pub struct FeedAssembler {
    posts: Arc<dyn PostRepository + Send + Sync>,
    users: Arc<dyn UserDirectory + Send + Sync>,
}

impl FeedAssembler {
    pub fn new(
        posts: Arc<dyn PostRepository + Send + Sync>,
        users: Arc<dyn UserDirectory + Send + Sync>,
    ) -> Self {
        Self { posts, users }
    }

    /// 组装一页时间线
    ///
    /// 只读操作。候选为空时返回空页。
    #[instrument(skip(self, filter, page), fields(kind = filter.kind(), page_index = page.index, page_size = page.size))]
    pub async fn assemble(
        &self,
        viewer_id: Option<&str>,
        filter: &FeedFilter,
        page: PageRequest,
    ) -> Result<Vec<FeedItem>> {
        let (reply_roots, direct) = if filter.includes_replies() {
            tokio::try_join!(
                self.resolve_reply_roots(filter),
                self.posts.root_post_refs(filter)
            )?
        } else {
            (Vec::new(), self.posts.root_post_refs(filter).await?)
        };

        debug!(
            via_reply = reply_roots.len(),
            direct = direct.len(),
            "collected feed candidates"
        );

        let candidates = reply_roots
            .into_iter()
            .map(Candidate::via_reply)
            .chain(direct.into_iter().map(Candidate::direct));
        let mut merged = merge_candidates(candidates);
        order_candidates(&mut merged);

        let total = merged.len();
        let page_items = page.slice(merged);
        debug!(total, returned = page_items.len(), "paginated feed candidates");

        if page_items.is_empty() {
            return Ok(Vec::new());
        }

        self.hydrate(viewer_id, page_items).await
    }

    /// 读取满足条件的回复所引用的根帖
    async fn resolve_reply_roots(&self, filter: &FeedFilter) -> Result<Vec<PostRef>> {
        let root_ids = self.posts.reply_root_ids(filter).await?;
        if root_ids.is_empty() {
            return Ok(Vec::new());
        }

        let roots = self.posts.post_refs_by_ids(&root_ids).await?;
        if roots.len() < root_ids.len() {
            // 被引用的根帖已不存在，对应回复不产生条目
            warn!(
                referenced = root_ids.len(),
                resolved = roots.len(),
                "some replies reference missing root posts"
            );
        }
        Ok(roots)
    }

    /// 读取本页完整帖子，补全回复数和作者资料
    async fn hydrate(
        &self,
        viewer_id: Option<&str>,
        page_items: Vec<Candidate>,
    ) -> Result<Vec<FeedItem>> {
        let ids: Vec<String> = page_items.iter().map(|c| c.post.id.clone()).collect();

        let (posts, reply_counts) = tokio::try_join!(
            self.posts.posts_by_ids(&ids),
            self.posts.reply_counts(&ids)
        )?;
        let mut posts: HashMap<String, Post> =
            posts.into_iter().map(|post| (post.id.clone(), post)).collect();

        let creator_ids: Vec<String> = {
            let mut seen = HashSet::new();
            posts
                .values()
                .filter(|post| seen.insert(post.creator_id.as_str()))
                .map(|post| post.creator_id.clone())
                .collect()
        };
        let creators = self.users.creators_by_ids(&creator_ids).await?;

        let items = page_items
            .into_iter()
            .filter_map(|candidate| {
                let Some(post) = posts.remove(&candidate.post.id) else {
                    // 候选阶段之后被删除
                    warn!(post_id = %candidate.post.id, "post vanished before hydration");
                    return None;
                };
                let reply_count = reply_counts.get(&post.id).copied().unwrap_or(0);
                let creator = match creators.get(&post.creator_id) {
                    Some(creator) => creator.clone(),
                    None => {
                        warn!(
                            post_id = %post.id,
                            creator_id = %post.creator_id,
                            "creator profile missing, using placeholder"
                        );
                        CreatorSummary::placeholder(&post.creator_id)
                    }
                };
                Some(project_item(post, candidate.origin, viewer_id, reply_count, creator))
            })
            .collect();

        Ok(items)
    }
}
