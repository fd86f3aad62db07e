//! 候选帖子筛选条件
//!
//! 六种时间线只在“选出哪些候选帖子”上不同，合并、去重、排序、分页完全一致。

use std::collections::HashSet;

use super::Post;

/// 候选帖子的两个互斥类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostClass {
    /// 回复：贡献其根帖，条目标记为 reply context
    Reply,
    /// 根帖：直接作为条目
    Root,
}

impl PostClass {
    pub fn of(post: &Post) -> Self {
        if post.is_reply() {
            PostClass::Reply
        } else {
            PostClass::Root
        }
    }
}

const REPLY_AND_ROOT: &[PostClass] = &[PostClass::Reply, PostClass::Root];
const ROOT_ONLY: &[PostClass] = &[PostClass::Root];

/// 时间线筛选条件
#[derive(Debug, Clone, PartialEq)]
pub enum FeedFilter {
    /// 本人或关注者发布的，或被关注者转推的
    Home {
        viewer_id: String,
        following: HashSet<String>,
    },
    /// 目标用户发布或转推的根帖
    ProfileTweets { user_id: String },
    /// 目标用户发布的根帖和回复
    ProfileReplies { user_id: String },
    /// 目标用户发布的、带媒体的根帖和回复
    ProfileMedia { user_id: String },
    /// 目标用户点赞的根帖和回复
    ProfileLikes { user_id: String },
    /// 查看者收藏的根帖
    Bookmarks { viewer_id: String },
}

impl FeedFilter {
    pub fn kind(&self) -> &'static str {
        match self {
            FeedFilter::Home { .. } => "home",
            FeedFilter::ProfileTweets { .. } => "profile_tweets",
            FeedFilter::ProfileReplies { .. } => "profile_replies",
            FeedFilter::ProfileMedia { .. } => "profile_media",
            FeedFilter::ProfileLikes { .. } => "profile_likes",
            FeedFilter::Bookmarks { .. } => "bookmarks",
        }
    }

    /// 参与选择的帖子类别
    pub fn classes(&self) -> &'static [PostClass] {
        match self {
            FeedFilter::ProfileTweets { .. } | FeedFilter::Bookmarks { .. } => ROOT_ONLY,
            _ => REPLY_AND_ROOT,
        }
    }

    pub fn includes_replies(&self) -> bool {
        self.classes().contains(&PostClass::Reply)
    }

    /// 帖子是否满足筛选条件（包含类别判断）
    pub fn matches(&self, post: &Post) -> bool {
        self.classes().contains(&PostClass::of(post)) && self.matches_predicate(post)
    }

    fn matches_predicate(&self, post: &Post) -> bool {
        match self {
            FeedFilter::Home {
                viewer_id,
                following,
            } => {
                post.creator_id == *viewer_id
                    || following.contains(&post.creator_id)
                    || post.retweeted_by.iter().any(|user| following.contains(user))
            }
            FeedFilter::ProfileTweets { user_id } => {
                post.creator_id == *user_id || post.retweeted_by.contains(user_id)
            }
            FeedFilter::ProfileReplies { user_id } => post.creator_id == *user_id,
            FeedFilter::ProfileMedia { user_id } => {
                post.creator_id == *user_id && post.has_media()
            }
            FeedFilter::ProfileLikes { user_id } => post.liked_by.contains(user_id),
            FeedFilter::Bookmarks { viewer_id } => post.saved_by.contains(viewer_id),
        }
    }
}

/// 个人主页的四个标签页
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileTab {
    Tweets,
    Replies,
    Media,
    Likes,
}

impl ProfileTab {
    pub fn filter_for(self, user_id: &str) -> FeedFilter {
        let user_id = user_id.to_string();
        match self {
            ProfileTab::Tweets => FeedFilter::ProfileTweets { user_id },
            ProfileTab::Replies => FeedFilter::ProfileReplies { user_id },
            ProfileTab::Media => FeedFilter::ProfileMedia { user_id },
            ProfileTab::Likes => FeedFilter::ProfileLikes { user_id },
        }
    }
}
