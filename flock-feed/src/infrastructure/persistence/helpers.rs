//! 辅助函数模块
//!
//! BSON 文档与领域模型之间的转换，以及各时间线的查询条件构造

use chrono::{DateTime, Utc};
use flock_core::millis_to_datetime;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document, doc};

use crate::domain::model::{
    CreatorSummary, FeedFilter, Hashtag, PersonSuggestion, Post, PostClass, PostRef, UserProfile,
};

/// 解析十六进制 id，无法解析时返回 None
pub fn object_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

/// 批量解析 id，跳过无法解析的值
pub fn object_ids<'a>(ids: impl IntoIterator<Item = &'a String>) -> Vec<ObjectId> {
    ids.into_iter().filter_map(|id| object_id(id)).collect()
}

/// 把 BSON 中的 id 转为字符串（兼容 ObjectId 和字符串两种存法）
pub fn id_to_string(value: &Bson) -> Option<String> {
    match value {
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn string_list(document: &Document, key: &str) -> Vec<String> {
    document
        .get_array(key)
        .map(|values| values.iter().filter_map(id_to_string).collect())
        .unwrap_or_default()
}

fn optional_str(document: &Document, key: &str) -> Option<String> {
    document
        .get_str(key)
        .ok()
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn count_value(value: Option<&Bson>) -> u64 {
    match value {
        Some(Bson::Int32(n)) => (*n).max(0) as u64,
        Some(Bson::Int64(n)) => (*n).max(0) as u64,
        Some(Bson::Double(n)) if *n > 0.0 => *n as u64,
        _ => 0,
    }
}

/// 帖子文档转换为领域模型，缺少 id、作者或创建时间的文档会被跳过
/// 候选阶段的投影：只取排序与去重所需字段
pub fn post_ref_projection() -> Document {
    doc! { "_id": 1, "createdAt": 1 }
}

fn created_at(document: &Document) -> Option<DateTime<Utc>> {
    match document.get("createdAt")? {
        Bson::DateTime(dt) => millis_to_datetime(dt.timestamp_millis()),
        Bson::Int64(ms) => millis_to_datetime(*ms),
        _ => None,
    }
}

pub fn document_to_post_ref(document: &Document) -> Option<PostRef> {
    Some(PostRef {
        id: document.get("_id").and_then(id_to_string)?,
        created_at: created_at(document)?,
    })
}

pub fn document_to_post(document: &Document) -> Option<Post> {
    let id = document.get("_id").and_then(id_to_string)?;
    let creator_id = document.get("creator").and_then(id_to_string)?;
    let created_at = created_at(document)?;

    Some(Post {
        id,
        creator_id,
        body: document.get_str("tweet").unwrap_or_default().to_string(),
        media: string_list(document, "media"),
        original_post_id: document
            .get("tweetId")
            .filter(|value| !matches!(value, Bson::Null))
            .and_then(id_to_string),
        liked_by: string_list(document, "likes"),
        saved_by: string_list(document, "savedBy"),
        retweeted_by: string_list(document, "retweetedUsers"),
        created_at,
    })
}

pub fn document_to_user(document: &Document) -> Option<UserProfile> {
    Some(UserProfile {
        id: document.get("_id").and_then(id_to_string)?,
        name: document.get_str("name").unwrap_or_default().to_string(),
        username: document.get_str("username").unwrap_or_default().to_string(),
        avatar_url: optional_str(document, "profilePic"),
        following: string_list(document, "following"),
        followers: string_list(document, "followers"),
    })
}

pub fn document_to_creator(document: &Document) -> Option<CreatorSummary> {
    document_to_user(document).map(|user| user.creator_summary())
}

pub fn document_to_person(document: &Document) -> Option<PersonSuggestion> {
    document_to_user(document).map(|user| PersonSuggestion {
        id: user.id,
        name: user.name,
        username: user.username,
        avatar_url: user.avatar_url,
    })
}

/// 聚合结果中的标签文档，`postCount` 由管道计算
pub fn document_to_hashtag(document: &Document) -> Option<Hashtag> {
    Some(Hashtag {
        id: document.get("_id").and_then(id_to_string)?,
        name: document.get_str("name").unwrap_or_default().to_string(),
        post_count: count_value(document.get("postCount")),
    })
}

/// 回复数聚合结果：`{_id: <根帖 id>, count: n}`
pub fn document_to_reply_count(document: &Document) -> Option<(String, u64)> {
    let id = document.get("_id").and_then(id_to_string)?;
    Some((id, count_value(document.get("count"))))
}

fn class_condition(class: PostClass) -> Document {
    match class {
        PostClass::Reply => doc! { "tweetId": { "$exists": true } },
        PostClass::Root => doc! { "tweetId": { "$exists": false } },
    }
}

/// 构造某一类候选帖子的查询条件
///
/// 返回 None 表示该类别不参与此时间线，或目标用户 id 无法解析（结果必然为空）。
pub fn candidate_filter(filter: &FeedFilter, class: PostClass) -> Option<Document> {
    if !filter.classes().contains(&class) {
        return None;
    }

    let predicate = match filter {
        FeedFilter::Home {
            viewer_id,
            following,
        } => {
            let viewer = object_id(viewer_id)?;
            let following = object_ids(following.iter());
            doc! {
                "$or": [
                    { "creator": viewer },
                    { "creator": { "$in": following.clone() } },
                    { "retweetedUsers": { "$in": following } },
                ]
            }
        }
        FeedFilter::ProfileTweets { user_id } => {
            let user = object_id(user_id)?;
            doc! { "$or": [ { "creator": user }, { "retweetedUsers": user } ] }
        }
        FeedFilter::ProfileReplies { user_id } => {
            let user = object_id(user_id)?;
            doc! { "creator": user }
        }
        FeedFilter::ProfileMedia { user_id } => {
            let user = object_id(user_id)?;
            doc! { "creator": user, "media.0": { "$exists": true } }
        }
        FeedFilter::ProfileLikes { user_id } => {
            let user = object_id(user_id)?;
            doc! { "likes": user }
        }
        FeedFilter::Bookmarks { viewer_id } => {
            let viewer = object_id(viewer_id)?;
            doc! { "savedBy": viewer }
        }
    };

    let mut condition = class_condition(class);
    condition.extend(predicate);
    Some(condition)
}

/// 统计一组根帖的回复数
pub fn reply_count_pipeline(root_ids: Vec<ObjectId>) -> Vec<Document> {
    vec![
        doc! { "$match": { "tweetId": { "$in": root_ids } } },
        doc! { "$group": { "_id": "$tweetId", "count": { "$sum": 1 } } },
    ]
}

/// 推荐关注：排除指定用户后按粉丝数倒序
pub fn people_pipeline(excluded: Vec<ObjectId>, skip: usize, limit: usize) -> Vec<Document> {
    let (skip, limit) = (skip as i64, limit as i64);
    vec![
        doc! { "$match": { "_id": { "$nin": excluded } } },
        doc! { "$addFields": { "followerCount": { "$size": { "$ifNull": ["$followers", []] } } } },
        doc! { "$sort": { "followerCount": -1, "_id": 1 } },
        doc! { "$skip": skip },
        doc! { "$limit": limit },
        doc! { "$project": { "name": 1, "username": 1, "profilePic": 1 } },
    ]
}

/// 热门标签：按标签下帖子数倒序
pub fn popular_tags_pipeline(skip: usize, limit: usize) -> Vec<Document> {
    let (skip, limit) = (skip as i64, limit as i64);
    vec![
        doc! { "$addFields": { "postCount": { "$size": { "$ifNull": ["$tweets", []] } } } },
        doc! { "$sort": { "postCount": -1, "_id": 1 } },
        doc! { "$skip": skip },
        doc! { "$limit": limit },
        doc! { "$project": { "name": 1, "postCount": 1 } },
    ]
}
