//! 内存版存储实现
//!
//! 未配置 MongoDB 时使用，也用于测试。插入顺序即存储的自然顺序。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;

use crate::domain::model::{
    CreatorSummary, FeedFilter, Hashtag, PersonSuggestion, Post, PostRef, UserProfile,
};
use crate::domain::repository::{
    HashtagRepository, PostRepository, SocialGraphReader, UserDirectory,
};

#[derive(Default, Clone)]
pub struct InMemoryFeedStore {
    posts: Arc<RwLock<Vec<Post>>>,
    users: Arc<RwLock<Vec<UserProfile>>>,
    hashtags: Arc<RwLock<Vec<Hashtag>>>,
}

impl InMemoryFeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_post(&self, post: Post) {
        self.posts.write().await.push(post);
    }

    pub async fn insert_user(&self, user: UserProfile) {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|existing| existing.id == user.id) {
            Some(existing) => *existing = user,
            None => users.push(user),
        }
    }

    pub async fn insert_hashtag(&self, hashtag: Hashtag) {
        self.hashtags.write().await.push(hashtag);
    }
}

#[async_trait::async_trait]
impl PostRepository for InMemoryFeedStore {
    async fn reply_root_ids(&self, filter: &FeedFilter) -> Result<Vec<String>> {
        let posts = self.posts.read().await;
        let mut seen = HashSet::new();
        let ids = posts
            .iter()
            .filter(|post| post.is_reply() && filter.matches(post))
            .filter_map(|post| post.original_post_id.clone())
            .filter(|id| seen.insert(id.clone()))
            .collect();
        Ok(ids)
    }

    async fn root_post_refs(&self, filter: &FeedFilter) -> Result<Vec<PostRef>> {
        let posts = self.posts.read().await;
        Ok(posts
            .iter()
            .filter(|post| !post.is_reply() && filter.matches(post))
            .map(PostRef::from)
            .collect())
    }

    async fn post_refs_by_ids(&self, ids: &[String]) -> Result<Vec<PostRef>> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let posts = self.posts.read().await;
        Ok(posts
            .iter()
            .filter(|post| wanted.contains(post.id.as_str()))
            .map(PostRef::from)
            .collect())
    }

    async fn posts_by_ids(&self, ids: &[String]) -> Result<Vec<Post>> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let posts = self.posts.read().await;
        Ok(posts
            .iter()
            .filter(|post| wanted.contains(post.id.as_str()))
            .cloned()
            .collect())
    }

    async fn reply_counts(&self, root_ids: &[String]) -> Result<HashMap<String, u64>> {
        let wanted: HashSet<&str> = root_ids.iter().map(String::as_str).collect();
        let posts = self.posts.read().await;
        let mut counts = HashMap::new();
        for parent in posts.iter().filter_map(|post| post.original_post_id.as_deref()) {
            if wanted.contains(parent) {
                *counts.entry(parent.to_string()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}

#[async_trait::async_trait]
impl SocialGraphReader for InMemoryFeedStore {
    async fn following_of(&self, user_id: &str) -> Result<HashSet<String>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|user| user.id == user_id)
            .map(|user| user.following.iter().cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl UserDirectory for InMemoryFeedStore {
    async fn creators_by_ids(&self, ids: &[String]) -> Result<HashMap<String, CreatorSummary>> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|user| wanted.contains(user.id.as_str()))
            .map(|user| (user.id.clone(), user.creator_summary()))
            .collect())
    }

    async fn suggest_people(
        &self,
        excluded: &HashSet<String>,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<PersonSuggestion>> {
        let users = self.users.read().await;
        let mut candidates: Vec<&UserProfile> = users
            .iter()
            .filter(|user| !excluded.contains(&user.id))
            .collect();
        candidates.sort_by(|a, b| b.followers.len().cmp(&a.followers.len()));

        Ok(candidates
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|user| PersonSuggestion {
                id: user.id.clone(),
                name: user.name.clone(),
                username: user.username.clone(),
                avatar_url: user.avatar_url.clone(),
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl HashtagRepository for InMemoryFeedStore {
    async fn popular_tags(&self, skip: usize, limit: usize) -> Result<Vec<Hashtag>> {
        let mut hashtags = self.hashtags.read().await.clone();
        hashtags.sort_by(|a, b| b.post_count.cmp(&a.post_count));
        Ok(hashtags.into_iter().skip(skip).take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn post(id: &str, creator: &str, parent: Option<&str>) -> Post {
        Post {
            id: id.to_string(),
            creator_id: creator.to_string(),
            body: format!("body of {id}"),
            media: Vec::new(),
            original_post_id: parent.map(str::to_string),
            liked_by: Vec::new(),
            saved_by: Vec::new(),
            retweeted_by: Vec::new(),
            created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_reply_root_ids_are_deduplicated() {
        let store = InMemoryFeedStore::new();
        store.insert_post(post("p1", "a", None)).await;
        store.insert_post(post("r1", "a", Some("p1"))).await;
        store.insert_post(post("r2", "a", Some("p1"))).await;
        store.insert_post(post("r3", "b", Some("p2"))).await;

        let filter = FeedFilter::ProfileReplies { user_id: "a".into() };
        assert_eq!(store.reply_root_ids(&filter).await.unwrap(), vec!["p1".to_string()]);
        let roots = store.root_post_refs(&filter).await.unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].id, "p1");
    }

    #[tokio::test]
    async fn test_reply_counts_cover_whole_store() {
        let store = InMemoryFeedStore::new();
        store.insert_post(post("p1", "a", None)).await;
        store.insert_post(post("r1", "a", Some("p1"))).await;
        store.insert_post(post("r2", "stranger", Some("p1"))).await;
        store.insert_post(post("r3", "b", Some("p2"))).await;

        let counts = store
            .reply_counts(&["p1".to_string(), "p9".to_string()])
            .await
            .unwrap();
        assert_eq!(counts.get("p1"), Some(&2));
        assert_eq!(counts.get("p9"), None);
        assert_eq!(counts.get("p2"), None);
    }

    #[tokio::test]
    async fn test_unknown_user_has_empty_following() {
        let store = InMemoryFeedStore::new();
        assert!(store.following_of("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_suggest_people_orders_by_followers() {
        let store = InMemoryFeedStore::new();
        for (id, followers) in [("u1", 1), ("u2", 3), ("u3", 2), ("me", 9)] {
            store
                .insert_user(UserProfile {
                    id: id.to_string(),
                    name: id.to_uppercase(),
                    username: id.to_string(),
                    followers: (0..followers).map(|i| format!("f{i}")).collect(),
                    ..UserProfile::default()
                })
                .await;
        }

        let excluded: HashSet<String> = ["me".to_string()].into_iter().collect();
        let people = store.suggest_people(&excluded, 0, 10).await.unwrap();
        let ids: Vec<&str> = people.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["u2", "u3", "u1"]);

        let second = store.suggest_people(&excluded, 1, 1).await.unwrap();
        assert_eq!(second[0].id, "u3");
    }

    #[tokio::test]
    async fn test_popular_tags() {
        let store = InMemoryFeedStore::new();
        for (name, count) in [("rust", 5), ("mongo", 9), ("axum", 1)] {
            store
                .insert_hashtag(Hashtag {
                    id: name.to_string(),
                    name: name.to_string(),
                    post_count: count,
                })
                .await;
        }

        let tags = store.popular_tags(0, 2).await.unwrap();
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["mongo", "rust"]);
    }
}
