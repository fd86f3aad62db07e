//! 时间线组装服务的单元测试

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    use anyhow::Result;
    use chrono::{DateTime, TimeZone, Utc};
    use flock_core::PageRequest;

    use crate::domain::model::{
        CreatorSummary, FeedFilter, FeedItem, PersonSuggestion, Post, PostRef, ProfileTab,
        UserProfile,
    };
    use crate::domain::repository::{PostRepository, UserDirectory};
    use crate::domain::service::{
        Candidate, CandidateOrigin, FeedAssembler, merge_candidates, order_candidates,
    };
    use crate::infrastructure::persistence::memory::InMemoryFeedStore;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    fn root(id: &str, creator: &str, seconds: i64) -> Post {
        Post {
            id: id.to_string(),
            creator_id: creator.to_string(),
            body: format!("post {id}"),
            media: Vec::new(),
            original_post_id: None,
            liked_by: Vec::new(),
            saved_by: Vec::new(),
            retweeted_by: Vec::new(),
            created_at: at(seconds),
        }
    }

    fn reply(id: &str, creator: &str, parent: &str, seconds: i64) -> Post {
        Post {
            original_post_id: Some(parent.to_string()),
            ..root(id, creator, seconds)
        }
    }

    fn user(id: &str, following: &[&str]) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            name: format!("User {id}"),
            username: id.to_string(),
            avatar_url: Some(format!("https://cdn.example/{id}.png")),
            following: following.iter().map(|s| s.to_string()).collect(),
            followers: Vec::new(),
        }
    }

    fn home(viewer: &str, following: &[&str]) -> FeedFilter {
        FeedFilter::Home {
            viewer_id: viewer.to_string(),
            following: following.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn assembler(store: &InMemoryFeedStore) -> FeedAssembler {
        FeedAssembler::new(Arc::new(store.clone()), Arc::new(store.clone()))
    }

    fn ids(items: &[FeedItem]) -> Vec<&str> {
        items.iter().map(|item| item.id.as_str()).collect()
    }

    fn reference(id: &str, seconds: i64) -> PostRef {
        PostRef {
            id: id.to_string(),
            created_at: at(seconds),
        }
    }

    #[test]
    fn test_merge_prefers_reply_origin_regardless_of_order() {
        let p1 = reference("p1", 1);

        let direct_first = merge_candidates(vec![
            Candidate::direct(p1.clone()),
            Candidate::via_reply(p1.clone()),
        ]);
        assert_eq!(direct_first.len(), 1);
        assert_eq!(direct_first[0].origin, CandidateOrigin::ViaReply);

        let reply_first = merge_candidates(vec![
            Candidate::via_reply(p1.clone()),
            Candidate::direct(p1),
        ]);
        assert_eq!(reply_first.len(), 1);
        assert_eq!(reply_first[0].origin, CandidateOrigin::ViaReply);
    }

    #[test]
    fn test_merge_keeps_distinct_ids() {
        let merged = merge_candidates(vec![
            Candidate::direct(reference("p1", 1)),
            Candidate::direct(reference("p2", 2)),
            Candidate::direct(reference("p1", 1)),
        ]);
        let ids: Vec<&str> = merged.iter().map(|c| c.post.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[test]
    fn test_order_is_descending_and_deterministic() {
        let mut candidates = vec![
            Candidate::direct(reference("p1", 1)),
            Candidate::direct(reference("p3", 3)),
            Candidate::direct(reference("p2a", 2)),
            Candidate::direct(reference("p2b", 2)),
        ];
        order_candidates(&mut candidates);
        let ids: Vec<&str> = candidates.iter().map(|c| c.post.id.as_str()).collect();
        assert_eq!(ids, vec!["p3", "p2b", "p2a", "p1"]);
    }

    #[tokio::test]
    async fn test_root_reachable_via_reply_and_directly_appears_once() {
        let store = InMemoryFeedStore::new();
        store.insert_user(user("v", &["a"])).await;
        store.insert_user(user("a", &[])).await;
        store.insert_post(root("p1", "a", 10)).await;
        store.insert_post(reply("r1", "a", "p1", 20)).await;

        let items = assembler(&store)
            .assemble(Some("v"), &home("v", &["a"]), PageRequest::new(0, 10))
            .await
            .unwrap();

        assert_eq!(ids(&items), vec!["p1"]);
        assert!(items[0].is_reply_context);
        assert_eq!(items[0].reply_count, 1);
        // 排序键取根帖时间，而不是回复时间
        assert_eq!(items[0].created_at, at(10));
    }

    #[tokio::test]
    async fn test_reply_count_includes_replies_outside_following() {
        // V 关注 A；B 未被关注，B 的回复不会让 P1 以回复身份出现，但仍然计数
        let store = InMemoryFeedStore::new();
        store.insert_user(user("v", &["a"])).await;
        store.insert_user(user("a", &[])).await;
        store.insert_user(user("b", &[])).await;
        store.insert_post(root("p1", "a", 10)).await;
        store.insert_post(reply("r1", "b", "p1", 20)).await;

        let items = assembler(&store)
            .assemble(Some("v"), &home("v", &["a"]), PageRequest::new(0, 10))
            .await
            .unwrap();

        assert_eq!(ids(&items), vec!["p1"]);
        assert!(!items[0].is_reply_context);
        assert_eq!(items[0].reply_count, 1);
        assert_eq!(items[0].creator.username, "a");
    }

    #[tokio::test]
    async fn test_viewer_flags_and_counts() {
        let store = InMemoryFeedStore::new();
        store.insert_user(user("a", &[])).await;
        let mut p1 = root("p1", "a", 1);
        p1.liked_by = vec!["u1".into(), "u2".into()];
        p1.retweeted_by = vec!["u1".into()];
        p1.saved_by = vec!["u2".into(), "u3".into(), "u4".into()];
        store.insert_post(p1).await;

        let filter = ProfileTab::Tweets.filter_for("a");
        let assembler = assembler(&store);

        let as_u1 = assembler
            .assemble(Some("u1"), &filter, PageRequest::new(0, 10))
            .await
            .unwrap();
        assert!(as_u1[0].liked_by_viewer);
        assert!(as_u1[0].retweeted_by_viewer);
        assert!(!as_u1[0].saved_by_viewer);
        assert_eq!(as_u1[0].like_count, 2);
        assert_eq!(as_u1[0].retweet_count, 1);
        assert_eq!(as_u1[0].saved_count, 3);

        let as_u3 = assembler
            .assemble(Some("u3"), &filter, PageRequest::new(0, 10))
            .await
            .unwrap();
        assert!(!as_u3[0].liked_by_viewer);
        assert!(as_u3[0].saved_by_viewer);
        assert_eq!(as_u3[0].like_count, 2);

        let anonymous = assembler
            .assemble(None, &filter, PageRequest::new(0, 10))
            .await
            .unwrap();
        assert!(!anonymous[0].liked_by_viewer);
        assert!(!anonymous[0].retweeted_by_viewer);
        assert!(!anonymous[0].saved_by_viewer);
    }

    #[tokio::test]
    async fn test_pagination_covers_every_item_exactly_once() {
        let store = InMemoryFeedStore::new();
        store.insert_user(user("a", &[])).await;
        // 23 个根帖，其中一部分同时被自己的回复引用
        for i in 0..23 {
            store.insert_post(root(&format!("p{i:02}"), "a", i)).await;
            if i % 4 == 0 {
                store
                    .insert_post(reply(&format!("r{i:02}"), "a", &format!("p{i:02}"), 100 + i))
                    .await;
            }
        }

        let filter = ProfileTab::Replies.filter_for("a");
        let assembler = assembler(&store);
        let page_size: usize = 10;
        let total: usize = 23;

        let mut all = Vec::new();
        for k in 0..4 {
            let page = assembler
                .assemble(Some("a"), &filter, PageRequest::new(k, page_size))
                .await
                .unwrap();
            let expected = page_size.min(total.saturating_sub(k * page_size));
            assert_eq!(page.len(), expected, "page {k}");

            for pair in page.windows(2) {
                assert!(pair[0].created_at >= pair[1].created_at);
            }
            all.extend(page);
        }

        assert_eq!(all.len(), total);
        let unique: HashSet<&str> = all.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(unique.len(), total);
        assert_eq!(all[0].id, "p22");
        assert_eq!(all[total - 1].id, "p00");
        assert!(all.iter().filter(|item| item.is_reply_context).count() == 6);
    }

    #[tokio::test]
    async fn test_empty_candidates_yield_empty_page() {
        let store = InMemoryFeedStore::new();
        store.insert_post(root("p1", "someone", 1)).await;

        let items = assembler(&store)
            .assemble(Some("v"), &home("v", &[]), PageRequest::new(0, 10))
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_missing_creator_uses_placeholder() {
        let store = InMemoryFeedStore::new();
        store.insert_post(root("p1", "deleted-user", 1)).await;

        let items = assembler(&store)
            .assemble(None, &ProfileTab::Tweets.filter_for("deleted-user"), PageRequest::new(0, 10))
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].creator.id, "deleted-user");
        assert!(items[0].creator.username.is_empty());
    }

    #[tokio::test]
    async fn test_dangling_reply_produces_no_item() {
        let store = InMemoryFeedStore::new();
        store.insert_post(reply("r1", "a", "gone", 1)).await;

        let items = assembler(&store)
            .assemble(None, &ProfileTab::Replies.filter_for("a"), PageRequest::new(0, 10))
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_media_and_likes_surface_roots_via_replies() {
        let store = InMemoryFeedStore::new();
        store.insert_user(user("a", &[])).await;
        store.insert_user(user("b", &[])).await;
        store.insert_post(root("p1", "b", 1)).await;
        let mut with_media = reply("r1", "a", "p1", 2);
        with_media.media.push("https://cdn.example/img.png".to_string());
        store.insert_post(with_media).await;
        let mut liked = root("p2", "b", 3);
        liked.liked_by.push("a".to_string());
        store.insert_post(liked).await;

        let assembler = assembler(&store);
        let media = assembler
            .assemble(Some("a"), &ProfileTab::Media.filter_for("a"), PageRequest::new(0, 10))
            .await
            .unwrap();
        assert_eq!(ids(&media), vec!["p1"]);
        assert!(media[0].is_reply_context);

        let likes = assembler
            .assemble(Some("a"), &ProfileTab::Likes.filter_for("a"), PageRequest::new(0, 10))
            .await
            .unwrap();
        assert_eq!(ids(&likes), vec!["p2"]);
        assert!(likes[0].liked_by_viewer);
        assert!(!likes[0].is_reply_context);
    }

    #[tokio::test]
    async fn test_bookmarks_only_roots() {
        let store = InMemoryFeedStore::new();
        let mut saved_root = root("p1", "a", 1);
        saved_root.saved_by.push("v".to_string());
        store.insert_post(saved_root).await;
        let mut saved_reply = reply("r1", "a", "p1", 2);
        saved_reply.saved_by.push("v".to_string());
        store.insert_post(saved_reply).await;

        let items = assembler(&store)
            .assemble(
                Some("v"),
                &FeedFilter::Bookmarks { viewer_id: "v".into() },
                PageRequest::new(0, 10),
            )
            .await
            .unwrap();
        assert_eq!(ids(&items), vec!["p1"]);
        assert!(items[0].saved_by_viewer);
        assert!(!items[0].is_reply_context);
        assert_eq!(items[0].reply_count, 1);
    }

    /// 记录完整帖子读取的存储
    #[derive(Clone, Default)]
    struct RecordingStore {
        inner: InMemoryFeedStore,
        full_fetches: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl PostRepository for RecordingStore {
        async fn reply_root_ids(&self, filter: &FeedFilter) -> Result<Vec<String>> {
            self.inner.reply_root_ids(filter).await
        }

        async fn root_post_refs(&self, filter: &FeedFilter) -> Result<Vec<PostRef>> {
            self.inner.root_post_refs(filter).await
        }

        async fn post_refs_by_ids(&self, ids: &[String]) -> Result<Vec<PostRef>> {
            self.inner.post_refs_by_ids(ids).await
        }

        async fn posts_by_ids(&self, ids: &[String]) -> Result<Vec<Post>> {
            self.full_fetches
                .lock()
                .unwrap()
                .extend(ids.iter().cloned());
            self.inner.posts_by_ids(ids).await
        }

        async fn reply_counts(&self, root_ids: &[String]) -> Result<HashMap<String, u64>> {
            self.inner.reply_counts(root_ids).await
        }
    }

    #[async_trait::async_trait]
    impl UserDirectory for RecordingStore {
        async fn creators_by_ids(&self, ids: &[String]) -> Result<HashMap<String, CreatorSummary>> {
            self.inner.creators_by_ids(ids).await
        }

        async fn suggest_people(
            &self,
            excluded: &HashSet<String>,
            skip: usize,
            limit: usize,
        ) -> Result<Vec<PersonSuggestion>> {
            self.inner.suggest_people(excluded, skip, limit).await
        }
    }

    #[tokio::test]
    async fn test_only_page_posts_are_loaded_in_full() {
        let store = RecordingStore::default();
        store.inner.insert_user(user("a", &[])).await;
        for i in 0..40 {
            store.inner.insert_post(root(&format!("p{i:02}"), "a", i)).await;
            if i % 3 == 0 {
                store
                    .inner
                    .insert_post(reply(&format!("r{i:02}"), "a", &format!("p{i:02}"), 100 + i))
                    .await;
            }
        }

        let assembler = FeedAssembler::new(Arc::new(store.clone()), Arc::new(store.clone()));
        let items = assembler
            .assemble(Some("a"), &ProfileTab::Replies.filter_for("a"), PageRequest::new(1, 10))
            .await
            .unwrap();

        let expected: Vec<String> = (20..30).rev().map(|i| format!("p{i:02}")).collect();
        assert_eq!(ids(&items), expected.iter().map(String::as_str).collect::<Vec<_>>());

        let mut fetched = store.full_fetches.lock().unwrap().clone();
        fetched.sort();
        let mut wanted = expected.clone();
        wanted.sort();
        assert_eq!(fetched, wanted);
    }

    #[tokio::test]
    async fn test_post_deleted_after_candidate_pass_is_skipped() {
        struct VanishingStore(InMemoryFeedStore);

        #[async_trait::async_trait]
        impl PostRepository for VanishingStore {
            async fn reply_root_ids(&self, filter: &FeedFilter) -> Result<Vec<String>> {
                self.0.reply_root_ids(filter).await
            }

            async fn root_post_refs(&self, filter: &FeedFilter) -> Result<Vec<PostRef>> {
                self.0.root_post_refs(filter).await
            }

            async fn post_refs_by_ids(&self, ids: &[String]) -> Result<Vec<PostRef>> {
                self.0.post_refs_by_ids(ids).await
            }

            async fn posts_by_ids(&self, ids: &[String]) -> Result<Vec<Post>> {
                let mut posts = self.0.posts_by_ids(ids).await?;
                posts.retain(|post| post.id != "p2");
                Ok(posts)
            }

            async fn reply_counts(&self, root_ids: &[String]) -> Result<HashMap<String, u64>> {
                self.0.reply_counts(root_ids).await
            }
        }

        let store = InMemoryFeedStore::new();
        store.insert_user(user("a", &[])).await;
        for (id, seconds) in [("p1", 1), ("p2", 2), ("p3", 3)] {
            store.insert_post(root(id, "a", seconds)).await;
        }

        let assembler = FeedAssembler::new(
            Arc::new(VanishingStore(store.clone())),
            Arc::new(store),
        );
        let items = assembler
            .assemble(None, &ProfileTab::Tweets.filter_for("a"), PageRequest::new(0, 10))
            .await
            .unwrap();
        assert_eq!(ids(&items), vec!["p3", "p1"]);
    }
}
