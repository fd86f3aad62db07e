use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::options::{ClientOptions, FindOneOptions, FindOptions};
use mongodb::{Client, Collection};
use tracing::{debug, info};

use crate::config::FeedServiceSettings;
use crate::domain::model::{
    CreatorSummary, FeedFilter, Hashtag, PersonSuggestion, Post, PostClass, PostRef,
};
use crate::domain::repository::{
    HashtagRepository, PostRepository, SocialGraphReader, UserDirectory,
};

use super::helpers::{
    candidate_filter, document_to_creator, document_to_hashtag, document_to_person,
    document_to_post, document_to_post_ref, document_to_reply_count, id_to_string, object_id,
    object_ids, people_pipeline, popular_tags_pipeline, post_ref_projection, reply_count_pipeline,
};

pub struct MongoFeedStore {
    posts: Collection<Document>,
    users: Collection<Document>,
    hashtags: Collection<Document>,
    _client: Arc<Client>,
}

impl MongoFeedStore {
    /// 未配置连接地址时返回 None
    pub async fn new(settings: &FeedServiceSettings) -> Result<Option<Self>> {
        let uri = match &settings.mongo_url {
            Some(url) => url,
            None => return Ok(None),
        };

        let mut options = ClientOptions::parse(uri)
            .await
            .context("invalid MongoDB connection string")?;
        options.connect_timeout = Some(settings.connect_timeout);
        options.server_selection_timeout = Some(settings.connect_timeout);
        if options.app_name.is_none() {
            options.app_name = Some("flock-feed".to_string());
        }

        let client = Arc::new(Client::with_options(options)?);
        let database = client.database(&settings.mongo_database);

        info!(
            database = %settings.mongo_database,
            posts = %settings.posts_collection,
            users = %settings.users_collection,
            "MongoDB feed store configured"
        );

        Ok(Some(Self {
            posts: database.collection::<Document>(&settings.posts_collection),
            users: database.collection::<Document>(&settings.users_collection),
            hashtags: database.collection::<Document>(&settings.hashtags_collection),
            _client: client,
        }))
    }

    async fn find_posts(&self, filter: Document) -> Result<Vec<Post>> {
        let documents: Vec<Document> = self.posts.find(filter, None).await?.try_collect().await?;
        Ok(documents.iter().filter_map(document_to_post).collect())
    }

    /// 只投影 `_id` 与 `createdAt`，不读取点赞、收藏、转推数组
    async fn find_post_refs(&self, filter: Document) -> Result<Vec<PostRef>> {
        let options = FindOptions::builder()
            .projection(post_ref_projection())
            .build();
        let documents: Vec<Document> = self
            .posts
            .find(filter, options)
            .await?
            .try_collect()
            .await?;
        Ok(documents.iter().filter_map(document_to_post_ref).collect())
    }
}

#[async_trait]
impl PostRepository for MongoFeedStore {
    async fn reply_root_ids(&self, filter: &FeedFilter) -> Result<Vec<String>> {
        let Some(condition) = candidate_filter(filter, PostClass::Reply) else {
            return Ok(Vec::new());
        };

        let values = self
            .posts
            .distinct("tweetId", condition, None)
            .await
            .context("distinct reply roots failed")?;
        Ok(values.iter().filter_map(id_to_string).collect())
    }

    async fn root_post_refs(&self, filter: &FeedFilter) -> Result<Vec<PostRef>> {
        let Some(condition) = candidate_filter(filter, PostClass::Root) else {
            return Ok(Vec::new());
        };
        self.find_post_refs(condition)
            .await
            .context("root post query failed")
    }

    async fn post_refs_by_ids(&self, ids: &[String]) -> Result<Vec<PostRef>> {
        let ids = object_ids(ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.find_post_refs(doc! { "_id": { "$in": ids } })
            .await
            .context("post reference lookup failed")
    }

    async fn posts_by_ids(&self, ids: &[String]) -> Result<Vec<Post>> {
        let ids = object_ids(ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.find_posts(doc! { "_id": { "$in": ids } })
            .await
            .context("post lookup by id failed")
    }

    async fn reply_counts(&self, root_ids: &[String]) -> Result<HashMap<String, u64>> {
        let ids = object_ids(root_ids);
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<Document> = self
            .posts
            .aggregate(reply_count_pipeline(ids), None)
            .await
            .context("reply count aggregation failed")?
            .try_collect()
            .await?;
        debug!(groups = rows.len(), "reply counts aggregated");

        Ok(rows.iter().filter_map(document_to_reply_count).collect())
    }
}

#[async_trait]
impl SocialGraphReader for MongoFeedStore {
    async fn following_of(&self, user_id: &str) -> Result<HashSet<String>> {
        let Some(id) = object_id(user_id) else {
            return Ok(HashSet::new());
        };

        let options = FindOneOptions::builder()
            .projection(doc! { "following": 1 })
            .build();
        let document = self
            .users
            .find_one(doc! { "_id": id }, options)
            .await
            .context("following lookup failed")?;

        Ok(document
            .and_then(|document| {
                document
                    .get_array("following")
                    .ok()
                    .map(|values| values.iter().filter_map(id_to_string).collect())
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl UserDirectory for MongoFeedStore {
    async fn creators_by_ids(&self, ids: &[String]) -> Result<HashMap<String, CreatorSummary>> {
        let ids = object_ids(ids);
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let options = FindOptions::builder()
            .projection(doc! { "name": 1, "username": 1, "profilePic": 1 })
            .build();
        let documents: Vec<Document> = self
            .users
            .find(doc! { "_id": { "$in": ids } }, options)
            .await
            .context("creator lookup failed")?
            .try_collect()
            .await?;

        Ok(documents
            .iter()
            .filter_map(document_to_creator)
            .map(|creator| (creator.id.clone(), creator))
            .collect())
    }

    async fn suggest_people(
        &self,
        excluded: &HashSet<String>,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<PersonSuggestion>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let documents: Vec<Document> = self
            .users
            .aggregate(people_pipeline(object_ids(excluded), skip, limit), None)
            .await
            .context("people suggestion aggregation failed")?
            .try_collect()
            .await?;

        Ok(documents.iter().filter_map(document_to_person).collect())
    }
}

#[async_trait]
impl HashtagRepository for MongoFeedStore {
    async fn popular_tags(&self, skip: usize, limit: usize) -> Result<Vec<Hashtag>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let documents: Vec<Document> = self
            .hashtags
            .aggregate(popular_tags_pipeline(skip, limit), None)
            .await
            .context("popular tags aggregation failed")?
            .try_collect()
            .await?;

        Ok(documents.iter().filter_map(document_to_hashtag).collect())
    }
}
