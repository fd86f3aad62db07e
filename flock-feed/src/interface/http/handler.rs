//! HTTP 处理函数
//!
//! 页号、limit 从原始路径段解析，解析失败直接返回 400，不会触达存储。

use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use flock_core::{FlockError, parse_list_limit, parse_page_index};
use serde::Serialize;

use crate::application::handlers::FeedQueryHandler;
use crate::application::queries::{
    BookmarksQuery, HomeTimelineQuery, PeopleSuggestionsQuery, PopularTagsQuery,
    ProfileTimelineQuery,
};
use crate::domain::model::{FeedItem, Hashtag, PersonSuggestion, ProfileTab};

use super::error::{ApiError, ApiResult};

/// 上游网关写入的查看者身份头
pub const VIEWER_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct HttpState {
    pub query_handler: Arc<FeedQueryHandler>,
    pub max_list_limit: usize,
}

#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub data: Vec<T>,
}

impl<T> From<Vec<T>> for DataEnvelope<T> {
    fn from(data: Vec<T>) -> Self {
        Self { data }
    }
}

/// 查看者身份，缺失时为 None
#[derive(Debug, Clone)]
pub struct ViewerId(pub Option<String>);

impl ViewerId {
    pub fn required(self) -> Result<String, FlockError> {
        self.0.ok_or_else(|| {
            FlockError::Unauthenticated(format!("missing {VIEWER_HEADER} header"))
        })
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ViewerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let viewer = parts
            .headers
            .get(VIEWER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        Ok(ViewerId(viewer))
    }
}

pub async fn home_timeline(
    State(state): State<HttpState>,
    Path(skip): Path<String>,
    viewer: ViewerId,
) -> ApiResult<Json<DataEnvelope<FeedItem>>> {
    let page = parse_page_index(&skip)?;
    let viewer_id = viewer.required()?;

    let items = state
        .query_handler
        .handle_home_timeline(HomeTimelineQuery { viewer_id, page })
        .await?;
    Ok(Json(items.into()))
}

pub async fn bookmarks(
    State(state): State<HttpState>,
    Path(skip): Path<String>,
    viewer: ViewerId,
) -> ApiResult<Json<DataEnvelope<FeedItem>>> {
    let page = parse_page_index(&skip)?;
    let viewer_id = viewer.required()?;

    let items = state
        .query_handler
        .handle_bookmarks(BookmarksQuery { viewer_id, page })
        .await?;
    Ok(Json(items.into()))
}

pub async fn profile_tweets(
    state: State<HttpState>,
    path: Path<(String, String)>,
    viewer: ViewerId,
) -> ApiResult<Json<DataEnvelope<FeedItem>>> {
    profile_timeline(state, path, viewer, ProfileTab::Tweets).await
}

pub async fn profile_replies(
    state: State<HttpState>,
    path: Path<(String, String)>,
    viewer: ViewerId,
) -> ApiResult<Json<DataEnvelope<FeedItem>>> {
    profile_timeline(state, path, viewer, ProfileTab::Replies).await
}

pub async fn profile_media(
    state: State<HttpState>,
    path: Path<(String, String)>,
    viewer: ViewerId,
) -> ApiResult<Json<DataEnvelope<FeedItem>>> {
    profile_timeline(state, path, viewer, ProfileTab::Media).await
}

pub async fn profile_likes(
    state: State<HttpState>,
    path: Path<(String, String)>,
    viewer: ViewerId,
) -> ApiResult<Json<DataEnvelope<FeedItem>>> {
    profile_timeline(state, path, viewer, ProfileTab::Likes).await
}

async fn profile_timeline(
    State(state): State<HttpState>,
    Path((profile_user_id, skip)): Path<(String, String)>,
    ViewerId(viewer_id): ViewerId,
    tab: ProfileTab,
) -> ApiResult<Json<DataEnvelope<FeedItem>>> {
    let page = parse_page_index(&skip)?;

    let items = state
        .query_handler
        .handle_profile_timeline(ProfileTimelineQuery {
            viewer_id,
            profile_user_id,
            tab,
            page,
        })
        .await?;
    Ok(Json(items.into()))
}

pub async fn popular_tags(
    State(state): State<HttpState>,
    Path((skip, limit)): Path<(String, String)>,
) -> ApiResult<Json<DataEnvelope<Hashtag>>> {
    let skip = parse_page_index(&skip)?;
    let limit = parse_list_limit(&limit, state.max_list_limit)?;

    let tags = state
        .query_handler
        .handle_popular_tags(PopularTagsQuery { skip, limit })
        .await?;
    Ok(Json(tags.into()))
}

pub async fn people_suggestions(
    State(state): State<HttpState>,
    Path((skip, limit)): Path<(String, String)>,
    viewer: ViewerId,
) -> ApiResult<Json<DataEnvelope<PersonSuggestion>>> {
    let skip = parse_page_index(&skip)?;
    let limit = parse_list_limit(&limit, state.max_list_limit)?;
    let viewer_id = viewer.required()?;

    let people = state
        .query_handler
        .handle_people_suggestions(PeopleSuggestionsQuery {
            viewer_id,
            skip,
            limit,
        })
        .await?;
    Ok(Json(people.into()))
}

pub async fn health() -> &'static str {
    "ok"
}
