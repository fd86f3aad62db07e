use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handler::{self, HttpState};

/// 构造时间线服务的全部路由
pub fn feed_router(state: HttpState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let home_routes = Router::new()
        .route("/home/:skip", get(handler::home_timeline))
        .route("/home/bookmarks/:skip", get(handler::bookmarks))
        .route("/home/tags/:skip/:limit", get(handler::popular_tags))
        .route("/home/people/:skip/:limit", get(handler::people_suggestions));

    let profile_routes = Router::new()
        .route("/profile/:user_id/tweets/:skip", get(handler::profile_tweets))
        .route("/profile/:user_id/replies/:skip", get(handler::profile_replies))
        .route("/profile/:user_id/media/:skip", get(handler::profile_media))
        .route("/profile/:user_id/likes/:skip", get(handler::profile_likes));

    Router::new()
        .merge(home_routes)
        .merge(profile_routes)
        .route("/healthz", get(handler::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
