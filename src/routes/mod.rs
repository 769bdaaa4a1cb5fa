use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};
use crate::state::AppState;

pub mod newsletter;
pub mod tmdb;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/tmdb", tmdb_routes())
        .route("/api/newsletter", post(newsletter::subscribe))
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// TMDB proxy routes under /api/tmdb
fn tmdb_routes() -> Router<AppState> {
    Router::new()
        .route("/localization", get(tmdb::localization))
        .route("/discover/movie", get(tmdb::discover_movies))
        .route("/discover/tv", get(tmdb::discover_tv))
        .route("/search/multi", get(tmdb::search_multi))
        .route("/movie/:id", get(tmdb::movie_details))
        .route("/tv/:id", get(tmdb::tv_details))
        .route("/movie/:id/watch/providers", get(tmdb::movie_watch_providers))
        .route("/tv/:id/watch/providers", get(tmdb::tv_watch_providers))
        .route("/genres/movie", get(tmdb::movie_genres))
        .route("/genres/tv", get(tmdb::tv_genres))
        .route("/movie/:id/videos", get(tmdb::movie_videos))
        .route("/tv/:id/videos", get(tmdb::tv_videos))
        .route("/movies/upcoming", get(tmdb::upcoming_movies))
        .route("/trending/:kind/:window", get(tmdb::trending))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
