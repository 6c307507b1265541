use axum::{
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use crate::startup::AppState;

pub mod records;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the application router: record routes, list route and health check.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let record_routes = Router::new()
        .route(
            "/record",
            post(records::create)
                .get(records::get)
                .delete(records::delete)
                .fallback(records::record_wrong_verb),
        )
        .route("/records", get(records::list).fallback(records::records_wrong_verb));

    Router::new()
        .route("/health", get(health))
        .merge(record_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        // 每次请求创建 span，包含方法和路径
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        // 响应返回时打点，包含状态码与耗时
                        .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                        .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
                )
                .layer(cors),
        )
}
