use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

use crate::errors::ApiError;
use crate::startup::AppState;

pub const RECORD_CREATED: &str = "Record created";
pub const RECORD_VERBS: &str = "POST, GET or DELETE Request accepted";
pub const RECORDS_VERBS: &str = "GET Request accepted";

/// Raw query pairs in request order, so repeated parameters keep their position.
pub type QueryPairs = Query<Vec<(String, String)>>;

/// First value of `name` in `pairs`; later repeats are ignored.
fn first<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}

/// 创建记录：POST /record?key=..&val=..
pub async fn create(
    State(state): State<AppState>,
    Query(pairs): QueryPairs,
) -> Result<impl IntoResponse, ApiError> {
    let key = match first(&pairs, "key") {
        Some(k) if !k.is_empty() => k,
        _ => return Err(ApiError::BadRequest("key is required".into())),
    };
    let val = first(&pairs, "val").unwrap_or_default();
    state.storage.store(key, val).await?;
    info!(key, "record stored");
    Ok((StatusCode::CREATED, RECORD_CREATED))
}

/// 列出全部记录：GET /records
pub async fn list(State(state): State<AppState>) -> Result<Json<HashMap<String, String>>, ApiError> {
    Ok(Json(state.storage.list().await?))
}

/// 获取单条记录：GET /record?key=..
pub async fn get(
    State(state): State<AppState>,
    Query(pairs): QueryPairs,
) -> Result<Json<HashMap<String, String>>, ApiError> {
    let key = first(&pairs, "key").unwrap_or_default();
    let value = state.storage.get(key).await?;
    Ok(Json(HashMap::from([(key.to_string(), value)])))
}

/// 删除记录：DELETE /record?key=..
pub async fn delete(
    State(state): State<AppState>,
    Query(pairs): QueryPairs,
) -> Result<StatusCode, ApiError> {
    let key = first(&pairs, "key").unwrap_or_default();
    state.storage.delete(key).await?;
    info!(key, "record deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn record_wrong_verb() -> ApiError {
    ApiError::BadRequest(RECORD_VERBS.into())
}

pub async fn records_wrong_verb() -> ApiError {
    ApiError::BadRequest(RECORDS_VERBS.into())
}
