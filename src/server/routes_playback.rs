//! Watch-progress routes, backed by the key-value store.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use homereel_common::Error;
use serde::{Deserialize, Serialize};

use super::error::ApiResult;
use super::AppContext;
use crate::store::{get_json, put_json};

pub fn playback_routes() -> Router<AppContext> {
    Router::new().route(
        "/progress/:client_id/:content_id",
        get(get_progress).put(put_progress),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchProgress {
    pub content_id: String,
    pub position_ms: u64,
    pub duration_ms: Option<u64>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    pub position_ms: u64,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

pub fn progress_key(client_id: &str, content_id: &str) -> String {
    format!("progress/{client_id}/{content_id}")
}

async fn put_progress(
    State(ctx): State<AppContext>,
    Path((client_id, content_id)): Path<(String, String)>,
    Json(req): Json<ProgressRequest>,
) -> ApiResult<Json<WatchProgress>> {
    let progress = WatchProgress {
        content_id: content_id.clone(),
        position_ms: req.position_ms,
        duration_ms: req.duration_ms,
        updated_at: Utc::now(),
    };

    // File-backed stores write synchronously.
    let store = ctx.store.clone();
    let key = progress_key(&client_id, &content_id);
    let saved = progress.clone();
    tokio::task::spawn_blocking(move || put_json(store.as_ref(), &key, &saved))
        .await
        .map_err(|e| Error::internal(format!("Progress write failed: {e}")))??;
    tracing::debug!(client_id = %client_id, content_id = %content_id, "Saved watch progress");
    Ok(Json(progress))
}

async fn get_progress(
    State(ctx): State<AppContext>,
    Path((client_id, content_id)): Path<(String, String)>,
) -> ApiResult<Json<WatchProgress>> {
    get_json(ctx.store.as_ref(), &progress_key(&client_id, &content_id))?
        .map(Json)
        .ok_or_else(|| Error::not_found(format!("No progress for {content_id}")).into())
}
