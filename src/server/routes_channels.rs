//! Channel routes.
//!
//! A client joining a channel asks for its state and seeks the current file
//! to `positionMs`; the server never frame-syncs viewers.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use homereel_common::{paths::resolve_root, Error};
use serde::Serialize;
use std::path::PathBuf;

use super::error::ApiResult;
use super::{media_url, AppContext};
use crate::channels::{ChannelState, ChannelStatus, StartOutcome};
use crate::config::ChannelDefinition;

pub fn channel_routes() -> Router<AppContext> {
    Router::new()
        .route("/channels", get(list_channels))
        .route("/channels/:channel_id", get(get_channel))
        .route("/channels/:channel_id/start", post(start_channel))
        .route("/channels/:channel_id/stop", post(stop_channel))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub cover_path: Option<PathBuf>,
    pub thumbnail_url: Option<String>,
    pub active: bool,
    pub status: ChannelStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStateView {
    pub channel_id: String,
    pub current_index: usize,
    pub position_ms: u64,
    pub duration_ms: Option<u64>,
    pub current_file: String,
    pub stream_url: String,
    pub playlist_length: usize,
    pub last_updated: DateTime<Utc>,
}

impl ChannelStateView {
    pub fn new(state: &ChannelState, base: &str) -> Self {
        let current_file = state.current_file().to_string_lossy().into_owned();
        Self {
            channel_id: state.channel_id.clone(),
            current_index: state.current_index,
            position_ms: state.position_ms,
            duration_ms: state.duration_ms,
            stream_url: media_url(base, "stream", &current_file),
            current_file,
            playlist_length: state.playlist.len(),
            last_updated: state.last_updated,
        }
    }
}

fn definition<'a>(ctx: &'a AppContext, id: &str) -> ApiResult<&'a ChannelDefinition> {
    ctx.channel_definition(id)
        .ok_or_else(|| Error::not_found(format!("Channel {id}")).into())
}

async fn list_channels(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Json<Vec<ChannelSummary>> {
    let base = ctx.base_url(&headers);
    let channels = ctx
        .config
        .channels
        .definitions
        .iter()
        .map(|d| {
            let cover_path = d.cover_path.as_deref().map(resolve_root);
            ChannelSummary {
                id: d.id.clone(),
                name: d.name.clone(),
                description: d.description.clone(),
                thumbnail_url: cover_path
                    .as_deref()
                    .and_then(|p| p.to_str())
                    .map(|p| media_url(&base, "thumbnail", p)),
                cover_path,
                active: d.active,
                status: ctx.channels.status(&d.id),
            }
        })
        .collect();
    Json(channels)
}

async fn get_channel(
    State(ctx): State<AppContext>,
    Path(channel_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<ChannelStateView>> {
    definition(&ctx, &channel_id)?;
    let state = ctx
        .channels
        .get_channel_state(&channel_id)
        .ok_or_else(|| Error::not_found(format!("Channel {channel_id} is not running")))?;
    Ok(Json(ChannelStateView::new(&state, &ctx.base_url(&headers))))
}

async fn start_channel(
    State(ctx): State<AppContext>,
    Path(channel_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let def = definition(&ctx, &channel_id)?.clone();
    let outcome = ctx.channels.start_channel(&def).await?;

    match (outcome, ctx.channels.get_channel_state(&channel_id)) {
        (StartOutcome::Started | StartOutcome::AlreadyRunning, Some(state)) => {
            Ok(Json(ChannelStateView::new(&state, &ctx.base_url(&headers))).into_response())
        }
        // Still resolving in another request, or stopped mid-start.
        _ => Ok((
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "channelId": channel_id,
                "status": ctx.channels.status(&channel_id),
            })),
        )
            .into_response()),
    }
}

async fn stop_channel(
    State(ctx): State<AppContext>,
    Path(channel_id): Path<String>,
) -> ApiResult<StatusCode> {
    definition(&ctx, &channel_id)?;
    ctx.channels.stop_channel(&channel_id).await;
    Ok(StatusCode::NO_CONTENT)
}
