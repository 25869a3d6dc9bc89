//! Client registration and heartbeat routes.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use homereel_common::Error;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use super::error::ApiResult;
use super::AppContext;
use crate::clients::ConnectedClient;

pub fn client_routes() -> Router<AppContext> {
    Router::new()
        .route("/clients", get(list_clients))
        .route("/clients/register", post(register_client))
        .route("/clients/heartbeat", post(heartbeat))
        .route("/clients/watching", post(report_watching))
        .route("/clients/:client_id", delete(remove_client))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub client_id: String,
    pub device_name: String,
    /// Overrides the connection's peer address.
    #[serde(default)]
    pub ip_address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub client_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchingRequest {
    pub client_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub position_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub status: &'static str,
    /// Whether the client id was registered.
    pub known: bool,
}

impl AckResponse {
    fn new(known: bool) -> Self {
        Self { status: "ok", known }
    }
}

fn require_id(client_id: &str) -> ApiResult<()> {
    if client_id.trim().is_empty() {
        return Err(Error::invalid_input("clientId must not be empty").into());
    }
    Ok(())
}

async fn register_client(
    State(ctx): State<AppContext>,
    peer: Option<ConnectInfo<SocketAddr>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<ConnectedClient>> {
    require_id(&req.client_id)?;

    let ip = req
        .ip_address
        .filter(|ip| !ip.trim().is_empty())
        .or_else(|| peer.map(|ConnectInfo(addr)| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string());

    Ok(Json(ctx.clients.register(&req.client_id, &req.device_name, &ip)))
}

async fn heartbeat(
    State(ctx): State<AppContext>,
    Json(req): Json<HeartbeatRequest>,
) -> Json<AckResponse> {
    Json(AckResponse::new(ctx.clients.heartbeat(&req.client_id)))
}

async fn report_watching(
    State(ctx): State<AppContext>,
    Json(req): Json<WatchingRequest>,
) -> Json<AckResponse> {
    let known = ctx
        .clients
        .report_watching(&req.client_id, req.title, req.position_ms);
    Json(AckResponse::new(known))
}

async fn list_clients(State(ctx): State<AppContext>) -> Json<Vec<ConnectedClient>> {
    Json(ctx.clients.list())
}

async fn remove_client(
    State(ctx): State<AppContext>,
    Path(client_id): Path<String>,
) -> ApiResult<StatusCode> {
    if ctx.clients.remove(&client_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found(format!("Client {client_id}")).into())
    }
}
