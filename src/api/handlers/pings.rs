use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Ping, PingDecision},
    services::{auth::Claims, pings::PingService},
    AppState,
};

use super::super::middleware::get_user_id;

#[derive(Debug, Deserialize)]
pub struct SendPingRequest {
    pub to_user_id: Uuid,
}

pub async fn send_ping(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendPingRequest>,
) -> AppResult<Json<Ping>> {
    let user_id = get_user_id(&claims)?;

    let ping_service = PingService::new(state.db, state.redis);
    let ping = ping_service.send_ping(user_id, req.to_user_id).await?;

    Ok(Json(ping))
}

pub async fn get_incoming(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<Ping>>> {
    let user_id = get_user_id(&claims)?;

    let ping_service = PingService::new(state.db, state.redis);
    let pings = ping_service.list_incoming_pending(user_id).await?;

    Ok(Json(pings))
}

pub async fn get_sent(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<Uuid>>> {
    let user_id = get_user_id(&claims)?;

    let ping_service = PingService::new(state.db, state.redis);
    let recipients = ping_service.list_sent_pending(user_id).await?;

    Ok(Json(recipients))
}

pub async fn get_accepted(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<Ping>>> {
    let user_id = get_user_id(&claims)?;

    let ping_service = PingService::new(state.db, state.redis);
    let pings = ping_service.list_accepted(user_id).await?;

    Ok(Json(pings))
}

pub async fn get_ping(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(ping_id): Path<Uuid>,
) -> AppResult<Json<Ping>> {
    let ping_service = PingService::new(state.db, state.redis);
    let ping = ping_service.get_ping(ping_id).await?;

    Ok(Json(ping))
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub decision: PingDecision,
}

pub async fn respond(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ping_id): Path<Uuid>,
    Json(req): Json<RespondRequest>,
) -> AppResult<Json<Ping>> {
    let user_id = get_user_id(&claims)?;

    let ping_service = PingService::new(state.db, state.redis);
    let ping = ping_service.respond(user_id, ping_id, req.decision).await?;

    Ok(Json(ping))
}

pub async fn end_match(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ping_id): Path<Uuid>,
) -> AppResult<Json<Ping>> {
    let user_id = get_user_id(&claims)?;

    let ping_service = PingService::new(state.db, state.redis);
    let ping = ping_service.end_match(user_id, ping_id).await?;

    Ok(Json(ping))
}
