use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{MatchEvent, MatchEventType, MatchMessage, Ping},
    services::{auth::Claims, match_log::MatchLogService, pings::PingService},
    AppState,
};

use super::super::middleware::get_user_id;

pub async fn get_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<Ping>>> {
    let user_id = get_user_id(&claims)?;

    let ping_service = PingService::new(state.db, state.redis);
    let pings = ping_service.past_matches(user_id).await?;

    Ok(Json(pings))
}

pub async fn get_match_with_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(other_user_id): Path<Uuid>,
) -> AppResult<Json<Option<Ping>>> {
    let user_id = get_user_id(&claims)?;

    let ping_service = PingService::new(state.db, state.redis);
    let ping = ping_service.match_with_user(user_id, other_user_id).await?;

    Ok(Json(ping))
}

pub async fn get_events(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(ping_id): Path<Uuid>,
) -> AppResult<Json<Vec<MatchEvent>>> {
    let match_log_service = MatchLogService::new(state.db, state.redis);
    let events = match_log_service.list_events(ping_id).await?;

    Ok(Json(events))
}

#[derive(Debug, Deserialize)]
pub struct AppendEventRequest {
    pub event_type: MatchEventType,
}

pub async fn append_event(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ping_id): Path<Uuid>,
    Json(req): Json<AppendEventRequest>,
) -> AppResult<Json<MatchEvent>> {
    let user_id = get_user_id(&claims)?;

    let match_log_service = MatchLogService::new(state.db, state.redis);
    let event = match_log_service
        .append_event(user_id, ping_id, req.event_type)
        .await?;

    Ok(Json(event))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(ping_id): Path<Uuid>,
) -> AppResult<Json<Vec<MatchMessage>>> {
    let match_log_service = MatchLogService::new(state.db, state.redis);
    let messages = match_log_service.list_messages(ping_id).await?;

    Ok(Json(messages))
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ping_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<Json<MatchMessage>> {
    let user_id = get_user_id(&claims)?;

    let match_log_service = MatchLogService::new(state.db, state.redis);
    let message = match_log_service
        .send_message(user_id, ping_id, &req.message)
        .await?;

    Ok(Json(message))
}

#[derive(Debug, Serialize)]
pub struct MarkSeenResponse {
    pub updated: u64,
}

pub async fn mark_seen(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ping_id): Path<Uuid>,
) -> AppResult<Json<MarkSeenResponse>> {
    let user_id = get_user_id(&claims)?;

    let match_log_service = MatchLogService::new(state.db, state.redis);
    let updated = match_log_service.mark_seen(user_id, ping_id).await?;

    Ok(Json(MarkSeenResponse { updated }))
}
