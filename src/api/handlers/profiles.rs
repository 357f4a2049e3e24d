use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::Profile,
    services::{auth::Claims, profiles::ProfileService},
    AppState,
};

use super::super::middleware::get_user_id;

pub async fn get_my_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Profile>> {
    let user_id = get_user_id(&claims)?;

    let profile_service = ProfileService::new(state.db);
    let profile = profile_service.get_profile(user_id).await?;

    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
pub struct UpsertProfileRequest {
    pub full_name: String,
    pub age_range: Option<String>,
    pub gender: Option<String>,
    pub avatar_url: Option<String>,
}

pub async fn upsert_my_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpsertProfileRequest>,
) -> AppResult<Json<Profile>> {
    let user_id = get_user_id(&claims)?;

    let profile_service = ProfileService::new(state.db);
    let profile = profile_service
        .upsert_profile(
            user_id,
            &req.full_name,
            req.age_range,
            req.gender,
            req.avatar_url,
        )
        .await?;

    Ok(Json(profile))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Profile>> {
    let profile_service = ProfileService::new(state.db);
    let profile = profile_service.get_profile(user_id).await?;

    Ok(Json(profile))
}
