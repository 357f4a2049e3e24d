use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::{Availability, WorkoutType},
    services::{auth::Claims, availability::AvailabilityService},
    AppState,
};

use super::super::middleware::get_user_id;

#[derive(Debug, Deserialize)]
pub struct SetAvailabilityRequest {
    pub active: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
    #[serde(default)]
    pub workout_type: WorkoutType,
}

pub async fn set_availability(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SetAvailabilityRequest>,
) -> AppResult<Json<Availability>> {
    let user_id = get_user_id(&claims)?;

    let availability_service = AvailabilityService::new(state.db, state.config);
    let availability = availability_service
        .set_availability(
            user_id,
            req.active,
            req.latitude,
            req.longitude,
            req.radius_km,
            req.workout_type,
        )
        .await?;

    Ok(Json(availability))
}

pub async fn get_my_availability(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Option<Availability>>> {
    let user_id = get_user_id(&claims)?;

    let availability_service = AvailabilityService::new(state.db, state.config);
    let availability = availability_service.get_own_availability(user_id).await?;

    Ok(Json(availability))
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub swept: u64,
}

/// Administrative: flip expired rows inactive now instead of waiting for
/// the background sweep.
pub async fn sweep_expired(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> AppResult<Json<SweepResponse>> {
    let availability_service = AvailabilityService::new(state.db, state.config);
    let swept = availability_service.sweep_expired().await?;

    Ok(Json(SweepResponse { swept }))
}
