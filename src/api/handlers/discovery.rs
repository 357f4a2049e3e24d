use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::NearbyUser,
    services::{auth::Claims, discovery::DiscoveryService},
    AppState,
};

use super::super::middleware::get_user_id;

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
}

pub async fn find_nearby(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<NearbyQuery>,
) -> AppResult<Json<Vec<NearbyUser>>> {
    let user_id = get_user_id(&claims)?;

    let discovery_service = DiscoveryService::new(state.db);
    let nearby = discovery_service
        .find_nearby(user_id, query.latitude, query.longitude, query.radius_km)
        .await?;

    Ok(Json(nearby))
}
