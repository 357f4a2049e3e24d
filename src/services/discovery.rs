use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Availability, NearbyUser},
    services::availability::{validate_location, validate_radius},
};

const EARTH_RADIUS_KM: f64 = 6371.0;

pub struct DiscoveryService {
    db: PgPool,
}

impl DiscoveryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Everyone currently available within mutual range of the caller,
    /// closest first. Computed fresh on every call; excludes the caller's
    /// own row.
    pub async fn find_nearby(
        &self,
        user_id: Uuid,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> AppResult<Vec<NearbyUser>> {
        validate_location(latitude, longitude)?;
        validate_radius(radius_km)?;

        let candidates: Vec<Availability> = sqlx::query_as(
            "SELECT * FROM availability WHERE status = TRUE AND expires_at > NOW() AND user_id <> $1",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rank_candidates(latitude, longitude, radius_km, candidates))
    }
}

/// Distance/radius filtering and ordering, separated from the query so the
/// mutual-radius rule is testable without a store.
fn rank_candidates(
    latitude: f64,
    longitude: f64,
    radius_km: f64,
    candidates: Vec<Availability>,
) -> Vec<NearbyUser> {
    let mut nearby: Vec<NearbyUser> = candidates
        .into_iter()
        .filter_map(|row| {
            let distance = round_km(haversine_km(
                latitude,
                longitude,
                row.latitude,
                row.longitude,
            ));

            // Mutual radius rule: both sides must be willing to travel the
            // distance, not just the caller.
            if distance <= radius_km.min(row.radius_km) {
                Some(NearbyUser {
                    user_id: row.user_id,
                    distance_km: distance,
                    radius_km: row.radius_km,
                    workout_type: row.workout_type,
                })
            } else {
                None
            }
        })
        .collect();

    nearby.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    nearby
}

/// Great-circle distance between two coordinates, in kilometers.
fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

fn round_km(distance: f64) -> f64 {
    (distance * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkoutType;
    use chrono::{Duration, Utc};

    fn row(user_id: Uuid, latitude: f64, longitude: f64, radius_km: f64) -> Availability {
        Availability {
            user_id,
            latitude,
            longitude,
            radius_km,
            workout_type: WorkoutType::Mixed,
            status: true,
            available_at: Utc::now(),
            expires_at: Utc::now() + Duration::minutes(30),
        }
    }

    #[test]
    fn haversine_matches_known_values() {
        // 0.02 degrees of latitude along the equator is roughly 2.2 km.
        let d = round_km(haversine_km(0.0, 0.0, 0.02, 0.0));
        assert_eq!(d, 2.2);

        let zero = haversine_km(51.5, -0.12, 51.5, -0.12);
        assert!(zero.abs() < 1e-9);

        // Paris to London is just under 350 km.
        let paris_london = haversine_km(48.8566, 2.3522, 51.5074, -0.1278);
        assert!((paris_london - 344.0).abs() < 5.0);
    }

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(round_km(2.249), 2.2);
        assert_eq!(round_km(2.25), 2.3);
        assert_eq!(round_km(0.04), 0.0);
    }

    #[test]
    fn mutual_radius_rule_filters_both_directions() {
        let near = Uuid::new_v4();
        let far_for_them = Uuid::new_v4();

        // ~2.2 km away, happy to travel 3 km.
        let a = row(near, 0.02, 0.0, 3.0);
        // ~2.2 km away but only willing to travel 1 km; the caller's 3 km
        // radius alone must not surface them.
        let b = row(far_for_them, 0.0, 0.02, 1.0);

        let result = rank_candidates(0.0, 0.0, 3.0, vec![a, b]);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].user_id, near);
        assert_eq!(result[0].distance_km, 2.2);
    }

    #[test]
    fn caller_radius_limits_results_symmetrically() {
        let candidate = row(Uuid::new_v4(), 0.02, 0.0, 10.0);

        // Candidate would travel 10 km, but the caller only 1 km.
        let result = rank_candidates(0.0, 0.0, 1.0, vec![candidate]);
        assert!(result.is_empty());
    }

    #[test]
    fn results_ordered_by_distance_then_user_id() {
        let far = row(Uuid::new_v4(), 0.04, 0.0, 10.0);
        let close = row(Uuid::new_v4(), 0.01, 0.0, 10.0);

        // Two candidates at the same rounded distance, to exercise the id
        // tie-break.
        let mut tie_ids = [Uuid::new_v4(), Uuid::new_v4()];
        tie_ids.sort();
        let tie_a = row(tie_ids[1], 0.02, 0.0, 10.0);
        let tie_b = row(tie_ids[0], -0.02, 0.0, 10.0);

        let result = rank_candidates(0.0, 0.0, 10.0, vec![far, tie_a, close, tie_b]);

        assert_eq!(result.len(), 4);
        assert!(result[0].distance_km <= result[1].distance_km);
        assert!(result[2].distance_km <= result[3].distance_km);
        assert_eq!(result[1].user_id, tie_ids[0]);
        assert_eq!(result[2].user_id, tie_ids[1]);
        assert_eq!(result[1].distance_km, result[2].distance_km);
    }
}
