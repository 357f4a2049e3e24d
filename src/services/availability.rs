use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{Availability, WorkoutType},
};

pub struct AvailabilityService {
    db: PgPool,
    config: Arc<Config>,
}

impl AvailabilityService {
    pub fn new(db: PgPool, config: Arc<Config>) -> Self {
        Self { db, config }
    }

    /// Upsert the caller's availability row.
    ///
    /// Toggling on stamps `expires_at` one TTL into the future; toggling off
    /// stamps it with `now` so the row drops out of discovery immediately
    /// instead of waiting for the TTL to lapse.
    pub async fn set_availability(
        &self,
        user_id: Uuid,
        active: bool,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
        workout_type: WorkoutType,
    ) -> AppResult<Availability> {
        validate_location(latitude, longitude)?;
        validate_radius(radius_km)?;

        let now = Utc::now();
        let expires_at = if active {
            now + Duration::seconds(self.config.availability.ttl.as_secs() as i64)
        } else {
            now
        };

        let availability: Availability = sqlx::query_as(
            r#"
            INSERT INTO availability
                (user_id, latitude, longitude, radius_km, workout_type, status, available_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id) DO UPDATE SET
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                radius_km = EXCLUDED.radius_km,
                workout_type = EXCLUDED.workout_type,
                status = EXCLUDED.status,
                available_at = EXCLUDED.available_at,
                expires_at = EXCLUDED.expires_at
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(latitude)
        .bind(longitude)
        .bind(radius_km)
        .bind(workout_type)
        .bind(active)
        .bind(now)
        .bind(expires_at)
        .fetch_one(&self.db)
        .await?;

        Ok(availability)
    }

    /// The caller's own availability, through the same active-and-unexpired
    /// test discovery uses. Pure read: expired rows are filtered out here,
    /// never mutated on this path.
    pub async fn get_own_availability(&self, user_id: Uuid) -> AppResult<Option<Availability>> {
        let availability: Option<Availability> = sqlx::query_as(
            "SELECT * FROM availability WHERE user_id = $1 AND status = TRUE AND expires_at > NOW()",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(availability)
    }

    /// Flip rows whose TTL has lapsed to inactive. Invoked from the
    /// background task in `main` and from the admin route; never fused into
    /// a read. Returns the number of rows flipped.
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        let result =
            sqlx::query("UPDATE availability SET status = FALSE WHERE status = TRUE AND expires_at <= NOW()")
                .execute(&self.db)
                .await?;

        Ok(result.rows_affected())
    }
}

pub(crate) fn validate_location(latitude: f64, longitude: f64) -> AppResult<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::Validation(
            "latitude must be between -90 and 90".to_string(),
        ));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::Validation(
            "longitude must be between -180 and 180".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_radius(radius_km: f64) -> AppResult<()> {
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(AppError::Validation(
            "radius_km must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(validate_location(0.0, 0.0).is_ok());
        assert!(validate_location(90.0, 180.0).is_ok());
        assert!(validate_location(-90.0, -180.0).is_ok());

        assert!(matches!(
            validate_location(90.1, 0.0),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_location(0.0, -180.5),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_location(f64::NAN, 0.0),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn rejects_non_positive_radius() {
        assert!(validate_radius(0.1).is_ok());
        assert!(matches!(validate_radius(0.0), Err(AppError::Validation(_))));
        assert!(matches!(
            validate_radius(-3.0),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_radius(f64::INFINITY),
            Err(AppError::Validation(_))
        ));
    }
}
