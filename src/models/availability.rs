use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's time-bounded declaration of availability. One row per user,
/// overwritten on every toggle.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Availability {
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
    pub workout_type: WorkoutType,
    pub status: bool,
    pub available_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "workout_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    Strength,
    Cardio,
    Mixed,
}

impl Default for WorkoutType {
    fn default() -> Self {
        Self::Mixed
    }
}

/// A discovery result: another available user within mutual range.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyUser {
    pub user_id: Uuid,
    pub distance_km: f64,
    pub radius_km: f64,
    pub workout_type: WorkoutType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workout_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&WorkoutType::Strength).unwrap(),
            "\"strength\""
        );
        assert_eq!(
            serde_json::from_str::<WorkoutType>("\"mixed\"").unwrap(),
            WorkoutType::Mixed
        );
    }
}
