use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A chat message scoped to one match. `seen_at` is set once by the
/// recipient and never cleared.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchMessage {
    pub id: Uuid,
    pub ping_id: Uuid,
    pub from_user_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub seen_at: Option<DateTime<Utc>>,
}
