use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A directed match request between two users.
///
/// `pending` transitions to `accepted` or `rejected` by the recipient only;
/// `accepted` transitions to `ended` by either participant. `rejected` and
/// `ended` are terminal.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ping {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub status: PingStatus,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Ping {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.from_user_id == user_id || self.to_user_id == user_id
    }

    pub fn counterpart(&self, user_id: Uuid) -> Uuid {
        if self.from_user_id == user_id {
            self.to_user_id
        } else {
            self.from_user_id
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ping_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PingStatus {
    Pending,
    Accepted,
    Rejected,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PingDecision {
    Accept,
    Reject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_deserializes_from_lowercase() {
        assert_eq!(
            serde_json::from_str::<PingDecision>("\"accept\"").unwrap(),
            PingDecision::Accept
        );
        assert_eq!(
            serde_json::from_str::<PingDecision>("\"reject\"").unwrap(),
            PingDecision::Reject
        );
    }

    #[test]
    fn counterpart_returns_the_other_side() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let ping = Ping {
            id: Uuid::new_v4(),
            from_user_id: a,
            to_user_id: b,
            status: PingStatus::Pending,
            created_at: Utc::now(),
            accepted_at: None,
            ended_at: None,
        };

        assert_eq!(ping.counterpart(a), b);
        assert_eq!(ping.counterpart(b), a);
        assert!(ping.is_participant(a) && ping.is_participant(b));
        assert!(!ping.is_participant(Uuid::new_v4()));
    }
}
