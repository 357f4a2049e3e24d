use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One entry in a match timeline. Append-only; rows are never updated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchEvent {
    pub id: Uuid,
    pub ping_id: Uuid,
    pub from_user_id: Uuid,
    pub event_type: MatchEventType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "match_event_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchEventType {
    OnTheWay,
    RunningLate,
    AtGym,
    CantMakeIt,
}

impl MatchEventType {
    /// `at_gym` and `cant_make_it` close the participant's side of the
    /// timeline; nothing may follow them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AtGym | Self::CantMakeIt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&MatchEventType::OnTheWay).unwrap(),
            "\"on_the_way\""
        );
        assert_eq!(
            serde_json::from_str::<MatchEventType>("\"cant_make_it\"").unwrap(),
            MatchEventType::CantMakeIt
        );
    }

    #[test]
    fn terminal_types() {
        assert!(MatchEventType::AtGym.is_terminal());
        assert!(MatchEventType::CantMakeIt.is_terminal());
        assert!(!MatchEventType::OnTheWay.is_terminal());
        assert!(!MatchEventType::RunningLate.is_terminal());
    }
}
