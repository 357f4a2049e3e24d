use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{MatchEvent, MatchEventType, MatchMessage, Ping, PingStatus},
    services::pings::WsMessage,
    storage::redis::RedisClient,
};

pub struct MatchLogService {
    db: PgPool,
    redis: RedisClient,
}

impl MatchLogService {
    pub fn new(db: PgPool, redis: RedisClient) -> Self {
        Self { db, redis }
    }

    /// Append a status event to the match timeline.
    ///
    /// The progression is checked twice: once over the participant's loaded
    /// events for a precise error message, then again inside the insert
    /// predicate (plus the unique index) so two racing sends cannot both
    /// land out of order.
    pub async fn append_event(
        &self,
        user_id: Uuid,
        ping_id: Uuid,
        event_type: MatchEventType,
    ) -> AppResult<MatchEvent> {
        self.require_active_participant(user_id, ping_id).await?;

        let sent: Vec<(MatchEventType,)> = sqlx::query_as(
            "SELECT event_type FROM match_events WHERE ping_id = $1 AND from_user_id = $2",
        )
        .bind(ping_id)
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        let sent: Vec<MatchEventType> = sent.into_iter().map(|(t,)| t).collect();
        next_event_allowed(&sent, event_type)
            .map_err(|reason| AppError::InvalidTransition(reason.to_string()))?;

        let inserted: Option<MatchEvent> = sqlx::query_as(
            r#"
            INSERT INTO match_events (id, ping_id, from_user_id, event_type)
            SELECT $1, $2, $3, $4
            WHERE (
                $4 = 'on_the_way'::match_event_type
                AND NOT EXISTS (
                    SELECT 1 FROM match_events e
                    WHERE e.ping_id = $2 AND e.from_user_id = $3
                )
            ) OR (
                $4 <> 'on_the_way'::match_event_type
                AND EXISTS (
                    SELECT 1 FROM match_events e
                    WHERE e.ping_id = $2 AND e.from_user_id = $3
                    AND e.event_type = 'on_the_way'
                )
                AND NOT EXISTS (
                    SELECT 1 FROM match_events e
                    WHERE e.ping_id = $2 AND e.from_user_id = $3
                    AND e.event_type IN ('at_gym', 'cant_make_it')
                )
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(ping_id)
        .bind(user_id)
        .bind(event_type)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return AppError::InvalidTransition(
                        "status already sent for this match".to_string(),
                    );
                }
            }
            AppError::from(e)
        })?;

        let event = inserted.ok_or_else(|| {
            AppError::InvalidTransition("timeline changed underneath this send".to_string())
        })?;

        self.publish(ping_id, "match_event", serde_json::to_value(&event)?)
            .await?;

        Ok(event)
    }

    /// All timeline events for a match, oldest first. Readable after the
    /// match ends (the history screen replays it).
    pub async fn list_events(&self, ping_id: Uuid) -> AppResult<Vec<MatchEvent>> {
        let events: Vec<MatchEvent> = sqlx::query_as(
            "SELECT * FROM match_events WHERE ping_id = $1 ORDER BY created_at ASC",
        )
        .bind(ping_id)
        .fetch_all(&self.db)
        .await?;

        Ok(events)
    }

    pub async fn send_message(
        &self,
        user_id: Uuid,
        ping_id: Uuid,
        message: &str,
    ) -> AppResult<MatchMessage> {
        let text = message.trim();
        if text.is_empty() {
            return Err(AppError::Validation("message must not be empty".to_string()));
        }

        self.require_active_participant(user_id, ping_id).await?;

        let message: MatchMessage = sqlx::query_as(
            r#"
            INSERT INTO match_messages (id, ping_id, from_user_id, message)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(ping_id)
        .bind(user_id)
        .bind(text)
        .fetch_one(&self.db)
        .await?;

        self.publish(ping_id, "chat_message", serde_json::to_value(&message)?)
            .await?;

        Ok(message)
    }

    /// All chat messages for a match, oldest first.
    pub async fn list_messages(&self, ping_id: Uuid) -> AppResult<Vec<MatchMessage>> {
        let messages: Vec<MatchMessage> = sqlx::query_as(
            "SELECT * FROM match_messages WHERE ping_id = $1 ORDER BY created_at ASC",
        )
        .bind(ping_id)
        .fetch_all(&self.db)
        .await?;

        Ok(messages)
    }

    /// Mark every message from the counterpart as seen. Idempotent; already
    /// seen messages keep their original `seen_at`.
    pub async fn mark_seen(&self, user_id: Uuid, ping_id: Uuid) -> AppResult<u64> {
        let ping = self.get_ping(ping_id).await?;
        if !ping.is_participant(user_id) {
            return Err(AppError::NotParticipant);
        }

        let result = sqlx::query(
            r#"
            UPDATE match_messages
            SET seen_at = NOW()
            WHERE ping_id = $1 AND from_user_id <> $2 AND seen_at IS NULL
            "#,
        )
        .bind(ping_id)
        .bind(user_id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }

    async fn get_ping(&self, ping_id: Uuid) -> AppResult<Ping> {
        let ping: Option<Ping> = sqlx::query_as("SELECT * FROM pings WHERE id = $1")
            .bind(ping_id)
            .fetch_optional(&self.db)
            .await?;

        ping.ok_or(AppError::PingNotFound)
    }

    async fn require_active_participant(&self, user_id: Uuid, ping_id: Uuid) -> AppResult<Ping> {
        let ping = self.get_ping(ping_id).await?;
        if !ping.is_participant(user_id) {
            return Err(AppError::NotParticipant);
        }
        if ping.status != PingStatus::Accepted {
            return Err(AppError::MatchNotActive);
        }
        Ok(ping)
    }

    async fn publish(
        &self,
        ping_id: Uuid,
        msg_type: &str,
        payload: serde_json::Value,
    ) -> AppResult<()> {
        let frame = WsMessage {
            msg_type: msg_type.to_string(),
            payload,
        };
        self.redis
            .publish_match(ping_id, &serde_json::to_string(&frame)?)
            .await?;
        Ok(())
    }
}

/// Per-participant timeline progression.
///
/// `on_the_way` opens the timeline and must come first; `running_late` and
/// `at_gym` require it; `cant_make_it` requires it too; `at_gym` and
/// `cant_make_it` close the participant's side; every type at most once.
fn next_event_allowed(sent: &[MatchEventType], next: MatchEventType) -> Result<(), &'static str> {
    if sent.contains(&next) {
        return Err("status already sent for this match");
    }
    if sent.iter().any(|t| t.is_terminal()) {
        return Err("timeline already closed for this participant");
    }
    match next {
        MatchEventType::OnTheWay => {
            if sent.is_empty() {
                Ok(())
            } else {
                Err("on_the_way must be the first status")
            }
        }
        _ => {
            if sent.contains(&MatchEventType::OnTheWay) {
                Ok(())
            } else {
                Err("send on_the_way before other statuses")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MatchEventType::*;

    #[test]
    fn on_the_way_must_open_the_timeline() {
        assert!(next_event_allowed(&[], OnTheWay).is_ok());
        assert!(next_event_allowed(&[], RunningLate).is_err());
        assert!(next_event_allowed(&[], AtGym).is_err());
        assert!(next_event_allowed(&[], CantMakeIt).is_err());
    }

    #[test]
    fn followups_allowed_after_on_the_way() {
        assert!(next_event_allowed(&[OnTheWay], RunningLate).is_ok());
        assert!(next_event_allowed(&[OnTheWay], AtGym).is_ok());
        assert!(next_event_allowed(&[OnTheWay], CantMakeIt).is_ok());
        assert!(next_event_allowed(&[OnTheWay, RunningLate], AtGym).is_ok());
    }

    #[test]
    fn each_type_at_most_once() {
        assert!(next_event_allowed(&[OnTheWay], OnTheWay).is_err());
        assert!(next_event_allowed(&[OnTheWay, RunningLate], RunningLate).is_err());
    }

    #[test]
    fn terminal_types_close_the_timeline() {
        assert!(next_event_allowed(&[OnTheWay, AtGym], RunningLate).is_err());
        assert!(next_event_allowed(&[OnTheWay, AtGym], CantMakeIt).is_err());
        assert!(next_event_allowed(&[OnTheWay, CantMakeIt], AtGym).is_err());
        assert!(next_event_allowed(&[OnTheWay, CantMakeIt], RunningLate).is_err());
    }
}
