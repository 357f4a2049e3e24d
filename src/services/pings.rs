use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Ping, PingDecision, PingStatus},
    storage::redis::RedisClient,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct WsMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub payload: serde_json::Value,
}

pub struct PingService {
    db: PgPool,
    redis: RedisClient,
}

impl PingService {
    pub fn new(db: PgPool, redis: RedisClient) -> Self {
        Self { db, redis }
    }

    /// Create a pending ping from `user_id` to `to_user_id`.
    ///
    /// The caller must hold an active availability row. "Already in a match"
    /// is guarded by the insert predicate and "live ping already exists for
    /// the pair" by the partial unique index, so concurrent duplicate sends
    /// cannot both land.
    pub async fn send_ping(&self, user_id: Uuid, to_user_id: Uuid) -> AppResult<Ping> {
        if user_id == to_user_id {
            return Err(AppError::CannotPingSelf);
        }

        let available: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM availability WHERE user_id = $1 AND status = TRUE AND expires_at > NOW()",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        if available.is_none() {
            return Err(AppError::NotAvailable);
        }

        let inserted: Option<Ping> = sqlx::query_as(
            r#"
            INSERT INTO pings (id, from_user_id, to_user_id, status)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (
                SELECT 1 FROM pings p
                WHERE p.status = $5
                AND (p.from_user_id = $2 OR p.to_user_id = $2)
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(to_user_id)
        .bind(PingStatus::Pending)
        .bind(PingStatus::Accepted)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return AppError::DuplicatePing;
                }
            }
            AppError::from(e)
        })?;

        inserted.ok_or(AppError::ActiveMatchExists)
    }

    /// Accept or reject a pending ping. Recipient only.
    ///
    /// Both arms are conditional updates predicated on `status = 'pending'`;
    /// when zero rows are affected the current row is re-read to tell
    /// "wrong caller" from "someone got there first".
    pub async fn respond(
        &self,
        user_id: Uuid,
        ping_id: Uuid,
        decision: PingDecision,
    ) -> AppResult<Ping> {
        let updated: Option<Ping> = match decision {
            PingDecision::Accept => {
                sqlx::query_as(
                    r#"
                    UPDATE pings AS t
                    SET status = $3, accepted_at = NOW()
                    WHERE t.id = $1 AND t.to_user_id = $2 AND t.status = $4
                    AND NOT EXISTS (
                        SELECT 1 FROM pings p
                        WHERE p.status = $3
                        AND (p.from_user_id IN (t.from_user_id, t.to_user_id)
                            OR p.to_user_id IN (t.from_user_id, t.to_user_id))
                    )
                    RETURNING t.*
                    "#,
                )
                .bind(ping_id)
                .bind(user_id)
                .bind(PingStatus::Accepted)
                .bind(PingStatus::Pending)
                .fetch_optional(&self.db)
                .await?
            }
            PingDecision::Reject => {
                sqlx::query_as(
                    r#"
                    UPDATE pings
                    SET status = $3
                    WHERE id = $1 AND to_user_id = $2 AND status = $4
                    RETURNING *
                    "#,
                )
                .bind(ping_id)
                .bind(user_id)
                .bind(PingStatus::Rejected)
                .bind(PingStatus::Pending)
                .fetch_optional(&self.db)
                .await?
            }
        };

        match updated {
            Some(ping) => Ok(ping),
            None => {
                let current = self.get_ping(ping_id).await?;
                if current.to_user_id != user_id {
                    Err(AppError::Unauthorized)
                } else if current.status != PingStatus::Pending {
                    Err(AppError::AlreadyHandled)
                } else {
                    // Row is still pending and ours, so the accept predicate
                    // tripped on an existing accepted match.
                    Err(AppError::ActiveMatchExists)
                }
            }
        }
    }

    /// End an accepted match. Either participant may call this; the loser of
    /// a double-end race observes `AlreadyHandled`.
    pub async fn end_match(&self, user_id: Uuid, ping_id: Uuid) -> AppResult<Ping> {
        let updated: Option<Ping> = sqlx::query_as(
            r#"
            UPDATE pings
            SET status = $3, ended_at = NOW()
            WHERE id = $1 AND status = $4
            AND (from_user_id = $2 OR to_user_id = $2)
            RETURNING *
            "#,
        )
        .bind(ping_id)
        .bind(user_id)
        .bind(PingStatus::Ended)
        .bind(PingStatus::Accepted)
        .fetch_optional(&self.db)
        .await?;

        let ping = match updated {
            Some(ping) => ping,
            None => {
                let current = self.get_ping(ping_id).await?;
                if !current.is_participant(user_id) {
                    return Err(AppError::Unauthorized);
                }
                return Err(AppError::AlreadyHandled);
            }
        };

        // Tell live subscribers the match is over so they tear down.
        let frame = WsMessage {
            msg_type: "match_ended".to_string(),
            payload: serde_json::to_value(&ping)?,
        };
        self.redis
            .publish_match(ping.id, &serde_json::to_string(&frame)?)
            .await?;

        Ok(ping)
    }

    pub async fn get_ping(&self, ping_id: Uuid) -> AppResult<Ping> {
        let ping: Option<Ping> = sqlx::query_as("SELECT * FROM pings WHERE id = $1")
            .bind(ping_id)
            .fetch_optional(&self.db)
            .await?;

        ping.ok_or(AppError::PingNotFound)
    }

    /// Pending pings addressed to the caller, newest first.
    pub async fn list_incoming_pending(&self, user_id: Uuid) -> AppResult<Vec<Ping>> {
        let pings: Vec<Ping> = sqlx::query_as(
            "SELECT * FROM pings WHERE to_user_id = $1 AND status = $2 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .bind(PingStatus::Pending)
        .fetch_all(&self.db)
        .await?;

        Ok(pings)
    }

    /// Accepted pings the caller participates in. Drives "do I have an
    /// active match" on the client.
    pub async fn list_accepted(&self, user_id: Uuid) -> AppResult<Vec<Ping>> {
        let pings: Vec<Ping> = sqlx::query_as(
            r#"
            SELECT * FROM pings
            WHERE status = $2 AND (from_user_id = $1 OR to_user_id = $1)
            ORDER BY accepted_at DESC
            "#,
        )
        .bind(user_id)
        .bind(PingStatus::Accepted)
        .fetch_all(&self.db)
        .await?;

        Ok(pings)
    }

    /// Recipients of the caller's pending pings. Client-side re-send
    /// suppression; the authoritative guard stays the unique index.
    pub async fn list_sent_pending(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT to_user_id FROM pings WHERE from_user_id = $1 AND status = $2",
        )
        .bind(user_id)
        .bind(PingStatus::Pending)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|(to_user_id,)| to_user_id).collect())
    }

    /// The accepted ping between the caller and `other_user_id`, if any.
    pub async fn match_with_user(
        &self,
        user_id: Uuid,
        other_user_id: Uuid,
    ) -> AppResult<Option<Ping>> {
        let ping: Option<Ping> = sqlx::query_as(
            r#"
            SELECT * FROM pings
            WHERE status = $3
            AND ((from_user_id = $1 AND to_user_id = $2)
                OR (from_user_id = $2 AND to_user_id = $1))
            "#,
        )
        .bind(user_id)
        .bind(other_user_id)
        .bind(PingStatus::Accepted)
        .fetch_optional(&self.db)
        .await?;

        Ok(ping)
    }

    /// Ended matches involving the caller, most recently ended first.
    pub async fn past_matches(&self, user_id: Uuid) -> AppResult<Vec<Ping>> {
        let pings: Vec<Ping> = sqlx::query_as(
            r#"
            SELECT * FROM pings
            WHERE status = $2 AND (from_user_id = $1 OR to_user_id = $1)
            ORDER BY ended_at DESC NULLS LAST
            "#,
        )
        .bind(user_id)
        .bind(PingStatus::Ended)
        .fetch_all(&self.db)
        .await?;

        Ok(pings)
    }
}
