use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use uuid::Uuid;

use crate::error::AppResult;

/// Thin wrapper over the Redis connection. Carries the multiplexed
/// connection for publishes and the raw client for per-subscriber pub/sub
/// connections (pub/sub cannot share a multiplexed connection).
#[derive(Clone)]
pub struct RedisClient {
    client: Client,
    conn: MultiplexedConnection,
}

impl RedisClient {
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { client, conn })
    }

    fn match_channel(ping_id: Uuid) -> String {
        format!("match:{}", ping_id)
    }

    /// Publish a frame on a match's channel. Delivery is at-least-once from
    /// the subscriber's point of view; frames carry row ids so clients fold
    /// duplicates.
    pub async fn publish_match(&self, ping_id: Uuid, payload: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.publish(Self::match_channel(ping_id), payload).await?;
        Ok(())
    }

    /// Open a dedicated pub/sub connection subscribed to one match channel.
    /// The subscription lives as long as the returned connection.
    pub async fn subscribe_match(&self, ping_id: Uuid) -> AppResult<redis::aio::PubSub> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(Self::match_channel(ping_id)).await?;
        Ok(pubsub)
    }
}
