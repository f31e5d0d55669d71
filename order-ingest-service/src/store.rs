//! Durable order persistence.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;

use crate::models::OrderRecord;

/// Storage failure, split by whether a later delivery of the same entry
/// could still succeed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(#[from] redis::RedisError),
    #[error("record could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}

/// Save-by-derived-key persistence. Saving the same key twice with
/// equivalent data must leave the store in the same state as saving once.
#[async_trait]
pub trait OrderStore: Send {
    async fn save(&mut self, order: &OrderRecord) -> Result<(), StoreError>;
}

/// Stores each record as JSON under its derived key.
///
/// Runs on a dedicated managed connection, separate from the stream reader
/// whose handle blocks in XREAD. The manager re-establishes the connection
/// after a broker outage: a save that failed during the outage goes through
/// when the unadvanced entry is redelivered.
pub struct RedisOrderStore {
    conn: ConnectionManager,
}

impl RedisOrderStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl OrderStore for RedisOrderStore {
    async fn save(&mut self, order: &OrderRecord) -> Result<(), StoreError> {
        let payload = serde_json::to_string(order)?;
        self.conn
            .set::<_, _, ()>(order.storage_key(), payload)
            .await?;
        Ok(())
    }
}
