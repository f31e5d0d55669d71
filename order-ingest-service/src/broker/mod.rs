//! Broker access: the stream read contract and its Redis implementation.

pub mod cursor;
pub mod follower;

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::streams::{StreamId, StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, Client, RedisResult};
use redis_utils::RedisSettings;
use tracing::{debug, info};

use crate::models::RawRecord;

pub use cursor::{StreamCursor, START_AT_LATEST};
pub use follower::{FollowerSettings, StreamFollower};

/// One stream entry: broker-assigned position (`timestamp-sequence`) plus
/// the raw field map it carried.
#[derive(Debug, Clone)]
pub struct StreamEntry {
    pub id: String,
    pub record: RawRecord,
}

impl From<StreamId> for StreamEntry {
    fn from(entry: StreamId) -> Self {
        let fields = entry
            .map
            .into_iter()
            .filter_map(|(name, value)| {
                redis::from_redis_value::<String>(&value)
                    .ok()
                    .map(|text| (name, text))
            })
            .collect();
        Self {
            id: entry.id,
            record: RawRecord::new(fields),
        }
    }
}

/// Read side of the broker.
///
/// `read_batch` blocks up to `block` waiting for entries strictly after
/// `from_id` and returns an empty batch on timeout; a connectivity failure
/// surfaces as the broker error so the caller can reconnect. The connection
/// handle is replaced wholesale by `reconnect`, never repaired in place.
#[async_trait]
pub trait StreamBroker: Send {
    async fn read_batch(
        &mut self,
        stream: &str,
        from_id: &str,
        count: usize,
        block: Duration,
    ) -> RedisResult<Vec<StreamEntry>>;

    async fn reconnect(&mut self) -> RedisResult<()>;

    async fn ping(&mut self) -> RedisResult<()>;
}

/// Redis Streams implementation over a multiplexed connection.
pub struct RedisBroker {
    client: Client,
    conn: MultiplexedConnection,
}

impl RedisBroker {
    /// Connects and verifies the broker before the loop starts. A failure
    /// here is fatal: connection parameters are assumed wrong rather than
    /// the broker transiently down.
    pub async fn connect(settings: &RedisSettings) -> crate::error::Result<Self> {
        let client = Client::open(settings.connection_info())?;
        let conn = redis_utils::open_connection(&client).await?;
        info!(addr = %settings.addr_label(), "broker connected");
        Ok(Self { client, conn })
    }
}

#[async_trait]
impl StreamBroker for RedisBroker {
    async fn read_batch(
        &mut self,
        stream: &str,
        from_id: &str,
        count: usize,
        block: Duration,
    ) -> RedisResult<Vec<StreamEntry>> {
        let options = StreamReadOptions::default()
            .count(count)
            .block(block.as_millis() as usize);
        let reply: StreamReadReply = self
            .conn
            .xread_options(&[stream], &[from_id], &options)
            .await?;

        let entries: Vec<StreamEntry> = reply
            .keys
            .into_iter()
            .filter(|key| key.key == stream)
            .flat_map(|key| key.ids)
            .map(StreamEntry::from)
            .collect();
        if !entries.is_empty() {
            debug!(stream = %stream, count = entries.len(), "read batch");
        }
        Ok(entries)
    }

    async fn reconnect(&mut self) -> RedisResult<()> {
        self.conn = redis_utils::open_connection(&self.client).await?;
        Ok(())
    }

    async fn ping(&mut self) -> RedisResult<()> {
        redis::cmd("PING").query_async(&mut self.conn).await
    }
}
