//! Read/reconnect loop shared by the ingestion pipeline and the tap.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use super::{StreamBroker, StreamCursor, StreamEntry};

/// Loop timing knobs.
#[derive(Debug, Clone)]
pub struct FollowerSettings {
    /// Bounded wait of one read call.
    pub block: Duration,
    /// Maximum entries per read call.
    pub batch_size: usize,
    /// Wait between reconnect attempts.
    pub reconnect_backoff: Duration,
    /// Idle time after which the connection is checked with a ping.
    pub health_check_interval: Duration,
}

impl Default for FollowerSettings {
    fn default() -> Self {
        Self {
            block: Duration::from_secs(1),
            batch_size: 100,
            reconnect_backoff: Duration::from_secs(5),
            health_check_interval: Duration::from_secs(30),
        }
    }
}

/// Follows one stream with bounded-blocking reads from the cursor position,
/// reconnecting with backoff on connectivity errors.
///
/// The cursor is advanced by the caller per handled entry, never in here,
/// so a batch abandoned at shutdown is redelivered on the next start.
pub struct StreamFollower<B: StreamBroker> {
    broker: B,
    stream: String,
    cursor: StreamCursor,
    settings: FollowerSettings,
    last_activity: Instant,
}

impl<B: StreamBroker> StreamFollower<B> {
    pub fn new(broker: B, stream: impl Into<String>, cursor: StreamCursor) -> Self {
        Self::with_settings(broker, stream, cursor, FollowerSettings::default())
    }

    pub fn with_settings(
        broker: B,
        stream: impl Into<String>,
        cursor: StreamCursor,
        settings: FollowerSettings,
    ) -> Self {
        Self {
            broker,
            stream: stream.into(),
            cursor,
            settings,
            last_activity: Instant::now(),
        }
    }

    /// Current read position.
    pub fn position(&self) -> &str {
        self.cursor.position()
    }

    /// Marks the entry at `id` handled: the next read asks for entries
    /// after it.
    pub fn advance(&mut self, id: &str) {
        self.cursor.advance(id);
    }

    /// Returns the next non-empty batch of entries after the cursor.
    ///
    /// Read timeouts loop quietly (with an idle health ping every
    /// `health_check_interval`); a connectivity failure turns into backoff
    /// plus reconnect, retried until the broker answers again. The cursor
    /// does not move in here, so the future is safe to cancel at any
    /// suspension point: callers drive it inside `tokio::select!` with the
    /// shutdown signal.
    pub async fn next_batch(&mut self) -> Vec<StreamEntry> {
        loop {
            let read = self
                .broker
                .read_batch(
                    &self.stream,
                    self.cursor.position(),
                    self.settings.batch_size,
                    self.settings.block,
                )
                .await;

            match read {
                Ok(entries) if !entries.is_empty() => {
                    self.last_activity = Instant::now();
                    return entries;
                }
                Ok(_) => {
                    if self.last_activity.elapsed() >= self.settings.health_check_interval {
                        if let Err(e) = self.broker.ping().await {
                            warn!(error = %e, "broker health check failed");
                            self.recover().await;
                        }
                        self.last_activity = Instant::now();
                    }
                }
                Err(e) => {
                    warn!(error = %e, "broker read failed");
                    self.recover().await;
                }
            }
        }
    }

    /// Backs off, then replaces the connection wholesale. Retries until it
    /// succeeds; the cursor is untouched, so no entries are skipped and
    /// entries already delivered before the failure may come again.
    async fn recover(&mut self) {
        loop {
            sleep(self.settings.reconnect_backoff).await;
            match self.broker.reconnect().await {
                Ok(()) => {
                    info!(position = %self.cursor.position(), "broker reconnected, resuming");
                    self.last_activity = Instant::now();
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "broker reconnect failed, retrying");
                }
            }
        }
    }
}
