//! Validated-ingestion consumer: read, validate, store, advance.

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::broker::{StreamBroker, StreamEntry, StreamFollower};
use crate::models::OrderRecord;
use crate::store::OrderStore;

/// Drains the stream into the store.
///
/// Per entry, in delivery order: a record that fails validation is logged
/// and skipped with the cursor advanced past it, so bad data can never
/// block the stream. A record that validates is saved under its derived
/// key; only then does the cursor advance. A retryable save failure leaves
/// the cursor where it was, keeping the entry inside the read window for
/// another pass.
pub struct OrderConsumer<B: StreamBroker, S: OrderStore> {
    follower: StreamFollower<B>,
    store: S,
    shutdown_rx: watch::Receiver<bool>,
    stored: u64,
    rejected: u64,
    store_failures: u64,
}

impl<B: StreamBroker, S: OrderStore> OrderConsumer<B, S> {
    pub fn new(follower: StreamFollower<B>, store: S, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            follower,
            store,
            shutdown_rx,
            stored: 0,
            rejected: 0,
            store_failures: 0,
        }
    }

    /// Records persisted this session.
    pub fn stored(&self) -> u64 {
        self.stored
    }

    /// Records rejected by validation this session.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Failed save attempts this session.
    pub fn store_failures(&self) -> u64 {
        self.store_failures
    }

    /// Current read position.
    pub fn position(&self) -> &str {
        self.follower.position()
    }

    /// Runs until the shutdown signal flips.
    pub async fn run(&mut self) {
        info!(position = %self.follower.position(), "order consumer started");

        loop {
            tokio::select! {
                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("shutdown signal received, stopping consumer");
                        break;
                    }
                }

                batch = self.follower.next_batch() => {
                    for entry in batch {
                        self.handle_entry(entry).await;
                    }
                }
            }
        }

        info!(
            stored = self.stored,
            rejected = self.rejected,
            store_failures = self.store_failures,
            "order consumer stopped"
        );
    }

    async fn handle_entry(&mut self, entry: StreamEntry) {
        let order = match OrderRecord::from_raw(&entry.record) {
            Ok(order) => order,
            Err(reason) => {
                self.rejected += 1;
                self.follower.advance(&entry.id);
                warn!(entry = %entry.id, reason = %reason, "order rejected");
                return;
            }
        };

        match self.store.save(&order).await {
            Ok(()) => {
                self.stored += 1;
                self.follower.advance(&entry.id);
                info!(
                    key = %order.storage_key(),
                    entry = %entry.id,
                    total = self.stored,
                    "order stored"
                );
            }
            Err(e) if e.is_retryable() => {
                self.store_failures += 1;
                error!(
                    entry = %entry.id,
                    key = %order.storage_key(),
                    error = %e,
                    "order save failed, leaving entry unadvanced"
                );
            }
            Err(e) => {
                self.store_failures += 1;
                self.follower.advance(&entry.id);
                error!(
                    entry = %entry.id,
                    key = %order.storage_key(),
                    error = %e,
                    "order could not be written, skipping entry"
                );
            }
        }
    }
}
