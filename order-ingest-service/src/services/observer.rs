//! Read-only tap: formats and prints the stream for live diagnostics.

use std::collections::HashMap;

use chrono::{DateTime, Local};
use tokio::sync::watch;
use tracing::info;

use crate::broker::{StreamBroker, StreamEntry, StreamFollower};

const SEPARATOR: &str = "--------------------------------------------------";

/// Prints every entry as a human-readable block and advances an in-memory
/// cursor. No validation, no storage: a passive tap on the same stream the
/// ingestion pipeline consumes, so both can run side by side.
pub struct StreamObserver<B: StreamBroker> {
    follower: StreamFollower<B>,
    shutdown_rx: watch::Receiver<bool>,
    seen: u64,
}

impl<B: StreamBroker> StreamObserver<B> {
    pub fn new(follower: StreamFollower<B>, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            follower,
            shutdown_rx,
            seen: 0,
        }
    }

    /// Entries printed this session.
    pub fn seen(&self) -> u64 {
        self.seen
    }

    /// Current read position.
    pub fn position(&self) -> &str {
        self.follower.position()
    }

    /// Runs until the shutdown signal flips.
    pub async fn run(&mut self) {
        info!(position = %self.follower.position(), "stream tap started");

        loop {
            tokio::select! {
                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("shutdown signal received, stopping tap");
                        break;
                    }
                }

                batch = self.follower.next_batch() => {
                    for entry in batch {
                        self.seen += 1;
                        println!("{}", render_entry(&entry, Local::now()));
                        self.follower.advance(&entry.id);
                    }
                }
            }
        }

        info!(seen = self.seen, "stream tap stopped");
    }
}

/// Renders one entry as a printed block: separator, broker-assigned entry
/// id, receive time, and the field map as pretty JSON.
fn render_entry(entry: &StreamEntry, received: DateTime<Local>) -> String {
    let mut block = String::new();
    block.push_str(SEPARATOR);
    block.push('\n');
    block.push_str(&format!("Entry ID: {}\n", entry.id));
    block.push_str(&format!(
        "Received: {}\n",
        received.format("%Y-%m-%d %H:%M:%S")
    ));
    block.push_str("Order details:\n");
    block.push_str(&format_fields(entry.record.fields()));
    block
}

/// Renders the field map as pretty JSON, expanding any value that itself
/// looks like an embedded JSON document. Values that do not parse stay as
/// their raw string.
fn format_fields(fields: &HashMap<String, String>) -> String {
    let rendered: serde_json::Map<String, serde_json::Value> = fields
        .iter()
        .map(|(name, value)| (name.clone(), expand_value(value)))
        .collect();
    serde_json::to_string_pretty(&rendered).unwrap_or_else(|_| format!("{fields:?}"))
}

fn expand_value(value: &str) -> serde_json::Value {
    let looks_structured = (value.starts_with('{') && value.ends_with('}'))
        || (value.starts_with('[') && value.ends_with(']'));
    if looks_structured {
        if let Ok(parsed) = serde_json::from_str(value) {
            return parsed;
        }
    }
    serde_json::Value::String(value.to_owned())
}
