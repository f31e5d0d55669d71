//! Order ingestion daemon: follows the order stream, validates each
//! record, and materializes it into keyed storage.
//!
//! Environment variables:
//! - BROKER_HOST: broker hostname (required)
//! - BROKER_PORT: broker port (default: 19536)
//! - BROKER_USERNAME: broker username (default: "default")
//! - BROKER_PASSWORD: broker password (required)
//! - BROKER_DB_INDEX: logical database for stored records (default: 0)
//! - STREAM_NAME: stream to follow (default: "orders")
//! - STREAM_START_ID: entry id to start from (default: "$", new entries only)

use anyhow::{Context, Result};
use order_ingest_service::broker::{RedisBroker, StreamCursor, StreamFollower};
use order_ingest_service::services::OrderConsumer;
use order_ingest_service::store::RedisOrderStore;
use order_ingest_service::Config;
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(
                    "order_ingest_service=info"
                        .parse()
                        .expect("valid directive"),
                )
                .add_directive("redis_utils=info".parse().expect("valid directive")),
        )
        .init();

    info!("Starting order ingestion service");

    let config = Config::from_env().context("configuration error")?;
    info!(
        addr = %config.broker.addr_label(),
        stream = %config.stream_name,
        start_id = %config.start_id,
        "Configuration loaded"
    );

    // Saves get their own managed connection; the broker's handle blocks
    // in XREAD.
    let store_conn = redis_utils::connect_manager(&config.broker)
        .await
        .context("storage connection failed")?;
    let store = RedisOrderStore::new(store_conn);

    let broker = RedisBroker::connect(&config.broker)
        .await
        .context("broker connection failed")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl+c");
        info!("Shutdown signal received");
        let _ = shutdown_tx_clone.send(true);
    });

    let follower = StreamFollower::new(
        broker,
        config.stream_name,
        StreamCursor::from_id(config.start_id),
    );
    let mut consumer = OrderConsumer::new(follower, store, shutdown_rx);
    consumer.run().await;

    info!(stored = consumer.stored(), "Order ingestion service stopped");
    Ok(())
}
