//! Live tap on the order stream: prints every entry as a readable block.
//!
//! Reads the same stream as the ingestion service but stores nothing and
//! keeps its cursor in memory only, so it is safe to run alongside it.
//!
//! Environment variables: the same BROKER_* and STREAM_* set the
//! ingestion service reads.

use anyhow::{Context, Result};
use order_ingest_service::broker::{RedisBroker, StreamCursor, StreamFollower};
use order_ingest_service::services::StreamObserver;
use order_ingest_service::Config;
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("order_tap=info".parse().expect("valid directive"))
                .add_directive(
                    "order_ingest_service=info"
                        .parse()
                        .expect("valid directive"),
                ),
        )
        .init();

    info!("Starting order stream tap");

    let config = Config::from_env().context("configuration error")?;
    info!(
        addr = %config.broker.addr_label(),
        stream = %config.stream_name,
        start_id = %config.start_id,
        "Configuration loaded"
    );

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
    let mut observer = StreamObserver::new(follower, shutdown_rx);
    observer.run().await;

    info!(seen = observer.seen(), "Order stream tap stopped");
    Ok(())
}
