use anyhow::{anyhow, Context, Result};
use redis::aio::{ConnectionManager, MultiplexedConnection};
use redis::{Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo, RedisError};
use std::time::Duration;
use tokio::time::timeout;
use tracing::info;

/// Bound on establishing (or re-establishing) a broker connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Broker connection parameters, assembled by the service config layer.
#[derive(Clone, Debug)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub db: i64,
}

impl RedisSettings {
    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: RedisConnectionInfo {
                db: self.db,
                username: Some(self.username.clone()),
                password: Some(self.password.clone()),
            },
        }
    }

    /// host:port label for log lines.
    pub fn addr_label(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Open a verified self-healing managed connection.
///
/// The manager re-establishes its underlying connection after a broker
/// outage, retrying internally with backoff; commands issued while it is
/// down return the broker error. Fails with context suitable for a startup
/// diagnostic; callers treat this as fatal during process start.
pub async fn connect_manager(settings: &RedisSettings) -> Result<ConnectionManager> {
    let client = Client::open(settings.connection_info())
        .context("failed to construct Redis client from broker settings")?;

    let mut manager = match timeout(CONNECT_TIMEOUT, ConnectionManager::new(client)).await {
        Ok(res) => res,
        Err(_) => Err(RedisError::from((
            redis::ErrorKind::IoError,
            "broker connection attempt timed out",
        ))),
    }
    .with_context(|| format!("failed to connect to broker at {}", settings.addr_label()))?;

    let pong: String = redis::cmd("PING")
        .query_async(&mut manager)
        .await
        .with_context(|| format!("broker at {} did not answer PING", settings.addr_label()))?;
    if pong != "PONG" {
        return Err(anyhow!("unexpected PING reply from broker: {pong:?}"));
    }

    info!(addr = %settings.addr_label(), "managed broker connection established");

    Ok(manager)
}

/// Establish a fresh multiplexed connection from an existing client, bounded
/// by [`CONNECT_TIMEOUT`] and verified with a PING round trip.
///
/// Used both for the initial connect and for wholesale connection
/// replacement after a broker outage.
pub async fn open_connection(
    client: &Client,
) -> std::result::Result<MultiplexedConnection, RedisError> {
    let mut conn = match timeout(CONNECT_TIMEOUT, client.get_multiplexed_async_connection()).await {
        Ok(res) => res?,
        Err(_) => {
            return Err(RedisError::from((
                redis::ErrorKind::IoError,
                "broker connection attempt timed out",
            )))
        }
    };

    let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
    if pong != "PONG" {
        return Err(RedisError::from((
            redis::ErrorKind::ResponseError,
            "unexpected PING reply from broker",
        )));
    }

    Ok(conn)
}
