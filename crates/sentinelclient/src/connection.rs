//! Transport seam
//!
//! The sentinel client and the pool adapter only ever talk to nodes through
//! [`Connector`] and [`Connection`]. [`RedisConnector`] is the production
//! implementation on top of the `redis` crate's multiplexed tokio connection.

use crate::error::{Result, SentinelError};
use crate::types::Timeouts;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Value;
use std::time::Duration;

/// A live connection that can carry request/reply commands
#[async_trait]
pub trait Connection: Send {
    /// Send one command (name followed by its arguments) and wait for the reply
    async fn request(&mut self, args: &[&str]) -> Result<Value>;
}

/// Opens connections to `host:port` endpoints
#[async_trait]
pub trait Connector: Send + Sync {
    type Conn: Connection + 'static;

    async fn connect(&self, addr: &str, timeouts: &Timeouts) -> Result<Self::Conn>;
}

/// Connector backed by the `redis` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisConnector;

impl RedisConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for RedisConnector {
    type Conn = RedisConnection;

    async fn connect(&self, addr: &str, timeouts: &Timeouts) -> Result<RedisConnection> {
        tracing::debug!("Connecting to {} (timeout {:?})", addr, timeouts.connect);

        let client = redis::Client::open(format!("redis://{}/", addr))?;
        let conn = tokio::time::timeout(
            timeouts.connect,
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| SentinelError::Timeout {
            op: "connect",
            after: timeouts.connect,
        })??;

        tracing::trace!("Connected to {}", addr);

        Ok(RedisConnection {
            addr: addr.to_string(),
            conn,
            request_timeout: timeouts.request(),
        })
    }
}

/// Connection produced by [`RedisConnector`]
///
/// Dropping it closes the socket once the multiplexer's driver task notices.
pub struct RedisConnection {
    addr: String,
    conn: MultiplexedConnection,
    request_timeout: Duration,
}

impl RedisConnection {
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// The underlying multiplexed connection, for issuing application commands
    pub fn inner_mut(&mut self) -> &mut MultiplexedConnection {
        &mut self.conn
    }
}

#[async_trait]
impl Connection for RedisConnection {
    async fn request(&mut self, args: &[&str]) -> Result<Value> {
        let mut cmd = redis::Cmd::new();
        for arg in args {
            cmd.arg(*arg);
        }

        tracing::trace!("{} <- {:?}", self.addr, args);

        let reply: Value = tokio::time::timeout(self.request_timeout, cmd.query_async(&mut self.conn))
            .await
            .map_err(|_| SentinelError::Timeout {
                op: "reply",
                after: self.request_timeout,
            })??;

        Ok(reply)
    }
}

impl std::fmt::Display for RedisConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RedisConnection(addr={})", self.addr)
    }
}

impl std::fmt::Debug for RedisConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisConnection")
            .field("addr", &self.addr)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
