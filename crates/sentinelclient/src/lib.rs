//! Sentinel client for Redis-protocol clusters
//!
//! This crate resolves the current master of a sentinel-monitored replica set
//! and plugs that resolution into a connection pool, so that the pool only
//! lends out connections to a node that currently reports itself as master.
//!
//! # Example
//!
//! ```no_run
//! use sentinelclient::{ClusterConfig, MasterConnector, PoolConnector};
//!
//! #[tokio::main]
//! async fn main() -> sentinelclient::Result<()> {
//!     let config = ClusterConfig::new(
//!         "mymaster",
//!         vec!["10.0.0.1:26379".to_string(), "10.0.0.2:26379".to_string()],
//!     );
//!
//!     let connector = MasterConnector::new(config)?;
//!
//!     // Resolve the master through the sentinels, connect, verify its role
//!     let mut conn = connector.dial().await?;
//!
//!     // Before lending an idle connection out again
//!     connector.validate(&mut conn, std::time::Instant::now()).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod pool;
mod reply;
pub mod role;
pub mod types;

pub use client::SentinelClient;
pub use config::{ClusterConfig, PoolSettings, ValidationPolicy};
pub use connection::{Connection, Connector, RedisConnection, RedisConnector};
pub use error::{Result, SentinelError};
pub use pool::{MasterConnector, PoolConnector};
pub use role::{check_role, query_role};
pub use types::Timeouts;
