//! Connection pool integration
//!
//! A generic pool needs two things from us: a way to open a new connection
//! and a way to vet an idle one before lending it out. [`MasterConnector`]
//! provides both on top of a shared [`SentinelClient`], so the pool only ever
//! hands out connections to a node that currently reports itself as master.

use crate::client::SentinelClient;
use crate::config::{ClusterConfig, PoolSettings};
use crate::connection::{Connector, RedisConnector};
use crate::error::{Result, SentinelError};
use crate::role::check_role;
use crate::types::{role, Timeouts};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace};

/// The dial/validate pair a connection pool is configured with
#[async_trait]
pub trait PoolConnector: Send + Sync {
    type Connection: Send;

    /// Open a new, ready-to-use connection
    async fn dial(&self) -> Result<Self::Connection>;

    /// Check a pooled connection before it is borrowed. An error tells the
    /// pool to discard the connection and dial a replacement.
    async fn validate(&self, conn: &mut Self::Connection, last_used: Instant) -> Result<()>;
}

/// Pool adapter that dials whichever node the sentinels report as master
pub struct MasterConnector<C: Connector = RedisConnector> {
    master_name: String,
    redis_timeouts: Timeouts,
    pool: PoolSettings,
    client: Arc<SentinelClient<C>>,
}

impl MasterConnector<RedisConnector> {
    /// Validate `config` and build the adapter over the `redis` crate transport
    pub fn new(config: ClusterConfig) -> Result<Self> {
        Self::with_connector(config, RedisConnector::new())
    }
}

impl<C: Connector> MasterConnector<C> {
    /// Validate `config` and build the adapter. Nothing is dialed here.
    pub fn with_connector(config: ClusterConfig, connector: C) -> Result<Self> {
        config.validate()?;

        let client = SentinelClient::with_connector(
            config.sentinel_addrs,
            config.sentinel_timeouts,
            connector,
        )?;

        info!("Pool adapter ready for master {}", config.master_name);

        Ok(Self {
            master_name: config.master_name,
            redis_timeouts: config.redis_timeouts,
            pool: config.pool,
            client: Arc::new(client),
        })
    }

    pub fn master_name(&self) -> &str {
        &self.master_name
    }

    pub fn pool_settings(&self) -> PoolSettings {
        self.pool
    }

    /// The sentinel client shared by every dial
    pub fn sentinel_client(&self) -> &Arc<SentinelClient<C>> {
        &self.client
    }

    /// Close the shared sentinel connection
    pub async fn close(&self) {
        self.client.close().await;
    }
}

#[async_trait]
impl<C: Connector> PoolConnector for MasterConnector<C> {
    type Connection = C::Conn;

    async fn dial(&self) -> Result<C::Conn> {
        let addr = self
            .client
            .master_address(&self.master_name)
            .await
            .map_err(|e| SentinelError::MasterAddress(Box::new(e)))?;

        let mut conn = self
            .client
            .connector()
            .connect(&addr, &self.redis_timeouts)
            .await
            .map_err(|e| SentinelError::Dial {
                addr: addr.clone(),
                source: Box::new(e),
            })?;

        // On mismatch the fresh connection is dropped here, never returned.
        check_role(&mut conn, role::MASTER)
            .await
            .map_err(|e| SentinelError::RoleCheck(Box::new(e)))?;

        debug!("Dialed master {} at {}", self.master_name, addr);
        Ok(conn)
    }

    async fn validate(&self, conn: &mut C::Conn, last_used: Instant) -> Result<()> {
        trace!(
            "Validating pooled connection idle for {:?}",
            last_used.elapsed()
        );

        check_role(conn, role::MASTER)
            .await
            .map_err(|e| SentinelError::RoleCheck(Box::new(e)))
    }
}

impl<C: Connector> std::fmt::Debug for MasterConnector<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterConnector")
            .field("master_name", &self.master_name)
            .field("redis_timeouts", &self.redis_timeouts)
            .field("pool", &self.pool)
            .field("client", &self.client)
            .finish()
    }
}
