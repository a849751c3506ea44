//! Sentinel client implementation
//!
//! A [`SentinelClient`] owns an ordered list of sentinel addresses and at most
//! one live connection, to the sentinel at the current index. Every query runs
//! under a single lock for its whole duration, retries across sentinels, and
//! sticks to the last sentinel that answered.
//!
//! Make sure to configure short timeouts: in the worst case one call tries
//! every sentinel once, so it may take `addrs.len()` times one connect plus one
//! request deadline.

use crate::connection::{Connection, Connector, RedisConnector};
use crate::error::{Result, SentinelError};
use crate::reply;
use crate::types::Timeouts;
use redis::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Which sentinel we talk to and, if dialed, the connection to it
struct Session<C> {
    index: usize,
    conn: Option<C>,
}

impl<C> Session<C> {
    /// Give up on the current sentinel and move to the next one
    fn rotate(&mut self, len: usize) {
        *self = Session {
            index: (self.index + 1) % len,
            conn: None,
        };
    }
}

/// Sentinel client
///
/// Safe to share between tasks (wrap it in an `Arc`); concurrent callers queue
/// on the internal lock so that only one sentinel request is in flight.
pub struct SentinelClient<C: Connector = RedisConnector> {
    addrs: Vec<String>,
    timeouts: Timeouts,
    connector: C,
    session: Mutex<Session<C::Conn>>,
}

impl SentinelClient<RedisConnector> {
    /// Client over the `redis` crate transport
    pub fn new(addrs: Vec<String>, timeouts: Timeouts) -> Result<Self> {
        Self::with_connector(addrs, timeouts, RedisConnector::new())
    }
}

impl<C: Connector> SentinelClient<C> {
    /// Create a client. No connection is made until the first query.
    pub fn with_connector(addrs: Vec<String>, timeouts: Timeouts, connector: C) -> Result<Self> {
        if addrs.is_empty() {
            return Err(SentinelError::InvalidConfig(
                "no sentinel addresses provided".into(),
            ));
        }

        info!("Sentinel client configured with {} sentinels", addrs.len());

        Ok(Self {
            addrs,
            timeouts,
            connector,
            session: Mutex::new(Session {
                index: 0,
                conn: None,
            }),
        })
    }

    pub fn addrs(&self) -> &[String] {
        &self.addrs
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// The connector used for sentinels, shared with callers dialing data nodes
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Index of the sentinel the next query will go to first
    pub async fn active_index(&self) -> usize {
        self.session.lock().await.index
    }

    /// Whether a sentinel connection is currently held
    pub async fn is_connected(&self) -> bool {
        self.session.lock().await.conn.is_some()
    }

    /// Look up the address (`host:port`) of the current master of `name`
    pub async fn master_address(&self, name: &str) -> Result<String> {
        let mut session = self.session.lock().await;

        let addr = self
            .query(
                &mut session,
                &["SENTINEL", "get-master-addr-by-name", name],
                reply::master_addr,
            )
            .await?;

        debug!("Master {} is at {}", name, addr);
        Ok(addr)
    }

    /// Run an arbitrary sentinel command with the same retry policy and return
    /// the raw reply
    pub async fn execute(&self, args: &[&str]) -> Result<Value> {
        let mut session = self.session.lock().await;
        self.query(&mut session, args, |value| Ok(value.clone()))
            .await
    }

    /// Drop the sentinel connection if one is established. The next query
    /// redials the same sentinel.
    pub async fn close(&self) {
        let mut session = self.session.lock().await;
        if session.conn.take().is_some() {
            debug!("Closed connection to sentinel {}", self.addrs[session.index]);
        }
    }

    /// Try every sentinel at most once, starting at the current one.
    ///
    /// `decode` runs inside the attempt so that a malformed reply rotates to
    /// the next sentinel just like a transport failure. Only the last error is
    /// surfaced.
    async fn query<T, F>(
        &self,
        session: &mut Session<C::Conn>,
        args: &[&str],
        decode: F,
    ) -> Result<T>
    where
        F: Fn(&Value) -> Result<T>,
    {
        let attempts = self.addrs.len();
        let mut last_err = None;

        for _ in 0..attempts {
            let addr = &self.addrs[session.index];

            match self.attempt(session, args).await.and_then(|v| decode(&v)) {
                Ok(result) => return Ok(result),
                Err(e) => {
                    warn!("Sentinel {} failed: {}", addr, e);
                    session.rotate(attempts);
                    last_err = Some(e);
                }
            }
        }

        Err(SentinelError::SentinelsExhausted {
            attempts,
            source: Box::new(last_err.unwrap_or_else(|| {
                SentinelError::InvalidConfig("no sentinel addresses provided".into())
            })),
        })
    }

    /// One request against the current sentinel, dialing it first if needed
    async fn attempt(&self, session: &mut Session<C::Conn>, args: &[&str]) -> Result<Value> {
        let conn = match session.conn.take() {
            Some(conn) => conn,
            None => {
                let addr = &self.addrs[session.index];
                let conn = self.connector.connect(addr, &self.timeouts).await?;
                debug!("Connected to sentinel {}", addr);
                conn
            }
        };

        session.conn.insert(conn).request(args).await
    }
}

impl<C: Connector> std::fmt::Debug for SentinelClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentinelClient")
            .field("addrs", &self.addrs)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}
