//! Cluster configuration for the pool adapter

use crate::error::{Result, SentinelError};
use crate::types::Timeouts;
use sentinelconfig::{ConfigOption, Count, Duration as ConfDuration, SentinelConf};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-operation sentinel timeout. Sentinel queries should fail fast.
pub const DEFAULT_SENTINEL_TIMEOUT: Duration = Duration::from_millis(500);

/// Default per-operation data node timeout
pub const DEFAULT_REDIS_TIMEOUT: Duration = Duration::from_secs(3);

/// How strictly data node timeouts are validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Only the data node connect timeout must be non-zero
    #[default]
    Lenient,
    /// Connect, read and write data node timeouts must all be non-zero
    Strict,
}

/// Settings handed to the external pool alongside the dial/validate callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSettings {
    /// Maximum number of idle connections kept by the pool
    pub max_idle: usize,
    /// Idle connections older than this are closed by the pool
    pub idle_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_idle: 10,
            idle_timeout: Duration::from_secs(240),
        }
    }
}

/// Everything needed to build a master-tracking pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Name of the monitored master, as known to the sentinels
    pub master_name: String,

    /// Sentinel endpoints (`host:port`), tried in order
    pub sentinel_addrs: Vec<String>,

    /// Timeouts for sentinel connections. Keep these short.
    pub sentinel_timeouts: Timeouts,

    /// Timeouts for data node connections
    pub redis_timeouts: Timeouts,

    #[serde(default)]
    pub pool: PoolSettings,

    #[serde(default)]
    pub validation: ValidationPolicy,
}

impl ClusterConfig {
    pub fn new(master_name: impl Into<String>, sentinel_addrs: Vec<String>) -> Self {
        Self {
            master_name: master_name.into(),
            sentinel_addrs,
            sentinel_timeouts: Timeouts::uniform(DEFAULT_SENTINEL_TIMEOUT),
            redis_timeouts: Timeouts::uniform(DEFAULT_REDIS_TIMEOUT),
            pool: PoolSettings::default(),
            validation: ValidationPolicy::default(),
        }
    }

    /// Check required fields. Performs no I/O.
    pub fn validate(&self) -> Result<()> {
        if self.master_name.is_empty() {
            return Err(SentinelError::InvalidConfig("master name is empty".into()));
        }
        if self.sentinel_addrs.is_empty() {
            return Err(SentinelError::InvalidConfig(
                "no sentinel addresses provided".into(),
            ));
        }
        if !self.sentinel_timeouts.all_nonzero() {
            return Err(SentinelError::InvalidConfig(
                "sentinel connect, read and write timeouts must be non-zero".into(),
            ));
        }
        if self.redis_timeouts.connect.is_zero() {
            return Err(SentinelError::InvalidConfig(
                "redis connect timeout must be non-zero".into(),
            ));
        }
        if self.validation == ValidationPolicy::Strict && !self.redis_timeouts.all_nonzero() {
            return Err(SentinelError::InvalidConfig(
                "redis read and write timeouts must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Build a configuration from a parsed config file.
    ///
    /// `master name` and `sentinels` are required; everything else falls back
    /// to the defaults. The result is not validated.
    pub fn from_conf(conf: &SentinelConf) -> Result<Self> {
        let mut config = Self::new(conf.master_name()?, conf.sentinel_addrs()?);
        config.apply_conf(conf)?;
        Ok(config)
    }

    /// Overlay timeouts, pool settings and validation policy from `conf`.
    /// Options missing from the file reset to their defaults.
    pub fn apply_conf(&mut self, conf: &SentinelConf) -> Result<()> {
        let sections = SentinelConf::DEFAULT_SECTIONS;

        self.sentinel_timeouts = read_timeouts(conf, "sentinel", DEFAULT_SENTINEL_TIMEOUT)?;
        self.redis_timeouts = read_timeouts(conf, "redis", DEFAULT_REDIS_TIMEOUT)?;

        let defaults = PoolSettings::default();
        self.pool = PoolSettings {
            max_idle: ConfigOption::new("pool max idle", Count(defaults.max_idle as u64))
                .get(conf, sections)?
                .0 as usize,
            idle_timeout: ConfigOption::new("pool idle timeout", ConfDuration(defaults.idle_timeout))
                .get(conf, sections)?
                .0,
        };

        self.validation = if conf
            .get_typed::<bool>(sections, "strict timeouts")?
            .unwrap_or(false)
        {
            ValidationPolicy::Strict
        } else {
            ValidationPolicy::Lenient
        };

        Ok(())
    }
}

/// Read `<prefix> connect|read|write timeout`, with `<prefix> timeout` as a
/// shared fallback for all three
fn read_timeouts(conf: &SentinelConf, prefix: &str, default: Duration) -> Result<Timeouts> {
    let sections = SentinelConf::DEFAULT_SECTIONS;
    let shared = conf
        .get_typed::<ConfDuration>(sections, &format!("{} timeout", prefix))?
        .map(|d| d.0)
        .unwrap_or(default);

    let read_one = |what: &str| -> Result<Duration> {
        Ok(conf
            .get_typed::<ConfDuration>(sections, &format!("{} {} timeout", prefix, what))?
            .map(|d| d.0)
            .unwrap_or(shared))
    };

    Ok(Timeouts::new(
        read_one("connect")?,
        read_one("read")?,
        read_one("write")?,
    ))
}
