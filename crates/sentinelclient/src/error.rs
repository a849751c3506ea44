//! Error types for the sentinel client

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SentinelError>;

#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("All {attempts} sentinels failed")]
    SentinelsExhausted {
        attempts: usize,
        #[source]
        source: Box<SentinelError>,
    },

    #[error("Could not get master address")]
    MasterAddress(#[source] Box<SentinelError>),

    #[error("Dial error for {addr}")]
    Dial {
        addr: String,
        #[source]
        source: Box<SentinelError>,
    },

    #[error("Failed role check")]
    RoleCheck(#[source] Box<SentinelError>),

    #[error("Role mismatch: expected {expected:?}, got {actual:?}")]
    RoleMismatch { expected: String, actual: String },

    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error("Timeout after {after:?} waiting for {op}")]
    Timeout { op: &'static str, after: Duration },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] sentinelconfig::ConfigError),
}

impl SentinelError {
    /// True for errors raised while validating configuration, before any I/O
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SentinelError::InvalidConfig(_) | SentinelError::Config(_)
        )
    }

    /// True if a role mismatch sits anywhere in the wrapping chain
    pub fn is_role_mismatch(&self) -> bool {
        match self {
            SentinelError::RoleMismatch { .. } => true,
            SentinelError::RoleCheck(inner) | SentinelError::MasterAddress(inner) => {
                inner.is_role_mismatch()
            }
            SentinelError::Dial { source, .. }
            | SentinelError::SentinelsExhausted { source, .. } => source.is_role_mismatch(),
            _ => false,
        }
    }
}
