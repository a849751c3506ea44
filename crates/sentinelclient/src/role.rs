//! Role verification
//!
//! Redis client guidelines ask that every freshly established connection to a
//! master obtained from a sentinel be checked with `ROLE` before use, since the
//! sentinel's answer may already be stale during a failover.

use crate::connection::Connection;
use crate::error::{Result, SentinelError};
use crate::reply;

/// Ask the peer for its role name (`ROLE`, available since redis 2.8.12)
pub async fn query_role<C>(conn: &mut C) -> Result<String>
where
    C: Connection + ?Sized,
{
    let value = conn.request(&["ROLE"]).await?;
    reply::role_name(&value)
}

/// Succeed only if the peer currently reports exactly `expected` as its role
pub async fn check_role<C>(conn: &mut C, expected: &str) -> Result<()>
where
    C: Connection + ?Sized,
{
    let actual = query_role(conn).await?;
    if actual != expected {
        tracing::debug!("Role check failed: expected {}, got {}", expected, actual);
        return Err(SentinelError::RoleMismatch {
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}
