//! Common types used throughout the sentinel client

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Role names reported by the `ROLE` command
pub mod role {
    pub const MASTER: &str = "master";
}

/// Per-connection deadlines
///
/// `connect` bounds connection setup. A request is bounded by `write + read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    pub connect: Duration,
    pub read: Duration,
    pub write: Duration,
}

impl Timeouts {
    pub const fn new(connect: Duration, read: Duration, write: Duration) -> Self {
        Self {
            connect,
            read,
            write,
        }
    }

    /// Same deadline for connect, read and write
    pub const fn uniform(timeout: Duration) -> Self {
        Self::new(timeout, timeout, timeout)
    }

    /// Deadline for one request/reply exchange
    pub fn request(&self) -> Duration {
        self.write.saturating_add(self.read)
    }

    pub fn all_nonzero(&self) -> bool {
        !self.connect.is_zero() && !self.read.is_zero() && !self.write.is_zero()
    }
}
