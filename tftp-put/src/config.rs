//! Per-transfer configuration.
//!
//! A [`TransferConfig`] holds the two knobs that shape every wait in the
//! sender: how long one attempt may wait for a reply, and how many attempts a
//! single step (the request, or one data block) may make before giving up.
//! Logging is not configured here; the crate writes through the `log` facade
//! and the binary installs `env_logger`.

use std::time::Duration;

/// Per-attempt wait before a request or block is retransmitted.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Total attempts per step, first transmission included.
pub const DEFAULT_RETRY_COUNT: u32 = 5;

/// Well-known TFTP server port.
pub const DEFAULT_PORT: u16 = 69;

/// Adjustable timeout and retry parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// How long one attempt waits for a conclusive reply.
    pub timeout: Duration,
    /// Total attempts per step.  Always at least 1.
    pub retry_count: u32,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retry_count: DEFAULT_RETRY_COUNT,
        }
    }
}

impl TransferConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// A count of 0 is raised to 1: every step sends at least once.
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count.max(1);
        self
    }
}
