//! Retry budget shared by the request handshake and the block transmitter.
//!
//! Both steps follow the same shape: transmit, wait up to the configured
//! timeout, and on silence transmit the identical packet again until the
//! budget is spent.  A [`RetryBudget`] is created fresh for every step, so
//! exhausting it on one block never touches blocks already acknowledged.

/// Attempt counter for one logical step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    limit: u32,
    used: u32,
}

impl RetryBudget {
    /// A budget of `limit` total attempts (at least 1).
    pub fn new(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            used: 0,
        }
    }

    /// Consume one attempt.  Returns `false` once the budget is spent.
    pub fn try_attempt(&mut self) -> bool {
        if self.used >= self.limit {
            return false;
        }
        self.used += 1;
        true
    }

    /// Attempts consumed so far.
    pub fn used(&self) -> u32 {
        self.used
    }

    /// `true` when the current attempt is a retransmission.
    pub fn is_retry(&self) -> bool {
        self.used > 1
    }
}
