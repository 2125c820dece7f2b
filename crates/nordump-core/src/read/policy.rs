//! Read pipeline tuning

/// Largest number of bytes requested in one bus transaction
///
/// A throughput/memory tradeoff, independent of the chip.
pub const MAX_TRANSFER_SIZE: usize = 4096;

/// Attempts per chunk before a read is aborted
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Fixed pause between attempts on the same chunk (100 ms)
pub const DEFAULT_RETRY_DELAY_US: u32 = 100_000;

/// Chunking and retry parameters for a read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPolicy {
    /// Upper bound on bytes per transaction
    pub max_transfer_size: usize,
    /// Total attempts per chunk (at least 1)
    pub attempts: u32,
    /// Delay after each failed attempt that will be retried
    pub retry_delay_us: u32,
}

impl Default for ReadPolicy {
    fn default() -> Self {
        Self {
            max_transfer_size: MAX_TRANSFER_SIZE,
            attempts: DEFAULT_ATTEMPTS,
            retry_delay_us: DEFAULT_RETRY_DELAY_US,
        }
    }
}

impl ReadPolicy {
    /// Set the per-transaction ceiling (clamped to at least one byte)
    pub fn with_max_transfer_size(mut self, size: usize) -> Self {
        self.max_transfer_size = size.max(1);
        self
    }

    /// Set the number of attempts per chunk (clamped to at least one)
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Set the delay between attempts
    pub fn with_retry_delay_us(mut self, us: u32) -> Self {
        self.retry_delay_us = us;
        self
    }

    /// Chunk size actually used against a transport with the given limit
    pub fn chunk_size(&self, transport_limit: usize) -> usize {
        self.max_transfer_size.min(transport_limit).max(1)
    }
}
