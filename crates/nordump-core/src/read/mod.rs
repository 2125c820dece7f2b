//! Chunked read pipeline
//!
//! Uses `maybe_async` to support both sync and async modes:
//! - With `is_sync` feature: blocking/synchronous
//! - Without `is_sync` feature: async, with the inter-retry delay as the
//!   suspension point

mod chunked;
mod policy;
mod progress;

#[cfg(feature = "alloc")]
pub use chunked::{read, read_chunk};
pub use chunked::{check_range, read_chunk_into, read_into};
pub use policy::{ReadPolicy, DEFAULT_ATTEMPTS, DEFAULT_RETRY_DELAY_US, MAX_TRANSFER_SIZE};
pub use progress::{NoProgress, ReadProgress};
