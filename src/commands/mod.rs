//! CLI command implementations
//!
//! Every command that touches hardware runs against a `Session` built from
//! the transport string; the session is disconnected when it goes out of
//! scope.

mod list;
mod probe;
mod read;

pub use list::{list_chips, list_transports};
pub use probe::run_probe;
pub use read::{run_read, ReadOptions};
