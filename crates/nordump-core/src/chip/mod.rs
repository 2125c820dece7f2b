//! Flash chip types, database and identification
//!
//! This module provides the `ChipIdentity` type, the built-in table of
//! known chips, and the JEDEC ID based resolver.

mod database;
mod identify;
mod types;

pub use database::{chips_by_vendor, lookup, CHIPS};
pub use identify::{identify, read_jedec_id};
pub use types::{jedec_key, ChipIdentity};
