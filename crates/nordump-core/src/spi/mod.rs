//! SPI types and command structures
//!
//! This module provides the command header encoding and the standard JEDEC
//! opcodes the read pipeline issues.

mod address;
mod command;
pub mod opcodes;

pub use address::AddressWidth;
pub use command::{SpiCommand, MAX_HEADER_LEN};
pub use opcodes::*;
