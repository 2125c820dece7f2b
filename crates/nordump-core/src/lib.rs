//! nordump-core - Core read pipeline for SPI NOR flash dumping
//!
//! This crate turns a raw byte-oriented SPI transport into a verified image
//! of a flash chip. It identifies the chip via JEDEC ID, splits a read request
//! into bus-sized fast-read transactions, retries transient failures and
//! reports progress. A read either returns exactly the requested bytes or a
//! typed error naming the address where it stopped.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable heap allocation for reads that return an owned image
//! - `is_sync` - Compile the transport trait and read pipeline as blocking code
//!
//! # Example
//!
//! ```ignore
//! use nordump_core::session::{ReadRequest, Session};
//! use nordump_core::transport::{BusAddress, Transport};
//!
//! fn dump<T: Transport>(transport: T) -> nordump_core::Result<Vec<u8>> {
//!     let mut session = Session::new(transport, BusAddress::new(0, 0));
//!     session.connect()?;
//!     session.read(ReadRequest::whole_chip(), &mut |done, total| {
//!         println!("{}/{}", done, total);
//!     })
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
// Allow async fn in traits - we use maybe-async for dual sync/async support
#![allow(async_fn_in_trait)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod chip;
pub mod error;
pub mod read;
pub mod session;
pub mod spi;
pub mod transport;

#[cfg(test)]
mod testing;

pub use error::{ConnectFailure, Error, InvalidRequest, Result};
