//! Transport traits and abstractions
//!
//! This module defines the raw bus capability every programmer backend
//! must provide for the read pipeline to drive it.

mod traits;

pub use traits::*;
