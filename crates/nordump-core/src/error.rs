//! Error types for nordump-core
//!
//! This module provides a no_std compatible error type that covers every
//! failure a caller of the read pipeline can observe. Transport-level faults
//! are folded into these variants at the smallest scope and never surface
//! as raw bus errors.

use core::fmt;

/// Why `Session::connect` failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectFailure {
    /// The transport could not open the bus device
    Open,
    /// The transport rejected the bus parameters
    Configure,
    /// The JEDEC ID self-test did not return exactly 3 bytes
    SelfTest {
        /// Number of bytes the self-test actually received (`None` on a bus fault)
        received: Option<usize>,
    },
}

/// Why a read request was rejected before touching the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidRequest {
    /// A length of zero was requested
    ZeroLength,
    /// No length was given and the chip capacity is unknown
    UnknownLength,
    /// The range extends past the chip capacity or the 24-bit address space
    OutOfBounds {
        /// Requested start address
        start: u32,
        /// Requested length
        length: u32,
        /// Highest exclusive end address allowed
        limit: u32,
    },
    /// The destination buffer length does not fit a 32-bit read length
    BufferTooLarge,
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The bus could not be opened or failed its connectivity self-test
    Connect(ConnectFailure),
    /// A read was attempted before a successful connect
    NotConnected,
    /// The read request is invalid for this session
    InvalidRequest(InvalidRequest),
    /// A chunk exhausted its retry budget and the read was aborted
    ChunkReadFailed {
        /// Start address of the chunk that could not be read
        address: u32,
        /// Bytes successfully read before that chunk
        bytes_read: usize,
    },
}

impl fmt::Display for ConnectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "could not open bus"),
            Self::Configure => write!(f, "could not configure bus"),
            Self::SelfTest { received: Some(n) } => {
                write!(f, "self-test failed: expected 3 ID bytes, got {}", n)
            }
            Self::SelfTest { received: None } => {
                write!(f, "self-test failed: JEDEC ID transfer error")
            }
        }
    }
}

impl fmt::Display for InvalidRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroLength => write!(f, "read length must not be zero"),
            Self::UnknownLength => {
                write!(f, "no length given and chip capacity is unknown")
            }
            Self::OutOfBounds {
                start,
                length,
                limit,
            } => write!(
                f,
                "range 0x{:08X}+0x{:X} exceeds limit 0x{:08X}",
                start, length, limit
            ),
            Self::BufferTooLarge => write!(f, "buffer exceeds 32-bit read length"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(failure) => write!(f, "connect failed: {}", failure),
            Self::NotConnected => write!(f, "session is not connected"),
            Self::InvalidRequest(reason) => write!(f, "invalid read request: {}", reason),
            Self::ChunkReadFailed {
                address,
                bytes_read,
            } => write!(
                f,
                "read aborted at 0x{:08X} after {} bytes",
                address, bytes_read
            ),
        }
    }
}

impl From<InvalidRequest> for Error {
    fn from(reason: InvalidRequest) -> Self {
        Self::InvalidRequest(reason)
    }
}

impl From<ConnectFailure> for Error {
    fn from(failure: ConnectFailure) -> Self {
        Self::Connect(failure)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
