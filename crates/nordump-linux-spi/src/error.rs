//! Error types for Linux SPI operations

use nordump_core::transport::TransportError;
use thiserror::Error;

/// Linux SPI specific errors
#[derive(Debug, Error)]
pub enum LinuxSpiError {
    /// Failed to open device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Operation needs an open device
    #[error("Device is not open")]
    NotOpen,

    /// Failed to set SPI mode
    #[error("Failed to set SPI mode to {mode:#04x}: {source}")]
    SetModeFailed {
        mode: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set bits per word
    #[error("Failed to set bits per word to {bits}: {source}")]
    SetBitsPerWordFailed {
        bits: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set clock speed
    #[error("Failed to set clock speed to {speed} Hz: {source}")]
    SetSpeedFailed {
        speed: u32,
        #[source]
        source: std::io::Error,
    },

    /// SPI transfer failed
    #[error("SPI transfer failed: {0}")]
    TransferFailed(#[source] std::io::Error),

    /// Transfer does not fit the kernel buffer
    #[error("Transfer of {len} bytes exceeds kernel buffer of {max} bytes")]
    TransferTooLarge { len: usize, max: usize },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for Linux SPI operations
pub type Result<T> = std::result::Result<T, LinuxSpiError>;

impl From<LinuxSpiError> for TransportError {
    fn from(err: LinuxSpiError) -> Self {
        match err {
            LinuxSpiError::OpenFailed { .. } => TransportError::OpenFailed,
            LinuxSpiError::NotOpen => TransportError::NotOpen,
            LinuxSpiError::SetModeFailed { .. }
            | LinuxSpiError::SetBitsPerWordFailed { .. }
            | LinuxSpiError::SetSpeedFailed { .. } => TransportError::ConfigureFailed,
            LinuxSpiError::TransferFailed(_) | LinuxSpiError::TransferTooLarge { .. } => {
                TransportError::TransferFailed
            }
            LinuxSpiError::InvalidParameter(_) => TransportError::Unsupported,
        }
    }
}
