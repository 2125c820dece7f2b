//! Transport trait definitions
//!
//! These traits use `maybe_async` to support both sync and async modes.
//! - By default, traits are async (suitable for WASM/web, Embassy, tokio)
//! - With the `is_sync` feature, traits become synchronous

use bitflags::bitflags;
use core::fmt;
use maybe_async::maybe_async;

/// Which bus and chip select a transport should open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BusAddress {
    /// Bus (controller) number
    pub bus: u8,
    /// Device (chip select) number on that bus
    pub device: u8,
}

impl BusAddress {
    /// Create a bus address
    pub const fn new(bus: u8, device: u8) -> Self {
        Self { bus, device }
    }
}

impl fmt::Display for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.bus, self.device)
    }
}

bitflags! {
    /// SPI mode bits
    ///
    /// Bit values match the Linux spidev `SPI_*` mode flags so transports
    /// can pass them through unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SpiMode: u8 {
        /// Clock phase: sample on the trailing edge
        const CPHA      = 0x01;
        /// Clock polarity: idle high
        const CPOL      = 0x02;
        /// Shift the least significant bit first
        const LSB_FIRST = 0x08;
    }
}

impl SpiMode {
    /// SPI mode 0: CPOL=0, CPHA=0
    pub const MODE_0: Self = Self::empty();
    /// SPI mode 3: CPOL=1, CPHA=1
    pub const MODE_3: Self = Self::CPOL.union(Self::CPHA);

    /// Clock mode number (0-3) ignoring the bit order flag
    pub fn clock_mode(&self) -> u8 {
        self.bits() & (Self::CPHA.bits() | Self::CPOL.bits())
    }

    /// Whether words are shifted least significant bit first
    pub fn lsb_first(&self) -> bool {
        self.contains(Self::LSB_FIRST)
    }
}

impl Default for SpiMode {
    fn default() -> Self {
        Self::MODE_0
    }
}

/// Bus parameters applied by `Transport::configure`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// SPI clock rate in Hz
    pub clock_hz: u32,
    /// Clock mode and bit order
    pub mode: SpiMode,
    /// Bits per word
    pub word_size: u8,
}

impl BusConfig {
    /// Parameters used for every flash session: 2 MHz, mode 0, 8-bit words, MSB first
    pub const FLASH_DEFAULT: Self = Self {
        clock_hz: 2_000_000,
        mode: SpiMode::MODE_0,
        word_size: 8,
    };
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::FLASH_DEFAULT
    }
}

/// Transport-level fault
///
/// Transports map their own rich errors onto this small set at the trait
/// boundary. The core never passes these to its callers directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The transport has not been opened
    NotOpen,
    /// Opening the bus device failed
    OpenFailed,
    /// Applying bus parameters failed
    ConfigureFailed,
    /// A transfer failed on the bus
    TransferFailed,
    /// The transport does not support the request (e.g. too long)
    Unsupported,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOpen => write!(f, "transport not open"),
            Self::OpenFailed => write!(f, "failed to open transport"),
            Self::ConfigureFailed => write!(f, "failed to configure transport"),
            Self::TransferFailed => write!(f, "transfer failed"),
            Self::Unsupported => write!(f, "request not supported by transport"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TransportError {}

/// Raw SPI transport (sync or async depending on `is_sync` feature)
///
/// This is the only capability the core needs from a programmer: a
/// strictly request/response byte pipe with an open/close lifecycle.
///
/// ## Example
///
/// ```ignore
/// impl Transport for MyBridge {
///     fn open(&mut self, bus: BusAddress) -> Result<(), TransportError> {
///         self.handle = Some(self.usb.claim(bus.device).map_err(|_| TransportError::OpenFailed)?);
///         Ok(())
///     }
///
///     fn transfer(&mut self, command: &[u8], response: &mut [u8]) -> Result<usize, TransportError> {
///         let handle = self.handle.as_mut().ok_or(TransportError::NotOpen)?;
///         handle.write_read(command, response).map_err(|_| TransportError::TransferFailed)
///     }
///     // ...
/// }
/// ```
#[maybe_async(AFIT)]
pub trait Transport {
    /// Open the bus device at `bus`
    fn open(&mut self, bus: BusAddress) -> Result<(), TransportError>;

    /// Apply clock rate, mode, word size and bit order
    fn configure(&mut self, config: &BusConfig) -> Result<(), TransportError>;

    /// Clock out `command` then clock in up to `response.len()` bytes
    ///
    /// Chip select stays asserted for the whole transaction. Returns the
    /// number of response bytes actually received, which may be fewer than
    /// requested; callers decide whether a short response is a failure.
    async fn transfer(
        &mut self,
        command: &[u8],
        response: &mut [u8],
    ) -> Result<usize, TransportError>;

    /// Release the bus device. Must be safe to call when already closed.
    fn close(&mut self);

    /// Get the maximum number of response bytes a single transfer can carry
    fn max_read_len(&self) -> usize;

    /// Delay for the specified number of microseconds
    async fn delay_us(&mut self, us: u32);
}

// Blanket impl for boxed transports to allow trait objects (sync mode only)
// In async mode, traits with async fn are not object-safe
#[cfg(all(feature = "alloc", feature = "is_sync"))]
impl Transport for alloc::boxed::Box<dyn Transport + Send> {
    fn open(&mut self, bus: BusAddress) -> Result<(), TransportError> {
        (**self).open(bus)
    }

    fn configure(&mut self, config: &BusConfig) -> Result<(), TransportError> {
        (**self).configure(config)
    }

    fn transfer(&mut self, command: &[u8], response: &mut [u8]) -> Result<usize, TransportError> {
        (**self).transfer(command, response)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn max_read_len(&self) -> usize {
        (**self).max_read_len()
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}
