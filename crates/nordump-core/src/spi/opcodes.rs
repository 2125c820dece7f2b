//! Standard JEDEC SPI flash opcodes used by the read pipeline

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC ID (manufacturer + device ID)
pub const RDID: u8 = 0x9F;

/// Number of bytes returned by `RDID`: manufacturer + 16-bit device ID
pub const RDID_LEN: usize = 3;

// ============================================================================
// Read commands - 3-byte address
// ============================================================================

/// Read Data (up to ~33 MHz, no dummy byte)
pub const READ: u8 = 0x03;
/// Fast Read (with dummy byte, up to max frequency)
pub const FAST_READ: u8 = 0x0B;

/// Dummy byte clocked out after the fast-read address
pub const DUMMY_BYTE: u8 = 0x00;
