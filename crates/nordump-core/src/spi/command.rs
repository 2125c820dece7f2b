//! SPI command header encoding

use super::{opcodes, AddressWidth};

/// Longest header we ever build: opcode + 3 address bytes + 1 dummy byte
pub const MAX_HEADER_LEN: usize = 5;

/// The command phase of a single SPI transaction
///
/// Only the bytes clocked out before the response are described here; the
/// response length is passed separately to `Transport::transfer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiCommand {
    /// The opcode byte
    pub opcode: u8,

    /// Address (if any)
    pub address: Option<u32>,

    /// Address width
    pub address_width: AddressWidth,

    /// Number of dummy bytes after the address
    pub dummy_bytes: u8,
}

impl SpiCommand {
    /// Create a read register command with no address (e.g., RDID)
    pub const fn read_reg(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            address_width: AddressWidth::None,
            dummy_bytes: 0,
        }
    }

    /// Create a fast read command: 3-byte address followed by one dummy byte
    pub const fn fast_read_3b(addr: u32) -> Self {
        Self {
            opcode: opcodes::FAST_READ,
            address: Some(addr),
            address_width: AddressWidth::ThreeByte,
            dummy_bytes: 1,
        }
    }

    /// Number of header bytes produced by `encode`
    pub fn header_len(&self) -> usize {
        1 + self.address_width.bytes() as usize + self.dummy_bytes as usize
    }

    /// Encode opcode, address and dummy bytes into `buf`
    ///
    /// Returns the number of bytes written. `buf` must hold at least
    /// `header_len()` bytes.
    pub fn encode(&self, buf: &mut [u8]) -> usize {
        let len = self.header_len();
        buf[0] = self.opcode;
        let addr_len = self.address_width.bytes() as usize;
        if let Some(addr) = self.address {
            self.address_width.encode(addr, &mut buf[1..1 + addr_len]);
        }
        for byte in &mut buf[1 + addr_len..len] {
            *byte = opcodes::DUMMY_BYTE;
        }
        len
    }

    /// Encode into a fixed-size array, returning it with the used length
    pub fn to_bytes(&self) -> ([u8; MAX_HEADER_LEN], usize) {
        let mut buf = [0u8; MAX_HEADER_LEN];
        let len = self.encode(&mut buf);
        (buf, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_read_header() {
        let (buf, len) = SpiCommand::fast_read_3b(0x12_3456).to_bytes();
        assert_eq!(&buf[..len], &[0x0B, 0x12, 0x34, 0x56, 0x00]);
    }

    #[test]
    fn test_fast_read_drops_high_address_byte() {
        let (buf, len) = SpiCommand::fast_read_3b(0xAB_00_10_00).to_bytes();
        assert_eq!(&buf[..len], &[0x0B, 0x00, 0x10, 0x00, 0x00]);
    }

    #[test]
    fn test_read_reg_header() {
        let (buf, len) = SpiCommand::read_reg(opcodes::RDID).to_bytes();
        assert_eq!(&buf[..len], &[0x9F]);
    }
}
