//! Flash chip type definitions

use core::fmt;

/// Geometry and identity of a recognised flash chip
///
/// Created once per successful identification and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipIdentity {
    /// Vendor name (e.g., "Winbond")
    pub vendor: &'static str,
    /// Chip name (e.g., "W25Q128.V")
    pub name: &'static str,
    /// JEDEC manufacturer ID
    pub manufacturer_code: u8,
    /// JEDEC device ID (memory type and capacity bytes, big-endian)
    pub device_code: u16,
    /// Total size in bytes
    pub capacity_bytes: u32,
    /// Page size in bytes (program granularity)
    pub page_size_bytes: u32,
    /// Smallest erase sector in bytes
    pub erase_sector_bytes: u32,
}

impl ChipIdentity {
    /// Combined 24-bit lookup key: `(manufacturer << 16) | device`
    pub const fn key(&self) -> u32 {
        jedec_key(self.manufacturer_code, self.device_code)
    }

    /// Check if an address range lies within this chip
    pub fn contains_range(&self, addr: u32, len: u32) -> bool {
        addr as u64 + len as u64 <= self.capacity_bytes as u64
    }

    /// Check the geometry invariant: capacity is a positive multiple of the
    /// sector size, which is itself a multiple of the page size
    pub fn has_consistent_geometry(&self) -> bool {
        self.page_size_bytes > 0
            && self.erase_sector_bytes > 0
            && self.capacity_bytes > 0
            && self.erase_sector_bytes % self.page_size_bytes == 0
            && self.capacity_bytes % self.erase_sector_bytes == 0
    }
}

impl fmt::Display for ChipIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (JEDEC {:02X} {:04X}, {} KiB)",
            self.vendor,
            self.name,
            self.manufacturer_code,
            self.device_code,
            self.capacity_bytes / 1024
        )
    }
}

/// Combine a manufacturer and device code into the 24-bit table key
pub const fn jedec_key(manufacturer: u8, device: u16) -> u32 {
    ((manufacturer as u32) << 16) | device as u32
}
