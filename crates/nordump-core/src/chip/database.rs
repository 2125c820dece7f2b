//! Built-in chip table
//!
//! Identity lookup is keyed by the 24-bit JEDEC ID. The table is fixed at
//! compile time; chips not listed here resolve to "unknown".

use super::types::{jedec_key, ChipIdentity};

const KIB: u32 = 1024;
const MIB: u32 = 1024 * 1024;

/// Standard page size for 25-series NOR flash
const PAGE_256: u32 = 256;
/// Standard smallest erase sector for 25-series NOR flash
const SECTOR_4K: u32 = 4 * KIB;

const fn chip(
    vendor: &'static str,
    name: &'static str,
    manufacturer_code: u8,
    device_code: u16,
    capacity_bytes: u32,
) -> ChipIdentity {
    ChipIdentity {
        vendor,
        name,
        manufacturer_code,
        device_code,
        capacity_bytes,
        page_size_bytes: PAGE_256,
        erase_sector_bytes: SECTOR_4K,
    }
}

/// All chips the resolver recognises
pub static CHIPS: &[ChipIdentity] = &[
    // Winbond
    chip("Winbond", "W25Q80.V", 0xEF, 0x4014, MIB),
    chip("Winbond", "W25Q16.V", 0xEF, 0x4015, 2 * MIB),
    chip("Winbond", "W25Q32.V", 0xEF, 0x4016, 4 * MIB),
    // Capacity pinned to 4 MiB; parts answering EF4017 are read as 4 MiB devices
    chip("Winbond", "W25Q64.V (4 MiB map)", 0xEF, 0x4017, 4 * MIB),
    chip("Winbond", "W25Q128.V", 0xEF, 0x4018, 16 * MIB),
    chip("Winbond", "W25Q32.W", 0xEF, 0x6016, 4 * MIB),
    // Macronix
    chip("Macronix", "MX25L8005", 0xC2, 0x2014, MIB),
    chip("Macronix", "MX25L1605", 0xC2, 0x2015, 2 * MIB),
    chip("Macronix", "MX25L3205", 0xC2, 0x2016, 4 * MIB),
    chip("Macronix", "MX25L6405", 0xC2, 0x2017, 8 * MIB),
    chip("Macronix", "MX25L12805D", 0xC2, 0x2018, 16 * MIB),
    // GigaDevice
    chip("GigaDevice", "GD25Q16", 0xC8, 0x4015, 2 * MIB),
    chip("GigaDevice", "GD25Q32", 0xC8, 0x4016, 4 * MIB),
    chip("GigaDevice", "GD25Q64", 0xC8, 0x4017, 8 * MIB),
    chip("GigaDevice", "GD25Q128", 0xC8, 0x4018, 16 * MIB),
    // Eon
    chip("Eon", "EN25Q32", 0x1C, 0x3016, 4 * MIB),
    chip("Eon", "EN25Q64", 0x1C, 0x3017, 8 * MIB),
    // Spansion
    chip("Spansion", "S25FL116K", 0x01, 0x4015, 2 * MIB),
    chip("Spansion", "S25FL132K", 0x01, 0x4016, 4 * MIB),
    // ISSI
    chip("ISSI", "IS25LP064", 0x9D, 0x6017, 8 * MIB),
    chip("ISSI", "IS25LP128", 0x9D, 0x6018, 16 * MIB),
    // Micron
    chip("Micron", "N25Q064..3E", 0x20, 0xBA17, 8 * MIB),
    chip("Micron", "N25Q128..3E", 0x20, 0xBA18, 16 * MIB),
];

/// Find a chip by its JEDEC manufacturer and device codes
pub fn lookup(manufacturer: u8, device: u16) -> Option<&'static ChipIdentity> {
    let key = jedec_key(manufacturer, device);
    CHIPS.iter().find(|chip| chip.key() == key)
}

/// Iterate over chips whose vendor contains `filter` (case-insensitive)
pub fn chips_by_vendor<'a>(filter: &'a str) -> impl Iterator<Item = &'static ChipIdentity> + 'a {
    CHIPS.iter().filter(move |chip| {
        filter.is_empty()
            || chip
                .vendor
                .as_bytes()
                .windows(filter.len())
                .any(|w| w.eq_ignore_ascii_case(filter.as_bytes()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_geometry_is_consistent() {
        for chip in CHIPS {
            assert!(chip.has_consistent_geometry(), "{} {}", chip.vendor, chip.name);
        }
    }

    #[test]
    fn test_table_keys_are_unique() {
        for (i, a) in CHIPS.iter().enumerate() {
            for b in &CHIPS[i + 1..] {
                assert_ne!(a.key(), b.key(), "{} vs {}", a.name, b.name);
            }
        }
    }

    #[test]
    fn test_lookup() {
        let chip = lookup(0xEF, 0x4018).unwrap();
        assert_eq!(chip.name, "W25Q128.V");
        assert_eq!(chip.capacity_bytes, 16 * MIB);

        assert!(lookup(0x00, 0x0000).is_none());
        assert!(lookup(0xFF, 0xFFFF).is_none());
    }

    #[test]
    fn test_chips_by_vendor() {
        assert!(chips_by_vendor("winbond").all(|c| c.vendor == "Winbond"));
        assert_eq!(chips_by_vendor("GIGA").count(), 4);
        assert_eq!(chips_by_vendor("").count(), CHIPS.len());
    }
}
