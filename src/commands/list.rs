//! List commands implementation

use crate::transports;
use nordump_core::chip;

/// List all supported transports
pub fn list_transports() {
    println!("Supported transports:");
    println!();
    for t in transports::available_transports() {
        println!("  {:10} - {}", t.name, t.description);
        if !t.aliases.is_empty() {
            println!("  {:10}   aliases: {}", "", t.aliases.join(", "));
        }
    }
}

/// List all supported chips
pub fn list_chips(vendor_filter: Option<&str>) {
    println!("Supported flash chips:");
    println!();
    println!("{:<12} {:<20} {:>10} {:>10}", "Vendor", "Name", "Size", "JEDEC ID");
    println!("{}", "-".repeat(60));

    for chip in chip::chips_by_vendor(vendor_filter.unwrap_or("")) {
        let size_str = format_size(chip.capacity_bytes);
        let jedec_str = format!("{:02X} {:04X}", chip.manufacturer_code, chip.device_code);

        println!(
            "{:<12} {:<20} {:>10} {:>10}",
            chip.vendor, chip.name, size_str, jedec_str
        );
    }
}

pub(crate) fn format_size(bytes: u32) -> String {
    if bytes >= 1024 * 1024 && bytes % (1024 * 1024) == 0 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 && bytes % 1024 == 0 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(16 * 1024 * 1024), "16 MiB");
        assert_eq!(format_size(64 * 1024), "64 KiB");
        assert_eq!(format_size(1500), "1500 B");
    }
}
