//! Probe command implementation

use super::list::format_size;
use nordump_core::session::Session;
use nordump_core::transport::Transport;

/// Connect and report what answered on the bus
pub fn run_probe<T: Transport>(session: &mut Session<T>) -> Result<(), Box<dyn std::error::Error>> {
    let identified = session.connect()?;

    match session.identity() {
        Some(chip) if identified => {
            println!("Found flash chip:");
            println!("  Vendor:      {}", chip.vendor);
            println!("  Name:        {}", chip.name);
            println!(
                "  Size:        {} ({} bytes)",
                format_size(chip.capacity_bytes),
                chip.capacity_bytes
            );
            println!("  Page size:   {} bytes", chip.page_size_bytes);
            println!("  Sector size: {} bytes", chip.erase_sector_bytes);
            println!(
                "  JEDEC ID:    {:02X} {:04X}",
                chip.manufacturer_code, chip.device_code
            );
        }
        _ => {
            println!("Bus {} is working but the chip is not recognised.", session.bus());
            println!("Use --length to read it anyway.");
        }
    }

    session.disconnect();
    Ok(())
}
