//! nordump-linux-spi - Linux spidev transport
//!
//! This crate provides a `Transport` backed by the Linux `/dev/spidevX.Y`
//! character devices, where X is the bus number and Y is the chip select.
//!
//! # Example
//!
//! ```no_run
//! use nordump_core::read::NoProgress;
//! use nordump_core::session::{ReadRequest, Session};
//! use nordump_core::transport::BusAddress;
//! use nordump_linux_spi::{LinuxSpi, LinuxSpiConfig};
//!
//! let bus = BusAddress::new(0, 0);
//! let mut session = Session::new(LinuxSpi::new(LinuxSpiConfig::new(bus)), bus);
//! session.connect()?;
//! let image = session.read(ReadRequest::whole_chip(), &mut NoProgress)?;
//! println!("read {} bytes", image.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with nordump CLI
//!
//! ```bash
//! # Probe the chip on bus 0, chip select 0
//! nordump probe -p linux_spi:bus=0,cs=0
//!
//! # Explicit device node and a 4 MHz clock
//! nordump read -p linux_spi:dev=/dev/spidev1.0,spispeed=4000 -o flash.bin
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with spidev support enabled (`CONFIG_SPI_SPIDEV`)
//! - Read/write access to `/dev/spidevX.Y` device
//! - May require adding user to `spi` group or using udev rules

pub mod device;
pub mod error;

// Re-exports
pub use device::{parse_options, LinuxSpi, LinuxSpiConfig};
pub use error::{LinuxSpiError, Result};

/// Build a boxed Linux SPI transport and the bus address to open
///
/// This is a convenience function for use in the CLI transport dispatch.
///
/// # Example Options
///
/// - `bus=0,cs=0` - bus number and chip select
/// - `dev=/dev/spidev0.0` - explicit device path
/// - `spispeed=4000` - Optional: speed in kHz (default: 2000)
pub fn open_linux_spi(
    options: &[(&str, &str)],
) -> std::result::Result<
    (
        Box<dyn nordump_core::transport::Transport + Send>,
        nordump_core::transport::BusAddress,
    ),
    Box<dyn std::error::Error>,
> {
    let config = parse_options(options)?;
    let bus = config.bus;
    let transport: Box<dyn nordump_core::transport::Transport + Send> =
        Box::new(LinuxSpi::new(config));
    Ok((transport, bus))
}
