//! Linux SPI device implementation
//!
//! This module provides the `LinuxSpi` struct that implements the `Transport`
//! trait using Linux's spidev interface.

use crate::error::{LinuxSpiError, Result};

use nordump_core::spi::MAX_HEADER_LEN;
use nordump_core::transport::{BusAddress, BusConfig, Transport, TransportError};

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;

/// Path to kernel spidev buffer size parameter
const BUF_SIZE_SYSFS: &str = "/sys/module/spidev/parameters/bufsiz";

/// Linux spidev ioctl constants
mod ioctl {
    use nix::ioctl_write_ptr;

    // SPI ioctl magic number
    const SPI_IOC_MAGIC: u8 = b'k';

    // SPI ioctl type numbers
    const SPI_IOC_TYPE_MODE: u8 = 1;
    const SPI_IOC_TYPE_LSB_FIRST: u8 = 2;
    const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3;
    const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4;

    ioctl_write_ptr!(spi_ioc_wr_mode, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE, u8);
    ioctl_write_ptr!(
        spi_ioc_wr_lsb_first,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_LSB_FIRST,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_bits_per_word,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_BITS_PER_WORD,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_max_speed_hz,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MAX_SPEED_HZ,
        u32
    );

    // SPI_IOC_MESSAGE(n) = _IOW(SPI_IOC_MAGIC, 0, char[n * sizeof(struct spi_ioc_transfer)])

    /// Size of struct spi_ioc_transfer
    pub const SPI_IOC_TRANSFER_SIZE: usize = 32;

    /// Calculate ioctl number for SPI_IOC_MESSAGE(n)
    pub fn spi_ioc_message(n: u8) -> libc::c_ulong {
        let size = (n as usize) * SPI_IOC_TRANSFER_SIZE;
        // _IOC(dir, type, nr, size) = ((dir)<<30)|((size)<<16)|((type)<<8)|(nr), _IOC_WRITE = 1
        ((1u32 << 30) | ((size as u32) << 16) | ((SPI_IOC_MAGIC as u32) << 8)) as libc::c_ulong
    }
}

/// SPI transfer structure for ioctl
/// This must match the kernel's struct spi_ioc_transfer layout
#[repr(C)]
#[derive(Debug, Default, Clone)]
struct SpiIocTransfer {
    tx_buf: u64,          // __u64 tx_buf
    rx_buf: u64,          // __u64 rx_buf
    len: u32,             // __u32 len
    speed_hz: u32,        // __u32 speed_hz
    delay_usecs: u16,     // __u16 delay_usecs
    bits_per_word: u8,    // __u8 bits_per_word
    cs_change: u8,        // __u8 cs_change
    tx_nbits: u8,         // __u8 tx_nbits
    rx_nbits: u8,         // __u8 rx_nbits
    word_delay_usecs: u8, // __u8 word_delay_usecs
    _pad: u8,             // padding
}

/// Configuration for a Linux SPI transport
#[derive(Debug, Clone, Default)]
pub struct LinuxSpiConfig {
    /// Bus and chip select, used to derive `/dev/spidevB.D`
    pub bus: BusAddress,
    /// Explicit device path overriding the derived one
    pub device: Option<String>,
    /// Clock speed in Hz overriding the session's bus parameters
    pub speed_hz: Option<u32>,
}

impl LinuxSpiConfig {
    /// Create a configuration for the given bus and chip select
    pub fn new(bus: BusAddress) -> Self {
        Self {
            bus,
            ..Default::default()
        }
    }

    /// Use an explicit device path
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Force the SPI clock speed in Hz
    pub fn with_speed(mut self, speed_hz: u32) -> Self {
        self.speed_hz = Some(speed_hz);
        self
    }

    /// Device node to open for `bus`
    pub fn device_path(&self, bus: BusAddress) -> String {
        match &self.device {
            Some(path) => path.clone(),
            None => format!("/dev/spidev{}.{}", bus.bus, bus.device),
        }
    }
}

/// Linux SPI transport using spidev interface
///
/// The device node is opened by `Transport::open` and released by
/// `Transport::close`; constructing a `LinuxSpi` touches nothing.
pub struct LinuxSpi {
    config: LinuxSpiConfig,
    /// File handle for spidev device, `None` while closed
    file: Option<File>,
    /// Maximum kernel buffer size
    max_kernel_buf_size: usize,
    /// Current speed in Hz
    speed_hz: u32,
    /// Current bits per word
    bits_per_word: u8,
}

impl LinuxSpi {
    /// Create a closed transport
    pub fn new(config: LinuxSpiConfig) -> Self {
        Self {
            config,
            file: None,
            max_kernel_buf_size: get_max_kernel_buf_size(),
            speed_hz: BusConfig::FLASH_DEFAULT.clock_hz,
            bits_per_word: BusConfig::FLASH_DEFAULT.word_size,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &LinuxSpiConfig {
        &self.config
    }

    /// Get current speed setting
    pub fn speed_hz(&self) -> u32 {
        self.speed_hz
    }

    fn fd(&self) -> Result<i32> {
        self.file
            .as_ref()
            .map(|f| f.as_raw_fd())
            .ok_or(LinuxSpiError::NotOpen)
    }

    fn open_device(&mut self, bus: BusAddress) -> Result<()> {
        let path = self.config.device_path(bus);
        log::debug!("linux_spi: Opening device {}", path);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| LinuxSpiError::OpenFailed { path, source: e })?;

        self.file = Some(file);
        Ok(())
    }

    fn apply(&mut self, config: &BusConfig) -> Result<()> {
        let fd = self.fd()?;

        let mode = config.mode.clock_mode();
        unsafe {
            ioctl::spi_ioc_wr_mode(fd, &mode).map_err(|e| LinuxSpiError::SetModeFailed {
                mode,
                source: std::io::Error::from_raw_os_error(e as i32),
            })?;
        }

        let lsb_first = config.mode.lsb_first() as u8;
        unsafe {
            ioctl::spi_ioc_wr_lsb_first(fd, &lsb_first).map_err(|e| {
                LinuxSpiError::SetModeFailed {
                    mode: config.mode.bits(),
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        let bits = config.word_size;
        unsafe {
            ioctl::spi_ioc_wr_bits_per_word(fd, &bits).map_err(|e| {
                LinuxSpiError::SetBitsPerWordFailed {
                    bits,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        let speed = self.config.speed_hz.unwrap_or(config.clock_hz);
        unsafe {
            ioctl::spi_ioc_wr_max_speed_hz(fd, &speed).map_err(|e| {
                LinuxSpiError::SetSpeedFailed {
                    speed,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        self.speed_hz = speed;
        self.bits_per_word = bits;

        log::info!(
            "linux_spi: Configured {} (mode={}, lsb_first={}, speed={} kHz)",
            self.config.device_path(self.config.bus),
            mode,
            lsb_first,
            speed / 1000
        );
        Ok(())
    }

    /// Perform an SPI transfer
    ///
    /// This implements the SPI_IOC_MESSAGE ioctl with two transfers under one
    /// chip select: a transmit-only phase for the command followed by a
    /// receive-only phase for the response.
    fn spi_transfer(&mut self, write_data: &[u8], read_buf: &mut [u8]) -> Result<usize> {
        let fd = self.fd()?;

        if write_data.is_empty() {
            return Err(LinuxSpiError::InvalidParameter(
                "Write data cannot be empty".into(),
            ));
        }
        let total = write_data.len() + read_buf.len();
        if total > self.max_kernel_buf_size {
            return Err(LinuxSpiError::TransferTooLarge {
                len: total,
                max: self.max_kernel_buf_size,
            });
        }

        let phase = |tx_buf: u64, rx_buf: u64, len: usize| SpiIocTransfer {
            tx_buf,
            rx_buf,
            len: len as u32,
            speed_hz: self.speed_hz,
            bits_per_word: self.bits_per_word,
            ..Default::default()
        };

        let mut transfers = vec![phase(write_data.as_ptr() as u64, 0, write_data.len())];
        if !read_buf.is_empty() {
            transfers.push(phase(0, read_buf.as_mut_ptr() as u64, read_buf.len()));
        }

        let ioctl_num = ioctl::spi_ioc_message(transfers.len() as u8);
        let ret = unsafe { libc::ioctl(fd, ioctl_num, transfers.as_ptr()) };

        if ret < 0 {
            return Err(LinuxSpiError::TransferFailed(
                std::io::Error::last_os_error(),
            ));
        }

        // The kernel reports the total number of bytes moved in both phases
        let received = (ret as usize).saturating_sub(write_data.len());
        Ok(received.min(read_buf.len()))
    }
}

impl Transport for LinuxSpi {
    fn open(&mut self, bus: BusAddress) -> std::result::Result<(), TransportError> {
        self.close();
        self.open_device(bus).map_err(|e| {
            log::error!("linux_spi: {}", e);
            e.into()
        })
    }

    fn configure(&mut self, config: &BusConfig) -> std::result::Result<(), TransportError> {
        self.apply(config).map_err(|e| {
            log::error!("linux_spi: {}", e);
            e.into()
        })
    }

    fn transfer(
        &mut self,
        command: &[u8],
        response: &mut [u8],
    ) -> std::result::Result<usize, TransportError> {
        self.spi_transfer(command, response).map_err(|e| {
            log::debug!("linux_spi: {}", e);
            e.into()
        })
    }

    fn close(&mut self) {
        if self.file.take().is_some() {
            log::debug!("linux_spi: Closed device");
        }
    }

    fn max_read_len(&self) -> usize {
        // Account for the longest command header
        self.max_kernel_buf_size.saturating_sub(MAX_HEADER_LEN)
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(us as u64));
    }
}

/// Read the maximum kernel buffer size from sysfs, or use page size as fallback
fn get_max_kernel_buf_size() -> usize {
    if let Ok(content) = std::fs::read_to_string(BUF_SIZE_SYSFS) {
        if let Ok(size) = content.trim().parse::<usize>() {
            if size > 0 {
                log::debug!("linux_spi: Using buffer size {} from sysfs", size);
                return size;
            }
        }
        log::warn!("linux_spi: Invalid buffer size in {}", BUF_SIZE_SYSFS);
    } else {
        log::debug!("linux_spi: Cannot read {}, using page size", BUF_SIZE_SYSFS);
    }

    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
    log::debug!("linux_spi: Using page size {} as buffer size", page_size);
    page_size
}

/// Parse transport options from a list of key-value pairs
///
/// Either `dev=/dev/spidevB.D` or `bus=<n>` (with optional `cs=<n>`) selects
/// the device; `spispeed` is in kHz.
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<LinuxSpiConfig, String> {
    let mut config = LinuxSpiConfig::default();
    let mut have_bus = false;

    for (key, value) in options {
        match *key {
            "dev" => {
                if let Some(bus) = parse_spidev_path(value) {
                    config.bus = bus;
                }
                config.device = Some(value.to_string());
            }
            "bus" => {
                config.bus.bus = value
                    .parse()
                    .map_err(|_| format!("Invalid bus value: {}", value))?;
                have_bus = true;
            }
            "cs" => {
                config.bus.device = value
                    .parse()
                    .map_err(|_| format!("Invalid cs value: {}", value))?;
            }
            "spispeed" => {
                let speed_khz: u32 = value
                    .parse()
                    .map_err(|_| format!("Invalid spispeed value: {}", value))?;
                if speed_khz == 0 {
                    return Err("spispeed must be non-zero".to_string());
                }
                let speed_hz = speed_khz
                    .checked_mul(1000)
                    .ok_or_else(|| format!("spispeed out of range: {}", value))?;
                config.speed_hz = Some(speed_hz);
            }
            _ => {
                log::warn!("linux_spi: Unknown option: {}={}", key, value);
            }
        }
    }

    if config.device.is_none() && !have_bus {
        return Err("No device specified. Use bus=<n>,cs=<n> or dev=/dev/spidevX.Y".to_string());
    }

    Ok(config)
}

/// Extract the bus address from a `/dev/spidevB.D` path
fn parse_spidev_path(path: &str) -> Option<BusAddress> {
    let name = path.rsplit('/').next()?.strip_prefix("spidev")?;
    let (bus, device) = name.split_once('.')?;
    Some(BusAddress::new(bus.parse().ok()?, device.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_struct_matches_kernel_layout() {
        assert_eq!(
            std::mem::size_of::<SpiIocTransfer>(),
            ioctl::SPI_IOC_TRANSFER_SIZE
        );
        // _IOW('k', 0, char[64])
        assert_eq!(ioctl::spi_ioc_message(2), 0x4040_6B00);
    }

    #[test]
    fn test_parse_bus_and_cs() {
        let config = parse_options(&[("bus", "1"), ("cs", "2"), ("spispeed", "8000")]).unwrap();
        assert_eq!(config.bus, BusAddress::new(1, 2));
        assert_eq!(config.speed_hz, Some(8_000_000));
        assert_eq!(config.device_path(config.bus), "/dev/spidev1.2");
    }

    #[test]
    fn test_parse_device_path() {
        let config = parse_options(&[("dev", "/dev/spidev0.1")]).unwrap();
        assert_eq!(config.bus, BusAddress::new(0, 1));
        assert_eq!(config.speed_hz, None);
        assert_eq!(config.device_path(config.bus), "/dev/spidev0.1");

        // Non-standard names are used verbatim
        let config = parse_options(&[("dev", "/dev/flash0")]).unwrap();
        assert_eq!(config.device_path(BusAddress::new(3, 3)), "/dev/flash0");
    }

    #[test]
    fn test_parse_rejects_missing_device() {
        assert!(parse_options(&[]).is_err());
        assert!(parse_options(&[("spispeed", "1000")]).is_err());
        assert!(parse_options(&[("bus", "x")]).is_err());
        assert!(parse_options(&[("bus", "0"), ("spispeed", "0")]).is_err());
        assert!(parse_options(&[("bus", "0"), ("spispeed", "5000000")]).is_err());
    }

    #[test]
    fn test_closed_device_refuses_transfers() {
        let mut spi = LinuxSpi::new(LinuxSpiConfig::new(BusAddress::new(0, 0)));
        let mut buf = [0u8; 3];
        assert_eq!(
            spi.transfer(&[0x9F], &mut buf),
            Err(TransportError::NotOpen)
        );
        assert_eq!(
            spi.configure(&BusConfig::FLASH_DEFAULT),
            Err(TransportError::NotOpen)
        );
        spi.close();
        spi.close();
    }

    #[test]
    fn test_open_missing_device_fails() {
        let config = LinuxSpiConfig::new(BusAddress::new(0, 0)).with_device("/nonexistent/spidev9.9");
        let mut spi = LinuxSpi::new(config);
        assert_eq!(
            spi.open(BusAddress::new(9, 9)),
            Err(TransportError::OpenFailed)
        );
    }
}
