//! nordump-dummy - In-memory flash emulator for testing
//!
//! This crate provides a dummy transport that emulates a SPI NOR flash chip
//! in memory. It answers JEDEC ID and read commands, and can inject bus
//! faults so the retry and abort paths of the read pipeline can be exercised
//! without real hardware.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::{string::String, vec, vec::Vec};

use nordump_core::spi::opcodes;
use nordump_core::transport::{BusAddress, BusConfig, Transport, TransportError};

/// Configuration for the dummy flash
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// JEDEC manufacturer ID
    pub manufacturer_id: u8,
    /// JEDEC device ID
    pub device_id: u16,
    /// Flash size in bytes
    pub size: usize,
    /// Largest response a single transfer may carry
    pub max_read_len: usize,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            manufacturer_id: 0xEF, // Winbond
            device_id: 0x4018,     // W25Q128FV
            size: 16 * 1024 * 1024,
            max_read_len: 64 * 1024,
        }
    }
}

/// Kind of fault to inject on a read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The transfer returns a bus error
    Error,
    /// The transfer delivers only half of the requested bytes
    Short,
}

#[derive(Debug, Clone, Copy)]
struct ReadFault {
    address: u32,
    remaining: u32,
    kind: FaultKind,
}

/// One transfer as seen by the emulator
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    /// Command bytes clocked out
    pub command: Vec<u8>,
    /// Response bytes requested
    pub requested: usize,
    /// Response bytes delivered, or `None` if the transfer failed
    pub delivered: Option<usize>,
}

/// Dummy flash transport
///
/// Emulates a flash chip in memory for testing purposes.
#[cfg(feature = "alloc")]
pub struct DummyFlash {
    config: DummyConfig,
    data: Vec<u8>,
    bus: Option<BusAddress>,
    bus_config: Option<BusConfig>,
    fail_open: bool,
    id_len: Option<usize>,
    faults: Vec<ReadFault>,
    log: Vec<TransferRecord>,
    delayed_us: u64,
}

#[cfg(feature = "alloc")]
impl DummyFlash {
    /// Create a new dummy flash with the given configuration, erased to 0xFF
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![0xFF; config.size];
        Self {
            config,
            data,
            bus: None,
            bus_config: None,
            fail_open: false,
            id_len: None,
            faults: Vec::new(),
            log: Vec::new(),
            delayed_us: 0,
        }
    }

    /// Create a new dummy flash with default configuration (W25Q128FV)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a dummy flash with pre-filled data
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = core::cmp::min(initial_data.len(), flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Whether the emulated bus is currently open
    pub fn is_open(&self) -> bool {
        self.bus.is_some()
    }

    /// Bus parameters applied by the last `configure`
    pub fn bus_config(&self) -> Option<&BusConfig> {
        self.bus_config.as_ref()
    }

    /// Make every `open` fail
    pub fn fail_open(&mut self) {
        self.fail_open = true;
    }

    /// Truncate JEDEC ID responses to `len` bytes
    pub fn truncate_id(&mut self, len: usize) {
        self.id_len = Some(len);
    }

    /// Make the next `count` reads starting exactly at `address` fail
    pub fn inject_read_fault(&mut self, address: u32, count: u32, kind: FaultKind) {
        self.faults.push(ReadFault {
            address,
            remaining: count,
            kind,
        });
    }

    /// All transfers issued so far
    pub fn transfers(&self) -> &[TransferRecord] {
        &self.log
    }

    /// Transfers that used the given opcode
    pub fn transfers_with(&self, opcode: u8) -> impl Iterator<Item = &TransferRecord> {
        self.log
            .iter()
            .filter(move |t| t.command.first() == Some(&opcode))
    }

    /// Forget the transfer log
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Total delay requested through `delay_us`
    pub fn delayed_us(&self) -> u64 {
        self.delayed_us
    }

    fn take_fault(&mut self, address: u32) -> Option<FaultKind> {
        let fault = self
            .faults
            .iter_mut()
            .find(|f| f.address == address && f.remaining > 0)?;
        fault.remaining -= 1;
        Some(fault.kind)
    }

    fn handle_read_id(&self, response: &mut [u8]) -> usize {
        let id = [
            self.config.manufacturer_id,
            (self.config.device_id >> 8) as u8,
            self.config.device_id as u8,
        ];
        let len = self
            .id_len
            .unwrap_or(id.len())
            .min(id.len())
            .min(response.len());
        response[..len].copy_from_slice(&id[..len]);
        len
    }

    fn handle_read(
        &mut self,
        command: &[u8],
        dummy_bytes: usize,
        response: &mut [u8],
    ) -> Result<usize, TransportError> {
        if command.len() != 4 + dummy_bytes {
            return Err(TransportError::Unsupported);
        }
        let addr = u32::from_be_bytes([0, command[1], command[2], command[3]]);

        let len = match self.take_fault(addr) {
            Some(FaultKind::Error) => {
                log::debug!("dummy: injected error at 0x{:06X}", addr);
                return Err(TransportError::TransferFailed);
            }
            Some(FaultKind::Short) => {
                log::debug!("dummy: injected short read at 0x{:06X}", addr);
                response.len() / 2
            }
            None => response.len(),
        };

        // Addresses wrap at the chip size like a real part
        if !self.data.is_empty() {
            for (i, byte) in response[..len].iter_mut().enumerate() {
                *byte = self.data[(addr as usize + i) % self.data.len()];
            }
        }
        Ok(len)
    }
}

#[cfg(feature = "alloc")]
impl Transport for DummyFlash {
    fn open(&mut self, bus: BusAddress) -> Result<(), TransportError> {
        if self.fail_open {
            return Err(TransportError::OpenFailed);
        }
        log::debug!("dummy: opened bus {}", bus);
        self.bus = Some(bus);
        Ok(())
    }

    fn configure(&mut self, config: &BusConfig) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::NotOpen);
        }
        self.bus_config = Some(*config);
        Ok(())
    }

    fn transfer(&mut self, command: &[u8], response: &mut [u8]) -> Result<usize, TransportError> {
        let result = if !self.is_open() {
            Err(TransportError::NotOpen)
        } else {
            match command.first().copied() {
                Some(opcodes::RDID) => Ok(self.handle_read_id(response)),
                Some(opcodes::READ) => self.handle_read(command, 0, response),
                Some(opcodes::FAST_READ) => self.handle_read(command, 1, response),
                _ => Err(TransportError::Unsupported),
            }
        };

        self.log.push(TransferRecord {
            command: command.to_vec(),
            requested: response.len(),
            delivered: result.as_ref().ok().copied(),
        });
        result
    }

    fn close(&mut self) {
        self.bus = None;
        self.bus_config = None;
    }

    fn max_read_len(&self) -> usize {
        self.config.max_read_len
    }

    fn delay_us(&mut self, us: u32) {
        // No delay needed for in-memory operations
        self.delayed_us += us as u64;
    }
}

/// Parse transport options from a list of key-value pairs
///
/// Recognised keys: `size` (bytes, hex with `0x` or suffixed with `K`/`M`),
/// `mfr` and `dev` (hex JEDEC codes).
#[cfg(feature = "alloc")]
pub fn parse_options(options: &[(&str, &str)]) -> Result<DummyConfig, String> {
    let mut config = DummyConfig::default();

    for (key, value) in options {
        match *key {
            "size" => config.size = parse_size(value)?,
            "mfr" => {
                config.manufacturer_id = u8::from_str_radix(strip_hex(value), 16)
                    .map_err(|_| alloc::format!("Invalid mfr value: {}", value))?;
            }
            "dev" => {
                config.device_id = u16::from_str_radix(strip_hex(value), 16)
                    .map_err(|_| alloc::format!("Invalid dev value: {}", value))?;
            }
            "image" => {} // handled by the caller, which can read files
            _ => log::warn!("dummy: Unknown option: {}={}", key, value),
        }
    }

    Ok(config)
}

#[cfg(feature = "alloc")]
fn strip_hex(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

#[cfg(feature = "alloc")]
fn parse_size(s: &str) -> Result<usize, String> {
    let invalid = || alloc::format!("Invalid size value: {}", s);
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return usize::from_str_radix(hex, 16).map_err(|_| invalid());
    }
    let (digits, multiplier) = match s.as_bytes().last() {
        Some(b'K' | b'k') => (&s[..s.len() - 1], 1024),
        Some(b'M' | b'm') => (&s[..s.len() - 1], 1024 * 1024),
        _ => (s, 1),
    };
    digits
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nordump_core::read::{NoProgress, ReadPolicy, MAX_TRANSFER_SIZE};
    use nordump_core::session::{ReadRequest, Session};
    use nordump_core::{ConnectFailure, Error};

    const MIB: usize = 1024 * 1024;

    fn patterned(config: DummyConfig) -> DummyFlash {
        let data: Vec<u8> = (0..config.size).map(|i| (i * 7 + (i >> 12)) as u8).collect();
        DummyFlash::with_data(config, &data)
    }

    /// 1 MiB Winbond part
    fn w25q80() -> DummyConfig {
        DummyConfig {
            device_id: 0x4014,
            size: MIB,
            ..Default::default()
        }
    }

    fn fast_reads(flash: &DummyFlash) -> Vec<(u32, usize)> {
        flash
            .transfers_with(opcodes::FAST_READ)
            .map(|t| {
                let addr = u32::from_be_bytes([0, t.command[1], t.command[2], t.command[3]]);
                (addr, t.requested)
            })
            .collect()
    }

    #[test]
    fn test_dump_whole_chip() {
        let flash = patterned(w25q80());
        let expected = flash.data().to_vec();
        let mut session = Session::new(flash, BusAddress::new(0, 0));

        assert_eq!(session.connect(), Ok(true));
        assert_eq!(session.identity().unwrap().name, "W25Q80.V");
        assert_eq!(
            session.transport().bus_config(),
            Some(&BusConfig::FLASH_DEFAULT)
        );

        let image = session.read(ReadRequest::whole_chip(), &mut NoProgress).unwrap();
        assert_eq!(image, expected);
        assert_eq!(fast_reads(session.transport()).len(), MIB / MAX_TRANSFER_SIZE);
    }

    #[test]
    fn test_one_past_max_transfer_is_two_transactions() {
        let mut session = Session::new(patterned(w25q80()), BusAddress::default());
        session.connect().unwrap();

        let len = MAX_TRANSFER_SIZE as u32 + 1;
        let data = session.read(ReadRequest::new(0x100, len), &mut NoProgress).unwrap();

        assert_eq!(data.len(), MAX_TRANSFER_SIZE + 1);
        assert_eq!(&data[..], &session.transport().data()[0x100..0x100 + len as usize]);
        assert_eq!(
            fast_reads(session.transport()),
            vec![(0x100, MAX_TRANSFER_SIZE), (0x1100, 1)]
        );
    }

    #[test]
    fn test_recovers_after_two_failed_attempts() {
        let mut flash = patterned(w25q80());
        flash.inject_read_fault(0x2000, 1, FaultKind::Error);
        flash.inject_read_fault(0x2000, 1, FaultKind::Short);
        let expected = flash.data()[..0x4000].to_vec();
        let mut session = Session::new(flash, BusAddress::default());
        session.connect().unwrap();

        let data = session
            .read(ReadRequest::new(0, 0x4000), &mut NoProgress)
            .unwrap();

        assert_eq!(data, expected);
        let at_fault = fast_reads(session.transport())
            .iter()
            .filter(|(addr, _)| *addr == 0x2000)
            .count();
        assert_eq!(at_fault, 3);
        assert_eq!(session.transport().delayed_us(), 200_000);
    }

    #[test]
    fn test_aborts_after_three_failed_attempts() {
        let mut flash = patterned(w25q80());
        flash.inject_read_fault(0x3000, 3, FaultKind::Error);
        let mut session = Session::new(flash, BusAddress::default());
        session.connect().unwrap();

        let mut seen = Vec::new();
        let err = session
            .read(ReadRequest::new(0x1000, 0x8000), &mut |done: usize, total: usize| {
                seen.push((done, total))
            })
            .unwrap_err();

        assert_eq!(
            err,
            Error::ChunkReadFailed {
                address: 0x3000,
                bytes_read: 0x2000
            }
        );
        assert_eq!(seen, vec![(0x1000, 0x8000), (0x2000, 0x8000)]);
        // Nothing past the failing chunk was attempted
        assert_eq!(fast_reads(session.transport()).last(), Some(&(0x3000, 0x1000)));

        // Resuming from the failing address works once the fault clears
        let rest = session
            .read(ReadRequest::new(0x3000, 0x6000), &mut NoProgress)
            .unwrap();
        assert_eq!(&rest[..], &session.transport().data()[0x3000..0x9000]);
    }

    #[test]
    fn test_unknown_chip_requires_length() {
        let config = DummyConfig {
            manufacturer_id: 0x00,
            device_id: 0x0000,
            size: 64 * 1024,
            ..Default::default()
        };
        let mut session = Session::new(patterned(config), BusAddress::default());

        assert_eq!(session.connect(), Ok(false));
        assert!(matches!(
            session.read(ReadRequest::whole_chip(), &mut NoProgress),
            Err(Error::InvalidRequest(_))
        ));
        let data = session
            .read(ReadRequest::new(0, 64 * 1024), &mut NoProgress)
            .unwrap();
        assert_eq!(&data[..], session.transport().data());
    }

    #[test]
    fn test_broken_self_test() {
        let mut flash = DummyFlash::new_default();
        flash.truncate_id(1);
        let mut session = Session::new(flash, BusAddress::default());

        assert_eq!(
            session.connect(),
            Err(Error::Connect(ConnectFailure::SelfTest { received: Some(1) }))
        );
        assert!(!session.transport().is_open());
    }

    #[test]
    fn test_open_failure() {
        let mut flash = DummyFlash::new_default();
        flash.fail_open();
        let mut session = Session::new(flash, BusAddress::default());

        assert_eq!(session.connect(), Err(Error::Connect(ConnectFailure::Open)));
        assert!(session.transport().transfers().is_empty());
    }

    #[test]
    fn test_read_before_connect_touches_nothing() {
        let mut session = Session::new(DummyFlash::new_default(), BusAddress::default());

        assert_eq!(
            session.read(ReadRequest::new(0, 16), &mut NoProgress),
            Err(Error::NotConnected)
        );
        assert!(session.transport().transfers().is_empty());
    }

    #[test]
    fn test_plain_read_sees_edited_data() {
        let mut flash = DummyFlash::new(w25q80());
        flash.data_mut()[0x10..0x14].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        flash.open(BusAddress::default()).unwrap();

        let mut buf = [0u8; 6];
        let n = flash
            .transfer(&[opcodes::READ, 0x00, 0x00, 0x0F], &mut buf)
            .unwrap();
        assert_eq!(n, 6);
        assert_eq!(buf, [0xFF, 0xDE, 0xAD, 0xBE, 0xEF, 0xFF]);

        // READ carries no dummy byte
        assert_eq!(
            flash.transfer(&[opcodes::READ, 0, 0, 0, 0], &mut buf),
            Err(TransportError::Unsupported)
        );
        assert_eq!(flash.transfers().len(), 2);

        flash.clear_log();
        assert!(flash.transfers().is_empty());
    }

    #[test]
    fn test_disconnect_closes_bus() {
        let mut session = Session::new(DummyFlash::new_default(), BusAddress::default());
        session.connect().unwrap();
        assert!(session.transport().is_open());

        session.disconnect();
        assert!(!session.transport().is_open());

        // The emulator refuses transfers on a closed bus
        let mut buf = [0u8; 3];
        assert_eq!(
            session.transport_mut().transfer(&[opcodes::RDID], &mut buf),
            Err(TransportError::NotOpen)
        );
    }

    #[test]
    fn test_small_transport_limit() {
        let config = DummyConfig {
            max_read_len: 1024,
            ..w25q80()
        };
        let mut session = Session::with_policy(
            patterned(config),
            BusAddress::default(),
            ReadPolicy::default(),
        );
        session.connect().unwrap();

        session
            .read(ReadRequest::new(0, 3000), &mut NoProgress)
            .unwrap();
        assert_eq!(
            fast_reads(session.transport()),
            vec![(0, 1024), (1024, 1024), (2048, 952)]
        );
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("size", "4M"), ("mfr", "0xc2"), ("dev", "2016")]).unwrap();
        assert_eq!(config.size, 4 * MIB);
        assert_eq!(config.manufacturer_id, 0xC2);
        assert_eq!(config.device_id, 0x2016);

        assert_eq!(parse_options(&[("size", "0x8000")]).unwrap().size, 0x8000);
        assert!(parse_options(&[("size", "big")]).is_err());
        assert!(parse_options(&[("size", "99999999999999999M")]).is_err());
    }
}
