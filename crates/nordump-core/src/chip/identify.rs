//! JEDEC ID based chip identification

use super::database::lookup;
use super::types::ChipIdentity;
use crate::error::ConnectFailure;
use crate::spi::{opcodes, SpiCommand};
use crate::transport::Transport;
use maybe_async::maybe_async;

/// Read the JEDEC ID from a flash chip
///
/// Returns (manufacturer_id, device_id) on success. The exchange must yield
/// exactly 3 bytes; anything else is reported as a failed self-test with the
/// number of bytes received (`None` when the transfer itself failed).
#[maybe_async]
pub async fn read_jedec_id<T: Transport + ?Sized>(
    transport: &mut T,
) -> core::result::Result<(u8, u16), ConnectFailure> {
    let (cmd, cmd_len) = SpiCommand::read_reg(opcodes::RDID).to_bytes();
    let mut buf = [0u8; opcodes::RDID_LEN];

    match transport.transfer(&cmd[..cmd_len], &mut buf).await {
        Ok(opcodes::RDID_LEN) => {}
        Ok(n) => return Err(ConnectFailure::SelfTest { received: Some(n) }),
        Err(e) => {
            log::debug!("JEDEC ID transfer failed: {}", e);
            return Err(ConnectFailure::SelfTest { received: None });
        }
    }

    let manufacturer = buf[0];
    let device = u16::from_be_bytes([buf[1], buf[2]]);

    Ok((manufacturer, device))
}

/// Identify the attached chip
///
/// Issues a single JEDEC ID exchange and looks the result up in the built-in
/// table. Any transport failure, short response or unknown ID yields `None`;
/// no retries are attempted.
#[maybe_async]
pub async fn identify<T: Transport + ?Sized>(transport: &mut T) -> Option<ChipIdentity> {
    let (manufacturer, device) = match read_jedec_id(transport).await {
        Ok(id) => id,
        Err(e) => {
            log::warn!("Chip identification failed: {}", e);
            return None;
        }
    };

    match lookup(manufacturer, device) {
        Some(chip) => {
            log::info!("Found {}", chip);
            Some(*chip)
        }
        None => {
            log::warn!(
                "Unknown chip: JEDEC ID {:02X} {:04X}",
                manufacturer,
                device
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use alloc::vec;

    #[test]
    fn test_identify_known_chip() {
        let mut transport = ScriptedTransport::new();
        transport.push_response(&[0xEF, 0x40, 0x17]);

        let chip = identify(&mut transport).unwrap();
        assert_eq!(chip.manufacturer_code, 0xEF);
        assert_eq!(chip.device_code, 0x4017);
        assert_eq!(chip.capacity_bytes, 4 * 1024 * 1024);
        assert_eq!(chip.name, "W25Q64.V (4 MiB map)");
        assert_eq!(transport.commands(), &[vec![opcodes::RDID]]);
    }

    #[test]
    fn test_identify_blank_id_is_unknown() {
        let mut transport = ScriptedTransport::new();
        transport.push_response(&[0x00, 0x00, 0x00]);
        assert!(identify(&mut transport).is_none());

        transport.push_response(&[0xFF, 0xFF, 0xFF]);
        assert!(identify(&mut transport).is_none());
    }

    #[test]
    fn test_identify_transport_failure_is_unknown_without_retry() {
        let mut transport = ScriptedTransport::new();
        transport.push_failure();
        transport.push_response(&[0xEF, 0x40, 0x18]);

        assert!(identify(&mut transport).is_none());
        assert_eq!(transport.transfer_count(), 1);
        assert!(transport.delays().is_empty());
    }

    #[test]
    fn test_read_jedec_id_short_response() {
        let mut transport = ScriptedTransport::new();
        transport.push_response(&[0xEF, 0x40]);
        assert_eq!(
            read_jedec_id(&mut transport),
            Err(ConnectFailure::SelfTest { received: Some(2) })
        );
    }
}
