//! Scripted transport for unit tests
//!
//! Serves JEDEC ID and fast-read requests from an in-memory image unless a
//! scripted step is queued, in which case the next transfer consumes it.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::spi::opcodes;
use crate::transport::{BusAddress, BusConfig, Transport, TransportError};

enum Step {
    Respond(Vec<u8>),
    Fail,
}

pub(crate) struct ScriptedTransport {
    script: VecDeque<Step>,
    image: Vec<u8>,
    jedec: [u8; 3],
    max_read_len: usize,
    fail_open: bool,
    fail_configure: bool,
    pub(crate) opened: Option<BusAddress>,
    pub(crate) config: Option<BusConfig>,
    pub(crate) close_count: usize,
    commands: Vec<Vec<u8>>,
    requested: Vec<usize>,
    delays: Vec<u32>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self {
            script: VecDeque::new(),
            image: Vec::new(),
            jedec: [0xEF, 0x40, 0x17],
            max_read_len: usize::MAX,
            fail_open: false,
            fail_configure: false,
            opened: None,
            config: None,
            close_count: 0,
            commands: Vec::new(),
            requested: Vec::new(),
            delays: Vec::new(),
        }
    }

    /// Image whose byte at index `i` is a function of `i`, so misplaced
    /// chunks are detectable
    pub(crate) fn with_pattern(len: usize) -> Self {
        let mut transport = Self::new();
        transport.image = (0..len).map(|i| (i ^ (i >> 8) ^ (i >> 16)) as u8).collect();
        transport
    }

    pub(crate) fn set_jedec(&mut self, id: [u8; 3]) {
        self.jedec = id;
    }

    pub(crate) fn set_max_read_len(&mut self, len: usize) {
        self.max_read_len = len;
    }

    pub(crate) fn fail_open(&mut self) {
        self.fail_open = true;
    }

    pub(crate) fn fail_configure(&mut self) {
        self.fail_configure = true;
    }

    pub(crate) fn push_response(&mut self, bytes: &[u8]) {
        self.script.push_back(Step::Respond(bytes.to_vec()));
    }

    pub(crate) fn push_failure(&mut self) {
        self.script.push_back(Step::Fail);
    }

    pub(crate) fn image(&self) -> &[u8] {
        &self.image
    }

    pub(crate) fn commands(&self) -> &[Vec<u8>] {
        &self.commands
    }

    pub(crate) fn requested_lengths(&self) -> &[usize] {
        &self.requested
    }

    pub(crate) fn transfer_count(&self) -> usize {
        self.commands.len()
    }

    pub(crate) fn delays(&self) -> &[u32] {
        &self.delays
    }

    fn serve(&self, command: &[u8], response: &mut [u8]) -> Result<usize, TransportError> {
        match command.first() {
            Some(&opcodes::RDID) => {
                let n = response.len().min(self.jedec.len());
                response[..n].copy_from_slice(&self.jedec[..n]);
                Ok(n)
            }
            Some(&opcodes::FAST_READ) if command.len() == 5 => {
                let addr = u32::from_be_bytes([0, command[1], command[2], command[3]]) as usize;
                let addr = addr.min(self.image.len());
                let end = (addr + response.len()).min(self.image.len());
                let n = end.saturating_sub(addr);
                response[..n].copy_from_slice(&self.image[addr..addr + n]);
                Ok(n)
            }
            _ => Err(TransportError::Unsupported),
        }
    }
}

impl Transport for ScriptedTransport {
    fn open(&mut self, bus: BusAddress) -> Result<(), TransportError> {
        if self.fail_open {
            return Err(TransportError::OpenFailed);
        }
        self.opened = Some(bus);
        Ok(())
    }

    fn configure(&mut self, config: &BusConfig) -> Result<(), TransportError> {
        if self.fail_configure {
            return Err(TransportError::ConfigureFailed);
        }
        self.config = Some(*config);
        Ok(())
    }

    fn transfer(&mut self, command: &[u8], response: &mut [u8]) -> Result<usize, TransportError> {
        self.commands.push(command.to_vec());
        self.requested.push(response.len());

        match self.script.pop_front() {
            Some(Step::Respond(bytes)) => {
                let n = response.len().min(bytes.len());
                response[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            Some(Step::Fail) => Err(TransportError::TransferFailed),
            None => self.serve(command, response),
        }
    }

    fn close(&mut self) {
        self.opened = None;
        self.close_count += 1;
    }

    fn max_read_len(&self) -> usize {
        self.max_read_len
    }

    fn delay_us(&mut self, us: u32) {
        self.delays.push(us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spi::SpiCommand;

    #[test]
    fn test_read_past_image_end_is_empty() {
        let mut transport = ScriptedTransport::with_pattern(16);
        let (cmd, len) = SpiCommand::fast_read_3b(0x100).to_bytes();
        let mut buf = [0u8; 8];

        assert_eq!(transport.transfer(&cmd[..len], &mut buf), Ok(0));

        let (cmd, len) = SpiCommand::fast_read_3b(12).to_bytes();
        assert_eq!(transport.transfer(&cmd[..len], &mut buf), Ok(4));
        assert_eq!(&buf[..4], &transport.image()[12..]);
    }
}
