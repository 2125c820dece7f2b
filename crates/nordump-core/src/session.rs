//! Session manager - connection lifecycle and the guarded read entry points
//!
//! A `Session` exclusively owns the transport and the cached chip identity.
//! All methods take `&mut self`, so calls on one session are serialized by
//! the borrow checker; there is no internal locking.

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use crate::chip::{self, ChipIdentity};
use crate::error::{ConnectFailure, Error, InvalidRequest, Result};
use crate::read::{self, ReadPolicy, ReadProgress};
use crate::transport::{BusAddress, BusConfig, Transport};
use maybe_async::maybe_async;

/// Connection state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No bus handle is held
    #[default]
    Disconnected,
    /// The bus passed its self-test; identity is `None` if the chip is unknown
    Connected {
        /// Chip resolved at connect time
        identity: Option<ChipIdentity>,
    },
}

/// A logical read: start address and optional length
///
/// When `length` is `None` it defaults to the capacity of the identified chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    /// First address to read
    pub start_address: u32,
    /// Number of bytes to read, or `None` for the chip capacity
    pub length: Option<u32>,
}

impl ReadRequest {
    /// Read `length` bytes from `start_address`
    pub const fn new(start_address: u32, length: u32) -> Self {
        Self {
            start_address,
            length: Some(length),
        }
    }

    /// Read the whole identified chip
    pub const fn whole_chip() -> Self {
        Self {
            start_address: 0,
            length: None,
        }
    }
}

/// One controller session over a transport
pub struct Session<T: Transport> {
    transport: T,
    bus: BusAddress,
    policy: ReadPolicy,
    state: SessionState,
}

impl<T: Transport> Session<T> {
    /// Create a disconnected session with the default read policy
    pub fn new(transport: T, bus: BusAddress) -> Self {
        Self::with_policy(transport, bus, ReadPolicy::default())
    }

    /// Create a disconnected session with a custom read policy
    pub fn with_policy(transport: T, bus: BusAddress, policy: ReadPolicy) -> Self {
        Self {
            transport,
            bus,
            policy,
            state: SessionState::Disconnected,
        }
    }

    /// Current connection state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether `connect` has succeeded and `disconnect` has not been called since
    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected { .. })
    }

    /// Identity cached at connect time, if connected and recognised
    pub fn identity(&self) -> Option<&ChipIdentity> {
        match &self.state {
            SessionState::Connected { identity } => identity.as_ref(),
            SessionState::Disconnected => None,
        }
    }

    /// Bus this session opens
    pub fn bus(&self) -> BusAddress {
        self.bus
    }

    /// Read policy used for every read
    pub fn policy(&self) -> &ReadPolicy {
        &self.policy
    }

    /// Replace the read policy
    pub fn set_policy(&mut self, policy: ReadPolicy) {
        self.policy = policy;
    }

    /// Get a reference to the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Open and configure the bus, self-test it, then identify the chip
    ///
    /// Returns `Ok(true)` if the chip was identified and `Ok(false)` if the
    /// bus works but the chip is unknown; both leave the session connected.
    /// On failure the transport is released and the session stays
    /// disconnected. Connecting an already connected session releases the
    /// old handle first.
    #[maybe_async]
    pub async fn connect(&mut self) -> Result<bool> {
        if self.is_connected() {
            log::debug!("Already connected to bus {}, reconnecting", self.bus);
            self.disconnect();
        }

        log::debug!("Opening bus {}", self.bus);
        if let Err(e) = self.transport.open(self.bus) {
            log::warn!("Failed to open bus {}: {}", self.bus, e);
            self.transport.close();
            return Err(ConnectFailure::Open.into());
        }

        if let Err(e) = self.transport.configure(&BusConfig::FLASH_DEFAULT) {
            log::warn!("Failed to configure bus {}: {}", self.bus, e);
            self.transport.close();
            return Err(ConnectFailure::Configure.into());
        }

        match chip::read_jedec_id(&mut self.transport).await {
            Ok((manufacturer, device)) => {
                log::debug!("Self-test passed: JEDEC ID {:02X} {:04X}", manufacturer, device)
            }
            Err(failure) => {
                log::warn!("Bus {} self-test failed: {}", self.bus, failure);
                self.transport.close();
                return Err(failure.into());
            }
        }

        self.state = SessionState::Connected { identity: None };
        let identity = chip::identify(&mut self.transport).await;
        self.state = SessionState::Connected { identity };

        Ok(identity.is_some())
    }

    /// Release the transport and go back to `Disconnected`
    ///
    /// Safe to call any number of times.
    pub fn disconnect(&mut self) {
        if self.is_connected() {
            log::debug!("Closing bus {}", self.bus);
        }
        self.transport.close();
        self.state = SessionState::Disconnected;
    }

    /// Fail with `NotConnected` unless the session is connected
    ///
    /// Returns the cached identity, which may be unknown.
    pub fn require_connected(&self) -> Result<Option<&ChipIdentity>> {
        match &self.state {
            SessionState::Connected { identity } => Ok(identity.as_ref()),
            SessionState::Disconnected => Err(Error::NotConnected),
        }
    }

    /// Validate a request against the session and resolve its length
    ///
    /// Returns `(start, length)` ready for the chunked reader.
    pub fn resolve(&self, request: ReadRequest) -> Result<(u32, u32)> {
        let identity = self.require_connected()?;
        let start = request.start_address;

        let length = match (request.length, identity) {
            (Some(0), _) => return Err(InvalidRequest::ZeroLength.into()),
            (Some(length), _) => length,
            (None, Some(chip)) => chip.capacity_bytes,
            (None, None) => return Err(InvalidRequest::UnknownLength.into()),
        };

        if let Some(chip) = identity {
            if !chip.contains_range(start, length) {
                return Err(InvalidRequest::OutOfBounds {
                    start,
                    length,
                    limit: chip.capacity_bytes,
                }
                .into());
            }
        }

        read::check_range(start, length)?;
        Ok((start, length))
    }

    /// Read a range into a new buffer of exactly the resolved length
    #[cfg(feature = "alloc")]
    #[maybe_async]
    pub async fn read<P: ReadProgress + ?Sized>(
        &mut self,
        request: ReadRequest,
        progress: &mut P,
    ) -> Result<Vec<u8>> {
        let (start, length) = self.resolve(request)?;
        read::read(&mut self.transport, start, length, &self.policy, progress).await
    }

    /// Fill `buf` starting at `start`
    ///
    /// On `ChunkReadFailed { bytes_read, .. }`, `buf[..bytes_read]` is valid.
    #[maybe_async]
    pub async fn read_into<P: ReadProgress + ?Sized>(
        &mut self,
        start: u32,
        buf: &mut [u8],
        progress: &mut P,
    ) -> Result<()> {
        let length = u32::try_from(buf.len()).map_err(|_| InvalidRequest::BufferTooLarge)?;
        self.resolve(ReadRequest::new(start, length))?;
        read::read_into(&mut self.transport, start, buf, &self.policy, progress).await
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        if self.is_connected() {
            self.disconnect();
        }
    }
}
