//! Chunked fast-read with bounded retries
//!
//! A logical `(address, length)` request is split into transactions of at
//! most `ReadPolicy::chunk_size` bytes. Each chunk gets a fixed number of
//! attempts separated by a fixed delay. The first chunk that exhausts its
//! attempts aborts the whole read: a gap would corrupt the linear image, so
//! nothing after it is attempted.

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use super::policy::ReadPolicy;
use super::progress::ReadProgress;
use crate::error::{Error, InvalidRequest, Result};
use crate::spi::{AddressWidth, SpiCommand};
use crate::transport::Transport;
use maybe_async::maybe_async;

/// Check that `[start, start + length)` is non-empty and fits 24-bit addressing
pub fn check_range(start: u32, length: u32) -> Result<()> {
    if length == 0 {
        return Err(InvalidRequest::ZeroLength.into());
    }
    let limit = AddressWidth::ThreeByte.max_size();
    if start as u64 + length as u64 > limit as u64 {
        return Err(InvalidRequest::OutOfBounds {
            start,
            length,
            limit,
        }
        .into());
    }
    Ok(())
}

/// Read one chunk into `buf`, retrying on failure
///
/// Sends `FAST_READ` with a 3-byte address and one dummy byte, and requires
/// exactly `buf.len()` response bytes. A transport error or a short
/// response counts as a failed attempt. Returns `false` once all attempts
/// are used up; the contents of `buf` are then unspecified.
#[maybe_async]
pub async fn read_chunk_into<T: Transport + ?Sized>(
    transport: &mut T,
    address: u32,
    buf: &mut [u8],
    policy: &ReadPolicy,
) -> bool {
    let (cmd, cmd_len) = SpiCommand::fast_read_3b(address).to_bytes();
    let attempts = policy.attempts.max(1);

    for attempt in 1..=attempts {
        match transport.transfer(&cmd[..cmd_len], buf).await {
            Ok(n) if n == buf.len() => return true,
            Ok(n) => log::warn!(
                "Short read at 0x{:06X}: got {} of {} bytes (attempt {}/{})",
                address,
                n,
                buf.len(),
                attempt,
                attempts
            ),
            Err(e) => log::warn!(
                "Read at 0x{:06X} failed: {} (attempt {}/{})",
                address,
                e,
                attempt,
                attempts
            ),
        }

        if attempt < attempts {
            transport.delay_us(policy.retry_delay_us).await;
        }
    }

    false
}

/// Read one chunk of `len` bytes, retrying on failure
///
/// Returns `None` once all attempts are used up.
#[cfg(feature = "alloc")]
#[maybe_async]
pub async fn read_chunk<T: Transport + ?Sized>(
    transport: &mut T,
    address: u32,
    len: usize,
    policy: &ReadPolicy,
) -> Option<Vec<u8>> {
    let mut buf = alloc::vec![0u8; len];
    if read_chunk_into(transport, address, &mut buf, policy).await {
        Some(buf)
    } else {
        None
    }
}

/// Fill `buf` with flash contents starting at `start`
///
/// On abort, `buf[..bytes_read]` holds valid data and the error names the
/// start of the chunk that could not be read.
#[maybe_async]
pub async fn read_into<T, P>(
    transport: &mut T,
    start: u32,
    buf: &mut [u8],
    policy: &ReadPolicy,
    progress: &mut P,
) -> Result<()>
where
    T: Transport + ?Sized,
    P: ReadProgress + ?Sized,
{
    let length = u32::try_from(buf.len()).map_err(|_| InvalidRequest::BufferTooLarge)?;
    check_range(start, length)?;

    let total = buf.len();
    let chunk_size = policy.chunk_size(transport.max_read_len());
    log::debug!(
        "Reading {} bytes from 0x{:06X} in chunks of {}",
        total,
        start,
        chunk_size
    );

    let mut done = 0usize;
    while done < total {
        let len = core::cmp::min(chunk_size, total - done);
        let address = start + done as u32;
        log::trace!("Chunk 0x{:06X}+{}", address, len);

        if !read_chunk_into(transport, address, &mut buf[done..done + len], policy).await {
            log::error!(
                "Giving up at 0x{:06X} after {} attempts ({} of {} bytes read)",
                address,
                policy.attempts.max(1),
                done,
                total
            );
            return Err(Error::ChunkReadFailed {
                address,
                bytes_read: done,
            });
        }

        done += len;
        progress.on_progress(done, total);
    }

    Ok(())
}

/// Read `length` bytes starting at `start` into a new buffer
#[cfg(feature = "alloc")]
#[maybe_async]
pub async fn read<T, P>(
    transport: &mut T,
    start: u32,
    length: u32,
    policy: &ReadPolicy,
    progress: &mut P,
) -> Result<Vec<u8>>
where
    T: Transport + ?Sized,
    P: ReadProgress + ?Sized,
{
    check_range(start, length)?;
    let mut buf = alloc::vec![0u8; length as usize];
    read_into(transport, start, &mut buf, policy, progress).await?;
    Ok(buf)
}
