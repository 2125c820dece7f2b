//! Progress reporting for reads

/// Observer notified as a read advances
///
/// `on_progress` is called synchronously once per completed chunk with
/// strictly increasing `bytes_done`. It is never called for a chunk that
/// failed, and never after the read has returned. A successful read ends
/// with `bytes_done == bytes_total`; an aborted one never reaches it.
pub trait ReadProgress {
    /// Called after each chunk has been read
    fn on_progress(&mut self, bytes_done: usize, bytes_total: usize);
}

/// A no-op progress reporter
pub struct NoProgress;

impl ReadProgress for NoProgress {
    fn on_progress(&mut self, _bytes_done: usize, _bytes_total: usize) {}
}

impl<F> ReadProgress for F
where
    F: FnMut(usize, usize),
{
    fn on_progress(&mut self, bytes_done: usize, bytes_total: usize) {
        self(bytes_done, bytes_total)
    }
}
