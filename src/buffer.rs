//! The growable output buffer (spec.md §4.2).
//!
//! `spec.md` calls this out as an external collaborator "specified only at
//! its interface" — a trivial append/resize container, not part of the
//! order-preserving hard part. `Buffer` is that container: a thin wrapper
//! over `Vec<u8>` that additionally remembers a permanent "reserved" floor
//! a caller can write once (e.g. a shared composite-key prefix) and keep
//! across `reset()` calls, per spec.md §4.2's `create`/`reset`/`reset_fast`
//! contract. It carries none of the tag/payload/terminator logic; that
//! lives in `pack` and `tokenize`.
//!
//! `end()` and `set_size_distance()` from spec.md §4.2 are raw-pointer
//! bookkeeping that has no counterpart once growth is handled by `Vec`;
//! `close()` likewise has no counterpart since `Drop` does that job. See
//! `DESIGN.md` for this decision.

use crate::error::Error;

/// A growable byte buffer that never shrinks its content below a
/// caller-chosen floor.
#[derive(Debug, Clone)]
pub struct Buffer {
    data: Vec<u8>,
    reserved: usize,
}

impl Buffer {
    /// Allocate a buffer with `reserve` bytes of initial capacity and no
    /// reserved floor (`reset()` truncates back to empty).
    pub fn new(reserve: usize) -> Self {
        Buffer { data: Vec::with_capacity(reserve), reserved: 0 }
    }

    /// Allocate a buffer whose first `floor` bytes, once written, survive
    /// every future `reset()` — useful for a shared record prefix that is
    /// written once and reused across many `pack_*` calls.
    pub fn with_reserved_floor(floor: usize) -> Self {
        Buffer { data: Vec::with_capacity(floor), reserved: floor }
    }

    /// Ensure at least `n` more bytes can be appended without reallocating
    /// again immediately; grows to `(size + n + 1) * 10 / 8` when short,
    /// the same >=25% headroom spec.md §4.2 calls for.
    pub(crate) fn require(&mut self, n: usize) -> Result<(), Error> {
        let want = self.data.len() + n;
        if want > self.data.capacity() {
            let new_cap = (want + 1) * 10 / 8;
            self.data
                .try_reserve(new_cap - self.data.len())
                .map_err(|_| Error::Allocation)?;
        }
        Ok(())
    }

    pub(crate) fn push(&mut self, b: u8) {
        self.data.push(b);
    }

    pub(crate) fn raw_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }

    /// The content written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Current length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Truncate content back to the reserved floor.
    pub fn reset(&mut self) {
        self.data.truncate(self.reserved);
    }

    /// Truncate content back to the reserved floor without releasing
    /// capacity. `Vec::truncate` never deallocates, so this is identical
    /// to `reset()` here; kept as a distinct name to mirror spec.md §4.2's
    /// two-operation interface for callers translating from it.
    pub fn reset_fast(&mut self) {
        self.data.truncate(self.reserved);
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Buffer::new(0)
    }
}
