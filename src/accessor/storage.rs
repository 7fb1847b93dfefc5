//! Storage backends behind accessors.
//!
//! A read base is immutable byte storage shared by a root accessor and any
//! number of sub-accessors; a write base is a growable zero-filled buffer
//! owned by exactly one write accessor. Growth requires `&mut`, so the
//! borrow checker guarantees no slice into the buffer survives a
//! reallocation.

use std::{fs::File, io::Write};

use memmap2::Mmap;

use crate::{Error, Result};

/// Granularity used when a write accessor is opened with `granularity == 0`.
#[cfg(target_pointer_width = "32")]
pub(crate) const DEFAULT_GRANULARITY: usize = 4 * 1024;
/// Granularity used when a write accessor is opened with `granularity == 0`.
#[cfg(not(target_pointer_width = "32"))]
pub(crate) const DEFAULT_GRANULARITY: usize = 64 * 1024;

#[cfg(target_pointer_width = "32")]
const MAX_INITIAL_ALLOCATION: usize = 1024 * 1024;
#[cfg(not(target_pointer_width = "32"))]
const MAX_INITIAL_ALLOCATION: usize = 16 * 1024 * 1024;

/// Immutable bytes backing a read accessor.
pub(crate) enum ReadStorage<'a> {
    /// Caller-owned memory; never freed by the accessor.
    Borrowed(&'a [u8]),
    /// Accessor-owned heap memory, freed when the last view closes.
    Owned(Box<[u8]>),
    /// A read-only file mapping covering exactly the requested window.
    Mapped(Mmap),
}

impl ReadStorage<'_> {
    pub(crate) fn bytes(&self) -> &[u8] {
        match self {
            ReadStorage::Borrowed(data) => data,
            ReadStorage::Owned(data) => data,
            ReadStorage::Mapped(map) => map,
        }
    }
}

/// Output file owed its content when the owning base is torn down.
pub(crate) struct PendingOutput {
    pub(crate) file: File,
    /// Bytes `[0, flush_len)` of the storage are written at teardown.
    pub(crate) flush_len: usize,
}

/// Shared base of a root read accessor and its sub-accessors.
///
/// Held behind an `Rc`; the storage is freed when the last accessor
/// referencing it is closed or dropped.
pub(crate) struct ReadBase<'a> {
    pub(crate) storage: ReadStorage<'a>,
    /// Logical offset of byte 0 of the storage window in the source file,
    /// zero for memory-backed bases. Used for absolute offset reporting.
    pub(crate) data_file_offset: usize,
    /// Present on a base that was demoted from a write accessor opened
    /// with an output file; flushed when the base is torn down.
    pub(crate) output: Option<PendingOutput>,
}

impl ReadBase<'_> {
    pub(crate) fn flush_output(&mut self) -> Result<()> {
        if let Some(out) = self.output.take() {
            let data = self.storage.bytes();
            let len = out.flush_len.min(data.len());
            (&out.file)
                .write_all(&data[..len])
                .map_err(Error::Write)?;
        }

        Ok(())
    }
}

impl Drop for ReadBase<'_> {
    fn drop(&mut self) {
        // best effort; explicit close reports the error instead
        let _ = self.flush_output();
    }
}

/// Growable buffer behind a write accessor.
///
/// The buffer is zero-filled up to its full allocated length; the logical
/// window size lives on the accessor. Reallocation happens in
/// granularity-sized steps.
pub(crate) struct WriteBase {
    pub(crate) buf: Vec<u8>,
    pub(crate) granularity: usize,
    /// File receiving the accumulated buffer when the accessor closes.
    pub(crate) output: Option<File>,
}

impl WriteBase {
    /// Allocates a zero-filled buffer honouring the granularity and the
    /// initial-allocation cap.
    pub(crate) fn with_allocation(
        initial_allocation: usize,
        granularity: usize,
        output: Option<File>,
    ) -> Result<WriteBase> {
        let mut granularity = if granularity == 0 {
            DEFAULT_GRANULARITY
        } else {
            granularity
        };

        let mut initial_allocation = initial_allocation;
        if initial_allocation > MAX_INITIAL_ALLOCATION {
            initial_allocation = MAX_INITIAL_ALLOCATION;
            granularity = MAX_INITIAL_ALLOCATION;
        }

        let size = round_up_to_nonnull_multiple(initial_allocation, granularity)
            .ok_or(Error::OutOfMemory)?;

        let mut buf = Vec::new();
        buf.try_reserve_exact(size).map_err(|_| Error::OutOfMemory)?;
        buf.resize(size, 0);

        Ok(WriteBase {
            buf,
            granularity,
            output,
        })
    }

    /// Ensures the allocation covers at least `new_size` bytes.
    ///
    /// A failed grow leaves the buffer unchanged.
    pub(crate) fn grow(&mut self, new_size: usize) -> Result<()> {
        if new_size <= self.buf.len() {
            return Ok(());
        }

        let target = round_up_to_nonnull_multiple(new_size, self.granularity)
            .ok_or(Error::OutOfMemory)?;
        self.buf
            .try_reserve_exact(target - self.buf.len())
            .map_err(|_| Error::OutOfMemory)?;
        self.buf.resize(target, 0);

        Ok(())
    }
}

/// Returns the smallest non-null multiple of `m` strictly greater than `x`.
fn round_up_to_nonnull_multiple(x: usize, m: usize) -> Option<usize> {
    x.checked_add(m - x % m)
}
