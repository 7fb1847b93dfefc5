//! Cursor-based typed access to memory buffers and files.
//!
//! This module provides [`Accessor`], a bounds-checked cursor over a window
//! of bytes, together with its storage backends, typed codecs, look-ahead
//! helpers and the coverage recorder. It abstracts over different data
//! sources (borrowed memory, owned buffers, memory-mapped files, growable
//! write buffers) behind one API designed for decoding and producing
//! arbitrary binary container formats.
//!
//! # Architecture
//!
//! The module is built around a small set of pieces that work together:
//!
//! - **Accessor object** - One type for root accessors and sub-accessors,
//!   holding the window, the cursor, the endianness and the coverage log
//! - **Storage backends** - Borrowed slices, owned heap buffers, read-only
//!   file mappings, and growable zero-filled write buffers
//! - **Typed codecs** - Endian-aware scalars, 24-bit and N-byte integers,
//!   varint/zig-zag, arrays, raw blocks and five string wire shapes
//! - **Look-ahead** - Non-consuming reads and bounded delimiter search
//! - **Coverage recorder** - A log of consumed regions with sort/merge
//!   summarisation
//!
//! # Key Components
//!
//! ## Core Types
//! - [`Accessor`] - Cursor + window + endianness over byte storage
//! - [`Scalar`] - Conversion trait behind the generic typed operations
//! - [`CoverageRecord`] - One consumed region of a window
//!
//! # Windows and sub-accessors
//!
//! Every accessor sees its data through a *window*: the byte range it is
//! allowed to access. The cursor is a position inside the window, in
//! `[0, len]`. A read-only accessor can hand out *sub-accessors* - windows
//! on its own window - that share the base storage without copying. The
//! base stays alive until the last accessor referencing it is closed.
//!
//! Write accessors buffer everything in memory, growing in
//! granularity-sized steps, and can flush to a file when closed
//! ([`Accessor::open_writing_file`]) or on demand
//! ([`Accessor::write_to_file`]). Sub-accessors are always read-only and
//! cannot be taken from a write-enabled accessor.
//!
//! # Thread Safety
//!
//! Accessors perform no synchronisation and are not `Send`; callers that
//! need cross-thread access must serialise externally. Two accessors that
//! do not share a base are independent.
//!
//! # Examples
//!
//! ## Reading from memory
//!
//! ```rust
//! use bytescope::{Accessor, Endianness};
//!
//! let data = [0x12, 0x34, 0x56, 0x78];
//! let mut acc = Accessor::open_reading_memory(&data, 0, None)?;
//!
//! assert_eq!(acc.read_endian::<u16>(Endianness::Big)?, 0x1234);
//! assert_eq!(acc.read_endian::<u16>(Endianness::Little)?, 0x7856);
//! assert_eq!(acc.available_bytes(), 0);
//! # Ok::<(), bytescope::Error>(())
//! ```
//!
//! ## Building a binary blob
//!
//! ```rust
//! use bytescope::{Accessor, Endianness};
//! use std::io::SeekFrom;
//!
//! let mut out = Accessor::open_writing_memory(0, 0)?;
//! out.set_endianness(Endianness::Big);
//! out.write::<u32>(0xdeadbeef)?;
//! out.write_c_string(b"header")?;
//!
//! out.seek(SeekFrom::Start(0))?;
//! assert_eq!(out.read::<u32>()?, 0xdeadbeef);
//! # Ok::<(), bytescope::Error>(())
//! ```

mod coverage;
mod lookahead;
mod read;
mod scalar;
mod storage;
mod write;

pub use coverage::{CoverageForce, CoverageRecord};
pub use scalar::Scalar;

use std::{
    fs::File,
    io::{ErrorKind, Read, Seek, SeekFrom, Write},
    mem,
    rc::Rc,
};

use memmap2::MmapOptions;

use crate::{
    endian::default_endianness,
    path::{build_path, PathOptions},
    Endianness, Error, Result,
};

use coverage::Coverage;
use storage::{PendingOutput, ReadBase, ReadStorage, WriteBase};

/// File read accessors with a window smaller than this are read into memory
/// instead of being mapped.
const MMAP_MIN_WINDOW: usize = 16 * 1024;

/// Upper bound for a single filesystem read transfer.
const READ_TRANSFER_LIMIT: usize = 1 << 30;

/// A cursor + window + endianness over a byte storage.
///
/// `Accessor` is the central type of this crate. Root accessors own (or
/// borrow, or map) their storage; sub-accessors share the storage of a
/// read-only root. All typed operations follow the same contract: check the
/// request against [`available_bytes`](Accessor::available_bytes), transfer
/// at the cursor, advance the cursor, and - for reads - append a coverage
/// record when recording is active. On failure the accessor is unchanged.
///
/// The lifetime parameter is the lifetime of borrowed memory; accessors
/// over owned buffers, mapped files and write buffers are `'static`.
///
/// # Examples
///
/// ```rust
/// use bytescope::{Accessor, Endianness};
///
/// let data = [0x01, 0x00, 0x02, 0x00, 0x03, 0x00];
/// let mut acc = Accessor::open_reading_memory(&data, 0, None)?;
/// acc.set_endianness(Endianness::Little);
///
/// let values = acc.read_array::<u16>(3)?;
/// assert_eq!(values, [1, 2, 3]);
/// # Ok::<(), bytescope::Error>(())
/// ```
pub struct Accessor<'a> {
    repr: Repr<'a>,
    /// Offset of this window inside the super's window; for roots, the
    /// offset inside the storage. Bookkeeping only.
    window_offset: usize,
    /// Cumulative offset of this window inside the base storage. The only
    /// offset used at transfer time.
    base_window_offset: usize,
    window_size: usize,
    cursor: usize,
    endianness: Endianness,
    write_enabled: bool,
    cursor_stack: Vec<usize>,
    coverage: Coverage,
}

enum Repr<'a> {
    /// Read-only storage, shared with any number of sub-accessors.
    Shared(Rc<ReadBase<'a>>),
    /// Growable write buffer, owned by exactly this accessor.
    Writable(WriteBase),
}

impl<'a> Accessor<'a> {
    // ------------------------------------------------------------------
    // opening and closing

    /// Opens a read-only accessor over borrowed memory.
    ///
    /// The window is `[window_offset, window_offset + window_size)` of
    /// `data`; `None` means "up to end of data". The initial endianness is
    /// [`default_endianness`](crate::default_endianness).
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if the window does not fit `data`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bytescope::Accessor;
    ///
    /// let data = [0u8; 64];
    /// let acc = Accessor::open_reading_memory(&data, 16, Some(32))?;
    /// assert_eq!(acc.len(), 32);
    /// assert_eq!(acc.root_window_offset(), 16);
    /// # Ok::<(), bytescope::Error>(())
    /// ```
    pub fn open_reading_memory(
        data: &'a [u8],
        window_offset: usize,
        window_size: Option<usize>,
    ) -> Result<Accessor<'a>> {
        let window_size = resolve_window(data.len(), window_offset, window_size)?;

        Ok(Self::from_read_base(
            ReadBase {
                storage: ReadStorage::Borrowed(data),
                data_file_offset: 0,
                output: None,
            },
            window_offset,
            window_size,
        ))
    }

    /// Opens a read-only accessor that takes ownership of `data`.
    ///
    /// The buffer is freed when the last accessor sharing it is closed.
    /// Otherwise identical to
    /// [`open_reading_memory`](Accessor::open_reading_memory).
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if the window does not fit `data`.
    pub fn open_reading_memory_owned(
        data: Vec<u8>,
        window_offset: usize,
        window_size: Option<usize>,
    ) -> Result<Accessor<'static>> {
        let window_size = resolve_window(data.len(), window_offset, window_size)?;

        Ok(Accessor::from_read_base(
            ReadBase {
                storage: ReadStorage::Owned(data.into_boxed_slice()),
                data_file_offset: 0,
                output: None,
            },
            window_offset,
            window_size,
        ))
    }

    /// Opens a read-only accessor over a window of a file.
    ///
    /// The target is named by `(base_path, path)` as documented in
    /// [`build_path`]; directory-creation options are ignored. Windows of
    /// at least 16 KiB are memory-mapped read-only; smaller windows are
    /// read into an owned buffer in transfers of at most 1 GiB. If the
    /// file's data inside the window is modified while the accessor is
    /// open, behaviour is unspecified.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] if the file cannot be opened or inspected,
    /// [`Error::BeyondEnd`] if the window does not fit the file,
    /// [`Error::Host`] if mapping or reading fails, and
    /// [`Error::OutOfMemory`] if the buffer allocation fails.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use bytescope::{Accessor, PathOptions};
    ///
    /// let mut acc = Accessor::open_reading_file("", "savegame.bin", PathOptions::empty(), 0, None)?;
    /// let magic = acc.read::<u32>()?;
    /// # Ok::<(), bytescope::Error>(())
    /// ```
    pub fn open_reading_file(
        base_path: &str,
        path: &str,
        options: PathOptions,
        window_offset: usize,
        window_size: Option<usize>,
    ) -> Result<Accessor<'static>> {
        // no directory should be created when opening for reading
        let options = options - (PathOptions::CREATE_DIRECTORY | PathOptions::CREATE_PATH);
        let name = build_path(base_path, path, options)?;

        let mut file = File::open(&name).map_err(Error::Open)?;
        let file_len = file.metadata().map_err(Error::Open)?.len();

        let window_offset_in_file = window_offset as u64;
        if window_offset_in_file > file_len {
            return Err(Error::BeyondEnd);
        }
        let window_size = match window_size {
            Some(size) => {
                match (size as u64).checked_add(window_offset_in_file) {
                    Some(end) if end <= file_len => {}
                    _ => return Err(Error::BeyondEnd),
                }
                size
            }
            None => usize::try_from(file_len - window_offset_in_file)
                .map_err(|_| Error::OutOfMemory)?,
        };

        let base = if window_size >= MMAP_MIN_WINDOW {
            // the mapping covers exactly the window; the page-alignment skew
            // is handled inside the mapping layer
            let map = unsafe {
                MmapOptions::new()
                    .offset(window_offset_in_file)
                    .len(window_size)
                    .map(&file)
            }
            .map_err(Error::Host)?;

            ReadBase {
                storage: ReadStorage::Mapped(map),
                data_file_offset: window_offset,
                output: None,
            }
        } else {
            let mut buf = Vec::new();
            buf.try_reserve_exact(window_size)
                .map_err(|_| Error::OutOfMemory)?;
            buf.resize(window_size, 0);

            file.seek(SeekFrom::Start(window_offset_in_file))
                .map_err(Error::Host)?;

            let mut filled = 0;
            while filled < window_size {
                let transfer = (window_size - filled).min(READ_TRANSFER_LIMIT);
                let n = file
                    .read(&mut buf[filled..filled + transfer])
                    .map_err(Error::Host)?;
                if n == 0 {
                    return Err(Error::Host(std::io::Error::new(
                        ErrorKind::UnexpectedEof,
                        "file ended before the requested window was read",
                    )));
                }
                filled += n;
            }

            ReadBase {
                storage: ReadStorage::Owned(buf.into_boxed_slice()),
                data_file_offset: window_offset,
                output: None,
            }
        };

        Ok(Accessor::from_read_base(base, 0, window_size))
    }

    /// Opens an empty write accessor backed by a growable memory buffer.
    ///
    /// `initial_allocation` and `granularity` are allocation hints; zero
    /// selects defaults. The buffer is dismissed when the accessor is
    /// closed - use [`write_to_file`](Accessor::write_to_file) to save it
    /// first, or [`open_writing_file`](Accessor::open_writing_file) to
    /// flush automatically. The initial endianness is
    /// [`default_endianness`](crate::default_endianness).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if the initial allocation fails.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bytescope::Accessor;
    ///
    /// let mut out = Accessor::open_writing_memory(0, 0)?;
    /// out.write::<u16>(0x1234)?;
    /// assert_eq!(out.len(), 2);
    /// # Ok::<(), bytescope::Error>(())
    /// ```
    pub fn open_writing_memory(
        initial_allocation: usize,
        granularity: usize,
    ) -> Result<Accessor<'static>> {
        let base = WriteBase::with_allocation(initial_allocation, granularity, None)?;

        Ok(Accessor::from_write_base(base))
    }

    /// Opens an empty write accessor whose content is written to a file
    /// when the accessor is closed.
    ///
    /// The output file is created (and truncated) immediately; its content
    /// is the accessor's window `[0, len)` at close time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if the initial allocation fails and
    /// [`Error::Open`] if the output file cannot be created.
    pub fn open_writing_file(
        base_path: &str,
        path: &str,
        options: PathOptions,
        initial_allocation: usize,
        granularity: usize,
    ) -> Result<Accessor<'static>> {
        let name = build_path(base_path, path, options)?;
        let file = File::create(&name).map_err(Error::Open)?;
        let base = WriteBase::with_allocation(initial_allocation, granularity, Some(file))?;

        Ok(Accessor::from_write_base(base))
    }

    /// Writes part of this accessor's window to a file, without modifying
    /// the accessor.
    ///
    /// Useful when the output file name becomes known only after
    /// [`open_writing_memory`](Accessor::open_writing_memory). The region
    /// is `[window_offset, window_offset + window_size)` of this accessor's
    /// window; `None` means "up to end of window".
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if the region does not fit the window,
    /// [`Error::Open`] if the file cannot be created, and [`Error::Write`]
    /// if the content cannot be written in full.
    pub fn write_to_file(
        &self,
        base_path: &str,
        path: &str,
        options: PathOptions,
        window_offset: usize,
        window_size: Option<usize>,
    ) -> Result<()> {
        if window_offset > self.window_size {
            return Err(Error::BeyondEnd);
        }
        let window_size = match window_size {
            Some(size) => size,
            None => self.window_size - window_offset,
        };
        match window_offset.checked_add(window_size) {
            Some(end) if end <= self.window_size => {}
            _ => return Err(Error::BeyondEnd),
        }

        let name = build_path(base_path, path, options)?;
        let file = File::create(&name).map_err(Error::Open)?;

        let start = self.base_window_offset + window_offset;
        (&file)
            .write_all(&self.data()[start..start + window_size])
            .map_err(Error::Write)
    }

    /// Creates a read-only sub-accessor over the next `count` bytes of this
    /// accessor's window, then advances this accessor's cursor past them.
    ///
    /// `None` means "all available bytes". The sub-accessor shares storage
    /// with this accessor's base and inherits its endianness; its coverage
    /// starts disabled. One coverage record (for the consumed range) is
    /// added to this accessor if recording is active.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] on a write-enabled accessor and
    /// [`Error::BeyondEnd`] if `count` exceeds the available bytes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bytescope::Accessor;
    ///
    /// let data = [1u8, 2, 3, 4, 5, 6];
    /// let mut acc = Accessor::open_reading_memory(&data, 0, None)?;
    /// acc.read::<u8>()?;
    ///
    /// let mut member = acc.sub_accessor_bytes(Some(4))?;
    /// assert_eq!(member.len(), 4);
    /// assert_eq!(member.read::<u8>()?, 2);
    /// assert_eq!(acc.cursor(), 5); // consumed by the slice
    /// # Ok::<(), bytescope::Error>(())
    /// ```
    pub fn sub_accessor_bytes(&mut self, count: Option<usize>) -> Result<Accessor<'a>> {
        if self.write_enabled {
            return Err(Error::InvalidParameter(
                "sub-accessors require a read-only super-accessor",
            ));
        }

        let count = match count {
            None => self.available_bytes(),
            Some(count) if count > self.available_bytes() => return Err(Error::BeyondEnd),
            Some(count) => count,
        };

        let base = self.shared_base();
        let sub = Accessor {
            repr: Repr::Shared(base),
            window_offset: self.cursor,
            base_window_offset: self.base_window_offset + self.cursor,
            window_size: count,
            cursor: 0,
            endianness: self.endianness,
            write_enabled: false,
            cursor_stack: Vec::new(),
            coverage: Coverage::new(),
        };

        self.consume(count);

        Ok(sub)
    }

    /// Creates a read-only sub-accessor over an explicit sub-window of this
    /// accessor's window.
    ///
    /// This accessor's cursor is irrelevant and unchanged, and no coverage
    /// record is added. `None` means "up to end of window". The
    /// sub-accessor shares storage with this accessor's base and inherits
    /// its endianness; its coverage starts disabled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] on a write-enabled accessor and
    /// [`Error::BeyondEnd`] if the sub-window does not fit.
    pub fn sub_accessor_window(
        &mut self,
        window_offset: usize,
        window_size: Option<usize>,
    ) -> Result<Accessor<'a>> {
        if self.write_enabled {
            return Err(Error::InvalidParameter(
                "sub-accessors require a read-only super-accessor",
            ));
        }

        if window_offset > self.window_size {
            return Err(Error::BeyondEnd);
        }
        let window_size = match window_size {
            Some(size) => size,
            None => self.window_size - window_offset,
        };
        match window_offset.checked_add(window_size) {
            Some(end) if end <= self.window_size => {}
            _ => return Err(Error::BeyondEnd),
        }

        let base = self.shared_base();

        Ok(Accessor {
            repr: Repr::Shared(base),
            window_offset,
            base_window_offset: self.base_window_offset + window_offset,
            window_size,
            cursor: 0,
            endianness: self.endianness,
            write_enabled: false,
            cursor_stack: Vec::new(),
            coverage: Coverage::new(),
        })
    }

    /// Closes the accessor, flushing any pending output file.
    ///
    /// For a base with live sub-accessors the storage teardown (and any
    /// flush) is deferred until the last of them is closed. Dropping an
    /// accessor flushes too, ignoring errors; `close` reports them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Write`] if the pending output cannot be written in
    /// full. The accessor is torn down regardless.
    pub fn close(mut self) -> Result<()> {
        self.flush_pending_output()
    }

    /// Swaps two accessor handles.
    ///
    /// If only one of the two is read-only, the other becomes read-only as
    /// well, keeping its close-time action (such as writing its content to
    /// a file). If both are read accessors, or both are write accessors,
    /// each keeps its status.
    ///
    /// This is how a "write to file on close" accessor is turned into a
    /// read-only view of what was built.
    pub fn swap(a: &mut Accessor<'a>, b: &mut Accessor<'a>) {
        mem::swap(a, b);

        if !(a.write_enabled && b.write_enabled) {
            a.write_enabled = false;
            b.write_enabled = false;
        }
    }

    // ------------------------------------------------------------------
    // cursor and window

    /// Returns the current cursor position, in `[0, len]`.
    ///
    /// A cursor equal to [`len`](Accessor::len) is just past the last byte,
    /// with no bytes available.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the current window size in bytes.
    ///
    /// For a write accessor the window grows to contain the last written
    /// byte.
    #[must_use]
    pub fn len(&self) -> usize {
        self.window_size
    }

    /// Returns `true` if the window is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window_size == 0
    }

    /// Returns how many bytes are available from the cursor to the end of
    /// the window.
    #[must_use]
    pub fn available_bytes(&self) -> usize {
        self.window_size - self.cursor
    }

    /// Returns this window's offset inside its super-accessor's window.
    ///
    /// For a root accessor this is the offset the window was opened at
    /// inside its storage. Sub-view offsets compose additively:
    /// `sub.root_window_offset() == super.root_window_offset() +
    /// sub.window_offset()`.
    #[must_use]
    pub fn window_offset(&self) -> usize {
        self.window_offset
    }

    /// Returns this window's offset in the root accessor's data.
    ///
    /// The root is the top of the super-accessor chain, or this accessor
    /// itself. For file-backed accessors the returned value is the absolute
    /// position in the file, which makes it suitable for diagnostics.
    #[must_use]
    pub fn root_window_offset(&self) -> usize {
        let data_file_offset = match &self.repr {
            Repr::Shared(base) => base.data_file_offset,
            Repr::Writable(_) => 0,
        };

        self.base_window_offset + data_file_offset
    }

    /// Returns the accessor's current endianness.
    #[must_use]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Sets the accessor's current endianness.
    ///
    /// Affects every subsequent typed operation that does not take an
    /// explicit endianness.
    pub fn set_endianness(&mut self, e: Endianness) {
        self.endianness = e;
    }

    /// Moves the cursor.
    ///
    /// A write-enabled accessor may seek past the end of its window; the
    /// window is extended and the added bytes are set to zero. Read-only
    /// accessors reject such seeks with [`Error::BeyondEnd`]. Returns the
    /// new cursor position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] for a target outside the window of a
    /// read-only accessor or before the start of the window, and
    /// [`Error::OutOfMemory`] if growing a write accessor fails.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bytescope::Accessor;
    /// use std::io::SeekFrom;
    ///
    /// let data = [0u8; 16];
    /// let mut acc = Accessor::open_reading_memory(&data, 0, None)?;
    ///
    /// acc.seek(SeekFrom::End(-2))?;
    /// assert_eq!(acc.available_bytes(), 2);
    /// acc.seek(SeekFrom::Current(-10))?;
    /// assert_eq!(acc.cursor(), 4);
    /// # Ok::<(), bytescope::Error>(())
    /// ```
    pub fn seek(&mut self, pos: SeekFrom) -> Result<usize> {
        let target: i128 = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => self.cursor as i128 + i128::from(delta),
            SeekFrom::End(delta) => self.window_size as i128 + i128::from(delta),
        };

        if target < 0 {
            return Err(Error::BeyondEnd);
        }
        let Ok(new_cursor) = usize::try_from(target) else {
            return Err(Error::BeyondEnd);
        };

        if new_cursor > self.window_size {
            if !self.write_enabled {
                return Err(Error::BeyondEnd);
            }

            let old_window_size = self.window_size;
            let base = self.write_base_mut()?;
            base.grow(new_cursor)?;
            // bytes past the window may be stale after a truncate
            base.buf[old_window_size..new_cursor].fill(0);
            self.window_size = new_cursor;
        }

        self.cursor = new_cursor;

        Ok(new_cursor)
    }

    /// Advances the cursor to the next multiple of `alignment`.
    ///
    /// On a write-enabled accessor the window may grow, as with
    /// [`seek`](Accessor::seek).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for a zero alignment and
    /// [`Error::BeyondEnd`] if the aligned position is outside a read-only
    /// window.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        if alignment == 0 {
            return Err(Error::InvalidParameter("alignment must not be zero"));
        }

        let padding = (alignment - self.cursor % alignment) % alignment;
        if padding == 0 {
            return Ok(());
        }

        let target = self.cursor.checked_add(padding).ok_or(Error::BeyondEnd)?;
        self.seek(SeekFrom::Start(target as u64)).map(drop)
    }

    /// Truncates a write accessor at the cursor.
    ///
    /// Any data following the cursor is removed from the window.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a read-only accessor.
    pub fn truncate(&mut self) -> Result<()> {
        if !self.write_enabled {
            return Err(Error::ReadOnly);
        }

        self.window_size = self.cursor;

        Ok(())
    }

    /// Saves the current cursor on the cursor stack.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if the stack cannot grow.
    pub fn push_cursor(&mut self) -> Result<()> {
        self.cursor_stack
            .try_reserve(1)
            .map_err(|_| Error::OutOfMemory)?;
        self.cursor_stack.push(self.cursor);

        Ok(())
    }

    /// Restores the last pushed cursor, removing it from the stack.
    ///
    /// The restore goes through [`seek`](Accessor::seek), so a
    /// write-enabled accessor whose window shrank may grow back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the stack is empty.
    pub fn pop_cursor(&mut self) -> Result<()> {
        self.pop_cursors(1)
    }

    /// Equivalent to repeating [`pop_cursor`](Accessor::pop_cursor) `n`
    /// times.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `n` is zero or exceeds the
    /// stack depth.
    pub fn pop_cursors(&mut self, n: usize) -> Result<()> {
        if n == 0 || self.cursor_stack.len() < n {
            return Err(Error::InvalidParameter(
                "cursor stack does not hold that many entries",
            ));
        }

        let target = self.cursor_stack[self.cursor_stack.len() - n];
        self.cursor_stack.truncate(self.cursor_stack.len() - n);

        self.seek(SeekFrom::Start(target as u64)).map(drop)
    }

    /// Removes the last pushed cursor from the stack without moving the
    /// cursor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the stack is empty.
    pub fn drop_cursor(&mut self) -> Result<()> {
        self.drop_cursors(1)
    }

    /// Equivalent to repeating [`drop_cursor`](Accessor::drop_cursor) `n`
    /// times; `n == 0` is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `n` exceeds the stack depth.
    pub fn drop_cursors(&mut self, n: usize) -> Result<()> {
        if self.cursor_stack.len() < n {
            return Err(Error::InvalidParameter(
                "cursor stack does not hold that many entries",
            ));
        }

        self.cursor_stack.truncate(self.cursor_stack.len() - n);

        Ok(())
    }

    // ------------------------------------------------------------------
    // internals shared by the codec and look-ahead operations

    fn from_read_base(base: ReadBase<'a>, window_offset: usize, window_size: usize) -> Accessor<'a> {
        Accessor {
            repr: Repr::Shared(Rc::new(base)),
            window_offset,
            base_window_offset: window_offset,
            window_size,
            cursor: 0,
            endianness: default_endianness(),
            write_enabled: false,
            cursor_stack: Vec::new(),
            coverage: Coverage::new(),
        }
    }

    fn from_write_base(base: WriteBase) -> Accessor<'static> {
        Accessor {
            repr: Repr::Writable(base),
            window_offset: 0,
            base_window_offset: 0,
            window_size: 0,
            cursor: 0,
            endianness: default_endianness(),
            write_enabled: true,
            cursor_stack: Vec::new(),
            coverage: Coverage::new(),
        }
    }

    /// The full base storage; window offsets index into this.
    fn data(&self) -> &[u8] {
        match &self.repr {
            Repr::Shared(base) => base.storage.bytes(),
            Repr::Writable(base) => &base.buf,
        }
    }

    /// The window bytes from the cursor to the end of the window.
    pub(crate) fn remaining(&self) -> &[u8] {
        let start = self.base_window_offset + self.cursor;
        &self.data()[start..self.base_window_offset + self.window_size]
    }

    /// Bounds-checks a read of `nbytes` and returns the source slice at the
    /// cursor. The cursor is not moved; pair with
    /// [`consume`](Accessor::consume).
    pub(crate) fn readable(&self, nbytes: usize) -> Result<&[u8]> {
        if self.available_bytes() < nbytes {
            return Err(Error::BeyondEnd);
        }

        let start = self.base_window_offset + self.cursor;
        Ok(&self.data()[start..start + nbytes])
    }

    /// Advances the cursor past a successful read and records coverage.
    pub(crate) fn consume(&mut self, nbytes: usize) {
        let start = self.cursor;
        self.cursor += nbytes;
        self.coverage.record_read(start, nbytes);
    }

    /// Bounds-checks a write of `nbytes`, growing the window if needed, and
    /// returns the destination slice. The cursor is advanced; writes do not
    /// record coverage.
    pub(crate) fn writable(&mut self, nbytes: usize) -> Result<&mut [u8]> {
        if !self.write_enabled {
            return Err(Error::ReadOnly);
        }

        let end = self.cursor.checked_add(nbytes).ok_or(Error::BeyondEnd)?;
        let start = self.base_window_offset + self.cursor;

        let Repr::Writable(base) = &mut self.repr else {
            return Err(Error::ReadOnly);
        };
        if end > base.buf.len() {
            base.grow(end)?;
        }

        if end > self.window_size {
            self.window_size = end;
        }
        self.cursor = end;

        Ok(&mut base.buf[start..start + nbytes])
    }

    fn write_base_mut(&mut self) -> Result<&mut WriteBase> {
        if !self.write_enabled {
            return Err(Error::ReadOnly);
        }

        match &mut self.repr {
            Repr::Writable(base) => Ok(base),
            Repr::Shared(_) => Err(Error::ReadOnly),
        }
    }

    /// Returns the shared base, demoting a (read-only) write buffer to
    /// owned read storage first.
    ///
    /// Demotion happens at most once per accessor, when the first
    /// sub-accessor is taken from a handle that was swapped read-only; the
    /// pending output keeps its flush length from that moment.
    fn shared_base(&mut self) -> Rc<ReadBase<'a>> {
        let flush_len = self.window_size;
        let base = match &mut self.repr {
            Repr::Shared(base) => return Rc::clone(base),
            Repr::Writable(base) => base,
        };

        let buf = mem::take(&mut base.buf);
        let output = base.output.take().map(|file| PendingOutput { file, flush_len });

        let shared = Rc::new(ReadBase {
            storage: ReadStorage::Owned(buf.into_boxed_slice()),
            data_file_offset: 0,
            output,
        });
        self.repr = Repr::Shared(Rc::clone(&shared));

        shared
    }

    fn flush_pending_output(&mut self) -> Result<()> {
        match &mut self.repr {
            Repr::Writable(base) => {
                if let Some(file) = base.output.take() {
                    let len = self.window_size.min(base.buf.len());
                    (&file).write_all(&base.buf[..len]).map_err(Error::Write)?;
                }
                Ok(())
            }
            Repr::Shared(base) => match Rc::get_mut(base) {
                // only the last live handle flushes
                Some(base) => base.flush_output(),
                None => Ok(()),
            },
        }
    }
}

impl Drop for Accessor<'_> {
    fn drop(&mut self) {
        // best effort; Accessor::close reports the error instead
        let _ = self.flush_pending_output();
    }
}

fn resolve_window(data_len: usize, window_offset: usize, window_size: Option<usize>) -> Result<usize> {
    if window_offset > data_len {
        return Err(Error::BeyondEnd);
    }

    let window_size = match window_size {
        Some(size) => size,
        None => data_len - window_offset,
    };

    match window_offset.checked_add(window_size) {
        Some(end) if end <= data_len => Ok(window_size),
        _ => Err(Error::BeyondEnd),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(data: &[u8]) -> Accessor<'_> {
        Accessor::open_reading_memory(data, 0, None).unwrap()
    }

    #[test]
    fn window_resolution() {
        let data = [0u8; 16];

        let acc = Accessor::open_reading_memory(&data, 4, None).unwrap();
        assert_eq!(acc.len(), 12);
        assert_eq!(acc.available_bytes(), 12);
        assert_eq!(acc.root_window_offset(), 4);

        let acc = Accessor::open_reading_memory(&data, 4, Some(8)).unwrap();
        assert_eq!(acc.len(), 8);

        assert!(matches!(
            Accessor::open_reading_memory(&data, 4, Some(13)),
            Err(Error::BeyondEnd)
        ));
        assert!(matches!(
            Accessor::open_reading_memory(&data, 17, None),
            Err(Error::BeyondEnd)
        ));
    }

    #[test]
    fn seek_within_window() {
        let data = [0u8; 16];
        let mut acc = reader(&data);

        assert_eq!(acc.seek(SeekFrom::Start(10)).unwrap(), 10);
        assert_eq!(acc.available_bytes(), 6);
        assert_eq!(acc.seek(SeekFrom::Current(-3)).unwrap(), 7);
        assert_eq!(acc.seek(SeekFrom::End(-1)).unwrap(), 15);
        assert_eq!(acc.seek(SeekFrom::End(0)).unwrap(), 16);
        assert_eq!(acc.available_bytes(), 0);

        assert!(matches!(
            acc.seek(SeekFrom::Start(17)),
            Err(Error::BeyondEnd)
        ));
        assert!(matches!(
            acc.seek(SeekFrom::Current(-17)),
            Err(Error::BeyondEnd)
        ));
        // failed seeks leave the cursor alone
        assert_eq!(acc.cursor(), 16);
    }

    #[test]
    fn seek_extends_write_window_zero_filled() {
        let mut acc = Accessor::open_writing_memory(0, 0).unwrap();
        acc.write::<u8>(0xff).unwrap();

        acc.seek(SeekFrom::Start(8)).unwrap();
        assert_eq!(acc.len(), 8);

        acc.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(acc.read::<u8>().unwrap(), 0xff);
        for _ in 1..8 {
            assert_eq!(acc.read::<u8>().unwrap(), 0);
        }
    }

    #[test]
    fn truncate_then_seek_rezeroes() {
        let mut acc = Accessor::open_writing_memory(0, 0).unwrap();
        acc.write_repeated_byte(0xaa, 8).unwrap();

        acc.seek(SeekFrom::Start(2)).unwrap();
        acc.truncate().unwrap();
        assert_eq!(acc.len(), 2);
        assert_eq!(acc.available_bytes(), 0);
        assert!(matches!(acc.read::<u8>(), Err(Error::BeyondEnd)));

        // re-extending must not resurrect the 0xaa bytes
        acc.seek(SeekFrom::Start(6)).unwrap();
        acc.seek(SeekFrom::Start(2)).unwrap();
        for _ in 2..6 {
            assert_eq!(acc.read::<u8>().unwrap(), 0);
        }
    }

    #[test]
    fn cursor_stack_is_lifo() {
        let data = [0u8; 32];
        let mut acc = reader(&data);

        acc.seek(SeekFrom::Start(5)).unwrap();
        acc.push_cursor().unwrap();
        acc.seek(SeekFrom::Start(11)).unwrap();
        acc.push_cursor().unwrap();
        acc.seek(SeekFrom::Start(23)).unwrap();

        acc.pop_cursor().unwrap();
        assert_eq!(acc.cursor(), 11);
        acc.pop_cursor().unwrap();
        assert_eq!(acc.cursor(), 5);
        assert!(matches!(acc.pop_cursor(), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn pop_cursors_equals_drop_then_pop() {
        let data = [0u8; 32];

        let mut a = reader(&data);
        let mut b = reader(&data);
        for pos in [3, 9, 27] {
            a.seek(SeekFrom::Start(pos)).unwrap();
            a.push_cursor().unwrap();
            b.seek(SeekFrom::Start(pos)).unwrap();
            b.push_cursor().unwrap();
        }

        a.pop_cursors(3).unwrap();
        b.drop_cursors(2).unwrap();
        b.pop_cursor().unwrap();
        assert_eq!(a.cursor(), b.cursor());
        assert_eq!(a.cursor(), 3);

        assert!(matches!(a.pop_cursors(0), Err(Error::InvalidParameter(_))));
        assert!(a.drop_cursors(0).is_ok());
    }

    #[test]
    fn align_advances_to_boundary() {
        let data = [0u8; 32];
        let mut acc = reader(&data);

        acc.seek(SeekFrom::Start(5)).unwrap();
        acc.align(4).unwrap();
        assert_eq!(acc.cursor(), 8);
        acc.align(4).unwrap();
        assert_eq!(acc.cursor(), 8);

        acc.seek(SeekFrom::Start(31)).unwrap();
        assert!(matches!(acc.align(16), Err(Error::BeyondEnd)));
        assert!(matches!(acc.align(0), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn sub_accessor_bytes_consumes_super() {
        let data: Vec<u8> = (0u8..64).collect();
        let mut acc = reader(&data);
        acc.seek(SeekFrom::Start(8)).unwrap();

        let mut sub = acc.sub_accessor_bytes(Some(16)).unwrap();
        assert_eq!(acc.cursor(), 24);
        assert_eq!(sub.len(), 16);
        assert_eq!(sub.read::<u8>().unwrap(), 8);
        assert_eq!(sub.root_window_offset(), 8);

        let rest = acc.sub_accessor_bytes(None).unwrap();
        assert_eq!(rest.len(), 40);
        assert_eq!(acc.available_bytes(), 0);

        assert!(matches!(
            acc.sub_accessor_bytes(Some(1)),
            Err(Error::BeyondEnd)
        ));
    }

    #[test]
    fn sub_accessor_window_leaves_super_alone() {
        let data: Vec<u8> = (0u8..64).collect();
        let mut acc = Accessor::open_reading_memory(&data, 1, None).unwrap();

        let mut b = acc.sub_accessor_window(1, None).unwrap();
        let mut c = b.sub_accessor_window(1, None).unwrap();

        assert_eq!(acc.root_window_offset(), 1);
        assert_eq!(b.root_window_offset(), 2);
        assert_eq!(c.root_window_offset(), 3);
        assert_eq!(acc.cursor(), 0);

        assert_eq!(c.read::<u8>().unwrap(), 3);

        assert!(matches!(
            b.sub_accessor_window(0, Some(b.len() + 1)),
            Err(Error::BeyondEnd)
        ));
    }

    #[test]
    fn sub_accessor_outlives_super() {
        let data: Vec<u8> = (0u8..32).collect();
        let mut acc = Accessor::open_reading_memory_owned(data, 0, None).unwrap();

        let mut sub = acc.sub_accessor_window(16, None).unwrap();
        drop(acc); // base storage stays alive through the sub-accessor

        assert_eq!(sub.read::<u8>().unwrap(), 16);
        sub.close().unwrap();
    }

    #[test]
    fn write_accessors_reject_sub_accessors() {
        let mut acc = Accessor::open_writing_memory(0, 0).unwrap();
        assert!(matches!(
            acc.sub_accessor_bytes(None),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            acc.sub_accessor_window(0, None),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn swap_demotes_to_read_only() {
        let data = [0u8; 4];
        let mut w = Accessor::open_writing_memory(0, 0).unwrap();
        w.write::<u32>(0xaabbccdd).unwrap();
        let mut r = reader(&data);

        Accessor::swap(&mut w, &mut r);

        // both handles are read-only now; the ex-write content moved to r
        assert!(matches!(r.truncate(), Err(Error::ReadOnly)));
        assert!(matches!(w.truncate(), Err(Error::ReadOnly)));
        assert!(matches!(w.write::<u8>(1), Err(Error::ReadOnly)));
        assert_eq!(r.len(), 4);

        r.seek(SeekFrom::Start(0)).unwrap();
        let e = r.endianness();
        assert_eq!(r.read_endian::<u32>(e).unwrap(), 0xaabbccdd);

        // a swapped-read-only ex-write accessor can be sub-accessed
        let mut sub = r.sub_accessor_window(0, None).unwrap();
        assert_eq!(sub.len(), 4);
        assert_eq!(sub.read_endian::<u32>(e).unwrap(), 0xaabbccdd);
    }

    #[test]
    fn swap_keeps_two_writers_writable() {
        let mut a = Accessor::open_writing_memory(0, 0).unwrap();
        let mut b = Accessor::open_writing_memory(0, 0).unwrap();
        a.write::<u8>(1).unwrap();

        Accessor::swap(&mut a, &mut b);

        assert!(a.write::<u8>(2).is_ok());
        assert!(b.write::<u8>(3).is_ok());
        assert_eq!(b.len(), 2); // the old `a` content plus one byte
    }
}
