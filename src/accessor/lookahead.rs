//! Non-consuming reads.
//!
//! Look-ahead operations behave like their read counterparts except that
//! the cursor does not move, no coverage is recorded, nothing is
//! allocated, and they cannot fail: a transfer is clamped to the available
//! bytes and the actual count is returned.

use crate::{Endianness, Error, Result};

use super::Accessor;

impl Accessor<'_> {
    /// Copies up to `buf.len()` bytes at the cursor into `buf` without
    /// moving the cursor.
    ///
    /// Returns the number of bytes copied, in `[0, buf.len()]`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bytescope::Accessor;
    ///
    /// let data = [1u8, 2, 3];
    /// let acc = Accessor::open_reading_memory(&data, 0, None)?;
    ///
    /// let mut buf = [0u8; 8];
    /// assert_eq!(acc.look_ahead_bytes(&mut buf), 3);
    /// assert_eq!(&buf[..3], &[1, 2, 3]);
    /// assert_eq!(acc.cursor(), 0);
    /// # Ok::<(), bytescope::Error>(())
    /// ```
    pub fn look_ahead_bytes(&self, buf: &mut [u8]) -> usize {
        let remaining = self.remaining();
        let count = buf.len().min(remaining.len());
        buf[..count].copy_from_slice(&remaining[..count]);

        count
    }

    /// Copies up to `buf.len()` bytes at the cursor into `buf` without
    /// moving the cursor, reversing the copied bytes when `e` is
    /// byte-reversed with respect to the host.
    ///
    /// Returns the number of bytes copied, in `[0, buf.len()]`.
    pub fn look_ahead_endian_bytes(&self, buf: &mut [u8], e: Endianness) -> usize {
        let count = self.look_ahead_bytes(buf);
        if e.is_reverse() {
            buf[..count].reverse();
        }

        count
    }

    /// Returns all bytes from the cursor to the end of the window, without
    /// moving the cursor or recording coverage.
    ///
    /// This is the zero-copy escape hatch for bulk transforms such as
    /// decompressing or decrypting straight out of the accessor's storage.
    /// The slice borrows the accessor, so it ends before the next
    /// cursor-moving operation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bytescope::Accessor;
    /// use std::io::SeekFrom;
    ///
    /// let data = [1u8, 2, 3, 4];
    /// let mut acc = Accessor::open_reading_memory(&data, 0, None)?;
    /// acc.seek(SeekFrom::End(0))?;
    ///
    /// assert!(acc.look_ahead_available_bytes().is_empty());
    /// # Ok::<(), bytescope::Error>(())
    /// ```
    #[must_use]
    pub fn look_ahead_available_bytes(&self) -> &[u8] {
        self.remaining()
    }

    /// Counts the bytes between the cursor and the first occurrence of
    /// `delimiter`, scanning at most `count_limit` bytes before it.
    ///
    /// Neither `count_limit` nor the returned count includes the delimiter
    /// itself. `None` means "up to end of window". No data is transferred
    /// and the cursor does not move.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for an empty delimiter and
    /// [`Error::BeyondEnd`] when fewer than `delimiter.len()` bytes are
    /// available or the delimiter is not found within the limit.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bytescope::Accessor;
    ///
    /// let data = b"key=value;rest";
    /// let acc = Accessor::open_reading_memory(data, 0, None)?;
    ///
    /// assert_eq!(acc.count_bytes_before_delimiter(None, b"=")?, 3);
    /// assert_eq!(acc.count_bytes_before_delimiter(None, b";")?, 9);
    /// assert!(acc.count_bytes_before_delimiter(Some(2), b";").is_err());
    /// # Ok::<(), bytescope::Error>(())
    /// ```
    pub fn count_bytes_before_delimiter(
        &self,
        count_limit: Option<usize>,
        delimiter: &[u8],
    ) -> Result<usize> {
        if delimiter.is_empty() {
            return Err(Error::InvalidParameter("delimiter must not be empty"));
        }

        let remaining = self.remaining();
        if remaining.len() < delimiter.len() {
            return Err(Error::BeyondEnd);
        }

        let last_start = (remaining.len() - delimiter.len()).min(count_limit.unwrap_or(usize::MAX));

        match delimiter.len() {
            // slightly optimized version for single-byte delimiters
            1 => {
                let wanted = delimiter[0];
                remaining[..=last_start]
                    .iter()
                    .position(|&b| b == wanted)
                    .ok_or(Error::BeyondEnd)
            }

            // slightly optimized version for two-byte delimiters
            2 => {
                let (d0, d1) = (delimiter[0], delimiter[1]);
                for start in 0..=last_start {
                    if remaining[start] == d0 && remaining[start + 1] == d1 {
                        return Ok(start);
                    }
                }
                Err(Error::BeyondEnd)
            }

            _ => {
                for start in 0..=last_start {
                    if &remaining[start..start + delimiter.len()] == delimiter {
                        return Ok(start);
                    }
                }
                Err(Error::BeyondEnd)
            }
        }
    }
}
