//! Typed read operations.
//!
//! Every read follows the same contract: bounds-check against
//! [`available_bytes`](Accessor::available_bytes), decode at the cursor
//! with the requested (or the accessor's current) endianness, advance the
//! cursor, and append a coverage record when recording is active. On
//! failure the cursor does not move and nothing is recorded.

use crate::{swap, Endianness, Error, Result};

use super::{Accessor, Scalar};

impl Accessor<'_> {
    /// Reads a scalar at the cursor using the accessor's current
    /// endianness.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if fewer than `T::WIDTH` bytes are
    /// available.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bytescope::{Accessor, Endianness};
    ///
    /// let data = [0x01, 0x02, 0x03, 0x04];
    /// let mut acc = Accessor::open_reading_memory(&data, 0, None)?;
    /// acc.set_endianness(Endianness::Little);
    ///
    /// assert_eq!(acc.read::<u16>()?, 0x0201);
    /// assert_eq!(acc.read::<i8>()?, 0x03);
    /// # Ok::<(), bytescope::Error>(())
    /// ```
    pub fn read<T: Scalar>(&mut self) -> Result<T> {
        self.read_endian(self.endianness)
    }

    /// Reads a scalar at the cursor using the given endianness.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if fewer than `T::WIDTH` bytes are
    /// available.
    pub fn read_endian<T: Scalar>(&mut self, e: Endianness) -> Result<T> {
        let bytes = self.readable(T::WIDTH)?;
        let Ok(raw) = T::Bytes::try_from(bytes) else {
            return Err(Error::BeyondEnd);
        };

        let value = if e.is_big() {
            T::from_be_bytes(raw)
        } else {
            T::from_le_bytes(raw)
        };
        self.consume(T::WIDTH);

        Ok(value)
    }

    /// Reads an `nbytes` wide unsigned integer at the cursor using the
    /// accessor's current endianness.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for widths above 8 bytes and
    /// [`Error::BeyondEnd`] if fewer than `nbytes` bytes are available.
    pub fn read_uint(&mut self, nbytes: usize) -> Result<u64> {
        self.read_endian_uint(nbytes, self.endianness)
    }

    /// Reads an `nbytes` wide unsigned integer at the cursor using the
    /// given endianness.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for widths above 8 bytes and
    /// [`Error::BeyondEnd`] if fewer than `nbytes` bytes are available.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bytescope::{Accessor, Endianness};
    ///
    /// let data = [0x12, 0x34, 0x56, 0x78, 0x9a];
    /// let mut acc = Accessor::open_reading_memory(&data, 0, None)?;
    ///
    /// assert_eq!(acc.read_endian_uint(5, Endianness::Big)?, 0x123456789a);
    /// # Ok::<(), bytescope::Error>(())
    /// ```
    pub fn read_endian_uint(&mut self, nbytes: usize, e: Endianness) -> Result<u64> {
        if nbytes > 8 {
            return Err(Error::InvalidParameter("integer width exceeds 8 bytes"));
        }

        let value = swap::read_uint_at(self.readable(nbytes)?, e);
        self.consume(nbytes);

        Ok(value)
    }

    /// Reads an `nbytes` wide signed integer at the cursor using the
    /// accessor's current endianness, sign-extending from bit
    /// `nbytes * 8 - 1`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for widths above 8 bytes and
    /// [`Error::BeyondEnd`] if fewer than `nbytes` bytes are available.
    pub fn read_int(&mut self, nbytes: usize) -> Result<i64> {
        self.read_endian_int(nbytes, self.endianness)
    }

    /// Reads an `nbytes` wide signed integer at the cursor using the given
    /// endianness, sign-extending from bit `nbytes * 8 - 1`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for widths above 8 bytes and
    /// [`Error::BeyondEnd`] if fewer than `nbytes` bytes are available.
    pub fn read_endian_int(&mut self, nbytes: usize, e: Endianness) -> Result<i64> {
        if nbytes > 8 {
            return Err(Error::InvalidParameter("integer width exceeds 8 bytes"));
        }

        let value = swap::read_int_at(self.readable(nbytes)?, e);
        self.consume(nbytes);

        Ok(value)
    }

    /// Reads a 3-byte unsigned integer at the cursor using the accessor's
    /// current endianness, zero-extended to 32 bits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if fewer than 3 bytes are available.
    pub fn read_u24(&mut self) -> Result<u32> {
        self.read_endian_u24(self.endianness)
    }

    /// Reads a 3-byte unsigned integer at the cursor using the given
    /// endianness, zero-extended to 32 bits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if fewer than 3 bytes are available.
    pub fn read_endian_u24(&mut self, e: Endianness) -> Result<u32> {
        let value = swap::read_uint_at(self.readable(3)?, e) as u32;
        self.consume(3);

        Ok(value)
    }

    /// Reads a 3-byte signed integer at the cursor using the accessor's
    /// current endianness, sign-extended from bit 23 to 32 bits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if fewer than 3 bytes are available.
    pub fn read_i24(&mut self) -> Result<i32> {
        self.read_endian_i24(self.endianness)
    }

    /// Reads a 3-byte signed integer at the cursor using the given
    /// endianness, sign-extended from bit 23 to 32 bits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if fewer than 3 bytes are available.
    pub fn read_endian_i24(&mut self, e: Endianness) -> Result<i32> {
        let value = swap::read_int_at(self.readable(3)?, e) as i32;
        self.consume(3);

        Ok(value)
    }

    /// Reads an unsigned base-128 varint at the cursor.
    ///
    /// The encoding is the one found in protobuf: seven payload bits per
    /// byte, least significant group first, high bit set on every byte but
    /// the last. The byte order is fixed by the encoding and cannot be
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if the window ends before the varint
    /// terminates and [`Error::InvalidData`] if the value does not
    /// terminate within the bytes a 64-bit accumulator can hold.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bytescope::Accessor;
    ///
    /// let data = [0xac, 0x02];
    /// let mut acc = Accessor::open_reading_memory(&data, 0, None)?;
    /// assert_eq!(acc.read_varint()?, 300);
    /// # Ok::<(), bytescope::Error>(())
    /// ```
    pub fn read_varint(&mut self) -> Result<u64> {
        let remaining = self.remaining();

        let mut result = 0_u64;
        let mut shift = 0_u32;
        let mut nbytes = 0_usize;
        let byte = loop {
            let Some(&byte) = remaining.get(nbytes) else {
                return Err(Error::BeyondEnd);
            };
            nbytes += 1;

            result |= u64::from(byte & 0x7f) << shift;
            shift += 7;

            if byte & 0x80 == 0 || shift >= u64::BITS {
                break byte;
            }
        };

        if byte & 0x80 != 0 {
            return Err(invalid_data_error!(
                "varint did not terminate within {} bytes",
                nbytes
            ));
        }

        self.consume(nbytes);

        Ok(result)
    }

    /// Reads a signed zig-zag base-128 varint at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if the window ends before the varint
    /// terminates and [`Error::InvalidData`] if the value does not
    /// terminate within the bytes a 64-bit accumulator can hold.
    pub fn read_zigzag(&mut self) -> Result<i64> {
        let varint = self.read_varint()?;

        Ok((varint >> 1) as i64 ^ -((varint & 1) as i64))
    }

    /// Reads `count` scalars at the cursor using the accessor's current
    /// endianness.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if the array does not fit the available
    /// bytes, [`Error::InvalidParameter`] if its byte count overflows, and
    /// [`Error::OutOfMemory`] if the result cannot be allocated.
    pub fn read_array<T: Scalar>(&mut self, count: usize) -> Result<Vec<T>> {
        self.read_endian_array(count, self.endianness)
    }

    /// Reads `count` scalars at the cursor using the given endianness.
    ///
    /// A single coverage record is added for the whole array.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if the array does not fit the available
    /// bytes, [`Error::InvalidParameter`] if its byte count overflows, and
    /// [`Error::OutOfMemory`] if the result cannot be allocated.
    pub fn read_endian_array<T: Scalar>(&mut self, count: usize, e: Endianness) -> Result<Vec<T>> {
        let nbytes = count
            .checked_mul(T::WIDTH)
            .ok_or(Error::InvalidParameter("array byte count overflows"))?;

        let src = self.readable(nbytes)?;
        let mut array = Vec::new();
        array
            .try_reserve_exact(count)
            .map_err(|_| Error::OutOfMemory)?;

        let big = e.is_big();
        for chunk in src.chunks_exact(T::WIDTH) {
            let Ok(raw) = T::Bytes::try_from(chunk) else {
                return Err(Error::BeyondEnd);
            };
            array.push(if big {
                T::from_be_bytes(raw)
            } else {
                T::from_le_bytes(raw)
            });
        }

        self.consume(nbytes);

        Ok(array)
    }

    /// Reads `count` 3-byte unsigned integers at the cursor using the
    /// accessor's current endianness.
    ///
    /// # Errors
    ///
    /// As [`read_endian_u24_array`](Accessor::read_endian_u24_array).
    pub fn read_u24_array(&mut self, count: usize) -> Result<Vec<u32>> {
        self.read_endian_u24_array(count, self.endianness)
    }

    /// Reads `count` 3-byte unsigned integers at the cursor using the given
    /// endianness, each zero-extended to 32 bits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if the array does not fit the available
    /// bytes, [`Error::InvalidParameter`] if its byte count overflows, and
    /// [`Error::OutOfMemory`] if the result cannot be allocated.
    pub fn read_endian_u24_array(&mut self, count: usize, e: Endianness) -> Result<Vec<u32>> {
        let nbytes = count
            .checked_mul(3)
            .ok_or(Error::InvalidParameter("array byte count overflows"))?;

        let src = self.readable(nbytes)?;
        let mut array = Vec::new();
        array
            .try_reserve_exact(count)
            .map_err(|_| Error::OutOfMemory)?;
        for chunk in src.chunks_exact(3) {
            array.push(swap::read_uint_at(chunk, e) as u32);
        }

        self.consume(nbytes);

        Ok(array)
    }

    /// Reads `count` 3-byte signed integers at the cursor using the
    /// accessor's current endianness.
    ///
    /// # Errors
    ///
    /// As [`read_endian_i24_array`](Accessor::read_endian_i24_array).
    pub fn read_i24_array(&mut self, count: usize) -> Result<Vec<i32>> {
        self.read_endian_i24_array(count, self.endianness)
    }

    /// Reads `count` 3-byte signed integers at the cursor using the given
    /// endianness, each sign-extended from bit 23.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if the array does not fit the available
    /// bytes, [`Error::InvalidParameter`] if its byte count overflows, and
    /// [`Error::OutOfMemory`] if the result cannot be allocated.
    pub fn read_endian_i24_array(&mut self, count: usize, e: Endianness) -> Result<Vec<i32>> {
        let nbytes = count
            .checked_mul(3)
            .ok_or(Error::InvalidParameter("array byte count overflows"))?;

        let src = self.readable(nbytes)?;
        let mut array = Vec::new();
        array
            .try_reserve_exact(count)
            .map_err(|_| Error::OutOfMemory)?;
        for chunk in src.chunks_exact(3) {
            array.push(swap::read_int_at(chunk, e) as i32);
        }

        self.consume(nbytes);

        Ok(array)
    }

    /// Reads exactly `buf.len()` bytes at the cursor into `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if fewer than `buf.len()` bytes are
    /// available.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        let src = self.readable(buf.len())?;
        buf.copy_from_slice(src);
        self.consume(buf.len());

        Ok(())
    }

    /// Reads exactly `buf.len()` bytes at the cursor into `buf`, reversing
    /// the buffer when `e` is byte-reversed with respect to the host.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if fewer than `buf.len()` bytes are
    /// available.
    pub fn read_endian_bytes(&mut self, buf: &mut [u8], e: Endianness) -> Result<()> {
        self.read_bytes(buf)?;
        if e.is_reverse() {
            buf.reverse();
        }

        Ok(())
    }

    /// Reads `count` bytes at the cursor into a freshly allocated buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if fewer than `count` bytes are
    /// available and [`Error::OutOfMemory`] if the buffer cannot be
    /// allocated.
    pub fn read_bytes_to_vec(&mut self, count: usize) -> Result<Vec<u8>> {
        let src = self.readable(count)?;
        let mut buf = Vec::new();
        buf.try_reserve_exact(count).map_err(|_| Error::OutOfMemory)?;
        buf.extend_from_slice(src);

        self.consume(count);

        Ok(buf)
    }

    /// Reads `count` bytes at the cursor into a freshly allocated buffer,
    /// reversing it when `e` is byte-reversed with respect to the host.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if fewer than `count` bytes are
    /// available and [`Error::OutOfMemory`] if the buffer cannot be
    /// allocated.
    pub fn read_endian_bytes_to_vec(&mut self, count: usize, e: Endianness) -> Result<Vec<u8>> {
        let mut buf = self.read_bytes_to_vec(count)?;
        if e.is_reverse() {
            buf.reverse();
        }

        Ok(buf)
    }

    /// Reads bytes in place: advances the cursor past `count` bytes and
    /// returns them as a slice into the accessor's storage, avoiding a
    /// copy.
    ///
    /// Coverage is recorded as for any other read. The slice borrows the
    /// accessor, so it ends before the next cursor-moving operation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if fewer than `count` bytes are
    /// available.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bytescope::Accessor;
    ///
    /// let data = [1u8, 2, 3, 4];
    /// let mut acc = Accessor::open_reading_memory(&data, 0, None)?;
    ///
    /// let head = acc.read_bytes_in_place(3)?;
    /// assert_eq!(head, &[1, 2, 3]);
    /// assert_eq!(acc.available_bytes(), 1);
    /// # Ok::<(), bytescope::Error>(())
    /// ```
    pub fn read_bytes_in_place(&mut self, count: usize) -> Result<&[u8]> {
        if self.available_bytes() < count {
            return Err(Error::BeyondEnd);
        }

        let start = self.base_window_offset + self.cursor;
        self.consume(count);

        Ok(&self.data()[start..start + count])
    }

    // ------------------------------------------------------------------
    // strings

    /// Reads a C string at the cursor: bytes up to a NUL terminator.
    ///
    /// The returned payload excludes the terminator; the cursor advances
    /// past it. No charset conversion is performed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if no terminator occurs inside the
    /// window and [`Error::OutOfMemory`] if the result cannot be
    /// allocated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bytescope::Accessor;
    ///
    /// let data = b"name\0rest";
    /// let mut acc = Accessor::open_reading_memory(data, 0, None)?;
    ///
    /// assert_eq!(acc.read_c_string()?, b"name");
    /// assert_eq!(acc.cursor(), 5);
    /// # Ok::<(), bytescope::Error>(())
    /// ```
    pub fn read_c_string(&mut self) -> Result<Vec<u8>> {
        let remaining = self.remaining();
        let Some(length) = remaining.iter().position(|&b| b == 0) else {
            return Err(Error::BeyondEnd);
        };

        let mut string = Vec::new();
        string
            .try_reserve_exact(length)
            .map_err(|_| Error::OutOfMemory)?;
        string.extend_from_slice(&remaining[..length]);

        self.consume(length + 1);

        Ok(string)
    }

    /// Reads a Pascal string at the cursor: one length byte followed by
    /// that many payload bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if the length byte or the payload does
    /// not fit the window and [`Error::OutOfMemory`] if the result cannot
    /// be allocated.
    pub fn read_p_string(&mut self) -> Result<Vec<u8>> {
        let remaining = self.remaining();
        let Some(&length) = remaining.first() else {
            return Err(Error::BeyondEnd);
        };
        let length = usize::from(length);
        if remaining.len() < 1 + length {
            return Err(Error::BeyondEnd);
        }

        let mut string = Vec::new();
        string
            .try_reserve_exact(length)
            .map_err(|_| Error::OutOfMemory)?;
        string.extend_from_slice(&remaining[1..1 + length]);

        self.consume(1 + length);

        Ok(string)
    }

    /// Reads an unterminated fixed-length string of exactly `length` bytes
    /// at the cursor.
    ///
    /// The payload may contain embedded NUL bytes; its length is not
    /// adjusted for them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if fewer than `length` bytes are
    /// available and [`Error::OutOfMemory`] if the result cannot be
    /// allocated.
    pub fn read_fixed_string(&mut self, length: usize) -> Result<Vec<u8>> {
        self.read_bytes_to_vec(length)
    }

    /// Reads a padded string at the cursor: `length` bytes with trailing
    /// `pad` bytes stripped from the result.
    ///
    /// The cursor advances past all `length` bytes regardless of padding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if fewer than `length` bytes are
    /// available and [`Error::OutOfMemory`] if the result cannot be
    /// allocated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bytescope::Accessor;
    ///
    /// let data = b"DISKNAME  ";
    /// let mut acc = Accessor::open_reading_memory(data, 0, None)?;
    ///
    /// assert_eq!(acc.read_padded_string(10, b' ')?, b"DISKNAME");
    /// assert_eq!(acc.cursor(), 10);
    /// # Ok::<(), bytescope::Error>(())
    /// ```
    pub fn read_padded_string(&mut self, length: usize, pad: u8) -> Result<Vec<u8>> {
        let mut string = self.read_bytes_to_vec(length)?;
        while string.last() == Some(&pad) {
            string.pop();
        }

        Ok(string)
    }

    /// Reads a NUL-terminated string of 16-bit code units at the cursor
    /// using the accessor's current endianness.
    ///
    /// # Errors
    ///
    /// As [`read_endian_string16`](Accessor::read_endian_string16).
    pub fn read_string16(&mut self) -> Result<Vec<u16>> {
        self.read_endian_string16(self.endianness)
    }

    /// Reads a NUL-terminated string of 16-bit code units at the cursor
    /// using the given endianness.
    ///
    /// The returned payload excludes the terminator unit; the cursor
    /// advances past it. The units are raw code units, no charset
    /// conversion is performed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if no terminator unit occurs inside the
    /// window and [`Error::OutOfMemory`] if the result cannot be
    /// allocated.
    pub fn read_endian_string16(&mut self, e: Endianness) -> Result<Vec<u16>> {
        let remaining = self.remaining();

        let mut count = 0_usize;
        loop {
            let start = count * 2;
            if start + 2 > remaining.len() {
                return Err(Error::BeyondEnd);
            }
            if remaining[start] == 0 && remaining[start + 1] == 0 {
                break;
            }
            count += 1;
        }

        let mut string = Vec::new();
        string
            .try_reserve_exact(count)
            .map_err(|_| Error::OutOfMemory)?;

        let big = e.is_big();
        for chunk in remaining[..count * 2].chunks_exact(2) {
            let raw = [chunk[0], chunk[1]];
            string.push(if big {
                u16::from_be_bytes(raw)
            } else {
                u16::from_le_bytes(raw)
            });
        }

        self.consume((count + 1) * 2);

        Ok(string)
    }

    /// Reads a NUL-terminated string of 32-bit code units at the cursor
    /// using the accessor's current endianness.
    ///
    /// # Errors
    ///
    /// As [`read_endian_string32`](Accessor::read_endian_string32).
    pub fn read_string32(&mut self) -> Result<Vec<u32>> {
        self.read_endian_string32(self.endianness)
    }

    /// Reads a NUL-terminated string of 32-bit code units at the cursor
    /// using the given endianness.
    ///
    /// The returned payload excludes the terminator unit; the cursor
    /// advances past it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeyondEnd`] if no terminator unit occurs inside the
    /// window and [`Error::OutOfMemory`] if the result cannot be
    /// allocated.
    pub fn read_endian_string32(&mut self, e: Endianness) -> Result<Vec<u32>> {
        let remaining = self.remaining();

        let mut count = 0_usize;
        loop {
            let start = count * 4;
            if start + 4 > remaining.len() {
                return Err(Error::BeyondEnd);
            }
            if remaining[start..start + 4] == [0, 0, 0, 0] {
                break;
            }
            count += 1;
        }

        let mut string = Vec::new();
        string
            .try_reserve_exact(count)
            .map_err(|_| Error::OutOfMemory)?;

        let big = e.is_big();
        for chunk in remaining[..count * 4].chunks_exact(4) {
            let raw = [chunk[0], chunk[1], chunk[2], chunk[3]];
            string.push(if big {
                u32::from_be_bytes(raw)
            } else {
                u32::from_le_bytes(raw)
            });
        }

        self.consume((count + 1) * 4);

        Ok(string)
    }
}
