//! Typed write operations.
//!
//! Writes are only valid on a write-enabled accessor; everything else
//! reports [`Error::ReadOnly`]. A write at the end of the window extends
//! the window, growing the underlying buffer in granularity-sized steps.
//! Writes never record coverage.

use crate::{swap, Endianness, Error, Result};

use super::{Accessor, Scalar};

impl Accessor<'_> {
    /// Writes a scalar at the cursor using the accessor's current
    /// endianness.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bytescope::{Accessor, Endianness};
    ///
    /// let mut out = Accessor::open_writing_memory(0, 0)?;
    /// out.set_endianness(Endianness::Big);
    ///
    /// out.write::<u16>(0x1234)?;
    /// out.write::<f64>(-0.5)?;
    /// assert_eq!(out.len(), 10);
    /// # Ok::<(), bytescope::Error>(())
    /// ```
    pub fn write<T: Scalar>(&mut self, x: T) -> Result<()> {
        self.write_endian(x, self.endianness)
    }

    /// Writes a scalar at the cursor using the given endianness.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_endian<T: Scalar>(&mut self, x: T, e: Endianness) -> Result<()> {
        let raw = if e.is_big() {
            x.to_be_bytes()
        } else {
            x.to_le_bytes()
        };

        let dst = self.writable(T::WIDTH)?;
        dst.copy_from_slice(raw.as_ref());

        Ok(())
    }

    /// Writes the low `nbytes` bytes of an unsigned integer at the cursor
    /// using the accessor's current endianness.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for widths above 8 bytes,
    /// [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_uint(&mut self, x: u64, nbytes: usize) -> Result<()> {
        self.write_endian_uint(x, nbytes, self.endianness)
    }

    /// Writes the low `nbytes` bytes of an unsigned integer at the cursor
    /// using the given endianness.
    ///
    /// Unused high order bits of `x` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for widths above 8 bytes,
    /// [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_endian_uint(&mut self, x: u64, nbytes: usize, e: Endianness) -> Result<()> {
        if nbytes > 8 {
            return Err(Error::InvalidParameter("integer width exceeds 8 bytes"));
        }

        let dst = self.writable(nbytes)?;
        swap::write_uint_at(dst, x, e);

        Ok(())
    }

    /// Writes the low `nbytes` bytes of a signed integer at the cursor
    /// using the accessor's current endianness.
    ///
    /// # Errors
    ///
    /// As [`write_endian_int`](Accessor::write_endian_int).
    pub fn write_int(&mut self, x: i64, nbytes: usize) -> Result<()> {
        self.write_endian_int(x, nbytes, self.endianness)
    }

    /// Writes the low `nbytes` bytes of a signed integer at the cursor
    /// using the given endianness.
    ///
    /// The two's-complement low bytes are what lands on the wire, so a
    /// value that fits `nbytes` bytes reads back identically through
    /// [`read_endian_int`](Accessor::read_endian_int).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for widths above 8 bytes,
    /// [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_endian_int(&mut self, x: i64, nbytes: usize, e: Endianness) -> Result<()> {
        self.write_endian_uint(x as u64, nbytes, e)
    }

    /// Writes a 3-byte unsigned integer at the cursor using the accessor's
    /// current endianness.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_u24(&mut self, x: u32) -> Result<()> {
        self.write_endian_u24(x, self.endianness)
    }

    /// Writes a 3-byte unsigned integer at the cursor using the given
    /// endianness.
    ///
    /// Bits 24..32 of `x` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_endian_u24(&mut self, x: u32, e: Endianness) -> Result<()> {
        let dst = self.writable(3)?;
        swap::write_uint_at(dst, u64::from(x), e);

        Ok(())
    }

    /// Writes a 3-byte signed integer at the cursor using the accessor's
    /// current endianness.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_i24(&mut self, x: i32) -> Result<()> {
        self.write_endian_i24(x, self.endianness)
    }

    /// Writes a 3-byte signed integer at the cursor using the given
    /// endianness.
    ///
    /// Bits 24..32 of `x` are ignored; a value in the 24-bit range reads
    /// back identically through
    /// [`read_endian_i24`](Accessor::read_endian_i24).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_endian_i24(&mut self, x: i32, e: Endianness) -> Result<()> {
        self.write_endian_u24(x as u32, e)
    }

    /// Writes an unsigned base-128 varint at the cursor.
    ///
    /// The encoding is the one found in protobuf; on the wire the value
    /// takes 1 to 10 bytes. The byte order is fixed by the encoding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_varint(&mut self, x: u64) -> Result<()> {
        let mut nbytes = 1;
        let mut tmp = x >> 7;
        while tmp != 0 {
            nbytes += 1;
            tmp >>= 7;
        }

        let dst = self.writable(nbytes)?;

        let mut value = x;
        for slot in dst[..nbytes - 1].iter_mut() {
            *slot = (value as u8 & 0x7f) | 0x80; // another byte follows
            value >>= 7;
        }
        dst[nbytes - 1] = value as u8 & 0x7f; // last byte

        Ok(())
    }

    /// Writes a signed zig-zag base-128 varint at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_zigzag(&mut self, x: i64) -> Result<()> {
        // avoid the implementation-defined right shift of negative values
        if x >= 0 {
            self.write_varint((x as u64) << 1)
        } else {
            self.write_varint(!((x as u64) << 1))
        }
    }

    /// Writes an array of scalars at the cursor using the accessor's
    /// current endianness.
    ///
    /// # Errors
    ///
    /// As [`write_endian_array`](Accessor::write_endian_array).
    pub fn write_array<T: Scalar>(&mut self, array: &[T]) -> Result<()> {
        self.write_endian_array(array, self.endianness)
    }

    /// Writes an array of scalars at the cursor using the given endianness.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the byte count overflows,
    /// [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_endian_array<T: Scalar>(&mut self, array: &[T], e: Endianness) -> Result<()> {
        let nbytes = array
            .len()
            .checked_mul(T::WIDTH)
            .ok_or(Error::InvalidParameter("array byte count overflows"))?;

        let big = e.is_big();
        let dst = self.writable(nbytes)?;
        for (slot, &x) in dst.chunks_exact_mut(T::WIDTH).zip(array) {
            let raw = if big { x.to_be_bytes() } else { x.to_le_bytes() };
            slot.copy_from_slice(raw.as_ref());
        }

        Ok(())
    }

    /// Writes an array of 3-byte unsigned integers at the cursor using the
    /// accessor's current endianness.
    ///
    /// # Errors
    ///
    /// As [`write_endian_u24_array`](Accessor::write_endian_u24_array).
    pub fn write_u24_array(&mut self, array: &[u32]) -> Result<()> {
        self.write_endian_u24_array(array, self.endianness)
    }

    /// Writes an array of 3-byte unsigned integers at the cursor using the
    /// given endianness.
    ///
    /// Bits 24..32 of each element are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the byte count overflows,
    /// [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_endian_u24_array(&mut self, array: &[u32], e: Endianness) -> Result<()> {
        let nbytes = array
            .len()
            .checked_mul(3)
            .ok_or(Error::InvalidParameter("array byte count overflows"))?;

        let dst = self.writable(nbytes)?;
        for (slot, &x) in dst.chunks_exact_mut(3).zip(array) {
            swap::write_uint_at(slot, u64::from(x), e);
        }

        Ok(())
    }

    /// Writes an array of 3-byte signed integers at the cursor using the
    /// accessor's current endianness.
    ///
    /// # Errors
    ///
    /// As [`write_endian_u24_array`](Accessor::write_endian_u24_array).
    pub fn write_i24_array(&mut self, array: &[i32]) -> Result<()> {
        self.write_endian_i24_array(array, self.endianness)
    }

    /// Writes an array of 3-byte signed integers at the cursor using the
    /// given endianness.
    ///
    /// # Errors
    ///
    /// As [`write_endian_u24_array`](Accessor::write_endian_u24_array).
    pub fn write_endian_i24_array(&mut self, array: &[i32], e: Endianness) -> Result<()> {
        let nbytes = array
            .len()
            .checked_mul(3)
            .ok_or(Error::InvalidParameter("array byte count overflows"))?;

        let dst = self.writable(nbytes)?;
        for (slot, &x) in dst.chunks_exact_mut(3).zip(array) {
            swap::write_uint_at(slot, x as u32 as u64, e);
        }

        Ok(())
    }

    /// Writes a chunk of bytes at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let dst = self.writable(bytes.len())?;
        dst.copy_from_slice(bytes);

        Ok(())
    }

    /// Writes a chunk of bytes at the cursor, reversed when `e` is
    /// byte-reversed with respect to the host.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_endian_bytes(&mut self, bytes: &[u8], e: Endianness) -> Result<()> {
        let dst = self.writable(bytes.len())?;
        dst.copy_from_slice(bytes);
        if e.is_reverse() {
            dst.reverse();
        }

        Ok(())
    }

    /// Writes `count` copies of `byte` at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_repeated_byte(&mut self, byte: u8, count: usize) -> Result<()> {
        let dst = self.writable(count)?;
        dst.fill(byte);

        Ok(())
    }

    /// Writes bytes in place: advances the cursor past `count` bytes and
    /// returns them as a mutable slice into the accessor's buffer that the
    /// caller MUST fill, avoiding an intermediate copy.
    ///
    /// The slice borrows the accessor, so it ends before the next
    /// cursor-moving operation (and thus before any reallocation).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bytescope::Accessor;
    ///
    /// let mut out = Accessor::open_writing_memory(0, 0)?;
    /// out.write_bytes_in_place(4)?.copy_from_slice(b"FORM");
    /// assert_eq!(out.len(), 4);
    /// # Ok::<(), bytescope::Error>(())
    /// ```
    pub fn write_bytes_in_place(&mut self, count: usize) -> Result<&mut [u8]> {
        self.writable(count)
    }

    // ------------------------------------------------------------------
    // strings

    /// Writes a C string at the cursor: the payload followed by a NUL
    /// terminator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_c_string(&mut self, s: &[u8]) -> Result<()> {
        let nbytes = s
            .len()
            .checked_add(1)
            .ok_or(Error::InvalidParameter("string byte count overflows"))?;

        let dst = self.writable(nbytes)?;
        dst[..s.len()].copy_from_slice(s);
        dst[s.len()] = 0;

        Ok(())
    }

    /// Writes a Pascal string at the cursor: one length byte followed by
    /// the payload, no terminator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for payloads longer than 255
    /// bytes, [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_p_string(&mut self, s: &[u8]) -> Result<()> {
        if s.len() > 255 {
            return Err(Error::InvalidParameter(
                "pascal string payload exceeds 255 bytes",
            ));
        }

        let dst = self.writable(1 + s.len())?;
        dst[0] = s.len() as u8;
        dst[1..].copy_from_slice(s);

        Ok(())
    }

    /// Writes a padded string at the cursor: the payload followed by `pad`
    /// bytes up to `padded_length`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the payload is longer than
    /// `padded_length`, [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_padded_string(&mut self, s: &[u8], padded_length: usize, pad: u8) -> Result<()> {
        if s.len() > padded_length {
            return Err(Error::InvalidParameter(
                "string longer than the padded length",
            ));
        }

        let dst = self.writable(padded_length)?;
        dst[..s.len()].copy_from_slice(s);
        dst[s.len()..].fill(pad);

        Ok(())
    }

    /// Writes a string of 16-bit code units at the cursor, including a
    /// trailing NUL unit, using the accessor's current endianness.
    ///
    /// # Errors
    ///
    /// As [`write_endian_string16`](Accessor::write_endian_string16).
    pub fn write_string16(&mut self, s: &[u16]) -> Result<()> {
        self.write_endian_string16(s, self.endianness)
    }

    /// Writes a string of 16-bit code units at the cursor, including a
    /// trailing NUL unit, using the given endianness.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the byte count overflows,
    /// [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_endian_string16(&mut self, s: &[u16], e: Endianness) -> Result<()> {
        let nbytes = s
            .len()
            .checked_add(1)
            .and_then(|units| units.checked_mul(2))
            .ok_or(Error::InvalidParameter("string byte count overflows"))?;

        let big = e.is_big();
        let dst = self.writable(nbytes)?;
        let terminated = s.iter().copied().chain(std::iter::once(0));
        for (slot, unit) in dst.chunks_exact_mut(2).zip(terminated) {
            let raw = if big {
                unit.to_be_bytes()
            } else {
                unit.to_le_bytes()
            };
            slot.copy_from_slice(&raw);
        }

        Ok(())
    }

    /// Writes a string of 32-bit code units at the cursor, including a
    /// trailing NUL unit, using the accessor's current endianness.
    ///
    /// # Errors
    ///
    /// As [`write_endian_string32`](Accessor::write_endian_string32).
    pub fn write_string32(&mut self, s: &[u32]) -> Result<()> {
        self.write_endian_string32(s, self.endianness)
    }

    /// Writes a string of 32-bit code units at the cursor, including a
    /// trailing NUL unit, using the given endianness.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the byte count overflows,
    /// [`Error::ReadOnly`] on a read-only accessor and
    /// [`Error::OutOfMemory`] if the buffer cannot grow.
    pub fn write_endian_string32(&mut self, s: &[u32], e: Endianness) -> Result<()> {
        let nbytes = s
            .len()
            .checked_add(1)
            .and_then(|units| units.checked_mul(4))
            .ok_or(Error::InvalidParameter("string byte count overflows"))?;

        let big = e.is_big();
        let dst = self.writable(nbytes)?;
        let terminated = s.iter().copied().chain(std::iter::once(0));
        for (slot, unit) in dst.chunks_exact_mut(4).zip(terminated) {
            let raw = if big {
                unit.to_be_bytes()
            } else {
                unit.to_le_bytes()
            };
            slot.copy_from_slice(&raw);
        }

        Ok(())
    }
}
