//! Integration tests for write-then-read round-trips across widths and
//! endianness tags.

use bytescope::prelude::*;
use rand::{Rng, SeedableRng};

const ALL_ENDIANNESS: [Endianness; 4] = [
    Endianness::Big,
    Endianness::Little,
    Endianness::Native,
    Endianness::Reverse,
];

fn writer(e: Endianness) -> Accessor<'static> {
    let mut acc = Accessor::open_writing_memory(0, 0).unwrap();
    acc.set_endianness(e);
    acc
}

/// Unsigned values written at every width read back as their
/// sign-extended counterparts.
#[test]
fn signed_reinterpretation_of_unsigned_writes() {
    for e in ALL_ENDIANNESS {
        let mut acc = writer(e);

        acc.write::<u8>(0x87).unwrap();
        acc.write::<u16>(0x8765).unwrap();
        acc.write_u24(0x876543).unwrap();
        acc.write::<u32>(0x87654321).unwrap();
        acc.write::<u64>(0x876543210fedcba9).unwrap();
        acc.write_uint(0x876543210fedcb, 7).unwrap();

        acc.seek(SeekFrom::Start(0)).unwrap();

        assert_eq!(acc.read::<i8>().unwrap(), -0x79);
        assert_eq!(acc.read::<i16>().unwrap(), -0x789b);
        assert_eq!(acc.read_i24().unwrap(), -0x789abd);
        assert_eq!(acc.read::<i32>().unwrap(), -0x789abcdf);
        assert_eq!(acc.read::<i64>().unwrap(), -0x789abcdef0123457);
        assert_eq!(acc.read_int(7).unwrap(), -0x789abcdef01235);

        assert_eq!(acc.available_bytes(), 0);
    }
}

/// Floats survive bit-exactly under every endianness tag.
#[test]
fn float_round_trip_is_bit_exact() {
    #[allow(clippy::excessive_precision)]
    let f32_value = -0.1234567890123456789_f32;
    #[allow(clippy::excessive_precision)]
    let f64_value = -0.1234567890123456789_f64;

    for e in ALL_ENDIANNESS {
        let mut acc = writer(e);
        acc.write::<f32>(f32_value).unwrap();
        acc.write::<f64>(f64_value).unwrap();

        acc.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(acc.read::<f32>().unwrap().to_bits(), f32_value.to_bits());
        assert_eq!(acc.read::<f64>().unwrap().to_bits(), f64_value.to_bits());
    }
}

/// Every scalar type round-trips through write + seek + read.
#[test]
fn scalar_round_trip_all_types() {
    for e in ALL_ENDIANNESS {
        let mut acc = writer(e);

        acc.write::<u8>(0xa5).unwrap();
        acc.write::<i8>(-0x5a).unwrap();
        acc.write::<u16>(0xbeef).unwrap();
        acc.write::<i16>(-0x1234).unwrap();
        acc.write::<u32>(0xdeadbeef).unwrap();
        acc.write::<i32>(-0x12345678).unwrap();
        acc.write::<u64>(0xfeedfacecafebeef).unwrap();
        acc.write::<i64>(-0x123456789abcdef0).unwrap();
        acc.write_u24(0xfedcba).unwrap();
        acc.write_i24(-0x123456).unwrap();

        acc.seek(SeekFrom::Start(0)).unwrap();

        assert_eq!(acc.read::<u8>().unwrap(), 0xa5);
        assert_eq!(acc.read::<i8>().unwrap(), -0x5a);
        assert_eq!(acc.read::<u16>().unwrap(), 0xbeef);
        assert_eq!(acc.read::<i16>().unwrap(), -0x1234);
        assert_eq!(acc.read::<u32>().unwrap(), 0xdeadbeef);
        assert_eq!(acc.read::<i32>().unwrap(), -0x12345678);
        assert_eq!(acc.read::<u64>().unwrap(), 0xfeedfacecafebeef);
        assert_eq!(acc.read::<i64>().unwrap(), -0x123456789abcdef0);
        assert_eq!(acc.read_u24().unwrap(), 0xfedcba);
        assert_eq!(acc.read_i24().unwrap(), -0x123456);
        assert_eq!(acc.available_bytes(), 0);
    }
}

/// Reading at the opposite endianness yields the byte-swapped value.
#[test]
fn opposite_endianness_reads_swapped() {
    for e in ALL_ENDIANNESS {
        let mut acc = writer(e);
        acc.write_endian::<u16>(0x8765, e).unwrap();
        acc.write_endian::<u32>(0x87654321, e).unwrap();
        acc.write_endian::<u64>(0x876543210fedcba9, e).unwrap();
        acc.write_endian_u24(0x876543, e).unwrap();
        acc.write_endian_uint(0x123456789a, 5, e).unwrap();

        acc.seek(SeekFrom::Start(0)).unwrap();
        let o = e.opposite();

        assert_eq!(
            acc.read_endian::<u16>(o).unwrap(),
            bytescope::swap_u16(0x8765)
        );
        assert_eq!(
            acc.read_endian::<u32>(o).unwrap(),
            bytescope::swap_u32(0x87654321)
        );
        assert_eq!(
            acc.read_endian::<u64>(o).unwrap(),
            bytescope::swap_u64(0x876543210fedcba9)
        );
        assert_eq!(
            acc.read_endian_u24(o).unwrap(),
            bytescope::swap_u24(0x876543)
        );
        assert_eq!(
            acc.read_endian_uint(5, o).unwrap(),
            bytescope::swap_uint(0x123456789a, 5)
        );
    }
}

/// Varint and zig-zag encodings round-trip over the whole value range.
#[test]
fn varint_and_zigzag_round_trip() {
    let unsigned = [
        0_u64,
        1,
        0x7f,
        0x80,
        0x3fff,
        0x4000,
        u64::from(u32::MAX),
        u64::MAX - 1,
        u64::MAX,
    ];
    let signed = [0_i64, 1, -1, 63, -64, 64, -65, i64::MAX, i64::MIN];

    let mut acc = writer(Endianness::Big);
    for &v in &unsigned {
        acc.write_varint(v).unwrap();
    }
    for &v in &signed {
        acc.write_zigzag(v).unwrap();
    }

    acc.seek(SeekFrom::Start(0)).unwrap();
    for &v in &unsigned {
        assert_eq!(acc.read_varint().unwrap(), v);
    }
    for &v in &signed {
        assert_eq!(acc.read_zigzag().unwrap(), v);
    }
    assert_eq!(acc.available_bytes(), 0);
}

/// Arrays round-trip for every element type and endianness.
#[test]
fn array_round_trip() {
    let u16s: Vec<u16> = (0..97).map(|i| 0x8000_u16.wrapping_add(i * 257)).collect();
    let i32s: Vec<i32> = (0..53).map(|i| -0x40000000 + i * 0x01020304).collect();
    let f64s: Vec<f64> = (0..19).map(|i| -0.25 * f64::from(i)).collect();
    let u24s: Vec<u32> = (0..31).map(|i| (i * 0x01fb37) & 0xffffff).collect();
    let i24s: Vec<i32> = (0..31).map(|i| -0x800000 + (i * 0x054321) % 0x1000000).collect();

    for e in ALL_ENDIANNESS {
        let mut acc = writer(Endianness::Native);

        acc.write_endian_array(&u16s, e).unwrap();
        acc.write_endian_array(&i32s, e).unwrap();
        acc.write_endian_array(&f64s, e).unwrap();
        acc.write_endian_u24_array(&u24s, e).unwrap();
        acc.write_endian_i24_array(&i24s, e).unwrap();

        acc.seek(SeekFrom::Start(0)).unwrap();

        assert_eq!(acc.read_endian_array::<u16>(u16s.len(), e).unwrap(), u16s);
        assert_eq!(acc.read_endian_array::<i32>(i32s.len(), e).unwrap(), i32s);
        assert_eq!(acc.read_endian_array::<f64>(f64s.len(), e).unwrap(), f64s);
        assert_eq!(acc.read_endian_u24_array(u24s.len(), e).unwrap(), u24s);
        assert_eq!(acc.read_endian_i24_array(i24s.len(), e).unwrap(), i24s);
        assert_eq!(acc.available_bytes(), 0);
    }
}

/// A large random block followed by three string shapes reads back intact.
#[test]
fn bulk_block_and_strings_round_trip() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x1337);
    let mut block = vec![0_u8; 65521];
    rng.fill(block.as_mut_slice());

    let pascal = b"pascal payload".to_vec();
    let c_string = b"a C string".to_vec();
    let wide: Vec<u16> = "wide chars".encode_utf16().collect();

    let mut acc = writer(Endianness::Little);
    acc.write_bytes(&block).unwrap();
    acc.write_p_string(&pascal).unwrap();
    acc.write_c_string(&c_string).unwrap();
    acc.write_string16(&wide).unwrap();

    acc.seek(SeekFrom::Start(0)).unwrap();

    assert_eq!(acc.read_bytes_to_vec(block.len()).unwrap(), block);
    assert_eq!(acc.read_p_string().unwrap(), pascal);
    assert_eq!(acc.read_c_string().unwrap(), c_string);
    assert_eq!(acc.read_string16().unwrap(), wide);
    assert_eq!(acc.available_bytes(), 0);
}

/// Wide strings round-trip under explicit endianness, including 32-bit
/// units.
#[test]
fn wide_string_round_trip() {
    let units16: Vec<u16> = vec![0x0041, 0x6c34, 0xfeff, 0x0001];
    let units32: Vec<u32> = vec![0x41, 0x1f600, 0xfffffffe, 1];

    for e in ALL_ENDIANNESS {
        let mut acc = writer(Endianness::Native);
        acc.write_endian_string16(&units16, e).unwrap();
        acc.write_endian_string32(&units32, e).unwrap();

        acc.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(acc.read_endian_string16(e).unwrap(), units16);
        assert_eq!(acc.read_endian_string32(e).unwrap(), units32);
    }
}

/// After writing values totalling `s` bytes and seeking home, exactly `s`
/// bytes are available.
#[test]
fn available_bytes_after_rewind() {
    let mut acc = writer(Endianness::Big);
    acc.write::<u32>(1).unwrap();
    acc.write::<u16>(2).unwrap();

    acc.seek(SeekFrom::Start(0)).unwrap();
    assert_eq!(acc.available_bytes(), 6);
    assert_eq!(acc.len(), 6);
}

/// Truncate pins the window at the cursor and further reads fail.
#[test]
fn truncate_ends_window() {
    let mut acc = writer(Endianness::Big);
    acc.write::<u64>(0x0102030405060708).unwrap();
    acc.seek(SeekFrom::Start(3)).unwrap();

    acc.truncate().unwrap();
    assert_eq!(acc.len(), 3);
    assert_eq!(acc.available_bytes(), 0);
    assert!(acc.read::<u8>().is_err());
}

/// Seeking to the very end succeeds but a one-byte read fails; one byte
/// earlier it succeeds.
#[test]
fn end_of_window_boundary() {
    let data = [7u8; 32];
    let mut acc = Accessor::open_reading_memory(&data, 0, None).unwrap();

    acc.seek(SeekFrom::End(0)).unwrap();
    assert!(acc.read::<u8>().is_err());

    acc.seek(SeekFrom::End(-1)).unwrap();
    assert_eq!(acc.read::<u8>().unwrap(), 7);
    assert_eq!(acc.available_bytes(), 0);
}

/// Repeated-byte writes land as a filled region.
#[test]
fn repeated_byte_fill() {
    let mut acc = writer(Endianness::Big);
    acc.write::<u8>(0x01).unwrap();
    acc.write_repeated_byte(0xee, 5).unwrap();
    acc.write::<u8>(0x02).unwrap();

    acc.seek(SeekFrom::Start(0)).unwrap();
    assert_eq!(
        acc.read_bytes_to_vec(7).unwrap(),
        [0x01, 0xee, 0xee, 0xee, 0xee, 0xee, 0x02]
    );
}
