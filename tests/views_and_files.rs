//! Integration tests for sub-accessor trees, accessor swapping and the
//! file-backed open/flush paths.

use bytescope::prelude::*;
use std::fs;
use std::io::SeekFrom;

fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 131 + 7) as u8).collect()
}

/// Chained sub-accessor offsets compose additively into root offsets.
#[test]
fn nested_sub_view_offsets() {
    let data = vec![0_u8; 65536];
    let mut a = Accessor::open_reading_memory(&data, 1, None).unwrap();
    let mut b = a.sub_accessor_window(1, None).unwrap();
    let c = b.sub_accessor_window(1, None).unwrap();

    assert_eq!(a.root_window_offset(), 1);
    assert_eq!(b.root_window_offset(), 2);
    assert_eq!(c.root_window_offset(), 3);

    assert_eq!(b.root_window_offset(), a.root_window_offset() + b.window_offset());
    assert_eq!(c.root_window_offset(), b.root_window_offset() + c.window_offset());

    assert_eq!(a.len(), 65535);
    assert_eq!(b.len(), 65534);
    assert_eq!(c.len(), 65533);

    c.close().unwrap();
    b.close().unwrap();
    a.close().unwrap();
}

/// Sub-accessors see the right bytes and inherit endianness.
#[test]
fn sub_views_share_data_and_endianness() {
    let data = patterned(256);
    let mut a = Accessor::open_reading_memory(&data, 0, None).unwrap();
    a.set_endianness(Endianness::Big);
    a.seek(SeekFrom::Start(10)).unwrap();

    let mut b = a.sub_accessor_bytes(Some(100)).unwrap();
    assert_eq!(b.endianness(), Endianness::Big);

    let mut expected = [0u8; 4];
    expected.copy_from_slice(&data[10..14]);
    assert_eq!(b.read::<u32>().unwrap(), u32::from_be_bytes(expected));

    // a window taken while b's cursor sits at 4
    let mut c = b.sub_accessor_window(20, Some(8)).unwrap();
    assert_eq!(c.read_bytes_to_vec(8).unwrap(), &data[30..38]);
    assert_eq!(c.root_window_offset(), 30);
}

/// Every write operation on a swapped-read-only handle is rejected.
#[test]
fn write_protection_after_swap() {
    let data = vec![0_u8; 256];
    let mut w = Accessor::open_writing_memory(0, 0).unwrap();
    let mut r = Accessor::open_reading_memory(&data, 0, None).unwrap();

    Accessor::swap(&mut w, &mut r);
    // the handle that used to write is now the reader and vice versa; both
    // are read-only
    for acc in [&mut w, &mut r] {
        assert!(matches!(acc.truncate(), Err(Error::ReadOnly)));
        assert!(matches!(acc.write::<u8>(0), Err(Error::ReadOnly)));
        assert!(matches!(acc.write::<u64>(0), Err(Error::ReadOnly)));
        assert!(matches!(acc.write_u24(0), Err(Error::ReadOnly)));
        assert!(matches!(acc.write_uint(0, 5), Err(Error::ReadOnly)));
        assert!(matches!(acc.write_varint(0), Err(Error::ReadOnly)));
        assert!(matches!(acc.write_zigzag(0), Err(Error::ReadOnly)));
        assert!(matches!(acc.write_bytes(&[0]), Err(Error::ReadOnly)));
        assert!(matches!(
            acc.write_endian_bytes(&[0], Endianness::Big),
            Err(Error::ReadOnly)
        ));
        assert!(matches!(acc.write_repeated_byte(0, 4), Err(Error::ReadOnly)));
        assert!(matches!(acc.write_array::<u16>(&[1]), Err(Error::ReadOnly)));
        assert!(matches!(acc.write_u24_array(&[1]), Err(Error::ReadOnly)));
        assert!(matches!(acc.write_c_string(b"x"), Err(Error::ReadOnly)));
        assert!(matches!(acc.write_p_string(b"x"), Err(Error::ReadOnly)));
        assert!(matches!(
            acc.write_padded_string(b"x", 4, b' '),
            Err(Error::ReadOnly)
        ));
        assert!(matches!(acc.write_string16(&[1]), Err(Error::ReadOnly)));
        assert!(matches!(acc.write_string32(&[1]), Err(Error::ReadOnly)));
        assert!(matches!(acc.write_bytes_in_place(1), Err(Error::ReadOnly)));
        assert!(matches!(
            acc.seek(SeekFrom::End(1)),
            Err(Error::BeyondEnd)
        ));
    }
}

/// Small windows are buffered, large ones mapped; both see the same bytes.
#[test]
fn reading_file_buffered_and_mapped() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().to_str().unwrap();
    let content = patterned(128 * 1024);
    fs::write(dir.path().join("blob.bin"), &content).unwrap();

    // small window: buffered read
    let mut small =
        Accessor::open_reading_file(base, "blob.bin", PathOptions::empty(), 100, Some(512))
            .unwrap();
    assert_eq!(small.len(), 512);
    assert_eq!(small.root_window_offset(), 100);
    assert_eq!(small.read_bytes_to_vec(512).unwrap(), &content[100..612]);

    // large window: memory-mapped
    let mut large =
        Accessor::open_reading_file(base, "blob.bin", PathOptions::empty(), 4096, None).unwrap();
    assert_eq!(large.len(), content.len() - 4096);
    assert_eq!(large.root_window_offset(), 4096);
    let head = large.read_bytes_to_vec(64).unwrap();
    assert_eq!(head, &content[4096..4160]);

    // window must fit the file
    assert!(matches!(
        Accessor::open_reading_file(base, "blob.bin", PathOptions::empty(), 0, Some(content.len() + 1)),
        Err(Error::BeyondEnd)
    ));
    assert!(matches!(
        Accessor::open_reading_file(base, "blob.bin", PathOptions::empty(), content.len() + 1, None),
        Err(Error::BeyondEnd)
    ));
    assert!(matches!(
        Accessor::open_reading_file(base, "missing.bin", PathOptions::empty(), 0, None),
        Err(Error::Open(_))
    ));
}

/// Sub-accessors of a mapped file report absolute file offsets.
#[test]
fn mapped_file_sub_view_offsets() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().to_str().unwrap();
    let content = patterned(64 * 1024);
    fs::write(dir.path().join("image.bin"), &content).unwrap();

    let mut acc =
        Accessor::open_reading_file(base, "image.bin", PathOptions::empty(), 1000, Some(32 * 1024))
            .unwrap();
    acc.seek(SeekFrom::Start(24)).unwrap();
    let mut sub = acc.sub_accessor_bytes(Some(100)).unwrap();

    assert_eq!(sub.root_window_offset(), 1024);
    assert_eq!(sub.read::<u8>().unwrap(), content[1024]);
}

/// A write accessor opened on a file flushes its window on close.
#[test]
fn writing_file_flushes_on_close() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().to_str().unwrap();

    let mut out =
        Accessor::open_writing_file(base, "out/made.bin", PathOptions::CREATE_PATH, 0, 0).unwrap();
    out.set_endianness(Endianness::Big);
    out.write::<u32>(0xcafebabe).unwrap();
    out.write_c_string(b"trailer").unwrap();
    out.close().unwrap();

    let written = fs::read(dir.path().join("out/made.bin")).unwrap();
    assert_eq!(&written[..4], &[0xca, 0xfe, 0xba, 0xbe]);
    assert_eq!(&written[4..], b"trailer\0");
}

/// Dropping a writing-file accessor flushes too.
#[test]
fn writing_file_flushes_on_drop() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().to_str().unwrap();

    {
        let mut out =
            Accessor::open_writing_file(base, "dropped.bin", PathOptions::empty(), 0, 0).unwrap();
        out.write_bytes(b"payload").unwrap();
    }

    assert_eq!(fs::read(dir.path().join("dropped.bin")).unwrap(), b"payload");
}

/// The output file is created (and truncated) eagerly.
#[test]
fn writing_file_truncates_eagerly() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().to_str().unwrap();
    fs::write(dir.path().join("old.bin"), b"previous content").unwrap();

    let out = Accessor::open_writing_file(base, "old.bin", PathOptions::empty(), 0, 0).unwrap();
    assert_eq!(fs::metadata(dir.path().join("old.bin")).unwrap().len(), 0);
    out.close().unwrap();

    assert_eq!(fs::read(dir.path().join("old.bin")).unwrap(), b"");
}

/// write_to_file snapshots a window region without touching the accessor.
#[test]
fn write_to_file_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().to_str().unwrap();

    let mut acc = Accessor::open_writing_memory(0, 0).unwrap();
    acc.write_bytes(&patterned(1000)).unwrap();
    acc.seek(SeekFrom::Start(123)).unwrap();

    acc.write_to_file(base, "snap.bin", PathOptions::empty(), 100, Some(200))
        .unwrap();
    assert_eq!(acc.cursor(), 123);
    assert_eq!(acc.len(), 1000);

    let snap = fs::read(dir.path().join("snap.bin")).unwrap();
    assert_eq!(snap, &patterned(1000)[100..300]);

    // whole-window snapshot of a read accessor
    let data = patterned(64);
    let reader = Accessor::open_reading_memory(&data, 16, Some(32)).unwrap();
    reader
        .write_to_file(base, "window.bin", PathOptions::empty(), 0, None)
        .unwrap();
    assert_eq!(fs::read(dir.path().join("window.bin")).unwrap(), &data[16..48]);

    assert!(matches!(
        reader.write_to_file(base, "bad.bin", PathOptions::empty(), 30, Some(10)),
        Err(Error::BeyondEnd)
    ));
}

/// Swapping a writing-file accessor with a reader keeps the flush action
/// on the swapped handle.
#[test]
fn swapped_writing_file_still_flushes() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().to_str().unwrap();
    let data = vec![9_u8; 8];

    let mut w = Accessor::open_writing_file(base, "swapped.bin", PathOptions::empty(), 0, 0).unwrap();
    w.write_bytes(b"built content").unwrap();
    let mut r = Accessor::open_reading_memory(&data, 0, None).unwrap();

    Accessor::swap(&mut w, &mut r);

    // r now holds the built buffer read-only; a sub-accessor can still be
    // taken from it and the flush happens at the last close
    let mut sub = r.sub_accessor_window(0, None).unwrap();
    assert_eq!(sub.read_bytes_to_vec(5).unwrap(), b"built");

    r.close().unwrap();
    sub.close().unwrap();

    assert_eq!(
        fs::read(dir.path().join("swapped.bin")).unwrap(),
        b"built content"
    );

    // the other handle is the plain memory reader
    assert_eq!(w.len(), 8);
    w.close().unwrap();
}

/// Closing a super-accessor before its sub-accessors defers the teardown.
#[test]
fn close_with_live_sub_views_defers() {
    let data = patterned(4096);
    let mut a = Accessor::open_reading_memory_owned(data.clone(), 0, None).unwrap();
    let mut b = a.sub_accessor_window(100, Some(200)).unwrap();

    a.close().unwrap(); // storage must stay alive for b

    assert_eq!(b.read_bytes_to_vec(200).unwrap(), &data[100..300]);
    b.close().unwrap();
}
