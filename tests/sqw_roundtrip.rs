//! Scenarios S1-S7 from the byte-level test plan: round-trip an in-memory
//! file through [`Builder`]/[`Reader`] and check both the wire bytes and the
//! values read back.

use std::io::Cursor;

use chrono::Utc;
use sqw::{BlockName, BlockValue, Builder, Byteorder, Error, Reader, Sqw};

#[test]
fn s1_empty_file_little_endian_bytes() {
    let expected: &[u8] = &[
        0x06, 0x00, 0x00, 0x00, b'h', b'o', b'r', b'a', b'c', b'e', 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x10, 0x40, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    let mut buf = Cursor::new(Vec::new());
    Sqw::build(&mut buf, "", Byteorder::Little).create().unwrap();

    let bytes = buf.into_inner();
    assert_eq!(&bytes[..expected.len()], expected);
}

#[test]
fn s2_empty_file_big_endian_bytes() {
    let expected: &[u8] = &[
        0x00, 0x00, 0x00, 0x06, b'h', b'o', b'r', b'a', b'c', b'e', 0x40, 0x10, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
    ];

    let mut buf = Cursor::new(Vec::new());
    Sqw::build(&mut buf, "", Byteorder::Big).create().unwrap();

    let bytes = buf.into_inner();
    assert_eq!(&bytes[..expected.len()], expected);
}

#[test]
fn s3_main_header_round_trips() {
    let mut buf = Cursor::new(Vec::new());
    Sqw::build(&mut buf, "my title", Byteorder::Little).create().unwrap();

    let before = Utc::now();
    buf.set_position(0);
    let mut reader = Reader::open(buf, Some(Byteorder::Little), "<mem>").unwrap();
    let value = reader.read_data_block(("", "main_header")).unwrap();

    match value {
        BlockValue::MainHeader(header) => {
            assert_eq!(header.full_filename, "");
            assert_eq!(header.title, "my title");
            assert_eq!(header.nfiles, 0);
            let age = header.creation_date.signed_duration_since(before);
            assert!(age.num_seconds().abs() <= 1);
        }
        other => panic!("unexpected block value: {other:?}"),
    }
}

#[test]
fn s4_pixel_metadata_layout() {
    let mut buf = Cursor::new(Vec::new());
    Sqw::build(&mut buf, "t", Byteorder::Little)
        .register_pixel_data(13, 3, vec![])
        .unwrap()
        .create()
        .unwrap();

    buf.set_position(0);
    let mut reader = Reader::open(buf, Some(Byteorder::Little), "<mem>").unwrap();
    let value = reader.read_data_block(("pix", "metadata")).unwrap();

    match value {
        BlockValue::PixMetadata(metadata) => {
            assert_eq!(metadata.npix, 13);
            assert_eq!(metadata.data_range.len(), 9);
        }
        other => panic!("unexpected block value: {other:?}"),
    }
}

#[test]
fn s5_unknown_program_is_a_warning_not_an_error() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut buf = Cursor::new(Vec::new());
    {
        let mut writer = sqw::io::SqwWriter::new(&mut buf, Byteorder::Little);
        sqw::header::write_file_header(
            &mut writer,
            &sqw::FileHeader {
                prog_name: "sqomega".to_string(),
                prog_version: 4.0,
                sqw_type: sqw::SqwFileType::Sqw,
                n_dims: 0,
            },
        )
        .unwrap();
        writer.write_u32(0).unwrap();
        writer.write_u32(0).unwrap();
    }

    buf.set_position(0);
    let reader = Reader::open(buf, Some(Byteorder::Little), "<mem>").unwrap();
    assert_eq!(reader.file_header().prog_name, "sqomega");
}

#[test]
fn s6_byteorder_is_detected_from_leading_length() {
    let little = Cursor::new(vec![0x06, 0x00, 0x00, 0x00]);
    let big = Cursor::new(vec![0x00, 0x00, 0x00, 0x06]);

    let reader = sqw::io::SqwReader::new(little, None, "<mem>").unwrap();
    assert_eq!(reader.byteorder(), Byteorder::Little);

    let reader = sqw::io::SqwReader::new(big, None, "<mem>").unwrap();
    assert_eq!(reader.byteorder(), Byteorder::Big);
}

#[test]
fn s7_name_form_misuse_is_invalid_name_not_not_found() {
    let mut buf = Cursor::new(Vec::new());
    Sqw::build(&mut buf, "t", Byteorder::Little).create().unwrap();

    buf.set_position(0);
    let mut reader = Reader::open(buf, Some(Byteorder::Little), "<mem>").unwrap();

    let err = reader
        .read_data_block(("", "main_header", "extra"))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidName));

    let err = reader.read_data_block("main_header").unwrap_err();
    assert!(matches!(err, Error::InvalidName));

    // The two-string form still works on the very same reader.
    let value = reader.read_data_block(BlockName("".to_string(), "main_header".to_string()));
    assert!(value.is_ok());
}
