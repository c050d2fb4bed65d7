//! Reader-façade integration tests: opening a file, listing its blocks, and
//! reading the pixel table back after filling in the reserved space the
//! builder leaves behind.

use std::io::{Cursor, Seek, SeekFrom, Write};

use sqw::{BlockName, BlockValue, Error, Reader, Sqw, Byteorder};

#[test]
fn data_block_names_lists_every_registered_block() {
    let mut buf = Cursor::new(Vec::new());
    Sqw::build(&mut buf, "t", Byteorder::Little)
        .register_pixel_data(1, 4, vec![])
        .unwrap()
        .create()
        .unwrap();

    buf.set_position(0);
    let reader = Reader::open(buf, Some(Byteorder::Little), "<mem>").unwrap();
    let names: Vec<String> = reader.data_block_names().map(|n| n.to_string()).collect();

    assert!(names.contains(&BlockName(String::new(), "main_header".to_string()).to_string()));
    assert!(names.contains(&BlockName("pix".to_string(), "data".to_string()).to_string()));
}

#[test]
fn unknown_block_name_is_not_found() {
    let mut buf = Cursor::new(Vec::new());
    Sqw::build(&mut buf, "t", Byteorder::Little).create().unwrap();

    buf.set_position(0);
    let mut reader = Reader::open(buf, Some(Byteorder::Little), "<mem>").unwrap();
    let err = reader.read_data_block(("no", "such")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn pixel_table_can_be_filled_in_after_creation_and_read_back() {
    let mut buf = Cursor::new(Vec::new());
    let n_pixels: u64 = 2;
    let mut written = Sqw::build(&mut buf, "t", Byteorder::Little)
        .register_pixel_data(n_pixels, 4, vec![])
        .unwrap()
        .create()
        .unwrap();

    // The builder only reserves the table; the caller writes the actual
    // f32 values right after the preamble, in the file's own byte order.
    let table: Vec<f32> = (0..9 * n_pixels as usize).map(|i| i as f32).collect();
    {
        let sink = written.get_mut();
        for value in &table {
            sink.write_all(&value.to_le_bytes()).unwrap();
        }
    }
    drop(written);

    buf.seek(SeekFrom::Start(0)).unwrap();
    let mut reader = Reader::open(buf, Some(Byteorder::Little), "<mem>").unwrap();
    let value = reader.read_data_block(("pix", "data")).unwrap();

    match value {
        BlockValue::Pixels { n_rows, n_pixels: read_pixels, data } => {
            assert_eq!(n_rows, 9);
            assert_eq!(read_pixels, n_pixels);
            assert_eq!(data, table);
        }
        other => panic!("unexpected block value: {other:?}"),
    }
}
