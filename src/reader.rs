//! Reader façade (component F).
//!
//! Parses a fixed preamble, then serves block contents on demand rather than
//! eagerly decoding everything, following `original_source/_sqw.py::SQW` /
//! `_reader.py::SQWReader`'s `open`/`file_header`/`byteorder` surface.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use crate::codec::read_object_array;
use crate::error::{Error, Result};
use crate::header::{self, Bat, BlockDescriptor, BlockName, BlockType, FileHeader};
use crate::io::{Byteorder, SqwReader};
use crate::schema::{self, BlockValue};

/// Reads the typed contents of an SQW file.
pub struct Reader<R> {
    io: SqwReader<R>,
    file_header: FileHeader,
    bat: Bat,
}

impl Reader<BufReader<File>> {
    /// Open a file on disk.
    pub fn open_path(path: impl AsRef<Path>, byteorder: Option<Byteorder>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::open(BufReader::new(file), byteorder, path.display().to_string())
    }
}

impl<R: Read + Seek> Reader<R> {
    /// Wrap an already-open reader. `byteorder`, if `None`, is auto-detected
    /// from the first four bytes of the stream.
    pub fn open(inner: R, byteorder: Option<Byteorder>, path: impl Into<String>) -> Result<Self> {
        let mut io = SqwReader::new(inner, byteorder, path)?;
        let file_header = header::read_file_header(&mut io)?;
        let bat = header::read_bat(&mut io)?;
        Ok(Self { io, file_header, bat })
    }

    #[must_use]
    pub fn file_header(&self) -> &FileHeader {
        &self.file_header
    }

    #[must_use]
    pub fn byteorder(&self) -> Byteorder {
        self.io.byteorder()
    }

    pub fn data_block_names(&self) -> impl Iterator<Item = &BlockName> {
        self.bat.names()
    }

    #[must_use]
    pub fn descriptor(&self, name: &BlockName) -> Option<&BlockDescriptor> {
        self.bat.get(name)
    }

    /// Read and (when possible) typecheck the block named `name`. Only the
    /// two-string form converts; any other shape (a single string, a
    /// 3-tuple, ...) fails with [`Error::InvalidName`] before a lookup is
    /// even attempted.
    pub fn read_data_block<T>(&mut self, name: T) -> Result<BlockValue>
    where
        T: TryInto<BlockName>,
    {
        let name = name.try_into().map_err(|_| Error::InvalidName)?;
        let descriptor = self.bat.get(&name).ok_or_else(|| Error::NotFound(name.clone()))?.clone();
        self.io.seek(descriptor.position)?;

        match descriptor.block_type {
            BlockType::Regular => {
                let array = read_object_array(&mut self.io)?;
                Ok(schema::raise_regular_block(&(name.0.clone(), name.1.clone()), array))
            }
            BlockType::Pix => {
                let n_rows = self.io.read_u32()?;
                let n_pixels = self.io.read_u64()?;
                let count = n_rows as usize * n_pixels as usize;
                let mut data = Vec::with_capacity(count);
                for _ in 0..count {
                    data.push(self.io.read_f32()?);
                }
                Ok(BlockValue::Pixels {
                    n_rows,
                    n_pixels,
                    data,
                })
            }
            BlockType::Dnd => Err(Error::UnsupportedBlockType {
                block_type: "dnd_data_block".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::io::Byteorder;
    use std::io::Cursor;

    #[test]
    fn reads_back_title_from_minimal_file() {
        let mut buf = Cursor::new(Vec::new());
        Builder::new(&mut buf, "my experiment", Byteorder::Little)
            .create()
            .unwrap();
        buf.set_position(0);

        let mut reader = Reader::open(buf, Some(Byteorder::Little), "<mem>").unwrap();
        assert_eq!(reader.file_header().prog_name, "horace");

        let names: Vec<_> = reader.data_block_names().cloned().collect();
        assert_eq!(names, vec![BlockName("".to_string(), "main_header".to_string())]);

        let value = reader
            .read_data_block(&BlockName("".to_string(), "main_header".to_string()))
            .unwrap();
        match value {
            BlockValue::MainHeader(header) => assert_eq!(header.title, "my experiment"),
            other => panic!("unexpected block value: {other:?}"),
        }
    }

    #[test]
    fn unknown_block_name_is_not_found() {
        let mut buf = Cursor::new(Vec::new());
        Builder::new(&mut buf, "t", Byteorder::Little).create().unwrap();
        buf.set_position(0);

        let mut reader = Reader::open(buf, Some(Byteorder::Little), "<mem>").unwrap();
        let err = reader
            .read_data_block(&BlockName("no".to_string(), "such".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
