//! Endian-aware primitive reads/writes over a seekable stream.
//!
//! Every other module routes its decoding through [`SqwReader`] /
//! [`SqwWriter`] rather than touching the underlying `Read`/`Write` directly.

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};

/// Byte order of an SQW file's multi-byte fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Byteorder {
    Little,
    Big,
}

impl Byteorder {
    /// The byte order of the machine running this code.
    #[must_use]
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }
}

/// Reads SQW primitives from a seekable source, in a given (or detected)
/// byte order.
pub struct SqwReader<R> {
    inner: R,
    byteorder: Byteorder,
    path: String,
}

impl<R: Read + Seek> SqwReader<R> {
    /// Wrap `inner`. If `byteorder` is `None`, it is detected from the first
    /// four bytes of the stream (the stream is rewound to its original
    /// position afterwards).
    pub fn new(mut inner: R, byteorder: Option<Byteorder>, path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let byteorder = match byteorder {
            Some(bo) => bo,
            None => detect_byteorder(&mut inner, &path)?,
        };
        Ok(Self {
            inner,
            byteorder,
            path,
        })
    }

    #[must_use]
    pub fn byteorder(&self) -> Byteorder {
        self.byteorder
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn truncated(&mut self, needed: usize) -> Error {
        let position = self.inner.stream_position().unwrap_or(0);
        Error::Truncated {
            path: self.path.clone(),
            position,
            needed,
        }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.inner
            .read_u8()
            .map_err(|_| self.truncated(1))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        match self.byteorder {
            Byteorder::Little => self.inner.read_u32::<LittleEndian>(),
            Byteorder::Big => self.inner.read_u32::<BigEndian>(),
        }
        .map_err(|_| self.truncated(4))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        match self.byteorder {
            Byteorder::Little => self.inner.read_u64::<LittleEndian>(),
            Byteorder::Big => self.inner.read_u64::<BigEndian>(),
        }
        .map_err(|_| self.truncated(8))
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.inner.read_i8().map_err(|_| self.truncated(1))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        match self.byteorder {
            Byteorder::Little => self.inner.read_i32::<LittleEndian>(),
            Byteorder::Big => self.inner.read_i32::<BigEndian>(),
        }
        .map_err(|_| self.truncated(4))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        match self.byteorder {
            Byteorder::Little => self.inner.read_i64::<LittleEndian>(),
            Byteorder::Big => self.inner.read_i64::<BigEndian>(),
        }
        .map_err(|_| self.truncated(8))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        match self.byteorder {
            Byteorder::Little => self.inner.read_f32::<LittleEndian>(),
            Byteorder::Big => self.inner.read_f32::<BigEndian>(),
        }
        .map_err(|_| self.truncated(4))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        match self.byteorder {
            Byteorder::Little => self.inner.read_f64::<LittleEndian>(),
            Byteorder::Big => self.inner.read_f64::<BigEndian>(),
        }
        .map_err(|_| self.truncated(8))
    }

    /// A `u32` value of 0/1, interpreted as a MATLAB `logical`.
    pub fn read_logical(&mut self) -> Result<bool> {
        Ok(self.read_u32()? != 0)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf).map_err(|_| self.truncated(len))?;
        Ok(buf)
    }

    /// Length-prefixed UTF-8 character array: a `u32` byte length followed
    /// by that many bytes.
    pub fn read_char_array(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        self.read_n_chars(len)
    }

    /// Read exactly `len` bytes and decode them as UTF-8.
    pub fn read_n_chars(&mut self, len: usize) -> Result<String> {
        let position = self.position()?;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes).map_err(|_| Error::Encoding {
            path: self.path.clone(),
            position,
        })
    }
}

fn detect_byteorder<R: Read + Seek>(inner: &mut R, path: &str) -> Result<Byteorder> {
    let start = inner.stream_position()?;
    let mut buf = [0u8; 4];
    inner.read_exact(&mut buf).map_err(|_| Error::Truncated {
        path: path.to_string(),
        position: start,
        needed: 4,
    })?;
    inner.seek(SeekFrom::Start(start))?;

    let le = u32::from_le_bytes(buf);
    let be = u32::from_be_bytes(buf);
    Ok(if le < be {
        Byteorder::Little
    } else {
        Byteorder::Big
    })
}

/// Writes SQW primitives to a seekable sink, in a given byte order.
pub struct SqwWriter<W> {
    inner: W,
    byteorder: Byteorder,
}

impl<W: Write + Seek> SqwWriter<W> {
    pub fn new(inner: W, byteorder: Byteorder) -> Self {
        Self { inner, byteorder }
    }

    #[must_use]
    pub fn byteorder(&self) -> Byteorder {
        self.byteorder
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.inner.write_u8(v)?;
        Ok(())
    }

    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        match self.byteorder {
            Byteorder::Little => self.inner.write_u32::<LittleEndian>(v),
            Byteorder::Big => self.inner.write_u32::<BigEndian>(v),
        }?;
        Ok(())
    }

    pub fn write_u64(&mut self, v: u64) -> Result<()> {
        match self.byteorder {
            Byteorder::Little => self.inner.write_u64::<LittleEndian>(v),
            Byteorder::Big => self.inner.write_u64::<BigEndian>(v),
        }?;
        Ok(())
    }

    pub fn write_i8(&mut self, v: i8) -> Result<()> {
        self.inner.write_i8(v)?;
        Ok(())
    }

    pub fn write_i32(&mut self, v: i32) -> Result<()> {
        match self.byteorder {
            Byteorder::Little => self.inner.write_i32::<LittleEndian>(v),
            Byteorder::Big => self.inner.write_i32::<BigEndian>(v),
        }?;
        Ok(())
    }

    pub fn write_i64(&mut self, v: i64) -> Result<()> {
        match self.byteorder {
            Byteorder::Little => self.inner.write_i64::<LittleEndian>(v),
            Byteorder::Big => self.inner.write_i64::<BigEndian>(v),
        }?;
        Ok(())
    }

    pub fn write_f32(&mut self, v: f32) -> Result<()> {
        match self.byteorder {
            Byteorder::Little => self.inner.write_f32::<LittleEndian>(v),
            Byteorder::Big => self.inner.write_f32::<BigEndian>(v),
        }?;
        Ok(())
    }

    pub fn write_f64(&mut self, v: f64) -> Result<()> {
        match self.byteorder {
            Byteorder::Little => self.inner.write_f64::<LittleEndian>(v),
            Byteorder::Big => self.inner.write_f64::<BigEndian>(v),
        }?;
        Ok(())
    }

    pub fn write_logical(&mut self, v: bool) -> Result<()> {
        self.write_u32(u32::from(v))
    }

    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        Ok(())
    }

    /// Length-prefixed UTF-8 character array.
    pub fn write_char_array(&mut self, s: &str) -> Result<()> {
        self.write_u32(s.len() as u32)?;
        self.write_raw(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn detects_little_endian() {
        let buf = Cursor::new(vec![0x06, 0x00, 0x00, 0x00, b'h', b'i']);
        let reader = SqwReader::new(buf, None, "<mem>").unwrap();
        assert_eq!(reader.byteorder(), Byteorder::Little);
    }

    #[test]
    fn detects_big_endian() {
        let buf = Cursor::new(vec![0x00, 0x00, 0x00, 0x06, b'h', b'i']);
        let reader = SqwReader::new(buf, None, "<mem>").unwrap();
        assert_eq!(reader.byteorder(), Byteorder::Big);
    }

    #[test]
    fn explicit_byteorder_skips_detection() {
        let buf = Cursor::new(vec![0x00, 0x00, 0x00, 0x06]);
        let reader = SqwReader::new(buf, Some(Byteorder::Little), "<mem>").unwrap();
        assert_eq!(reader.byteorder(), Byteorder::Little);
    }

    #[test]
    fn char_array_round_trip() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = SqwWriter::new(&mut buf, Byteorder::Little);
            writer.write_char_array("horace").unwrap();
        }
        buf.set_position(0);
        let mut reader = SqwReader::new(buf, Some(Byteorder::Little), "<mem>").unwrap();
        assert_eq!(reader.read_char_array().unwrap(), "horace");
    }

    #[test]
    fn truncated_read_reports_position() {
        let buf = Cursor::new(vec![0x01, 0x00]);
        let mut reader = SqwReader::new(buf, Some(Byteorder::Little), "<mem>").unwrap();
        let err = reader.read_u32().unwrap_err();
        assert!(matches!(err, Error::Truncated { position: 0, .. }));
    }
}
