//! Type-tag codec (component C): reads and writes an [`ObjectArray`] against
//! the SQW wire grammar.
//!
//! Dispatch is a closed `match` over [`Tag`], the same shape as the
//! teacher's `BuiltinAbbreviationId` match in `BlockIter::next` — the tag
//! vocabulary is fixed by the file format, so there is no runtime handler
//! registration to get wrong.

use std::io::{Read, Seek, Write};

use crate::error::{Error, Result};
use crate::ir::{ArrayData, ObjectArray, Scalar, StructValue, Tag};
use crate::io::{SqwReader, SqwWriter};

/// Read one `ObjectArray` (or recurse through a `Serializable` marker).
pub fn read_object_array<R: Read + Seek>(io: &mut SqwReader<R>) -> Result<ObjectArray> {
    let position = io.position()?;
    let tag_code = io.read_u8()?;

    if tag_code == Tag::Serializable.code() {
        return read_object_array(io);
    }

    let tag = Tag::from_code(tag_code).ok_or(Error::UnsupportedTag {
        tag: tag_code,
        position,
    })?;

    let n_dims = io.read_u8()?;

    if tag == Tag::Char {
        // shape[0] is the per-string length; no known schema has len(shape) > 1.
        let shape: Vec<u32> = (0..n_dims).map(|_| io.read_u32()).collect::<Result<_>>()?;
        let len = shape.first().copied().unwrap_or(0) as usize;
        let repeats: usize = shape.iter().skip(1).map(|&d| d as usize).product();
        let repeats = repeats.max(1);
        let s = io.read_n_chars(len)?;
        for _ in 1..repeats {
            // Only the scalar-string case is exercised by any known schema;
            // further repeats are consumed to keep the stream aligned but
            // their content isn't retained.
            io.read_n_chars(len)?;
        }
        return Ok(ObjectArray {
            ty: Tag::Char,
            shape,
            data: ArrayData::Char(s),
        });
    }

    let shape: Vec<u32> = (0..n_dims).map(|_| io.read_u32()).collect::<Result<_>>()?;
    let count: usize = shape.iter().map(|&d| d as usize).product();

    let data = match tag {
        Tag::Char | Tag::Serializable => unreachable!("handled above"),
        Tag::Cell => {
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(read_object_array(io)?);
            }
            ArrayData::Cell(items)
        }
        Tag::Struct => {
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(read_struct(io)?);
            }
            ArrayData::Struct(items)
        }
        _ => {
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(read_scalar(io, tag, position)?);
            }
            ArrayData::Numeric(values)
        }
    };

    Ok(ObjectArray { ty: tag, shape, data })
}

fn read_scalar<R: Read + Seek>(io: &mut SqwReader<R>, tag: Tag, position: u64) -> Result<Scalar> {
    Ok(match tag {
        Tag::Logical => Scalar::Logical(io.read_logical()?),
        Tag::F64 => Scalar::F64(io.read_f64()?),
        Tag::F32 => Scalar::F32(io.read_f32()?),
        Tag::I8 => Scalar::I8(io.read_i8()?),
        Tag::U8 => Scalar::U8(io.read_u8()?),
        Tag::I32 => Scalar::I32(io.read_i32()?),
        Tag::U32 => Scalar::U32(io.read_u32()?),
        Tag::I64 => Scalar::I64(io.read_i64()?),
        Tag::U64 => Scalar::U64(io.read_u64()?),
        Tag::Char | Tag::Cell | Tag::Struct | Tag::Serializable => {
            return Err(Error::UnsupportedTag {
                tag: tag.code(),
                position,
            });
        }
    })
}

fn read_struct<R: Read + Seek>(io: &mut SqwReader<R>) -> Result<StructValue> {
    let n_fields = io.read_u32()? as usize;
    let name_lens: Vec<usize> = (0..n_fields)
        .map(|_| io.read_u32().map(|n| n as usize))
        .collect::<Result<_>>()?;
    let field_names = name_lens
        .into_iter()
        .map(|len| io.read_n_chars(len))
        .collect::<Result<Vec<_>>>()?;

    let field_values_position = io.position()?;
    let field_values_array = read_object_array(io)?;
    let field_values_shape = field_values_array.shape.clone();
    let field_values = match field_values_array.data {
        ArrayData::Cell(items) => items,
        _ => {
            // Defensive: the grammar guarantees this is a cell array, but a
            // malformed file could claim otherwise.
            return Err(Error::UnsupportedTag {
                tag: field_values_array.ty.code(),
                position: field_values_position,
            });
        }
    };

    Ok(StructValue {
        field_names,
        field_values,
        field_values_shape,
    })
}

/// Write one `ObjectArray` using the wire grammar. Never emits a
/// `Serializable` marker.
pub fn write_object_array<W: Write + Seek>(io: &mut SqwWriter<W>, array: &ObjectArray) -> Result<()> {
    io.write_u8(array.ty.code())?;
    io.write_u8(array.shape.len() as u8)?;

    if array.ty == Tag::Char {
        let Some(s) = array.as_char() else {
            return Err(Error::UnsupportedTag {
                tag: array.ty.code(),
                position: io.position()?,
            });
        };
        for &d in &array.shape {
            io.write_u32(d)?;
        }
        let repeats: usize = array.shape.iter().skip(1).map(|&d| d as usize).product();
        for _ in 0..repeats.max(1) {
            io.write_raw(s.as_bytes())?;
        }
        return Ok(());
    }

    for &d in &array.shape {
        io.write_u32(d)?;
    }

    match &array.data {
        ArrayData::Numeric(values) => {
            for &v in values {
                write_scalar(io, v)?;
            }
        }
        ArrayData::Cell(items) => {
            for item in items {
                write_object_array(io, item)?;
            }
        }
        ArrayData::Struct(items) => {
            for item in items {
                write_struct(io, item)?;
            }
        }
        ArrayData::Char(_) => unreachable!("handled above"),
    }

    Ok(())
}

fn write_scalar<W: Write + Seek>(io: &mut SqwWriter<W>, value: Scalar) -> Result<()> {
    match value {
        Scalar::Logical(v) => io.write_logical(v),
        Scalar::F64(v) => io.write_f64(v),
        Scalar::F32(v) => io.write_f32(v),
        Scalar::I8(v) => io.write_i8(v),
        Scalar::U8(v) => io.write_u8(v),
        Scalar::I32(v) => io.write_i32(v),
        Scalar::U32(v) => io.write_u32(v),
        Scalar::I64(v) => io.write_i64(v),
        Scalar::U64(v) => io.write_u64(v),
    }
}

fn write_struct<W: Write + Seek>(io: &mut SqwWriter<W>, value: &StructValue) -> Result<()> {
    io.write_u32(value.field_names.len() as u32)?;
    for name in &value.field_names {
        io.write_u32(name.len() as u32)?;
    }
    for name in &value.field_names {
        io.write_raw(name.as_bytes())?;
    }

    let field_values = ObjectArray {
        ty: Tag::Cell,
        shape: value.field_values_shape.clone(),
        data: ArrayData::Cell(value.field_values.clone()),
    };
    write_object_array(io, &field_values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Byteorder;
    use std::io::Cursor;

    fn round_trip(array: &ObjectArray) -> ObjectArray {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = SqwWriter::new(&mut buf, Byteorder::Little);
            write_object_array(&mut writer, array).unwrap();
        }
        buf.set_position(0);
        let mut reader = SqwReader::new(buf, Some(Byteorder::Little), "<mem>").unwrap();
        read_object_array(&mut reader).unwrap()
    }

    #[test]
    fn scalar_f64_round_trips() {
        let array = ObjectArray::scalar(Scalar::F64(std::f64::consts::PI));
        assert_eq!(round_trip(&array), array);
    }

    #[test]
    fn char_array_round_trips() {
        let array = ObjectArray::char("my title");
        assert_eq!(round_trip(&array), array);
    }

    #[test]
    fn struct_round_trips() {
        let s = StructValue::new(vec![
            ("serial_name".to_string(), ObjectArray::char("main_header_cl")),
            ("version".to_string(), ObjectArray::scalar(Scalar::F64(2.0))),
            ("nfiles".to_string(), ObjectArray::scalar(Scalar::F64(0.0))),
        ]);
        let array = s.into_block_payload();
        assert_eq!(round_trip(&array), array);
    }

    #[test]
    fn unknown_tag_fails() {
        let mut buf = Cursor::new(vec![99u8, 0]);
        let mut reader = SqwReader::new(&mut buf, Some(Byteorder::Little), "<mem>").unwrap();
        let err = read_object_array(&mut reader).unwrap_err();
        assert!(matches!(err, Error::UnsupportedTag { tag: 99, .. }));
    }
}
