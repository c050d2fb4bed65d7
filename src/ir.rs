//! Intermediate representation for SQW object graphs.
//!
//! A closed tagged sum — not a trait object, not reflection — mirroring the
//! teacher's `BitcodeElement`/`Record`/`Payload` split: heterogeneous wire
//! content is one enum with a fixed set of variants, and higher layers match
//! on it rather than asking it to behave polymorphically.

use chrono::{DateTime, Utc};

/// Single-byte type tag, as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Tag {
    Logical,
    Char,
    F64,
    F32,
    I8,
    U8,
    I32,
    U32,
    I64,
    U64,
    Cell,
    Struct,
    /// Read-only marker: "a self-describing object follows". Never written
    /// by this crate.
    Serializable,
}

impl Tag {
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Logical => 0,
            Self::Char => 1,
            Self::F64 => 3,
            Self::F32 => 4,
            Self::I8 => 5,
            Self::U8 => 6,
            Self::I32 => 9,
            Self::U32 => 10,
            Self::I64 => 11,
            Self::U64 => 12,
            Self::Cell => 23,
            Self::Struct => 24,
            Self::Serializable => 32,
        }
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Logical,
            1 => Self::Char,
            3 => Self::F64,
            4 => Self::F32,
            5 => Self::I8,
            6 => Self::U8,
            9 => Self::I32,
            10 => Self::U32,
            11 => Self::I64,
            12 => Self::U64,
            23 => Self::Cell,
            24 => Self::Struct,
            32 => Self::Serializable,
            _ => return None,
        })
    }
}

/// A single scalar value of one of the numeric/logical tags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Logical(bool),
    F64(f64),
    F32(f32),
    I8(i8),
    U8(u8),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
}

impl Scalar {
    #[must_use]
    pub fn tag(self) -> Tag {
        match self {
            Self::Logical(_) => Tag::Logical,
            Self::F64(_) => Tag::F64,
            Self::F32(_) => Tag::F32,
            Self::I8(_) => Tag::I8,
            Self::U8(_) => Tag::U8,
            Self::I32(_) => Tag::I32,
            Self::U32(_) => Tag::U32,
            Self::I64(_) => Tag::I64,
            Self::U64(_) => Tag::U64,
        }
    }

    #[must_use]
    pub fn as_f64(self) -> Option<f64> {
        match self {
            Self::F64(v) => Some(v),
            Self::F32(v) => Some(f64::from(v)),
            Self::I8(v) => Some(f64::from(v)),
            Self::U8(v) => Some(f64::from(v)),
            Self::I32(v) => Some(f64::from(v)),
            Self::U32(v) => Some(f64::from(v)),
            Self::I64(v) => Some(v as f64),
            Self::U64(v) => Some(v as f64),
            Self::Logical(_) => None,
        }
    }

    #[must_use]
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Logical(v) => Some(v),
            _ => None,
        }
    }
}

/// The payload of an [`ObjectArray`], shaped by `ty`.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    /// One of the numeric/logical tags, `prod(shape)` elements.
    Numeric(Vec<Scalar>),
    /// A scalar character string (the only case known schemas exercise).
    Char(String),
    /// `prod(shape)` nested, independently-typed arrays.
    Cell(Vec<ObjectArray>),
    /// `prod(shape)` structs.
    Struct(Vec<StructValue>),
}

/// A homogeneous (or, for `Cell`/`Struct`, homogeneously-typed-as-container)
/// typed n-dimensional array — the unit of exchange between the codec and
/// everything above it.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectArray {
    pub ty: Tag,
    pub shape: Vec<u32>,
    pub data: ArrayData,
}

impl ObjectArray {
    /// A single scalar value, shape `(1,)`.
    #[must_use]
    pub fn scalar(value: Scalar) -> Self {
        Self {
            ty: value.tag(),
            shape: vec![1],
            data: ArrayData::Numeric(vec![value]),
        }
    }

    /// A scalar character string, shape `(len,)`.
    #[must_use]
    pub fn char(value: impl Into<String>) -> Self {
        let value = value.into();
        let shape = vec![value.len() as u32];
        Self {
            ty: Tag::Char,
            shape,
            data: ArrayData::Char(value),
        }
    }

    /// An ISO-8601-seconds character string, per this crate's normalization
    /// of [`Value::DateTime`]: seconds precision, `Z`-suffixed UTC, matching
    /// `_ir.py::_serialize_field`'s `isoformat(timespec='seconds')` on an
    /// aware UTC datetime.
    #[must_use]
    pub fn datetime(value: DateTime<Utc>) -> Self {
        Self::char(value.format("%Y-%m-%dT%H:%M:%SZ").to_string())
    }

    /// A 1-D numeric array.
    #[must_use]
    pub fn numeric_vector(ty: Tag, values: Vec<Scalar>) -> Self {
        Self {
            ty,
            shape: vec![values.len() as u32],
            data: ArrayData::Numeric(values),
        }
    }

    #[must_use]
    pub fn element_count(&self) -> usize {
        self.shape.iter().map(|&d| d as usize).product()
    }

    #[must_use]
    pub fn as_char(&self) -> Option<&str> {
        match &self.data {
            ArrayData::Char(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_numeric(&self) -> Option<&[Scalar]> {
        match &self.data {
            ArrayData::Numeric(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_struct(&self) -> Option<&[StructValue]> {
        match &self.data {
            ArrayData::Struct(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_cell(&self) -> Option<&[ObjectArray]> {
        match &self.data {
            ArrayData::Cell(v) => Some(v),
            _ => None,
        }
    }
}

/// A single struct instance: an ordered set of named fields, whose values
/// live in a `(n, 1)`-shaped cell array for wire compatibility with the
/// reference implementation. `field_values_shape` is the shape the field
/// values cell array actually carried on the wire, kept alongside the
/// flattened `field_values` so a raise can reject a non-`(n, 1)` shape
/// rather than silently accepting it.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    pub field_names: Vec<String>,
    pub field_values: Vec<ObjectArray>,
    pub field_values_shape: Vec<u32>,
}

impl StructValue {
    #[must_use]
    pub fn new(fields: Vec<(String, ObjectArray)>) -> Self {
        let (field_names, field_values): (Vec<String>, Vec<ObjectArray>) = fields.into_iter().unzip();
        let field_values_shape = vec![field_names.len() as u32, 1];
        Self {
            field_names,
            field_values,
            field_values_shape,
        }
    }

    /// Wrap this struct as the single-element `ObjectArray` a regular block
    /// payload must be (`ty = Struct, shape = (1,)`).
    #[must_use]
    pub fn into_block_payload(self) -> ObjectArray {
        ObjectArray {
            ty: Tag::Struct,
            shape: vec![1],
            data: ArrayData::Struct(vec![self]),
        }
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&ObjectArray> {
        self.field_names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.field_values[i])
    }
}
