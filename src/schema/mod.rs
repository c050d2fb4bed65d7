//! Typed schema layer (component D): lowers typed Rust values to IR for
//! writing, and best-effort raises IR back to typed values for reading.
//!
//! Grounded on `original_source/_ir.py::Serializable` (lowering: an ordered
//! field list becomes a `Struct` wrapped in a `(1,)`-shaped `ObjectArray`)
//! and `_read_write.py::_read_struct` (raising: every known struct carries
//! `serial_name`/`version` fields that this layer uses to dispatch). Unlike
//! the Python reference, which builds an ad hoc dataclass for *every*
//! struct it encounters, raising here is guarded: anything that doesn't
//! match a known `(serial_name, version)` or has an unexpected shape aborts
//! with [`SchemaAbort`] rather than partially reconstructing a value, and
//! the caller falls back to the raw IR.

pub mod containers;
pub mod dnd;
pub mod experiment;
pub mod instrument;
pub mod main_header;
pub mod pix;

use crate::error::SchemaAbort;
use crate::ir::{ArrayData, ObjectArray, StructValue};

pub use containers::{UniqueObjectsContainer, UniqueReferencesContainer};
pub use dnd::{DndMetadata, SqwLineAxes, SqwLineProj};
pub use experiment::{EnergyMode, IxExperiment};
pub use instrument::{IxNullInstrument, IxSample, IxSource, IxSourceNamed};
pub use main_header::MainHeader;
pub use pix::PixMetadata;

/// Best-effort typed view of a parsed regular data block. Falls back to
/// [`Raw`](BlockValue::Raw) whenever raising fails.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockValue {
    MainHeader(MainHeader),
    PixMetadata(PixMetadata),
    Experiments(Vec<IxExperiment>),
    Dnd(DndMetadata),
    NullInstrument(IxNullInstrument),
    Sample(IxSample),
    References(UniqueReferencesContainer),
    Objects(UniqueObjectsContainer),
    /// Pixel data: `n_rows x n_pixels` table of `f32`, row-major by row.
    Pixels { n_rows: u32, n_pixels: u64, data: Vec<f32> },
    /// A regular block whose struct did not match any known schema, or
    /// which was not a struct at all.
    Raw(ObjectArray),
}

/// Attempt to raise `array` into one of the known schemas named in
/// `SPEC_FULL.md`'s schema table, dispatching on the block name since two
/// schemas can share a `(serial_name, version)` shape (e.g. `IxNullInstrument`
/// embeds a struct that on its own could be mistaken for other named structs).
pub(crate) fn raise_regular_block(name: &(String, String), array: ObjectArray) -> BlockValue {
    let result = match (name.0.as_str(), name.1.as_str()) {
        ("", "main_header") => MainHeader::raise(&array).map(BlockValue::MainHeader),
        ("pix", "metadata") => PixMetadata::raise(&array).map(BlockValue::PixMetadata),
        ("experiment_info", "expdata") => raise_experiments(&array).map(BlockValue::Experiments),
        ("data", "metadata") => DndMetadata::raise(&array).map(BlockValue::Dnd),
        ("instrument", "unique_objects") | ("sample", "unique_objects") => {
            UniqueObjectsContainer::raise(&array).map(BlockValue::Objects)
        }
        ("instrument", "unique_references")
        | ("sample", "unique_references")
        | ("experiment_info", "unique_references") => {
            UniqueReferencesContainer::raise(&array).map(BlockValue::References)
        }
        _ => Err(SchemaAbort::new(format!("no known schema for block {name:?}"))),
    };

    match result {
        Ok(value) => value,
        Err(reason) => {
            log::warn!("failed to raise data block {name:?} into a typed schema: {reason}");
            BlockValue::Raw(array)
        }
    }
}

fn raise_experiments(array: &ObjectArray) -> Result<Vec<IxExperiment>, SchemaAbort> {
    match &array.data {
        ArrayData::Cell(items) => items.iter().map(IxExperiment::raise).collect(),
        ArrayData::Struct(_) => Ok(vec![IxExperiment::raise(array)?]),
        _ => Err(SchemaAbort::new("expdata is neither a struct nor a cell array")),
    }
}

// --- shared raise helpers, used by every schema submodule ---

pub(crate) fn single_struct(array: &ObjectArray) -> Result<&StructValue, SchemaAbort> {
    if array.shape != [1] {
        return Err(SchemaAbort::new(format!(
            "expected a scalar struct, got shape {:?}",
            array.shape
        )));
    }
    let s = match &array.data {
        ArrayData::Struct(items) if items.len() == 1 => &items[0],
        _ => return Err(SchemaAbort::new("expected a struct, got a different tag")),
    };

    let expected_shape = [s.field_names.len() as u32, 1];
    if s.field_values_shape != expected_shape {
        return Err(SchemaAbort::new(format!(
            "field values' cell shape is multi-dimensional: expected {expected_shape:?}, got {:?}",
            s.field_values_shape
        )));
    }

    Ok(s)
}

pub(crate) fn check_serial_name(s: &StructValue, expected_name: &str, expected_version: f64) -> Result<(), SchemaAbort> {
    let name = field_char(s, "serial_name")?;
    if name != expected_name {
        return Err(SchemaAbort::new(format!(
            "serial_name mismatch: expected `{expected_name}`, got `{name}`"
        )));
    }
    let version = field_f64(s, "version")?;
    if version != expected_version {
        return Err(SchemaAbort::new(format!(
            "version mismatch for `{expected_name}`: expected {expected_version}, got {version}"
        )));
    }
    Ok(())
}

pub(crate) fn field<'a>(s: &'a StructValue, name: &str) -> Result<&'a ObjectArray, SchemaAbort> {
    s.field(name)
        .ok_or_else(|| SchemaAbort::new(format!("missing field `{name}`")))
}

pub(crate) fn field_char<'a>(s: &'a StructValue, name: &str) -> Result<&'a str, SchemaAbort> {
    field(s, name)?
        .as_char()
        .ok_or_else(|| SchemaAbort::new(format!("field `{name}` is not a character array")))
}

pub(crate) fn field_f64(s: &StructValue, name: &str) -> Result<f64, SchemaAbort> {
    let values = field(s, name)?
        .as_numeric()
        .ok_or_else(|| SchemaAbort::new(format!("field `{name}` is not numeric")))?;
    values
        .first()
        .and_then(|v| v.as_f64())
        .ok_or_else(|| SchemaAbort::new(format!("field `{name}` is empty or non-numeric")))
}

pub(crate) fn field_bool(s: &StructValue, name: &str) -> Result<bool, SchemaAbort> {
    let values = field(s, name)?
        .as_numeric()
        .ok_or_else(|| SchemaAbort::new(format!("field `{name}` is not numeric")))?;
    values
        .first()
        .and_then(|v| v.as_bool())
        .ok_or_else(|| SchemaAbort::new(format!("field `{name}` is empty or non-logical")))
}

pub(crate) fn field_numeric_vec(s: &StructValue, name: &str) -> Result<Vec<f64>, SchemaAbort> {
    let values = field(s, name)?
        .as_numeric()
        .ok_or_else(|| SchemaAbort::new(format!("field `{name}` is not numeric")))?;
    values
        .iter()
        .map(|v| v.as_f64().ok_or_else(|| SchemaAbort::new(format!("field `{name}` is not f64"))))
        .collect()
}

pub(crate) fn field_numeric_array3(s: &StructValue, name: &str) -> Result<[f64; 3], SchemaAbort> {
    raise_f64_array(field(s, name)?, name)
}

pub(crate) fn field_numeric_u32_array4(s: &StructValue, name: &str) -> Result<[u32; 4], SchemaAbort> {
    let values = field(s, name)?
        .as_numeric()
        .ok_or_else(|| SchemaAbort::new(format!("field `{name}` is not numeric")))?;
    let ints: Vec<u32> = values
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as u32)
                .ok_or_else(|| SchemaAbort::new(format!("field `{name}` is not numeric")))
        })
        .collect::<Result<_, _>>()?;
    ints.try_into()
        .map_err(|_| SchemaAbort::new(format!("field `{name}` has wrong length")))
}

pub(crate) fn field_bool_array4(s: &StructValue, name: &str) -> Result<[bool; 4], SchemaAbort> {
    let values = field(s, name)?
        .as_numeric()
        .ok_or_else(|| SchemaAbort::new(format!("field `{name}` is not numeric")))?;
    let bools: Vec<bool> = values
        .iter()
        .map(|v| v.as_bool().ok_or_else(|| SchemaAbort::new(format!("field `{name}` is not logical"))))
        .collect::<Result<_, _>>()?;
    bools
        .try_into()
        .map_err(|_| SchemaAbort::new(format!("field `{name}` has wrong length")))
}

pub(crate) fn field_datetime(
    s: &StructValue,
    name: &str,
) -> Result<chrono::DateTime<chrono::Utc>, SchemaAbort> {
    let raw = field_char(s, name)?;
    parse_datetime_lenient(raw).ok_or_else(|| SchemaAbort::new(format!("field `{name}` is not a valid datetime")))
}

/// Parse an ISO-8601-ish datetime, per the resolution of the Open Question
/// in `SPEC_FULL.md` §9: an offset-bearing string is converted to UTC; an
/// offset-less string is assumed to already be UTC.
fn parse_datetime_lenient(raw: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    use chrono::{NaiveDateTime, TimeZone, Utc};

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

pub(crate) fn lower_string_array(values: &[String]) -> ObjectArray {
    ObjectArray {
        ty: crate::ir::Tag::Cell,
        shape: vec![values.len() as u32],
        data: ArrayData::Cell(values.iter().map(ObjectArray::char).collect()),
    }
}

pub(crate) fn raise_string_array<const N: usize>(array: &ObjectArray, field: &str) -> Result<[String; N], SchemaAbort> {
    let items = array
        .as_cell()
        .ok_or_else(|| SchemaAbort::new(format!("{field} is not a cell array")))?;
    let strings: Vec<String> = items
        .iter()
        .map(|item| {
            item.as_char()
                .map(str::to_string)
                .ok_or_else(|| SchemaAbort::new(format!("{field} element is not a string")))
        })
        .collect::<Result<_, _>>()?;
    strings
        .try_into()
        .map_err(|_| SchemaAbort::new(format!("{field} has wrong length")))
}

pub(crate) fn lower_f64_array(values: &[f64]) -> ObjectArray {
    ObjectArray::numeric_vector(
        crate::ir::Tag::F64,
        values.iter().map(|&v| crate::ir::Scalar::F64(v)).collect(),
    )
}

pub(crate) fn raise_f64_array<const N: usize>(array: &ObjectArray, field: &str) -> Result<[f64; N], SchemaAbort> {
    let values = array
        .as_numeric()
        .ok_or_else(|| SchemaAbort::new(format!("{field} is not numeric")))?;
    let floats: Vec<f64> = values
        .iter()
        .map(|v| v.as_f64().ok_or_else(|| SchemaAbort::new(format!("{field} is not f64"))))
        .collect::<Result<_, _>>()?;
    floats
        .try_into()
        .map(|arr: [f64; N]| arr)
        .map_err(|_| SchemaAbort::new(format!("{field} has wrong length")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_block_falls_back_to_raw() {
        let array = ObjectArray::char("not a struct");
        let value = raise_regular_block(&("custom".to_string(), "thing".to_string()), array.clone());
        assert_eq!(value, BlockValue::Raw(array));
    }

    #[test]
    fn single_struct_rejects_non_n_by_1_field_values_shape() {
        let mut array = StructValue::new(vec![
            ("serial_name".to_string(), ObjectArray::char("main_header_cl")),
            ("version".to_string(), ObjectArray::scalar(crate::ir::Scalar::F64(2.0))),
        ])
        .into_block_payload();
        let ArrayData::Struct(items) = &mut array.data else {
            unreachable!()
        };
        items[0].field_values_shape = vec![2, 1, 1];

        assert!(single_struct(&array).is_err());
    }
}
