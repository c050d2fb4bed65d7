//! Deduplicated object containers (`unique_references_container` /
//! `unique_objects_container`), grounded on
//! `original_source/tests/horace_test.py`'s
//! `loaded_file.experiment_info.instruments`/`.samples` accessors: a run
//! maps into a small pool of distinct instrument/sample objects via an
//! index, rather than repeating one per run.

use crate::error::SchemaAbort;
use crate::ir::{ArrayData, ObjectArray, Scalar, StructValue, Tag};

const REFERENCES_SERIAL_NAME: &str = "unique_references_container";
const REFERENCES_VERSION: f64 = 1.0;
const OBJECTS_SERIAL_NAME: &str = "unique_objects_container";
const OBJECTS_VERSION: f64 = 1.0;

/// Maps each run index to a position in a [`UniqueObjectsContainer`].
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueReferencesContainer {
    pub global_indices: Vec<u32>,
}

/// A deduplicated pool of sub-objects (instruments, samples, ...), each
/// already lowered to IR by its own schema type.
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueObjectsContainer {
    pub objects: Vec<ObjectArray>,
}

impl UniqueReferencesContainer {
    pub(crate) fn lower(&self) -> ObjectArray {
        StructValue::new(vec![
            ("serial_name".to_string(), ObjectArray::char(REFERENCES_SERIAL_NAME)),
            (
                "version".to_string(),
                ObjectArray::scalar(Scalar::F64(REFERENCES_VERSION)),
            ),
            (
                "global_indices".to_string(),
                ObjectArray::numeric_vector(
                    Tag::U32,
                    self.global_indices.iter().map(|&v| Scalar::U32(v)).collect(),
                ),
            ),
        ])
        .into_block_payload()
    }

    pub(crate) fn raise(array: &ObjectArray) -> Result<Self, SchemaAbort> {
        let s = super::single_struct(array)?;
        super::check_serial_name(s, REFERENCES_SERIAL_NAME, REFERENCES_VERSION)?;
        let indices_array = super::field(s, "global_indices")?;
        let values = indices_array
            .as_numeric()
            .ok_or_else(|| SchemaAbort::new("global_indices is not numeric"))?;
        let global_indices = values
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(|f| f as u32)
                    .ok_or_else(|| SchemaAbort::new("global_indices is not numeric"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { global_indices })
    }
}

impl UniqueObjectsContainer {
    pub(crate) fn lower(&self) -> ObjectArray {
        let objects = ObjectArray {
            ty: Tag::Cell,
            shape: vec![self.objects.len() as u32, 1],
            data: ArrayData::Cell(self.objects.clone()),
        };
        StructValue::new(vec![
            ("serial_name".to_string(), ObjectArray::char(OBJECTS_SERIAL_NAME)),
            ("version".to_string(), ObjectArray::scalar(Scalar::F64(OBJECTS_VERSION))),
            (
                "n_objects".to_string(),
                ObjectArray::scalar(Scalar::F64(self.objects.len() as f64)),
            ),
            ("unique_objects".to_string(), objects),
        ])
        .into_block_payload()
    }

    pub(crate) fn raise(array: &ObjectArray) -> Result<Self, SchemaAbort> {
        let s = super::single_struct(array)?;
        super::check_serial_name(s, OBJECTS_SERIAL_NAME, OBJECTS_VERSION)?;
        let objects = super::field(s, "unique_objects")?
            .as_cell()
            .ok_or_else(|| SchemaAbort::new("unique_objects is not a cell array"))?
            .to_vec();
        Ok(Self { objects })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_round_trip() {
        let container = UniqueReferencesContainer {
            global_indices: vec![0, 0, 1],
        };
        let array = container.lower();
        assert_eq!(UniqueReferencesContainer::raise(&array).unwrap(), container);
    }

    #[test]
    fn objects_round_trip() {
        let container = UniqueObjectsContainer {
            objects: vec![ObjectArray::char("Custom Instrument")],
        };
        let array = container.lower();
        assert_eq!(UniqueObjectsContainer::raise(&array).unwrap(), container);
    }
}
