//! `("pix", "metadata")`.
//!
//! Grounded on `original_source/_models.py::SqwPixelMetadata` and
//! `_build.py::register_pixel_data`'s `data_range` initialization
//! (`[+inf, -inf]` per row until pixel data is actually written).

use crate::error::SchemaAbort;
use crate::ir::{ObjectArray, Scalar, StructValue, Tag};

pub const SERIAL_NAME: &str = "pix_metadata";
pub const VERSION: f64 = 1.0;

/// Number of rows in the default pixel layout (h, k, l, E, irun, idet, ien,
/// signal, error), matching Horace's `_DEFAULT_PIX_ROWS`.
pub const DEFAULT_PIX_ROW_COUNT: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct PixMetadata {
    pub full_filename: String,
    pub npix: u64,
    /// `[min, max]` per row, shape `(n_rows, 2)`.
    pub data_range: Vec<[f64; 2]>,
}

impl PixMetadata {
    #[must_use]
    pub fn with_unset_range(full_filename: impl Into<String>, npix: u64, n_rows: usize) -> Self {
        Self {
            full_filename: full_filename.into(),
            npix,
            data_range: vec![[f64::INFINITY, f64::NEG_INFINITY]; n_rows],
        }
    }

    pub(crate) fn lower(&self) -> ObjectArray {
        let n_rows = self.data_range.len();
        let mut values = Vec::with_capacity(n_rows * 2);
        for row in &self.data_range {
            values.push(Scalar::F64(row[0]));
            values.push(Scalar::F64(row[1]));
        }
        let data_range = ObjectArray {
            ty: Tag::F64,
            shape: vec![n_rows as u32, 2],
            data: crate::ir::ArrayData::Numeric(values),
        };

        StructValue::new(vec![
            ("serial_name".to_string(), ObjectArray::char(SERIAL_NAME)),
            ("version".to_string(), ObjectArray::scalar(Scalar::F64(VERSION))),
            (
                "full_filename".to_string(),
                ObjectArray::char(self.full_filename.clone()),
            ),
            (
                "npix".to_string(),
                ObjectArray::scalar(Scalar::F64(self.npix as f64)),
            ),
            ("data_range".to_string(), data_range),
        ])
        .into_block_payload()
    }

    pub(crate) fn raise(array: &ObjectArray) -> Result<Self, SchemaAbort> {
        let s = super::single_struct(array)?;
        super::check_serial_name(s, SERIAL_NAME, VERSION)?;

        let full_filename = super::field_char(s, "full_filename")?.to_string();
        let npix = super::field_f64(s, "npix")? as u64;

        let range_array = super::field(s, "data_range")?;
        if range_array.shape.len() != 2 || range_array.shape[1] != 2 {
            return Err(SchemaAbort::new("data_range has unexpected shape"));
        }
        let n_rows = range_array.shape[0] as usize;
        let values = range_array
            .as_numeric()
            .ok_or_else(|| SchemaAbort::new("data_range is not numeric"))?;
        if values.len() != n_rows * 2 {
            return Err(SchemaAbort::new("data_range element count mismatch"));
        }
        let data_range = values
            .chunks_exact(2)
            .map(|pair| {
                let lo = pair[0].as_f64().ok_or_else(|| SchemaAbort::new("data_range is not f64"))?;
                let hi = pair[1].as_f64().ok_or_else(|| SchemaAbort::new("data_range is not f64"))?;
                Ok([lo, hi])
            })
            .collect::<Result<Vec<_>, SchemaAbort>>()?;

        Ok(Self {
            full_filename,
            npix,
            data_range,
        })
    }
}
