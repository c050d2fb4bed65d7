//! `("data", "metadata")` — binning/projection metadata for a DND dataset.
//!
//! Field lists grounded on `original_source/tests/horace_test.py`'s
//! `dnd_metadata` fixture (`SqwLineAxes`/`SqwLineProj`). Every field there is
//! either a plain scalar/string or a fixed-length vector of four (one per
//! Horace dimension); this crate stores them as such rather than carrying a
//! units library, since nothing downstream of the wire format needs unit
//! arithmetic.

use crate::error::SchemaAbort;
use crate::ir::{ArrayData, ObjectArray, Scalar, StructValue, Tag};

pub const SERIAL_NAME: &str = "dnd_metadata";
pub const VERSION: f64 = 1.0;

const AXES_SERIAL_NAME: &str = "IX_line_axes";
const AXES_VERSION: f64 = 1.0;
const PROJ_SERIAL_NAME: &str = "IX_line_proj";
const PROJ_VERSION: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SqwLineAxes {
    pub title: String,
    pub label: [String; 4],
    pub img_scales: [f64; 4],
    pub img_range: [[f64; 2]; 4],
    pub n_bins_all_dims: [u32; 4],
    pub single_bin_defines_iax: [bool; 4],
    pub dax: [u32; 4],
    pub offset: [f64; 4],
    pub changes_aspect_ratio: bool,
    pub filename: String,
    pub filepath: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqwLineProj {
    pub title: String,
    pub lattice_spacing: [f64; 3],
    pub lattice_angle: [f64; 3],
    pub offset: [f64; 4],
    pub label: [String; 4],
    pub u: [f64; 3],
    pub v: [f64; 3],
    pub w: Option<[f64; 3]>,
    pub non_orthogonal: bool,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DndMetadata {
    pub axes: SqwLineAxes,
    pub proj: SqwLineProj,
}

use super::{lower_f64_array, lower_string_array, raise_f64_array, raise_string_array};

impl SqwLineAxes {
    fn lower_field(&self) -> ObjectArray {
        let img_range = ObjectArray {
            ty: Tag::F64,
            shape: vec![4, 2],
            data: ArrayData::Numeric(
                self.img_range
                    .iter()
                    .flat_map(|pair| [Scalar::F64(pair[0]), Scalar::F64(pair[1])])
                    .collect(),
            ),
        };
        StructValue::new(vec![
            ("serial_name".to_string(), ObjectArray::char(AXES_SERIAL_NAME)),
            ("version".to_string(), ObjectArray::scalar(Scalar::F64(AXES_VERSION))),
            ("title".to_string(), ObjectArray::char(self.title.clone())),
            ("label".to_string(), lower_string_array(&self.label)),
            ("img_scales".to_string(), lower_f64_array(&self.img_scales)),
            ("img_range".to_string(), img_range),
            (
                "n_bins_all_dims".to_string(),
                ObjectArray::numeric_vector(
                    Tag::U32,
                    self.n_bins_all_dims.iter().map(|&v| Scalar::U32(v)).collect(),
                ),
            ),
            (
                "single_bin_defines_iax".to_string(),
                ObjectArray::numeric_vector(
                    Tag::Logical,
                    self.single_bin_defines_iax.iter().map(|&v| Scalar::Logical(v)).collect(),
                ),
            ),
            (
                "dax".to_string(),
                ObjectArray::numeric_vector(Tag::U32, self.dax.iter().map(|&v| Scalar::U32(v)).collect()),
            ),
            ("offset".to_string(), lower_f64_array(&self.offset)),
            (
                "changes_aspect_ratio".to_string(),
                ObjectArray::scalar(Scalar::Logical(self.changes_aspect_ratio)),
            ),
            ("filename".to_string(), ObjectArray::char(self.filename.clone())),
            ("filepath".to_string(), ObjectArray::char(self.filepath.clone())),
        ])
        .into_block_payload()
    }

    fn raise_field(array: &ObjectArray) -> Result<Self, SchemaAbort> {
        let s = super::single_struct(array)?;
        super::check_serial_name(s, AXES_SERIAL_NAME, AXES_VERSION)?;

        let title = super::field_char(s, "title")?.to_string();
        let label = raise_string_array(super::field(s, "label")?, "label")?;
        let img_scales = raise_f64_array(super::field(s, "img_scales")?, "img_scales")?;

        let img_range_array = super::field(s, "img_range")?;
        if img_range_array.shape != [4, 2] {
            return Err(SchemaAbort::new("img_range has unexpected shape"));
        }
        let img_range_values = img_range_array
            .as_numeric()
            .ok_or_else(|| SchemaAbort::new("img_range is not numeric"))?;
        let mut img_range = [[0.0; 2]; 4];
        for (i, pair) in img_range_values.chunks_exact(2).enumerate() {
            img_range[i] = [
                pair[0].as_f64().ok_or_else(|| SchemaAbort::new("img_range is not f64"))?,
                pair[1].as_f64().ok_or_else(|| SchemaAbort::new("img_range is not f64"))?,
            ];
        }

        let n_bins_all_dims = super::field_numeric_u32_array4(s, "n_bins_all_dims")?;
        let single_bin_defines_iax = super::field_bool_array4(s, "single_bin_defines_iax")?;
        let dax = super::field_numeric_u32_array4(s, "dax")?;
        let offset = raise_f64_array(super::field(s, "offset")?, "offset")?;
        let changes_aspect_ratio = super::field_bool(s, "changes_aspect_ratio")?;
        let filename = super::field_char(s, "filename")?.to_string();
        let filepath = super::field_char(s, "filepath")?.to_string();

        Ok(Self {
            title,
            label,
            img_scales,
            img_range,
            n_bins_all_dims,
            single_bin_defines_iax,
            dax,
            offset,
            changes_aspect_ratio,
            filename,
            filepath,
        })
    }
}

impl SqwLineProj {
    fn lower_field(&self) -> ObjectArray {
        let mut fields = vec![
            ("serial_name".to_string(), ObjectArray::char(PROJ_SERIAL_NAME)),
            ("version".to_string(), ObjectArray::scalar(Scalar::F64(PROJ_VERSION))),
            ("title".to_string(), ObjectArray::char(self.title.clone())),
            ("lattice_spacing".to_string(), lower_f64_array(&self.lattice_spacing)),
            ("lattice_angle".to_string(), lower_f64_array(&self.lattice_angle)),
            ("offset".to_string(), lower_f64_array(&self.offset)),
            ("label".to_string(), lower_string_array(&self.label)),
            ("u".to_string(), lower_f64_array(&self.u)),
            ("v".to_string(), lower_f64_array(&self.v)),
        ];
        fields.push((
            "w".to_string(),
            match self.w {
                Some(w) => lower_f64_array(&w),
                None => ObjectArray::numeric_vector(Tag::F64, vec![]),
            },
        ));
        fields.push((
            "non_orthogonal".to_string(),
            ObjectArray::scalar(Scalar::Logical(self.non_orthogonal)),
        ));
        fields.push(("type".to_string(), ObjectArray::char(self.kind.clone())));

        StructValue::new(fields).into_block_payload()
    }

    fn raise_field(array: &ObjectArray) -> Result<Self, SchemaAbort> {
        let s = super::single_struct(array)?;
        super::check_serial_name(s, PROJ_SERIAL_NAME, PROJ_VERSION)?;

        let title = super::field_char(s, "title")?.to_string();
        let lattice_spacing = raise_f64_array(super::field(s, "lattice_spacing")?, "lattice_spacing")?;
        let lattice_angle = raise_f64_array(super::field(s, "lattice_angle")?, "lattice_angle")?;
        let offset = raise_f64_array(super::field(s, "offset")?, "offset")?;
        let label = raise_string_array(super::field(s, "label")?, "label")?;
        let u = raise_f64_array(super::field(s, "u")?, "u")?;
        let v = raise_f64_array(super::field(s, "v")?, "v")?;
        let w_array = super::field(s, "w")?;
        let w = if w_array.element_count() == 0 {
            None
        } else {
            Some(raise_f64_array(w_array, "w")?)
        };
        let non_orthogonal = super::field_bool(s, "non_orthogonal")?;
        let kind = super::field_char(s, "type")?.to_string();

        Ok(Self {
            title,
            lattice_spacing,
            lattice_angle,
            offset,
            label,
            u,
            v,
            w,
            non_orthogonal,
            kind,
        })
    }
}

impl DndMetadata {
    pub(crate) fn lower(&self) -> ObjectArray {
        StructValue::new(vec![
            ("serial_name".to_string(), ObjectArray::char(SERIAL_NAME)),
            ("version".to_string(), ObjectArray::scalar(Scalar::F64(VERSION))),
            ("axes".to_string(), self.axes.lower_field()),
            ("proj".to_string(), self.proj.lower_field()),
        ])
        .into_block_payload()
    }

    pub(crate) fn raise(array: &ObjectArray) -> Result<Self, SchemaAbort> {
        let s = super::single_struct(array)?;
        super::check_serial_name(s, SERIAL_NAME, VERSION)?;

        let axes = SqwLineAxes::raise_field(super::field(s, "axes")?)?;
        let proj = SqwLineProj::raise_field(super::field(s, "proj")?)?;
        Ok(Self { axes, proj })
    }
}
