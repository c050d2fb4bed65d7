//! `("", "main_header")` — the one struct present in every SQW file.
//!
//! Field list and lowering/raising behavior grounded on
//! `original_source/_models.py::SqwMainHeader` and
//! `_build.py::SqwBuilder.__init__`/`_make_file_header`.

use chrono::{DateTime, Utc};

use crate::error::SchemaAbort;
use crate::ir::{ObjectArray, Scalar, StructValue};

pub const SERIAL_NAME: &str = "main_header_cl";
pub const VERSION: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MainHeader {
    pub full_filename: String,
    pub title: String,
    pub nfiles: u32,
    pub creation_date: DateTime<Utc>,
    pub creation_date_defined_privately: bool,
}

impl MainHeader {
    pub(crate) fn lower(&self) -> ObjectArray {
        StructValue::new(vec![
            ("serial_name".to_string(), ObjectArray::char(SERIAL_NAME)),
            ("version".to_string(), ObjectArray::scalar(Scalar::F64(VERSION))),
            (
                "full_filename".to_string(),
                ObjectArray::char(self.full_filename.clone()),
            ),
            ("title".to_string(), ObjectArray::char(self.title.clone())),
            (
                "nfiles".to_string(),
                ObjectArray::scalar(Scalar::F64(f64::from(self.nfiles))),
            ),
            ("creation_date".to_string(), ObjectArray::datetime(self.creation_date)),
            (
                "creation_date_defined_privately".to_string(),
                ObjectArray::scalar(Scalar::Logical(self.creation_date_defined_privately)),
            ),
        ])
        .into_block_payload()
    }

    pub(crate) fn raise(array: &ObjectArray) -> Result<Self, SchemaAbort> {
        let s = super::single_struct(array)?;
        super::check_serial_name(s, SERIAL_NAME, VERSION)?;

        let full_filename = super::field_char(s, "full_filename")?.to_string();
        let title = super::field_char(s, "title")?.to_string();
        let nfiles = super::field_f64(s, "nfiles")? as u32;
        let creation_date = super::field_datetime(s, "creation_date")?;
        let creation_date_defined_privately = super::field_bool(s, "creation_date_defined_privately")?;

        Ok(Self {
            full_filename,
            title,
            nfiles,
            creation_date,
            creation_date_defined_privately,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let header = MainHeader {
            full_filename: "/data/run.sqw".to_string(),
            title: "my experiment".to_string(),
            nfiles: 3,
            creation_date: DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
                .unwrap()
                .with_timezone(&Utc),
            creation_date_defined_privately: false,
        };
        let array = header.lower();
        assert_eq!(MainHeader::raise(&array).unwrap(), header);
    }

    #[test]
    fn rejects_wrong_serial_name() {
        let array = StructValue::new(vec![
            ("serial_name".to_string(), ObjectArray::char("something_else")),
            ("version".to_string(), ObjectArray::scalar(Scalar::F64(2.0))),
        ])
        .into_block_payload();
        assert!(MainHeader::raise(&array).is_err());
    }
}
