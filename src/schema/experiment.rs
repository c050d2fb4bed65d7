//! `("experiment_info", "expdata")` — one [`IxExperiment`] per measured run.
//!
//! Field list grounded on `original_source/tests/horace_test.py`'s
//! `experiment_template` fixture and the `test_horace_roundtrip_experiment`
//! assertions, which fix the unit convention this crate stores values in:
//! angles in radians, energies in meV, `u`/`v` in inverse angstrom. Horace
//! reserves run 0 for the unassigned/template state, so `run_id` is
//! incremented by one when raising from a file (mirrored from that test's
//! `loaded.run_id.squeeze() == expected.run_id + 1`).

use crate::error::SchemaAbort;
use crate::ir::{ArrayData, ObjectArray, Scalar, StructValue, Tag};

pub const SERIAL_NAME: &str = "IX_experiment";
pub const VERSION: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyMode {
    Elastic,
    Direct,
    Indirect,
}

impl EnergyMode {
    #[must_use]
    pub fn code(self) -> f64 {
        match self {
            Self::Elastic => 0.0,
            Self::Direct => 1.0,
            Self::Indirect => 2.0,
        }
    }

    #[must_use]
    pub fn from_code(code: f64) -> Option<Self> {
        if code == 0.0 {
            Some(Self::Elastic)
        } else if code == 1.0 {
            Some(Self::Direct)
        } else if code == 2.0 {
            Some(Self::Indirect)
        } else {
            None
        }
    }
}

/// One run's experiment metadata. All angles are radians, all energies meV,
/// `u`/`v` inverse angstrom.
#[derive(Debug, Clone, PartialEq)]
pub struct IxExperiment {
    pub run_id: u32,
    pub efix: f64,
    pub emode: EnergyMode,
    pub en: Vec<f64>,
    pub psi: f64,
    pub omega: f64,
    pub dpsi: f64,
    pub gl: f64,
    pub gs: f64,
    pub u: [f64; 3],
    pub v: [f64; 3],
    pub filename: String,
    pub filepath: String,
}

impl IxExperiment {
    pub(crate) fn lower(&self) -> ObjectArray {
        let en = ObjectArray {
            ty: Tag::F64,
            shape: vec![self.en.len() as u32],
            data: ArrayData::Numeric(self.en.iter().map(|&v| Scalar::F64(v)).collect()),
        };
        let u = ObjectArray::numeric_vector(Tag::F64, self.u.iter().map(|&v| Scalar::F64(v)).collect());
        let v = ObjectArray::numeric_vector(Tag::F64, self.v.iter().map(|&v| Scalar::F64(v)).collect());

        StructValue::new(vec![
            ("serial_name".to_string(), ObjectArray::char(SERIAL_NAME)),
            ("version".to_string(), ObjectArray::scalar(Scalar::F64(VERSION))),
            (
                "run_id".to_string(),
                ObjectArray::scalar(Scalar::F64(f64::from(self.run_id))),
            ),
            ("efix".to_string(), ObjectArray::scalar(Scalar::F64(self.efix))),
            (
                "emode".to_string(),
                ObjectArray::scalar(Scalar::F64(self.emode.code())),
            ),
            ("en".to_string(), en),
            ("psi".to_string(), ObjectArray::scalar(Scalar::F64(self.psi))),
            ("omega".to_string(), ObjectArray::scalar(Scalar::F64(self.omega))),
            ("dpsi".to_string(), ObjectArray::scalar(Scalar::F64(self.dpsi))),
            ("gl".to_string(), ObjectArray::scalar(Scalar::F64(self.gl))),
            ("gs".to_string(), ObjectArray::scalar(Scalar::F64(self.gs))),
            ("u".to_string(), u),
            ("v".to_string(), v),
            ("filename".to_string(), ObjectArray::char(self.filename.clone())),
            ("filepath".to_string(), ObjectArray::char(self.filepath.clone())),
        ])
        .into_block_payload()
    }

    pub(crate) fn raise(array: &ObjectArray) -> Result<Self, SchemaAbort> {
        let s = super::single_struct(array)?;
        super::check_serial_name(s, SERIAL_NAME, VERSION)?;

        let run_id = super::field_f64(s, "run_id")? as u32 + 1;
        let efix = super::field_f64(s, "efix")?;
        let emode_code = super::field_f64(s, "emode")?;
        let emode = EnergyMode::from_code(emode_code)
            .ok_or_else(|| SchemaAbort::new(format!("unknown emode {emode_code}")))?;
        let en = super::field_numeric_vec(s, "en")?;
        let psi = super::field_f64(s, "psi")?;
        let omega = super::field_f64(s, "omega")?;
        let dpsi = super::field_f64(s, "dpsi")?;
        let gl = super::field_f64(s, "gl")?;
        let gs = super::field_f64(s, "gs")?;
        let u = super::field_numeric_array3(s, "u")?;
        let v = super::field_numeric_array3(s, "v")?;
        let filename = super::field_char(s, "filename")?.to_string();
        let filepath = super::field_char(s, "filepath")?.to_string();

        Ok(Self {
            run_id,
            efix,
            emode,
            en,
            psi,
            omega,
            dpsi,
            gl,
            gs,
            u,
            v,
            filename,
            filepath,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> IxExperiment {
        IxExperiment {
            run_id: 0,
            efix: 1.0,
            emode: EnergyMode::Direct,
            en: vec![],
            psi: 0.0,
            omega: 0.0,
            dpsi: 0.0,
            gl: 0.0,
            gs: 0.0,
            u: [1.0, 0.0, 0.0],
            v: [0.0, 1.0, 0.0],
            filename: "experiment1.nxspe".to_string(),
            filepath: "/data".to_string(),
        }
    }

    #[test]
    fn run_id_increments_on_raise() {
        let experiment = sample();
        let array = experiment.lower();
        let raised = IxExperiment::raise(&array).unwrap();
        assert_eq!(raised.run_id, experiment.run_id + 1);
        assert_eq!(raised.efix, experiment.efix);
        assert_eq!(raised.emode, experiment.emode);
    }
}
