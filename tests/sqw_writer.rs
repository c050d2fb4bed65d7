//! Builder-focused integration tests: assembling a file out of every kind of
//! block the builder knows about, then checking the Block Allocation Table
//! lands them in the right order with the pixel table always last.

use std::io::Cursor;

use sqw::header::read_bat;
use sqw::schema::{
    DndMetadata, EnergyMode, IxExperiment, IxNullInstrument, IxSample, IxSource, IxSourceNamed,
    SqwLineAxes, SqwLineProj,
};
use sqw::{BlockName, Byteorder, Sqw};

fn dnd_metadata() -> DndMetadata {
    let label = || ["u1".to_string(), "u2".to_string(), "u3".to_string(), "u4".to_string()];
    DndMetadata {
        axes: SqwLineAxes {
            title: "axes".to_string(),
            label: label(),
            img_scales: [1.0; 4],
            img_range: [[0.0, 1.0]; 4],
            n_bins_all_dims: [1, 1, 1, 1],
            single_bin_defines_iax: [true, true, true, true],
            dax: [0, 1, 2, 3],
            offset: [0.0; 4],
            changes_aspect_ratio: false,
            filename: String::new(),
            filepath: String::new(),
        },
        proj: SqwLineProj {
            title: "proj".to_string(),
            lattice_spacing: [2.87, 2.87, 2.87],
            lattice_angle: [90.0, 90.0, 90.0],
            offset: [0.0; 4],
            label: label(),
            u: [1.0, 0.0, 0.0],
            v: [0.0, 1.0, 0.0],
            w: None,
            non_orthogonal: false,
            kind: "aaa".to_string(),
        },
    }
}

fn experiment(run_id: u32) -> IxExperiment {
    IxExperiment {
        run_id,
        efix: 400.0,
        emode: EnergyMode::Direct,
        en: vec![-10.0, 0.0, 10.0],
        psi: 0.0,
        omega: 0.0,
        dpsi: 0.0,
        gl: 0.0,
        gs: 0.0,
        u: [1.0, 0.0, 0.0],
        v: [0.0, 1.0, 0.0],
        filename: format!("run{run_id}.nxspe"),
        filepath: "/data".to_string(),
    }
}

#[test]
fn full_file_keeps_pixel_block_last() {
    let mut buf = Cursor::new(Vec::new());
    let metadata = dnd_metadata();
    let instrument = IxNullInstrument {
        name: "instrument".to_string(),
        source: IxSourceNamed {
            name: "source".to_string(),
            target_name: "target".to_string(),
            source: IxSource { frequency: 50.0 },
        },
    };
    let sample = IxSample {
        name: "sample".to_string(),
        lattice_spacing: [2.87, 2.87, 2.87],
        lattice_angle: [90.0, 90.0, 90.0],
    };

    Sqw::build(&mut buf, "full file", Byteorder::Little)
        .register_pixel_data(100, 4, vec![experiment(0), experiment(1)])
        .unwrap()
        .add_dnd_metadata(&metadata)
        .add_default_instrument(&instrument)
        .add_default_sample(&sample)
        .create()
        .unwrap();

    buf.set_position(0);
    let mut reader = sqw::io::SqwReader::new(&mut buf, Some(Byteorder::Little), "<mem>").unwrap();
    sqw::header::read_file_header(&mut reader).unwrap();
    let bat = read_bat(&mut reader).unwrap();

    let names: Vec<String> = bat.names().map(|n| n.to_string()).collect();
    assert_eq!(
        names.last().unwrap(),
        &BlockName("pix".to_string(), "data".to_string()).to_string()
    );

    for expected in [
        BlockName(String::new(), "main_header".to_string()),
        BlockName("data".to_string(), "metadata".to_string()),
        BlockName("instrument".to_string(), "unique_objects".to_string()),
        BlockName("sample".to_string(), "unique_objects".to_string()),
    ] {
        assert!(bat.get(&expected).is_some(), "missing block {expected}");
    }
}

#[test]
fn registering_pixel_data_records_every_experiment() {
    let mut buf = Cursor::new(Vec::new());
    Sqw::build(&mut buf, "t", Byteorder::Little)
        .register_pixel_data(1, 4, vec![experiment(0), experiment(1), experiment(2)])
        .unwrap()
        .create()
        .unwrap();

    buf.set_position(0);
    let mut reader = sqw::Reader::open(buf, Some(Byteorder::Little), "<mem>").unwrap();
    let value = reader
        .read_data_block(("experiment_info", "expdata"))
        .unwrap();

    match value {
        sqw::BlockValue::Experiments(experiments) => {
            assert_eq!(experiments.len(), 3);
            assert_eq!(experiments[0].run_id, 1);
            assert_eq!(experiments[1].run_id, 2);
            assert_eq!(experiments[2].run_id, 3);
        }
        other => panic!("unexpected block value: {other:?}"),
    }
}
