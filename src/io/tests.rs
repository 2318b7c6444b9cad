// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use indexmap::indexmap;
use marlu::{c64, LatLngHeight};
use ndarray::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

use super::*;
use crate::{
    calibration::{GainTableFields, PointingTableFields},
    coords::ReceptorFrame,
    create_visibility,
    params::CreateVisibilityParams,
    Configuration, DataModelError, Precision, SkyCoord,
};

fn make_config() -> Arc<Configuration> {
    Arc::new(
        Configuration::from_antennas(
            "test".to_string(),
            LatLngHeight {
                longitude_rad: 116.76444824_f64.to_radians(),
                latitude_rad: -26.82472208_f64.to_radians(),
                height_metres: 377.8,
            },
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            array![[0.0, 0.0, 0.0], [100.0, 20.0, 1.0], [-30.0, 250.0, -2.0]],
            "local".to_string(),
            ReceptorFrame::Linear,
            Array1::from_elem(3, 38.0),
        )
        .unwrap(),
    )
}

fn make_vis(params: &CreateVisibilityParams) -> Visibility {
    let mut vis = create_visibility(
        make_config(),
        &[-0.1, 0.0, 0.1],
        array![100e6, 101e6],
        SkyCoord::from_degrees(30.0, -45.0),
        array![1e6, 1e6],
        params,
    )
    .unwrap();
    // Something other than zeros to check.
    vis.vis_mut()
        .indexed_iter_mut()
        .for_each(|((t, b, f, p), v)| *v = c64::new((t + b) as f64, (f + p) as f64 * 0.25));
    vis.flags_mut()[(1, 2, 0, 3)] = 1;
    vis
}

fn make_gain_table(with_config: bool) -> GainTable {
    GainTable::new(GainTableFields {
        gain: Array5::from_shape_fn((2, 3, 4, 2, 2), |(t, a, f, r1, r2)| {
            if r1 == r2 {
                c64::new(1.0 + (t + a) as f64 * 0.1, f as f64 * 0.01)
            } else {
                c64::new(0.0, 0.0)
            }
        }),
        time: array![5e9, 5e9 + 10.0],
        frequency: array![100e6, 110e6, 120e6, 130e6],
        receptor_frames: (ReceptorFrame::Linear, ReceptorFrame::Linear),
        phase_centre: Some(SkyCoord::from_degrees(15.0, -45.0)),
        configuration: with_config.then(make_config),
        jones_type: "B".to_string(),
        ..Default::default()
    })
    .unwrap()
}

fn make_pointing_table() -> PointingTable {
    PointingTable::new(PointingTableFields {
        pointing: Array5::from_shape_fn((2, 3, 1, 2, 2), |(t, a, _, r, i)| {
            (t * 100 + a * 10 + r) as f64 * 1e-4 + i as f64 * 1e-5
        }),
        time: array![5e9, 5e9 + 10.0],
        frequency: array![150e6],
        receptor_frame: ReceptorFrame::Linear,
        pointing_centre: Some(SkyCoord::from_degrees(60.0, -30.0)),
        configuration: Some(make_config()),
        ..Default::default()
    })
    .unwrap()
}

#[test]
#[serial]
fn test_visibility_round_trip() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("vis.h5");
    let params = CreateVisibilityParams {
        source: "test source".to_string(),
        meta: Some(indexmap! {
            "observer".to_string() => serde_json::json!("me"),
            "scan".to_string() => serde_json::json!(3),
        }),
        ..Default::default()
    };
    let vis = make_vis(&params);

    export_to_hdf5(std::slice::from_ref(&vis), &file).unwrap();
    let result = import_from_hdf5::<Visibility, _>(&file).unwrap();
    assert!(matches!(result, OneOrMany::One(_)));
    let read = result.into_one().unwrap();
    assert_eq!(read, vis);
    assert_eq!(read.meta(), vis.meta());
    assert_eq!(read.low_precision(), Precision::F64);
    assert_eq!(read.uvw_lambda(), vis.uvw_lambda());
}

#[test]
#[serial]
fn test_visibility_round_trip_low_precision() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("vis.h5");
    let params = CreateVisibilityParams {
        weight: 0.1,
        integration_time: 1.1,
        low_precision: Precision::F32,
        ..Default::default()
    };
    let vis = make_vis(&params);

    export_to_hdf5(std::slice::from_ref(&vis), &file).unwrap();
    let h5 = hdf5::File::open(&file).unwrap();
    let group = h5.group("Visibility0").unwrap();
    assert_eq!(group.dataset("data_weight").unwrap().dtype().unwrap().size(), 4);
    assert_eq!(group.dataset("data_vis").unwrap().dtype().unwrap().size(), 16);
    drop(h5);

    let read = import_from_hdf5::<Visibility, _>(&file)
        .unwrap()
        .into_one()
        .unwrap();
    assert_eq!(read.low_precision(), Precision::F32);
    assert_eq!(read, vis);
}

#[test]
#[serial]
fn test_many_visibilities_round_trip() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("vis.h5");
    let vis1 = make_vis(&CreateVisibilityParams::default());
    let vis2 = make_vis(&CreateVisibilityParams {
        zerow: true,
        source: "second".to_string(),
        ..Default::default()
    });

    export_to_hdf5(&[vis1.clone(), vis2.clone()], &file).unwrap();
    let h5 = hdf5::File::open(&file).unwrap();
    assert_eq!(
        h5.attr(NUMBER_DATA_MODELS_ATTR)
            .unwrap()
            .read_scalar::<i64>()
            .unwrap(),
        2
    );
    drop(h5);

    let result = import_from_hdf5::<Visibility, _>(&file).unwrap();
    assert_eq!(result.len(), 2);
    assert!(matches!(result, OneOrMany::Many(_)));
    assert_eq!(result.into_vec(), vec![vis1, vis2]);
}

#[test]
#[serial]
fn test_flag_table_round_trip() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("flags.h5");
    let vis = make_vis(&CreateVisibilityParams::default());
    let ft = FlagTable::from_visibility(&vis);

    export_to_hdf5(std::slice::from_ref(&ft), &file).unwrap();
    let read = import_from_hdf5::<FlagTable, _>(&file)
        .unwrap()
        .into_one()
        .unwrap();
    assert_eq!(read, ft);
    assert_eq!(read.flags()[(1, 2, 0, 3)], 1);
}

#[test]
#[serial]
fn test_gain_table_round_trip() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("gains.h5");
    let gt = make_gain_table(true);

    export_to_hdf5(std::slice::from_ref(&gt), &file).unwrap();
    let read = import_from_hdf5::<GainTable, _>(&file)
        .unwrap()
        .into_one()
        .unwrap();
    assert_eq!(read, gt);
    assert_eq!(read.jones_type(), "B");
    assert!(read.configuration().is_some());
}

#[test]
#[serial]
fn test_gain_tables_without_configuration_round_trip() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("gains.h5");
    let gts = vec![make_gain_table(false), make_gain_table(false)];

    export_to_hdf5(&gts, &file).unwrap();
    let read = import_from_hdf5::<GainTable, _>(&file).unwrap().into_vec();
    assert_eq!(read, gts);
    assert!(read[0].configuration().is_none());
}

#[test]
#[serial]
fn test_gain_table_without_jones_type_reads_default() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("gains.h5");
    let gt = make_gain_table(false);
    let (frame1, frame2) = gt.receptor_frames();

    // Everything but the Jones type.
    let h5 = hdf5::File::create(&file).unwrap();
    let group = h5.create_group("GainTable0").unwrap();
    helpers::write_str_attr(&group, "data_model", "GainTable").unwrap();
    helpers::write_str_attr(&group, "receptor_frame1", &frame1.to_string()).unwrap();
    helpers::write_str_attr(&group, "receptor_frame2", &frame2.to_string()).unwrap();
    helpers::write_sky_coord(&group, "phasecentre", gt.phase_centre()).unwrap();
    helpers::write_dataset(&group, "data_time", gt.time().view()).unwrap();
    helpers::write_complex_dataset(&group, "data_gain", gt.gain()).unwrap();
    helpers::write_dataset(&group, "data_weight", gt.weight().view()).unwrap();
    helpers::write_dataset(&group, "data_residual", gt.residual().view()).unwrap();
    helpers::write_dataset(&group, "data_interval", gt.interval().view()).unwrap();
    helpers::write_dataset(&group, "data_frequency", gt.frequency().view()).unwrap();
    h5.new_attr::<i64>()
        .create(NUMBER_DATA_MODELS_ATTR)
        .unwrap()
        .write_scalar(&1)
        .unwrap();
    drop(group);
    drop(h5);

    let read = import_from_hdf5::<GainTable, _>(&file)
        .unwrap()
        .into_one()
        .unwrap();
    assert_eq!(read.jones_type(), "T");
}

#[test]
#[serial]
fn test_pointing_table_round_trip() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("pointing.h5");
    let pt = make_pointing_table();

    export_to_hdf5(std::slice::from_ref(&pt), &file).unwrap();
    let read = import_from_hdf5::<PointingTable, _>(&file)
        .unwrap()
        .into_one()
        .unwrap();
    assert_eq!(read, pt);
    assert_eq!(read.pointing_frame(), "azel");
}

#[test]
#[serial]
fn test_import_wrong_type() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("gains.h5");
    export_to_hdf5(&[make_gain_table(true)], &file).unwrap();

    let result = import_from_hdf5::<Visibility, _>(&file);
    match result {
        Err(Hdf5ReadError::NotThisType {
            expected, found, ..
        }) => {
            assert_eq!(expected, "Visibility");
            assert_eq!(found, "GainTable");
        }
        _ => panic!("Expected NotThisType, got {result:?}"),
    }
}

#[test]
#[serial]
fn test_export_nothing() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("empty.h5");
    let result = export_to_hdf5::<GainTable, _>(&[], &file);
    assert!(matches!(result, Err(Hdf5WriteError::NoDataModels)));
    assert!(!file.exists());
}

#[test]
#[serial]
fn test_import_no_data_models() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("empty.h5");
    let h5 = hdf5::File::create(&file).unwrap();
    h5.new_attr::<i64>()
        .create(NUMBER_DATA_MODELS_ATTR)
        .unwrap()
        .write_scalar(&0)
        .unwrap();
    drop(h5);

    let result = import_from_hdf5::<GainTable, _>(&file);
    assert!(matches!(result, Err(Hdf5ReadError::NoDataModels(0))));
    let result = import_any_from_hdf5(&file);
    assert!(matches!(result, Err(Hdf5ReadError::NoDataModels(0))));
}

#[test]
#[serial]
fn test_import_missing_count() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("nothing.h5");
    drop(hdf5::File::create(&file).unwrap());

    let result = import_from_hdf5::<GainTable, _>(&file);
    assert!(matches!(
        result,
        Err(Hdf5ReadError::MissingAttribute { .. })
    ));
}

/// Writes one good group, then fails.
#[derive(Debug)]
struct FailsSecond(usize);

impl DataModel for FailsSecond {
    const DATA_MODEL: &'static str = "FailsSecond";

    fn validate(&self) -> Result<(), DataModelError> {
        Ok(())
    }

    fn assess(&self, context: Option<&str>) -> QualityAssessment {
        QualityAssessment::new(
            Self::DATA_MODEL,
            crate::QaStatistics::from_values(&[], &[]),
            context,
        )
    }
}

impl Hdf5DataModel for FailsSecond {
    fn to_hdf5_group(&self, group: &Group) -> Result<(), Hdf5WriteError> {
        if self.0 > 0 {
            return Err(Hdf5WriteError::NoDataModels);
        }
        helpers::write_str_attr(group, "data_model", Self::DATA_MODEL)
    }

    fn from_hdf5_group(_: &Group) -> Result<Self, Hdf5ReadError> {
        Ok(FailsSecond(0))
    }
}

#[test]
#[serial]
fn test_failed_export_removes_file() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("partial.h5");

    let result = export_to_hdf5(&[FailsSecond(0), FailsSecond(1)], &file);
    assert!(result.is_err());
    assert!(!file.exists());

    // A successful write leaves the file in place.
    export_to_hdf5(&[FailsSecond(0)], &file).unwrap();
    assert!(file.exists());
}

#[test]
#[serial]
fn test_import_any() {
    let tmp_dir = TempDir::new().unwrap();
    let gt_file = tmp_dir.path().join("gains.h5");
    let pt_file = tmp_dir.path().join("pointing.h5");
    let gts = vec![make_gain_table(true), make_gain_table(false)];
    let pt = make_pointing_table();
    export_to_hdf5(&gts, &gt_file).unwrap();
    export_to_hdf5(std::slice::from_ref(&pt), &pt_file).unwrap();

    let models = import_any_from_hdf5(&gt_file).unwrap();
    assert_eq!(models.len(), 2);
    assert!(models.iter().all(|m| m.data_model() == "GainTable"));
    assert_eq!(models[1], AnyDataModel::GainTable(gts[1].clone()));
    assert!(models[0].to_string().starts_with("GainTable (B Jones)"));

    let models = import_any_from_hdf5(&pt_file).unwrap();
    assert_eq!(models, vec![AnyDataModel::PointingTable(pt.clone())]);
    let qa = models[0].assess(Some("test"));
    assert_eq!(qa, pt.assess(Some("test")));
}

#[test]
#[serial]
fn test_import_any_unknown_data_model() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("weird.h5");
    let h5 = hdf5::File::create(&file).unwrap();
    let group = h5.create_group("GainTable0").unwrap();
    helpers::write_str_attr(&group, "data_model", "SkyModel").unwrap();
    h5.new_attr::<i64>()
        .create(NUMBER_DATA_MODELS_ATTR)
        .unwrap()
        .write_scalar(&1)
        .unwrap();
    drop(group);
    drop(h5);

    let result = import_any_from_hdf5(&file);
    assert!(matches!(
        result,
        Err(Hdf5ReadError::UnknownDataModel { found, .. }) if found == "SkyModel"
    ));
}
