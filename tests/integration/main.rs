// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod assess;
mod round_trip;
mod summary;

use std::path::Path;
use std::process::Output;
use std::str::from_utf8;
use std::sync::Arc;

use assert_cmd::{output::OutputError, Command};
use ndarray::prelude::*;

use sdp_datamodels::{
    c64, calibration::GainTableFields, create_visibility, export_to_hdf5,
    params::CreateVisibilityParams, Configuration, GainTable, LatLngHeight, ReceptorFrame,
    SkyCoord, Visibility,
};

fn datamodels() -> Command {
    Command::cargo_bin("datamodels").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

/// Four antennas in a local frame near the MWA.
fn get_config() -> Arc<Configuration> {
    Arc::new(
        Configuration::from_antennas(
            "integration".to_string(),
            LatLngHeight::mwa(),
            (0..4).map(|i| format!("ant{i}")).collect(),
            array![
                [0.0, 0.0, 0.0],
                [50.0, 0.0, 0.0],
                [0.0, 120.0, 0.0],
                [-200.0, 30.0, 2.0],
            ],
            "local".to_string(),
            ReceptorFrame::Linear,
            Array1::from_elem(4, 35.0),
        )
        .unwrap(),
    )
}

fn get_vis() -> Visibility {
    let mut vis = create_visibility(
        get_config(),
        &[-0.05, 0.0, 0.05],
        array![150e6, 151e6, 152e6],
        SkyCoord::from_degrees(0.0, -27.0),
        array![1e6, 1e6, 1e6],
        &CreateVisibilityParams {
            source: "integration".to_string(),
            ..Default::default()
        },
    )
    .unwrap();
    vis.vis_mut().fill(c64::new(3.0, 4.0));
    vis
}

fn get_gain_table() -> GainTable {
    GainTable::new(GainTableFields {
        gain: Array5::from_elem((1, 4, 3, 2, 2), c64::new(1.0, 0.0)),
        time: array![5e9],
        frequency: array![150e6, 151e6, 152e6],
        receptor_frames: (ReceptorFrame::Linear, ReceptorFrame::Linear),
        phase_centre: Some(SkyCoord::from_degrees(0.0, -27.0)),
        configuration: Some(get_config()),
        ..Default::default()
    })
    .unwrap()
}

fn write_vis<P: AsRef<Path>>(file: P) -> Visibility {
    let vis = get_vis();
    export_to_hdf5(std::slice::from_ref(&vis), file).unwrap();
    vis
}

fn write_gain_tables<P: AsRef<Path>>(file: P) -> Vec<GainTable> {
    let gts = vec![get_gain_table(), get_gain_table()];
    export_to_hdf5(&gts, file).unwrap();
    gts
}
