// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Library-level persistence tests through the public API.

use sdp_datamodels::{
    import_any_from_hdf5, import_from_hdf5, AnyDataModel, DataModel, FlagTable, OneOrMany,
};
use tempfile::TempDir;

use crate::*;

#[test]
fn test_visibility_and_flags_survive_a_round_trip() {
    let tmp_dir = TempDir::new().unwrap();
    let vis_file = tmp_dir.path().join("vis.h5");
    let flags_file = tmp_dir.path().join("flags.h5");
    let mut vis = write_vis(&vis_file);
    vis.flags_mut()[(0, 1, 2, 3)] = 1;
    let ft = FlagTable::from_visibility(&vis);
    export_to_hdf5(std::slice::from_ref(&ft), &flags_file).unwrap();

    let read = import_from_hdf5::<Visibility, _>(&vis_file).unwrap();
    assert!(matches!(&read, OneOrMany::One(v) if v.flags().iter().all(|&f| f == 0)));
    let read = import_from_hdf5::<FlagTable, _>(&flags_file)
        .unwrap()
        .into_one()
        .unwrap();
    assert_eq!(read, ft);
    assert!(read.validate().is_ok());
}

#[test]
fn test_import_any_mixed_files() {
    let tmp_dir = TempDir::new().unwrap();
    let vis_file = tmp_dir.path().join("vis.h5");
    let gain_file = tmp_dir.path().join("gains.h5");
    let vis = write_vis(&vis_file);
    let gts = write_gain_tables(&gain_file);

    assert_eq!(
        import_any_from_hdf5(&vis_file).unwrap(),
        vec![AnyDataModel::Visibility(vis)]
    );
    assert_eq!(
        import_any_from_hdf5(&gain_file).unwrap(),
        gts.into_iter()
            .map(AnyDataModel::GainTable)
            .collect::<Vec<_>>()
    );
    assert!(import_from_hdf5::<GainTable, _>(&vis_file).is_err());
}
