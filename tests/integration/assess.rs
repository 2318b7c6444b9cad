// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use sdp_datamodels::QualityAssessment;
use tempfile::TempDir;

use crate::*;

#[test]
fn test_assess_visibility() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("vis.h5");
    write_vis(&file);

    let cmd = datamodels()
        .args(["assess", &file.display().to_string(), "--context", "ci"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Visibility: Quality assessment from qa_visibility"), "{stdout}");
    assert!(stdout.contains("context:   ci"), "{stdout}");
}

#[test]
fn test_assess_json() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("vis.h5");
    write_vis(&file);

    let cmd = datamodels()
        .args(["assess", "--json", &file.display().to_string()])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    let qas: Vec<QualityAssessment> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(qas.len(), 1);
    assert_eq!(qas[0].origin, "qa_visibility");
    assert!(qas[0].context.is_none());
    // Every visibility is 3+4i.
    assert_abs_diff_eq!(qas[0].data.max, 5.0);
    assert_abs_diff_eq!(qas[0].data.min, 5.0);
    assert_abs_diff_eq!(qas[0].data.medianabs, 5.0);
    assert_abs_diff_eq!(qas[0].data.median, 3.0);
}

#[test]
fn test_assess_gain_tables() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("gains.h5");
    write_gain_tables(&file);

    let cmd = datamodels()
        .args(["assess", "--json", &file.display().to_string()])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    let qas: Vec<QualityAssessment> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(qas.len(), 2);
    assert!(qas.iter().all(|qa| qa.origin == "qa_gaintable"));
    assert_abs_diff_eq!(qas[0].data.max, 1.0);
    assert_eq!(qas[0].data.residual, Some(0.0));
}
