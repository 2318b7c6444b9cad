// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tempfile::TempDir;

use crate::*;

#[test]
fn test_summary_visibility() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("vis.h5");
    write_vis(&file);

    let cmd = datamodels()
        .args(["summary", &file.display().to_string()])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "{stderr}");
    let lines = stdout.lines().filter(|l| l.starts_with("0: ")).collect::<Vec<_>>();
    assert_eq!(lines.len(), 1, "{stdout}");
    assert!(lines[0].contains("Visibility of 'integration'"), "{stdout}");
    assert!(lines[0].contains("10 baselines"), "{stdout}");
    assert!(lines[0].contains("3 channels"), "{stdout}");
}

#[test]
fn test_summary_many_gain_tables() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("gains.h5");
    write_gain_tables(&file);

    let cmd = datamodels()
        .args(["summary", &file.display().to_string()])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("0: GainTable (T Jones)"), "{stdout}");
    assert!(stdout.contains("1: GainTable (T Jones)"), "{stdout}");
    assert!(stdout.contains("4 antennas"), "{stdout}");
}

#[test]
fn test_summary_missing_file() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("nope.h5");

    let cmd = datamodels()
        .args(["summary", &file.display().to_string()])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error: "), "{stderr}");
}

#[test]
fn test_no_args_prints_help() {
    let cmd = datamodels().ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("USAGE"), "{stderr}");
}
