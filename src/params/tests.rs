// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::io::Write;

use approx::assert_abs_diff_eq;
use indoc::indoc;
use tempfile::Builder;

use super::*;

fn write_settings(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_defaults() {
    let p = CreateVisibilityParams::default();
    assert_abs_diff_eq!(p.weight, 1.0);
    assert_abs_diff_eq!(p.integration_time, 1.0);
    assert_eq!(p.elevation_limit_deg, Some(15.0));
    assert_eq!(p.source, "unknown");
    assert!(p.times_are_ha);
    assert!(!p.zerow);
    assert_eq!(p.low_precision, Precision::F64);
    assert!(p.polarisation_frame.is_none());
    assert!(p.utc_time.is_none());
}

#[test]
fn test_read_toml() {
    let file = write_settings(
        ".toml",
        indoc! {r#"
            weight = 2.5
            polarisation_frame = "linearnp"
            zerow = true
            source = "3C273"
            utc_time = "2023-01-01T00:00:00 UTC"
            low_precision = "float32"
        "#},
    );
    let p = CreateVisibilityParams::from_file(file.path()).unwrap();
    assert_abs_diff_eq!(p.weight, 2.5);
    assert_eq!(p.polarisation_frame, Some(PolarisationFrame::LinearNp));
    assert!(p.zerow);
    assert_eq!(p.source, "3C273");
    assert_eq!(
        p.utc_time,
        Some(Epoch::from_gregorian_utc_at_midnight(2023, 1, 1))
    );
    assert_eq!(p.low_precision, Precision::F32);
    // Unspecified fields take their defaults.
    assert_eq!(p.elevation_limit_deg, Some(15.0));
    assert!(p.times_are_ha);
}

#[test]
fn test_read_json() {
    let file = write_settings(
        ".json",
        indoc! {r#"
            {
                "elevation_limit_deg": null,
                "times_are_ha": false,
                "meta": {"observer": "someone", "run": 3}
            }
        "#},
    );
    let p = CreateVisibilityParams::from_file(file.path()).unwrap();
    assert_eq!(p.elevation_limit_deg, None);
    assert!(!p.times_are_ha);
    let meta = p.meta.unwrap();
    assert_eq!(meta["observer"], "someone");
    assert_eq!(meta["run"], 3);
}

#[test]
fn test_bad_extension() {
    let file = write_settings(".yaml", "weight: 1.0\n");
    let result = CreateVisibilityParams::from_file(file.path());
    assert!(matches!(
        result,
        Err(ParamsFileError::UnrecognisedExtension { .. })
    ));
}

#[test]
fn test_bad_contents() {
    let file = write_settings(".toml", "weight = \"heavy\"\n");
    let result = CreateVisibilityParams::from_file(file.path());
    assert!(matches!(result, Err(ParamsFileError::Toml { .. })));

    let file = write_settings(".json", "{ \"utc_time\": \"not a time\" }");
    let result = CreateVisibilityParams::from_file(file.path());
    assert!(matches!(result, Err(ParamsFileError::Json { .. })));
}

#[test]
fn test_missing_file() {
    let result = CreateVisibilityParams::from_file("/does/not/exist.toml");
    assert!(matches!(result, Err(ParamsFileError::IO(_))));
}
