// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use marlu::{LatLngHeight, XyzGeocentric};
use ndarray::prelude::*;

use super::*;

fn low_like_position() -> LatLngHeight {
    LatLngHeight {
        longitude_rad: 116.764_484_44_f64.to_radians(),
        latitude_rad: (-26.824_722_08_f64).to_radians(),
        height_metres: 300.0,
    }
}

fn make_config(xyz: Array2<f64>) -> Configuration {
    let nants = xyz.len_of(Axis(0));
    Configuration::from_antennas(
        "test".to_string(),
        low_like_position(),
        (0..nants).map(|i| format!("ant{i}")).collect(),
        xyz,
        "local".to_string(),
        ReceptorFrame::Linear,
        Array1::from_elem(nants, 35.0),
    )
    .unwrap()
}

#[test]
fn test_from_antennas_defaults() {
    let config = make_config(array![[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]]);
    assert_eq!(config.nants(), 2);
    assert_eq!(config.mount, ["altaz", "altaz"]);
    assert_eq!(config.stations, ["0", "1"]);
    assert_eq!(config.vp_type, ["unknown", "unknown"]);
    assert_eq!(config.offset, Array2::<f64>::zeros((2, 3)));
    assert!(!config.is_geocentric());
}

#[test]
fn test_bad_shapes_are_rejected() {
    let result = Configuration::from_antennas(
        "test".to_string(),
        low_like_position(),
        vec!["a".to_string(), "b".to_string()],
        Array2::zeros((3, 3)),
        "local".to_string(),
        ReceptorFrame::Linear,
        Array1::zeros(2),
    );
    assert!(matches!(
        result,
        Err(DataModelError::ShapeMismatch { what: "xyz", .. })
    ));

    let result = Configuration::from_antennas(
        "test".to_string(),
        low_like_position(),
        vec!["a".to_string(), "b".to_string()],
        Array2::zeros((2, 3)),
        "local".to_string(),
        ReceptorFrame::Linear,
        Array1::zeros(1),
    );
    assert!(matches!(
        result,
        Err(DataModelError::ShapeMismatch {
            what: "diameter",
            ..
        })
    ));
}

#[test]
fn test_radii_and_ids() {
    // Centroid is (0, 0, 0).
    let config = make_config(array![
        [-100.0, 0.0, 0.0],
        [100.0, 0.0, 0.0],
        [0.0, -10.0, 0.0],
        [0.0, 10.0, 0.0],
    ]);
    let radii = config.radii();
    assert_abs_diff_eq!(radii, array![100.0, 100.0, 10.0, 10.0]);

    assert_eq!(config.antenna_ids_in_radius(None, None), [0, 1, 2, 3]);
    assert_eq!(config.antenna_ids_in_radius(None, Some(50.0)), [2, 3]);
    assert_eq!(config.antenna_ids_in_radius(Some(50.0), None), [0, 1]);
    // Bounds are strict.
    assert!(config
        .antenna_ids_in_radius(Some(10.0), Some(100.0))
        .is_empty());
}

#[test]
fn test_local_xyz_geodetic_rotates_by_latitude() {
    // Due east, due north and straight up.
    let config = make_config(array![[10.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]]);
    let (s_lat, c_lat) = config.location.latitude_rad.sin_cos();
    let xyzs = config.xyz_geodetic();

    // East is y, whatever the latitude.
    assert_abs_diff_eq!(xyzs[0].x, 0.0);
    assert_abs_diff_eq!(xyzs[0].y, 10.0);
    assert_abs_diff_eq!(xyzs[0].z, 0.0);

    // North tilts towards the pole; up tilts towards the equator.
    assert_abs_diff_eq!(xyzs[1].x, -10.0 * s_lat, epsilon = 1e-12);
    assert_abs_diff_eq!(xyzs[1].y, 0.0);
    assert_abs_diff_eq!(xyzs[1].z, 10.0 * c_lat, epsilon = 1e-12);
    assert_abs_diff_eq!(xyzs[2].x, 10.0 * c_lat, epsilon = 1e-12);
    assert_abs_diff_eq!(xyzs[2].y, 0.0);
    assert_abs_diff_eq!(xyzs[2].z, 10.0 * s_lat, epsilon = 1e-12);

    // Lengths are preserved.
    for xyz in xyzs {
        assert_abs_diff_eq!(
            (xyz.x * xyz.x + xyz.y * xyz.y + xyz.z * xyz.z).sqrt(),
            10.0,
            epsilon = 1e-12
        );
    }
}

#[test]
fn test_geocentric_array_centre_is_origin() {
    let location = low_like_position();
    let centre = XyzGeocentric::get_geocentric_vector(location);
    let mut config = make_config(array![[0.0, 0.0, 0.0]]);
    config.xyz = array![[centre.x, centre.y, centre.z]];
    config.frame = "ITRF".to_string();
    assert!(config.is_geocentric());

    let xyzs = config.xyz_geodetic();
    assert_abs_diff_eq!(xyzs[0].x, 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(xyzs[0].y, 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(xyzs[0].z, 0.0, epsilon = 1e-6);

    // Converting the geocentric centre back lands on the location.
    let back = XyzGeocentric {
        x: centre.x,
        y: centre.y,
        z: centre.z,
    }
    .to_earth_wgs84();
    assert_abs_diff_eq!(back.latitude_rad, location.latitude_rad, epsilon = 1e-9);
    assert_abs_diff_eq!(back.longitude_rad, location.longitude_rad, epsilon = 1e-9);
}

#[test]
fn test_equality() {
    let a = make_config(array![[1.0, 2.0, 3.0]]);
    let mut b = a.clone();
    assert_eq!(a, b);
    b.location.height_metres += 1.0;
    assert_ne!(a, b);
}
