// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The telescope configuration: antenna names, positions and properties.
//!
//! A [`Configuration`] is immutable once built; data models share one with
//! an [`std::sync::Arc`].

#[cfg(test)]
mod tests;

use log::trace;
use marlu::{LatLngHeight, XyzGeocentric, XyzGeodetic, ENH};
use ndarray::prelude::*;

use crate::{coords::ReceptorFrame, DataModelError};

/// The default mount type of an antenna.
pub const DEFAULT_MOUNT: &str = "altaz";

/// The default voltage-pattern type of an antenna.
pub const DEFAULT_VP_TYPE: &str = "unknown";

#[derive(Debug, Clone)]
pub struct Configuration {
    /// The name of the array (e.g. "LOW").
    pub name: String,

    /// The reference position of the array.
    pub location: LatLngHeight,

    /// Antenna names. All per-antenna fields are 1:1 with this.
    pub names: Vec<String>,

    /// Antenna positions \[metres\] with shape (nants, 3). Their meaning
    /// depends on `frame`.
    pub xyz: Array2<f64>,

    pub mount: Vec<String>,

    /// "ITRF"/"global" for geocentric positions, anything else (usually
    /// "local") for east, north and height relative to `location`.
    pub frame: String,

    pub receptor_frame: ReceptorFrame,

    /// \[metres\]
    pub diameter: Array1<f64>,

    /// Axis offsets \[metres\] with shape (nants, 3).
    pub offset: Array2<f64>,

    pub stations: Vec<String>,

    pub vp_type: Vec<String>,
}

impl Configuration {
    /// Make a new configuration, checking that every per-antenna field has the
    /// same length as `names`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        location: LatLngHeight,
        names: Vec<String>,
        xyz: Array2<f64>,
        mount: Vec<String>,
        frame: String,
        receptor_frame: ReceptorFrame,
        diameter: Array1<f64>,
        offset: Array2<f64>,
        stations: Vec<String>,
        vp_type: Vec<String>,
    ) -> Result<Configuration, DataModelError> {
        let config = Configuration {
            name,
            location,
            names,
            xyz,
            mount,
            frame,
            receptor_frame,
            diameter,
            offset,
            stations,
            vp_type,
        };
        config.validate()?;
        Ok(config)
    }

    /// Make a new configuration with default mounts, zero offsets, stations
    /// named after their index and unknown voltage patterns.
    pub fn from_antennas(
        name: String,
        location: LatLngHeight,
        names: Vec<String>,
        xyz: Array2<f64>,
        frame: String,
        receptor_frame: ReceptorFrame,
        diameter: Array1<f64>,
    ) -> Result<Configuration, DataModelError> {
        let nants = names.len();
        Configuration::new(
            name,
            location,
            names,
            xyz,
            vec![DEFAULT_MOUNT.to_string(); nants],
            frame,
            receptor_frame,
            diameter,
            Array2::zeros((nants, 3)),
            (0..nants).map(|i| i.to_string()).collect(),
            vec![DEFAULT_VP_TYPE.to_string(); nants],
        )
    }

    pub fn validate(&self) -> Result<(), DataModelError> {
        let nants = self.names.len();
        DataModelError::check_shape("xyz", &[nants, 3], self.xyz.shape())?;
        DataModelError::check_shape("mount", &[nants], &[self.mount.len()])?;
        DataModelError::check_shape("diameter", &[nants], self.diameter.shape())?;
        DataModelError::check_shape("offset", &[nants, 3], self.offset.shape())?;
        DataModelError::check_shape("stations", &[nants], &[self.stations.len()])?;
        DataModelError::check_shape("vp_type", &[nants], &[self.vp_type.len()])?;
        Ok(())
    }

    pub fn nants(&self) -> usize {
        self.names.len()
    }

    /// Are the positions geocentric (ITRF)?
    pub fn is_geocentric(&self) -> bool {
        self.frame.eq_ignore_ascii_case("itrf") || self.frame.eq_ignore_ascii_case("global")
    }

    /// The antenna positions in the local geodetic frame of `location`.
    /// Geocentric positions are rotated by the array longitude; any other
    /// frame is taken to be east, north and height \[metres\], rotated by the
    /// array latitude.
    pub fn xyz_geodetic(&self) -> Vec<XyzGeodetic> {
        if self.is_geocentric() {
            trace!("Converting geocentric antenna positions to geodetic");
            let vec = XyzGeocentric::get_geocentric_vector(self.location);
            let (s_long, c_long) = self.location.longitude_rad.sin_cos();
            self.xyz
                .outer_iter()
                .map(|row| {
                    XyzGeocentric {
                        x: row[0],
                        y: row[1],
                        z: row[2],
                    }
                    .to_geodetic_inner(vec, s_long, c_long)
                })
                .collect()
        } else {
            // Local positions are east, north and height.
            let latitude = self.location.latitude_rad;
            self.xyz
                .outer_iter()
                .map(|row| {
                    ENH {
                        e: row[0],
                        n: row[1],
                        h: row[2],
                    }
                    .to_xyz(latitude)
                })
                .collect()
        }
    }

    /// The distance of each antenna from the mean antenna position
    /// \[metres\].
    pub fn radii(&self) -> Array1<f64> {
        let centroid = match self.xyz.mean_axis(Axis(0)) {
            Some(c) => c,
            None => return Array1::zeros(0),
        };
        self.xyz
            .outer_iter()
            .map(|row| {
                row.iter()
                    .zip(centroid.iter())
                    .map(|(p, c)| (p - c).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .collect()
    }

    /// The indices of antennas whose distance from the mean position is
    /// strictly between `rmin` and `rmax`. Absent bounds are not applied.
    pub fn antenna_ids_in_radius(&self, rmin: Option<f64>, rmax: Option<f64>) -> Vec<usize> {
        self.radii()
            .iter()
            .enumerate()
            .filter(|(_, &r)| rmin.map(|rmin| r > rmin).unwrap_or(true))
            .filter(|(_, &r)| rmax.map(|rmax| r < rmax).unwrap_or(true))
            .map(|(i, _)| i)
            .collect()
    }
}

impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.location.longitude_rad == other.location.longitude_rad
            && self.location.latitude_rad == other.location.latitude_rad
            && self.location.height_metres == other.location.height_metres
            && self.names == other.names
            && self.xyz == other.xyz
            && self.mount == other.mount
            && self.frame == other.frame
            && self.receptor_frame == other.receptor_frame
            && self.diameter == other.diameter
            && self.offset == other.offset
            && self.stations == other.stations
            && self.vp_type == other.vp_type
    }
}
