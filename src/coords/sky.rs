// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fmt::Display;

use marlu::RADec;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SKY_FRAME;

/// A sky position with its reference frame. The coordinates are kept in
/// degrees, which is also how they are persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyCoord {
    /// Right ascension (or longitude-like coordinate) \[degrees\]
    pub ra: f64,

    /// Declination (or latitude-like coordinate) \[degrees\]
    pub dec: f64,

    /// e.g. "icrs" or "fk5".
    pub frame: String,
}

impl SkyCoord {
    /// A new position in the default ("icrs") frame.
    pub fn from_degrees(ra: f64, dec: f64) -> SkyCoord {
        SkyCoord {
            ra,
            dec,
            frame: DEFAULT_SKY_FRAME.to_string(),
        }
    }

    pub fn from_radians(ra: f64, dec: f64) -> SkyCoord {
        SkyCoord::from_degrees(ra.to_degrees(), dec.to_degrees())
    }

    pub fn with_frame<S: Into<String>>(mut self, frame: S) -> SkyCoord {
        self.frame = frame.into();
        self
    }

    pub fn from_radec(radec: RADec) -> SkyCoord {
        SkyCoord::from_radians(radec.ra, radec.dec)
    }

    /// Get the position as a [`RADec`] (radians).
    pub fn radec(&self) -> RADec {
        RADec::from_degrees(self.ra, self.dec)
    }

    /// The persisted form of the coordinates: "<ra> <dec>" in degrees. Rust's
    /// float formatting is the shortest string that parses back to the same
    /// value, so this is lossless.
    pub fn to_coord_string(&self) -> String {
        format!("{} {}", self.ra, self.dec)
    }

    /// Parse the output of [`SkyCoord::to_coord_string`]. Commas are also
    /// accepted as separators. Returns `None` if the string isn't two floats.
    pub fn from_coord_string<S: Into<String>>(coords: &str, frame: S) -> Option<SkyCoord> {
        let mut split = coords
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty());
        let ra = split.next()?.trim().parse().ok()?;
        let dec = split.next()?.trim().parse().ok()?;
        if split.next().is_some() {
            return None;
        }
        Some(SkyCoord {
            ra,
            dec,
            frame: frame.into(),
        })
    }
}

impl Display for SkyCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:.4}°, {:.4}°) {}",
            self.ra, self.dec, self.frame
        )
    }
}
