// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All constants *must* be double precision. Bulk arrays may be stored in a
lower precision, but derived quantities are computed in double precision.
 */

pub use marlu::constants::VEL_C;
pub use std::f64::consts::TAU;

/// The number of seconds in a (solar) day.
pub const SECONDS_PER_DAY: f64 = 86400.0;

/// The number of seconds in a sidereal day.
pub const SIDEREAL_DAY_SECONDS: f64 = 86164.090_530_832_88;

/// Times whose phase centre elevation is at or below this value are dropped
/// when simulating visibilities \[degrees\].
pub const DEFAULT_ELEVATION_LIMIT_DEG: f64 = 15.0;

/// The coordinate frame assumed for sky positions when none is given.
pub const DEFAULT_SKY_FRAME: &str = "icrs";

/// The name of the file-level attribute counting the data models in an HDF5
/// file.
pub const NUMBER_DATA_MODELS_ATTR: &str = "number_data_models";
