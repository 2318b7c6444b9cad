// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The axes shared by all data models: times, baselines, frequencies,
//! polarisations and sky positions.

mod baselines;
mod polarisation;
mod sky;
mod time;

pub use baselines::Baselines;
pub use polarisation::{correlate_polarisation, PolarisationFrame, ReceptorFrame};
pub use sky::SkyCoord;
pub use time::{datetimes_from_mjd_seconds, epoch_to_mjd_seconds, mjd_seconds_to_epoch};
