// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Conversions between the stored time coordinate (UTC MJD seconds) and
//! [`Epoch`]s.

use hifitime::Epoch;

use crate::constants::SECONDS_PER_DAY;

pub fn mjd_seconds_to_epoch(mjd_seconds: f64) -> Epoch {
    Epoch::from_mjd_utc(mjd_seconds / SECONDS_PER_DAY)
}

pub fn epoch_to_mjd_seconds(epoch: Epoch) -> f64 {
    epoch.to_mjd_utc_days() * SECONDS_PER_DAY
}

/// The derived `datetime` coordinate of a time axis.
pub fn datetimes_from_mjd_seconds<'a, I: IntoIterator<Item = &'a f64>>(times: I) -> Vec<Epoch> {
    times.into_iter().copied().map(mjd_seconds_to_epoch).collect()
}
