// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Simulate the layout of a [`Visibility`] for an array tracking a phase
//! centre.

use std::sync::Arc;

use hifitime::{Duration, Epoch};
use log::{debug, info};
use marlu::{precession::get_lmst, HADec, LatLngHeight, RADec, UVW};
use ndarray::prelude::*;

use super::{Visibility, VisibilityFields};
use crate::{
    constants::{SECONDS_PER_DAY, SIDEREAL_DAY_SECONDS, TAU},
    coords::{correlate_polarisation, epoch_to_mjd_seconds, Baselines, SkyCoord},
    params::CreateVisibilityParams,
    Configuration, DataModelError,
};

/// Create a [`Visibility`] with zeroed visibilities for `config` observing
/// `phase_centre`.
///
/// `times` are hour angles \[radians\] unless `params.times_are_ha` is false,
/// in which case they are UTC \[radians\] relative to the reference time and
/// are converted to hour angles with the sidereal rate. Times at which the
/// phase centre is at or below the elevation limit are dropped; if none
/// remain, an [`DataModelError::EmptySelection`] is returned.
///
/// The time coordinate is the first transit of the phase centre after the
/// reference time (`params.utc_time`, or 2000-01-01T00:00:00 UTC), offset by
/// each time.
///
/// Autocorrelations get zero weight; cross-correlations get `params.weight`.
/// No samples are flagged.
pub fn create_visibility(
    config: Arc<Configuration>,
    times: &[f64],
    frequency: Array1<f64>,
    phase_centre: SkyCoord,
    channel_bandwidth: Array1<f64>,
    params: &CreateVisibilityParams,
) -> Result<Visibility, DataModelError> {
    let polarisation_frame = params
        .polarisation_frame
        .unwrap_or_else(|| correlate_polarisation(config.receptor_frame));
    let latitude = config.location.latitude_rad;
    let dec = phase_centre.dec.to_radians();
    let (s_dec, c_dec) = dec.sin_cos();
    let elevation_limit = params.elevation_limit_deg.map(f64::to_radians);

    let to_ha = |time: f64| {
        if params.times_are_ha {
            time
        } else {
            time * (SIDEREAL_DAY_SECONDS / SECONDS_PER_DAY)
        }
    };
    let kept = times
        .iter()
        .copied()
        .filter(|&time| {
            let hadec = HADec {
                ha: to_ha(time),
                dec,
            };
            let elevation = hadec.to_azel(latitude).el;
            elevation_limit.map(|limit| elevation > limit).unwrap_or(true)
        })
        .collect::<Vec<_>>();
    let num_flagged = times.len() - kept.len();
    if kept.is_empty() {
        return Err(DataModelError::EmptySelection {
            what: "elevation",
            filtered: num_flagged,
            total: times.len(),
        });
    }
    if let (Some(limit), true) = (params.elevation_limit_deg, num_flagged > 0) {
        info!(
            "create_visibility: flagged {num_flagged}/{} times below elevation limit {limit}°",
            times.len()
        );
    } else {
        debug!("create_visibility: created {} times", kept.len());
    }

    let reference_time = params.utc_time.unwrap_or_else(default_reference_time);
    let transit = transit_time(config.location, reference_time, &phase_centre);
    let transit_seconds = epoch_to_mjd_seconds(transit);

    let baselines = Baselines::generate(config.nants());
    let ants_xyz = config.xyz_geodetic();
    let num_times = kept.len();
    let num_baselines = baselines.len();
    let vis_shape = (
        num_times,
        num_baselines,
        frequency.len(),
        polarisation_frame.npol(),
    );

    let mut time_coord = Array1::zeros(num_times);
    let mut weight = Array4::ones(vis_shape);
    let mut uvw = Array3::zeros((num_times, num_baselines, 3));
    for (i_time, &time) in kept.iter().enumerate() {
        time_coord[i_time] = transit_seconds + time * SECONDS_PER_DAY / TAU;

        let (s_ha, c_ha) = to_ha(time).sin_cos();
        let ant_uvws = ants_xyz
            .iter()
            .map(|&xyz| UVW::from_xyz_inner(xyz, s_ha, c_ha, s_dec, c_dec))
            .collect::<Vec<_>>();
        for (i_bl, &(a1, a2)) in baselines.iter().enumerate() {
            let bl_weight = if a1 == a2 { 0.0 } else { params.weight };
            weight.slice_mut(s![i_time, i_bl, .., ..]).fill(bl_weight);

            let bl_uvw = ant_uvws[a2] - ant_uvws[a1];
            uvw[[i_time, i_bl, 0]] = bl_uvw.u;
            uvw[[i_time, i_bl, 1]] = bl_uvw.v;
            uvw[[i_time, i_bl, 2]] = bl_uvw.w;
        }
    }
    if params.zerow {
        uvw.slice_mut(s![.., .., 2]).fill(0.0);
    }

    let mut integration_time = Array1::zeros(num_times);
    for i in 1..num_times {
        integration_time[i] = time_coord[i] - time_coord[i - 1];
    }
    integration_time[0] = if num_times > 1 {
        integration_time[1]
    } else {
        params.integration_time
    };

    let vis = Visibility::new(VisibilityFields {
        frequency,
        channel_bandwidth,
        phase_centre: Some(phase_centre),
        configuration: Some(config),
        uvw,
        time: time_coord,
        vis: Array4::zeros(vis_shape),
        weight: Some(weight),
        integration_time: Some(integration_time),
        flags: Array4::zeros(vis_shape),
        baselines,
        polarisation_frame,
        source: params.source.clone(),
        meta: params.meta.clone(),
        low_precision: params.low_precision,
    })?;
    debug!(
        "create_visibility: {} visibilities, {:.3} GB",
        vis.nvis(),
        vis.size() as f64 / 1e9
    );
    Ok(vis)
}

/// 2000-01-01T00:00:00 UTC.
pub(crate) fn default_reference_time() -> Epoch {
    Epoch::from_gregorian_utc_at_midnight(2000, 1, 1)
}

/// The first time at or after `after` that `position` crosses the local
/// meridian of `location`.
pub(crate) fn transit_time(location: LatLngHeight, after: Epoch, position: &SkyCoord) -> Epoch {
    let lst = get_lmst(location.longitude_rad, after, Duration::from_seconds(0.0));
    let RADec { ra, .. } = position.radec();
    let ha = (lst - ra).rem_euclid(TAU);
    let wait = if ha == 0.0 { 0.0 } else { TAU - ha };
    after + Duration::from_seconds(wait / TAU * SIDEREAL_DAY_SECONDS)
}
