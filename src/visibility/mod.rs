// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Visibilities and flag tables.
//!
//! The `uvw` of a [`Visibility`] follows the convention
//! `uvw = position(a2) - position(a1)` for baseline (a1, a2). This is the
//! negation of the usual interferometric convention.

mod create;
mod flag_table;

pub use create::create_visibility;
pub use flag_table::{FlagTable, FlagTableFields};

use std::sync::{Arc, OnceLock};

use hifitime::Epoch;
use indexmap::IndexMap;
use log::{debug, trace};
use marlu::c64;
use ndarray::{prelude::*, Zip};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    constants::VEL_C,
    coords::{datetimes_from_mjd_seconds, Baselines, PolarisationFrame, SkyCoord},
    qa::{QaStatistics, QualityAssessment},
    Configuration, DataModel, DataModelError,
};

/// Free-form metadata attached to a [`Visibility`].
pub type Meta = IndexMap<String, serde_json::Value>;

/// The precision used to store `weight` and `integration_time` arrays.
#[derive(
    Debug,
    Display,
    EnumIter,
    EnumString,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
)]
pub enum Precision {
    #[strum(serialize = "float32")]
    #[serde(rename = "float32")]
    F32,

    #[default]
    #[strum(serialize = "float64")]
    #[serde(rename = "float64")]
    F64,
}

impl Precision {
    /// The size of a float of this precision \[bytes\].
    pub fn size(self) -> usize {
        match self {
            Precision::F32 => std::mem::size_of::<f32>(),
            Precision::F64 => std::mem::size_of::<f64>(),
        }
    }

    pub fn from_size(size: usize) -> Option<Precision> {
        match size {
            4 => Some(Precision::F32),
            8 => Some(Precision::F64),
            _ => None,
        }
    }

    /// Round a value to this precision.
    pub(crate) fn round(self, v: f64) -> f64 {
        match self {
            Precision::F32 => v as f32 as f64,
            Precision::F64 => v,
        }
    }
}

/// The inputs to [`Visibility::new`]. `phase_centre` and `configuration` are
/// required; absent `weight`s are ones and absent `integration_time`s are one
/// second.
#[derive(Debug, Clone, Default)]
pub struct VisibilityFields {
    /// \[Hz\]
    pub frequency: Array1<f64>,

    /// \[Hz\]
    pub channel_bandwidth: Array1<f64>,

    pub phase_centre: Option<SkyCoord>,

    pub configuration: Option<Arc<Configuration>>,

    /// \[metres\] with shape (time, baseline, 3).
    pub uvw: Array3<f64>,

    /// UTC MJD \[seconds\].
    pub time: Array1<f64>,

    /// (time, baseline, frequency, polarisation)
    pub vis: Array4<c64>,

    pub weight: Option<Array4<f64>>,

    /// \[seconds\]
    pub integration_time: Option<Array1<f64>>,

    /// 1 is flagged, 0 is unflagged.
    pub flags: Array4<i32>,

    pub baselines: Baselines,

    pub polarisation_frame: PolarisationFrame,

    pub source: String,

    pub meta: Option<Meta>,

    pub low_precision: Precision,
}

/// Visibilities, their weights, flags and uvws, along with the axes and
/// metadata needed to interpret them.
#[derive(Debug, Clone)]
pub struct Visibility {
    time: Array1<f64>,
    datetime: Vec<Epoch>,
    baselines: Baselines,
    frequency: Array1<f64>,
    polarisation_frame: PolarisationFrame,
    vis: Array4<c64>,
    weight: Array4<f64>,
    flags: Array4<i32>,
    uvw: Array3<f64>,
    integration_time: Array1<f64>,
    channel_bandwidth: Array1<f64>,
    phase_centre: SkyCoord,
    configuration: Arc<Configuration>,
    source: String,
    meta: Option<Meta>,
    low_precision: Precision,

    /// Memoised uvws in wavelengths. Not reset when `uvw` is changed through
    /// [`Visibility::uvw_mut`]; see [`Visibility::invalidate_uvw_lambda`].
    uvw_lambda: OnceLock<Array4<f64>>,
}

impl Visibility {
    /// Make a new [`Visibility`], checking that every array agrees with the
    /// time, baseline, frequency and polarisation axes.
    pub fn new(fields: VisibilityFields) -> Result<Visibility, DataModelError> {
        let VisibilityFields {
            frequency,
            channel_bandwidth,
            phase_centre,
            configuration,
            uvw,
            time,
            vis,
            weight,
            integration_time,
            flags,
            baselines,
            polarisation_frame,
            source,
            meta,
            low_precision,
        } = fields;

        let phase_centre = phase_centre.ok_or(DataModelError::MissingRequired("phase centre"))?;
        let configuration =
            configuration.ok_or(DataModelError::MissingRequired("configuration"))?;

        let mut weight = weight.unwrap_or_else(|| Array4::ones(vis.raw_dim()));
        let mut integration_time = integration_time.unwrap_or_else(|| Array1::ones(time.len()));
        if low_precision == Precision::F32 {
            weight.mapv_inplace(|w| low_precision.round(w));
            integration_time.mapv_inplace(|t| low_precision.round(t));
        }

        let vis = Visibility {
            datetime: datetimes_from_mjd_seconds(&time),
            time,
            baselines,
            frequency,
            polarisation_frame,
            vis,
            weight,
            flags,
            uvw,
            integration_time,
            channel_bandwidth,
            phase_centre,
            configuration,
            source,
            meta,
            low_precision,
            uvw_lambda: OnceLock::new(),
        };
        vis.validate()?;
        Ok(vis)
    }

    /// Decompose into the parts that [`Visibility::new`] takes. The memoised
    /// `uvw_lambda` is discarded.
    pub fn into_fields(self) -> VisibilityFields {
        VisibilityFields {
            frequency: self.frequency,
            channel_bandwidth: self.channel_bandwidth,
            phase_centre: Some(self.phase_centre),
            configuration: Some(self.configuration),
            uvw: self.uvw,
            time: self.time,
            vis: self.vis,
            weight: Some(self.weight),
            integration_time: Some(self.integration_time),
            flags: self.flags,
            baselines: self.baselines,
            polarisation_frame: self.polarisation_frame,
            source: self.source,
            meta: self.meta,
            low_precision: self.low_precision,
        }
    }

    /// Make the fields of a new container sharing this one's metadata, with
    /// the supplied arrays.
    #[allow(clippy::too_many_arguments)]
    fn derive_fields(
        &self,
        time: Array1<f64>,
        baselines: Baselines,
        frequency: Array1<f64>,
        channel_bandwidth: Array1<f64>,
        vis: Array4<c64>,
        weight: Array4<f64>,
        flags: Array4<i32>,
        uvw: Array3<f64>,
        integration_time: Array1<f64>,
    ) -> VisibilityFields {
        VisibilityFields {
            frequency,
            channel_bandwidth,
            phase_centre: Some(self.phase_centre.clone()),
            configuration: Some(Arc::clone(&self.configuration)),
            uvw,
            time,
            vis,
            weight: Some(weight),
            integration_time: Some(integration_time),
            flags,
            baselines,
            polarisation_frame: self.polarisation_frame,
            source: self.source.clone(),
            meta: self.meta.clone(),
            low_precision: self.low_precision,
        }
    }

    /// UTC MJD \[seconds\].
    pub fn time(&self) -> &Array1<f64> {
        &self.time
    }

    /// The timestamps derived from [`Visibility::time`].
    pub fn datetime(&self) -> &[Epoch] {
        &self.datetime
    }

    pub fn baselines(&self) -> &Baselines {
        &self.baselines
    }

    /// \[Hz\]
    pub fn frequency(&self) -> &Array1<f64> {
        &self.frequency
    }

    pub fn polarisation_frame(&self) -> PolarisationFrame {
        self.polarisation_frame
    }

    pub fn vis(&self) -> &Array4<c64> {
        &self.vis
    }

    pub fn vis_mut(&mut self) -> ArrayViewMut4<c64> {
        self.vis.view_mut()
    }

    pub fn weight(&self) -> &Array4<f64> {
        &self.weight
    }

    pub fn weight_mut(&mut self) -> ArrayViewMut4<f64> {
        self.weight.view_mut()
    }

    pub fn flags(&self) -> &Array4<i32> {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> ArrayViewMut4<i32> {
        self.flags.view_mut()
    }

    /// \[metres\]
    pub fn uvw(&self) -> &Array3<f64> {
        &self.uvw
    }

    /// Mutable access to the uvws. This does *not* reset the memoised
    /// [`Visibility::uvw_lambda`].
    pub fn uvw_mut(&mut self) -> ArrayViewMut3<f64> {
        self.uvw.view_mut()
    }

    /// \[seconds\]
    pub fn integration_time(&self) -> &Array1<f64> {
        &self.integration_time
    }

    /// \[Hz\]
    pub fn channel_bandwidth(&self) -> &Array1<f64> {
        &self.channel_bandwidth
    }

    pub fn phase_centre(&self) -> &SkyCoord {
        &self.phase_centre
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn meta(&self) -> Option<&Meta> {
        self.meta.as_ref()
    }

    pub fn low_precision(&self) -> Precision {
        self.low_precision
    }

    pub fn ntimes(&self) -> usize {
        self.time.len()
    }

    pub fn nbaselines(&self) -> usize {
        self.baselines.len()
    }

    pub fn nchan(&self) -> usize {
        self.frequency.len()
    }

    pub fn npol(&self) -> usize {
        self.polarisation_frame.npol()
    }

    pub fn nants(&self) -> usize {
        self.configuration.nants()
    }

    /// The number of visibilities.
    pub fn nvis(&self) -> usize {
        self.vis.len()
    }

    /// \[metres\] with shape (time, baseline).
    pub fn u(&self) -> ArrayView2<f64> {
        self.uvw.slice(s![.., .., 0])
    }

    pub fn v(&self) -> ArrayView2<f64> {
        self.uvw.slice(s![.., .., 1])
    }

    pub fn w(&self) -> ArrayView2<f64> {
        self.uvw.slice(s![.., .., 2])
    }

    /// The projected baseline lengths sqrt(u^2 + v^2) \[metres\].
    pub fn uvdist(&self) -> Array2<f64> {
        let mut uvdist = self.u().to_owned();
        uvdist.zip_mut_with(&self.v(), |u, &v| *u = u.hypot(v));
        uvdist
    }

    /// The memory occupied by the bulk arrays \[bytes\].
    pub fn size(&self) -> usize {
        self.vis.len() * std::mem::size_of::<c64>()
            + self.weight.len() * self.low_precision.size()
            + self.flags.len() * std::mem::size_of::<i32>()
            + self.uvw.len() * std::mem::size_of::<f64>()
            + self.time.len() * std::mem::size_of::<f64>()
            + self.integration_time.len() * self.low_precision.size()
            + self.frequency.len() * std::mem::size_of::<f64>()
            + self.channel_bandwidth.len() * std::mem::size_of::<f64>()
            + self.baselines.len() * 2 * std::mem::size_of::<usize>()
    }

    pub fn info(&self) -> VisibilityInfo {
        VisibilityInfo {
            number_times: self.ntimes(),
            number_baselines: self.nbaselines(),
            nchan: self.nchan(),
            npol: self.npol(),
            polarisation_frame: self.polarisation_frame,
            nvis: self.nvis(),
            size: self.size(),
        }
    }

    /// The uvws in wavelengths, with shape (time, baseline, frequency, 3).
    /// Computed on first use and memoised.
    pub fn uvw_lambda(&self) -> &Array4<f64> {
        self.uvw_lambda.get_or_init(|| {
            trace!("Computing uvw_lambda");
            compute_uvw_lambda(self.uvw.view(), self.frequency.view())
        })
    }

    /// Replace the memoised uvws in wavelengths.
    pub fn set_uvw_lambda(&mut self, uvw_lambda: Array4<f64>) -> Result<(), DataModelError> {
        let expected = [self.ntimes(), self.nbaselines(), self.nchan(), 3];
        if uvw_lambda.shape() != expected {
            return Err(DataModelError::IncompatibleUpdate {
                what: "uvw_lambda",
                expected: expected.to_vec(),
                actual: uvw_lambda.shape().to_vec(),
            });
        }
        self.uvw_lambda = OnceLock::from(uvw_lambda);
        Ok(())
    }

    /// Forget the memoised uvws in wavelengths; they are recomputed from the
    /// current `uvw` on next use.
    pub fn invalidate_uvw_lambda(&mut self) {
        self.uvw_lambda.take();
    }

    pub fn recompute_uvw_lambda(&mut self) -> &Array4<f64> {
        self.invalidate_uvw_lambda();
        self.uvw_lambda()
    }

    /// The visibilities with flagged samples zeroed.
    pub fn flagged_vis(&self) -> Array4<c64> {
        let mut out = self.vis.clone();
        out.zip_mut_with(&self.flags, |v, &f| *v *= (1 - f) as f64);
        out
    }

    /// The weights with flagged samples zeroed.
    pub fn flagged_weight(&self) -> Array4<f64> {
        let mut out = self.weight.clone();
        out.zip_mut_with(&self.flags, |w, &f| *w *= (1 - f) as f64);
        out
    }

    /// A copy of this container with all visibilities set to zero.
    pub fn zeroed_copy(&self) -> Visibility {
        let mut copy = self.clone();
        copy.vis.fill(c64::new(0.0, 0.0));
        copy
    }

    /// Flag (in place) all samples whose uv distance in wavelengths is at
    /// least `uvmax` or at most `uvmin`. All polarisations of such a sample
    /// are flagged. Existing flags are never cleared.
    pub fn select_uv_range(&mut self, uvmin: Option<f64>, uvmax: Option<f64>) {
        if uvmin.is_none() && uvmax.is_none() {
            return;
        }

        let uvdist = {
            let uvw_lambda = self.uvw_lambda();
            let mut uvdist = uvw_lambda.slice(s![.., .., .., 0]).to_owned();
            uvdist.zip_mut_with(&uvw_lambda.slice(s![.., .., .., 1]), |u, &v| {
                *u = u.hypot(v)
            });
            uvdist
        };

        let mut num_flagged = 0;
        Zip::from(self.flags.lanes_mut(Axis(3)))
            .and(&uvdist)
            .for_each(|mut flags, &d| {
                let outside = uvmax.map(|m| d >= m).unwrap_or(false)
                    || uvmin.map(|m| d <= m).unwrap_or(false);
                if outside {
                    flags.fill(1);
                    num_flagged += 1;
                }
            });
        debug!(
            "select_uv_range: {num_flagged} of {} (time, baseline, channel) samples are outside the uv range",
            uvdist.len()
        );
    }

    /// A new container holding only the baselines whose antennas both lie
    /// strictly between `rmin` and `rmax` metres of the array's mean antenna
    /// position. The configuration is shared, not subsetted. With neither
    /// bound set, this is a plain copy.
    pub fn select_r_range(
        &self,
        rmin: Option<f64>,
        rmax: Option<f64>,
    ) -> Result<Visibility, DataModelError> {
        if rmin.is_none() && rmax.is_none() {
            return Ok(self.clone());
        }

        let present = self.baselines.antenna_ids();
        let ids = self
            .configuration
            .antenna_ids_in_radius(rmin, rmax)
            .into_iter()
            .filter(|id| present.binary_search(id).is_ok())
            .collect::<Vec<_>>();
        debug!(
            "select_r_range: {} of {} antennas are within the radius range",
            ids.len(),
            present.len()
        );
        if ids.is_empty() {
            return Err(DataModelError::EmptySelection {
                what: "radius",
                filtered: present.len(),
                total: present.len(),
            });
        }

        let keep = self
            .baselines
            .iter()
            .enumerate()
            .filter(|(_, (a1, a2))| ids.binary_search(a1).is_ok() && ids.binary_search(a2).is_ok())
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        let baselines = Baselines::from_antenna_ids(&ids);
        if keep
            .iter()
            .map(|&i| self.baselines.as_slice()[i])
            .ne(baselines.iter().copied())
        {
            return Err(DataModelError::NonCanonicalBaselines { antennas: ids });
        }

        self.select_baseline_indices(&keep, baselines)
    }

    fn select_baseline_indices(
        &self,
        indices: &[usize],
        baselines: Baselines,
    ) -> Result<Visibility, DataModelError> {
        Visibility::new(self.derive_fields(
            self.time.clone(),
            baselines,
            self.frequency.clone(),
            self.channel_bandwidth.clone(),
            self.vis.select(Axis(1), indices),
            self.weight.select(Axis(1), indices),
            self.flags.select(Axis(1), indices),
            self.uvw.select(Axis(1), indices),
            self.integration_time.clone(),
        ))
    }

    /// A new container holding only the given timesteps, in the given order.
    pub fn select_time_indices(&self, indices: &[usize]) -> Result<Visibility, DataModelError> {
        check_indices("time", indices, self.ntimes())?;
        Visibility::new(self.derive_fields(
            self.time.select(Axis(0), indices),
            self.baselines.clone(),
            self.frequency.clone(),
            self.channel_bandwidth.clone(),
            self.vis.select(Axis(0), indices),
            self.weight.select(Axis(0), indices),
            self.flags.select(Axis(0), indices),
            self.uvw.select(Axis(0), indices),
            self.integration_time.select(Axis(0), indices),
        ))
    }

    /// A new container holding only the channels in `range`.
    pub fn select_channel_range(
        &self,
        range: std::ops::Range<usize>,
    ) -> Result<Visibility, DataModelError> {
        let indices = range.collect::<Vec<_>>();
        check_indices("frequency", &indices, self.nchan())?;
        Visibility::new(self.derive_fields(
            self.time.clone(),
            self.baselines.clone(),
            self.frequency.select(Axis(0), &indices),
            self.channel_bandwidth.select(Axis(0), &indices),
            self.vis.select(Axis(2), &indices),
            self.weight.select(Axis(2), &indices),
            self.flags.select(Axis(2), &indices),
            self.uvw.clone(),
            self.integration_time.clone(),
        ))
    }

    /// Split into one container per unique time, in order of first
    /// appearance.
    pub fn group_by_time(&self) -> Result<Vec<(f64, Visibility)>, DataModelError> {
        let mut groups: Vec<(f64, Vec<usize>)> = vec![];
        for (i, &t) in self.time.iter().enumerate() {
            match groups.iter_mut().find(|(gt, _)| *gt == t) {
                Some((_, indices)) => indices.push(i),
                None => groups.push((t, vec![i])),
            }
        }
        groups
            .into_iter()
            .map(|(t, indices)| Ok((t, self.select_time_indices(&indices)?)))
            .collect()
    }
}

/// A summary of the size of a [`Visibility`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibilityInfo {
    pub number_times: usize,
    pub number_baselines: usize,
    pub nchan: usize,
    pub npol: usize,
    pub polarisation_frame: PolarisationFrame,
    pub nvis: usize,
    /// \[bytes\]
    pub size: usize,
}

fn check_indices(axis: &'static str, indices: &[usize], len: usize) -> Result<(), DataModelError> {
    if indices.is_empty() {
        return Err(DataModelError::EmptySelection {
            what: axis,
            filtered: len,
            total: len,
        });
    }
    match indices.iter().find(|&&i| i >= len) {
        Some(&index) => Err(DataModelError::IndexOutOfRange { axis, index, len }),
        None => Ok(()),
    }
}

/// Scale uvws \[metres\] by each channel's wavenumber.
fn compute_uvw_lambda(uvw: ArrayView3<f64>, frequency: ArrayView1<f64>) -> Array4<f64> {
    let k = frequency.mapv(|f| f / VEL_C);
    if k.len() == 1 {
        return (&uvw * k[0]).insert_axis(Axis(2));
    }

    let (num_times, num_baselines, _) = uvw.dim();
    let mut out = Array4::zeros((num_times, num_baselines, k.len(), 3));
    for (mut out_t, uvw_t) in out.outer_iter_mut().zip(uvw.outer_iter()) {
        for (mut out_b, uvw_b) in out_t.outer_iter_mut().zip(uvw_t.outer_iter()) {
            for (mut out_f, &k) in out_b.outer_iter_mut().zip(k.iter()) {
                out_f.assign(&(&uvw_b * k));
            }
        }
    }
    out
}

impl DataModel for Visibility {
    const DATA_MODEL: &'static str = "Visibility";

    fn validate(&self) -> Result<(), DataModelError> {
        let shape = [
            self.ntimes(),
            self.nbaselines(),
            self.nchan(),
            self.polarisation_frame.npol(),
        ];
        DataModelError::check_shape("vis", &shape, self.vis.shape())?;
        DataModelError::check_shape("weight", &shape, self.weight.shape())?;
        DataModelError::check_shape("flags", &shape, self.flags.shape())?;
        DataModelError::check_shape("uvw", &[shape[0], shape[1], 3], self.uvw.shape())?;
        DataModelError::check_shape(
            "integration_time",
            &[shape[0]],
            self.integration_time.shape(),
        )?;
        DataModelError::check_shape(
            "channel_bandwidth",
            &[shape[2]],
            self.channel_bandwidth.shape(),
        )?;
        check_baselines(&self.baselines, self.configuration.nants())
    }

    fn assess(&self, context: Option<&str>) -> QualityAssessment {
        let amplitudes = self.vis.iter().map(|v| v.norm()).collect::<Vec<_>>();
        let reals = self.vis.iter().map(|v| v.re).collect::<Vec<_>>();
        QualityAssessment::new(
            "qa_visibility",
            QaStatistics::from_values(&amplitudes, &reals),
            context,
        )
    }
}

/// The baselines must be canonical and refer to antennas in the
/// configuration.
pub(crate) fn check_baselines(baselines: &Baselines, nants: usize) -> Result<(), DataModelError> {
    baselines.check_canonical()?;
    match baselines.antenna_ids().last() {
        Some(&max) if max >= nants => Err(DataModelError::IndexOutOfRange {
            axis: "antenna",
            index: max,
            len: nants,
        }),
        _ => Ok(()),
    }
}

impl PartialEq for Visibility {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time
            && self.baselines == other.baselines
            && self.frequency == other.frequency
            && self.polarisation_frame == other.polarisation_frame
            && self.vis == other.vis
            && self.weight == other.weight
            && self.flags == other.flags
            && self.uvw == other.uvw
            && self.integration_time == other.integration_time
            && self.channel_bandwidth == other.channel_bandwidth
            && self.phase_centre == other.phase_centre
            && self.configuration == other.configuration
            && self.source == other.source
            && self.meta == other.meta
            && self.low_precision == other.low_precision
    }
}
