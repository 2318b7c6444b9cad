// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use hifitime::Epoch;
use marlu::c64;
use ndarray::prelude::*;

use crate::{
    coords::{datetimes_from_mjd_seconds, ReceptorFrame, SkyCoord},
    qa::{mean, QaStatistics, QualityAssessment},
    Configuration, DataModel, DataModelError,
};

/// The Jones type given to a [`GainTable`] when none is specified.
pub const DEFAULT_JONES_TYPE: &str = "T";

/// The inputs to [`GainTable::new`]. `phase_centre` is required. Absent
/// `interval`s and `weight`s are ones, and absent `residual`s are zeros.
#[derive(Debug, Clone)]
pub struct GainTableFields {
    /// (time, antenna, frequency, receptor1, receptor2)
    pub gain: Array5<c64>,

    /// UTC MJD \[seconds\].
    pub time: Array1<f64>,

    /// The solution interval of each time \[seconds\].
    pub interval: Option<Array1<f64>>,

    /// Same shape as `gain`.
    pub weight: Option<Array5<f64>>,

    /// (time, frequency, receptor1, receptor2)
    pub residual: Option<Array4<f64>>,

    /// \[Hz\]
    pub frequency: Array1<f64>,

    /// The input and output receptor frames.
    pub receptor_frames: (ReceptorFrame, ReceptorFrame),

    pub phase_centre: Option<SkyCoord>,

    pub configuration: Option<Arc<Configuration>>,

    /// e.g. "T", "G" or "B".
    pub jones_type: String,
}

impl Default for GainTableFields {
    fn default() -> Self {
        GainTableFields {
            gain: Array5::zeros((0, 0, 0, 0, 0)),
            time: Array1::zeros(0),
            interval: None,
            weight: None,
            residual: None,
            frequency: Array1::zeros(0),
            receptor_frames: (ReceptorFrame::default(), ReceptorFrame::default()),
            phase_centre: None,
            configuration: None,
            jones_type: DEFAULT_JONES_TYPE.to_string(),
        }
    }
}

/// Per-antenna complex gains as a function of time and frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct GainTable {
    time: Array1<f64>,
    datetime: Vec<Epoch>,
    interval: Array1<f64>,
    gain: Array5<c64>,
    weight: Array5<f64>,
    residual: Array4<f64>,
    frequency: Array1<f64>,
    receptor_frames: (ReceptorFrame, ReceptorFrame),
    phase_centre: SkyCoord,
    configuration: Option<Arc<Configuration>>,
    jones_type: String,
}

impl GainTable {
    pub fn new(fields: GainTableFields) -> Result<GainTable, DataModelError> {
        let GainTableFields {
            gain,
            time,
            interval,
            weight,
            residual,
            frequency,
            receptor_frames,
            phase_centre,
            configuration,
            jones_type,
        } = fields;
        let phase_centre = phase_centre.ok_or(DataModelError::MissingRequired("phase centre"))?;

        let (num_times, _, num_chans, nrec1, nrec2) = gain.dim();
        let interval = interval.unwrap_or_else(|| Array1::ones(time.len()));
        let weight = weight.unwrap_or_else(|| Array5::ones(gain.raw_dim()));
        let residual =
            residual.unwrap_or_else(|| Array4::zeros((num_times, num_chans, nrec1, nrec2)));

        let gt = GainTable {
            datetime: datetimes_from_mjd_seconds(&time),
            time,
            interval,
            gain,
            weight,
            residual,
            frequency,
            receptor_frames,
            phase_centre,
            configuration,
            jones_type,
        };
        gt.validate()?;
        Ok(gt)
    }

    pub fn into_fields(self) -> GainTableFields {
        GainTableFields {
            gain: self.gain,
            time: self.time,
            interval: Some(self.interval),
            weight: Some(self.weight),
            residual: Some(self.residual),
            frequency: self.frequency,
            receptor_frames: self.receptor_frames,
            phase_centre: Some(self.phase_centre),
            configuration: self.configuration,
            jones_type: self.jones_type,
        }
    }

    /// UTC MJD \[seconds\].
    pub fn time(&self) -> &Array1<f64> {
        &self.time
    }

    pub fn datetime(&self) -> &[Epoch] {
        &self.datetime
    }

    pub fn interval(&self) -> &Array1<f64> {
        &self.interval
    }

    pub fn gain(&self) -> &Array5<c64> {
        &self.gain
    }

    pub fn gain_mut(&mut self) -> ArrayViewMut5<c64> {
        self.gain.view_mut()
    }

    pub fn weight(&self) -> &Array5<f64> {
        &self.weight
    }

    pub fn weight_mut(&mut self) -> ArrayViewMut5<f64> {
        self.weight.view_mut()
    }

    pub fn residual(&self) -> &Array4<f64> {
        &self.residual
    }

    pub fn frequency(&self) -> &Array1<f64> {
        &self.frequency
    }

    pub fn receptor_frames(&self) -> (ReceptorFrame, ReceptorFrame) {
        self.receptor_frames
    }

    pub fn phase_centre(&self) -> &SkyCoord {
        &self.phase_centre
    }

    /// Tables imported from some external formats have no configuration.
    pub fn configuration(&self) -> Option<&Arc<Configuration>> {
        self.configuration.as_ref()
    }

    pub fn jones_type(&self) -> &str {
        &self.jones_type
    }

    pub fn ntimes(&self) -> usize {
        self.gain.len_of(Axis(0))
    }

    pub fn nants(&self) -> usize {
        self.gain.len_of(Axis(1))
    }

    pub fn nchan(&self) -> usize {
        self.gain.len_of(Axis(2))
    }

    /// The number of receptors of the input and output frames.
    pub fn nrec(&self) -> (usize, usize) {
        (self.receptor_frames.0.nrec(), self.receptor_frames.1.nrec())
    }
}

impl DataModel for GainTable {
    const DATA_MODEL: &'static str = "GainTable";

    fn validate(&self) -> Result<(), DataModelError> {
        let (nrec1, nrec2) = self.nrec();
        let shape = [
            self.time.len(),
            self.nants(),
            self.frequency.len(),
            nrec1,
            nrec2,
        ];
        DataModelError::check_shape("gain", &shape, self.gain.shape())?;
        DataModelError::check_shape("weight", &shape, self.weight.shape())?;
        DataModelError::check_shape(
            "residual",
            &[shape[0], shape[2], nrec1, nrec2],
            self.residual.shape(),
        )?;
        DataModelError::check_shape("interval", &[shape[0]], self.interval.shape())?;
        if let Some(c) = &self.configuration {
            c.validate()?;
        }
        Ok(())
    }

    fn assess(&self, context: Option<&str>) -> QualityAssessment {
        let (amplitudes, reals): (Vec<f64>, Vec<f64>) = self
            .gain
            .iter()
            .zip(self.weight.iter())
            .filter(|(_, &w)| w > 0.0)
            .map(|(g, _)| (g.norm(), g.re))
            .unzip();
        let mut data = QaStatistics::from_values(&amplitudes, &reals);
        data.mean = Some(mean(&amplitudes));
        data.residual = Some(max_abs(self.residual.iter()));
        QualityAssessment::new("qa_gaintable", data, context)
    }
}

/// The largest absolute value, or NaN if there are no values.
pub(super) fn max_abs<'a, I: Iterator<Item = &'a f64>>(values: I) -> f64 {
    values
        .map(|v| v.abs())
        .fold(None, |max: Option<f64>, v| Some(max.map_or(v, |m| m.max(v))))
        .unwrap_or(f64::NAN)
}
