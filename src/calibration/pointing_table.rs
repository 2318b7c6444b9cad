// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use hifitime::Epoch;
use ndarray::prelude::*;

use super::gain_table::max_abs;
use crate::{
    coords::{datetimes_from_mjd_seconds, ReceptorFrame, SkyCoord},
    qa::{mean, QaStatistics, QualityAssessment},
    Configuration, DataModel, DataModelError,
};

/// The pointing frame given to a [`PointingTable`] when none is specified.
pub const DEFAULT_POINTING_FRAME: &str = "azel";

/// The inputs to [`PointingTable::new`]. `pointing_centre` and
/// `configuration` are required. Absent `nominal`s and `residual`s are zeros,
/// and absent `weight`s and `interval`s are ones.
#[derive(Debug, Clone)]
pub struct PointingTableFields {
    /// (time, antenna, frequency, receptor, angle) \[radians\].
    pub pointing: Array5<f64>,

    /// Same shape as `pointing` \[radians\].
    pub nominal: Option<Array5<f64>>,

    /// UTC MJD \[seconds\].
    pub time: Array1<f64>,

    /// \[seconds\]
    pub interval: Option<Array1<f64>>,

    pub weight: Option<Array5<f64>>,

    /// (time, frequency, receptor, angle) \[radians\].
    pub residual: Option<Array4<f64>>,

    /// \[Hz\]
    pub frequency: Array1<f64>,

    pub receptor_frame: ReceptorFrame,

    pub pointing_centre: Option<SkyCoord>,

    /// e.g. "azel".
    pub pointing_frame: String,

    pub configuration: Option<Arc<Configuration>>,
}

impl Default for PointingTableFields {
    fn default() -> Self {
        PointingTableFields {
            pointing: Array5::zeros((0, 0, 0, 0, 2)),
            nominal: None,
            time: Array1::zeros(0),
            interval: None,
            weight: None,
            residual: None,
            frequency: Array1::zeros(0),
            receptor_frame: ReceptorFrame::default(),
            pointing_centre: None,
            pointing_frame: DEFAULT_POINTING_FRAME.to_string(),
            configuration: None,
        }
    }
}

/// Per-antenna pointing offsets as a function of time and frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct PointingTable {
    time: Array1<f64>,
    datetime: Vec<Epoch>,
    interval: Array1<f64>,
    pointing: Array5<f64>,
    nominal: Array5<f64>,
    weight: Array5<f64>,
    residual: Array4<f64>,
    frequency: Array1<f64>,
    receptor_frame: ReceptorFrame,
    pointing_centre: SkyCoord,
    pointing_frame: String,
    configuration: Arc<Configuration>,
}

impl PointingTable {
    pub fn new(fields: PointingTableFields) -> Result<PointingTable, DataModelError> {
        let PointingTableFields {
            pointing,
            nominal,
            time,
            interval,
            weight,
            residual,
            frequency,
            receptor_frame,
            pointing_centre,
            pointing_frame,
            configuration,
        } = fields;
        let pointing_centre =
            pointing_centre.ok_or(DataModelError::MissingRequired("pointing centre"))?;
        let configuration =
            configuration.ok_or(DataModelError::MissingRequired("configuration"))?;

        let (num_times, _, num_chans, nrec, num_angles) = pointing.dim();
        let nominal = nominal.unwrap_or_else(|| Array5::zeros(pointing.raw_dim()));
        let weight = weight.unwrap_or_else(|| Array5::ones(pointing.raw_dim()));
        let residual =
            residual.unwrap_or_else(|| Array4::zeros((num_times, num_chans, nrec, num_angles)));
        let interval = interval.unwrap_or_else(|| Array1::ones(time.len()));

        let pt = PointingTable {
            datetime: datetimes_from_mjd_seconds(&time),
            time,
            interval,
            pointing,
            nominal,
            weight,
            residual,
            frequency,
            receptor_frame,
            pointing_centre,
            pointing_frame,
            configuration,
        };
        pt.validate()?;
        Ok(pt)
    }

    pub fn into_fields(self) -> PointingTableFields {
        PointingTableFields {
            pointing: self.pointing,
            nominal: Some(self.nominal),
            time: self.time,
            interval: Some(self.interval),
            weight: Some(self.weight),
            residual: Some(self.residual),
            frequency: self.frequency,
            receptor_frame: self.receptor_frame,
            pointing_centre: Some(self.pointing_centre),
            pointing_frame: self.pointing_frame,
            configuration: Some(self.configuration),
        }
    }

    pub fn time(&self) -> &Array1<f64> {
        &self.time
    }

    pub fn datetime(&self) -> &[Epoch] {
        &self.datetime
    }

    pub fn interval(&self) -> &Array1<f64> {
        &self.interval
    }

    pub fn pointing(&self) -> &Array5<f64> {
        &self.pointing
    }

    pub fn pointing_mut(&mut self) -> ArrayViewMut5<f64> {
        self.pointing.view_mut()
    }

    pub fn nominal(&self) -> &Array5<f64> {
        &self.nominal
    }

    pub fn weight(&self) -> &Array5<f64> {
        &self.weight
    }

    pub fn residual(&self) -> &Array4<f64> {
        &self.residual
    }

    pub fn frequency(&self) -> &Array1<f64> {
        &self.frequency
    }

    pub fn receptor_frame(&self) -> ReceptorFrame {
        self.receptor_frame
    }

    pub fn pointing_centre(&self) -> &SkyCoord {
        &self.pointing_centre
    }

    pub fn pointing_frame(&self) -> &str {
        &self.pointing_frame
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    pub fn ntimes(&self) -> usize {
        self.pointing.len_of(Axis(0))
    }

    pub fn nants(&self) -> usize {
        self.pointing.len_of(Axis(1))
    }

    pub fn nchan(&self) -> usize {
        self.pointing.len_of(Axis(2))
    }

    pub fn nrec(&self) -> usize {
        self.receptor_frame.nrec()
    }
}

impl DataModel for PointingTable {
    const DATA_MODEL: &'static str = "PointingTable";

    fn validate(&self) -> Result<(), DataModelError> {
        let shape = [
            self.time.len(),
            self.configuration.nants(),
            self.frequency.len(),
            self.receptor_frame.nrec(),
            2,
        ];
        DataModelError::check_shape("pointing", &shape, self.pointing.shape())?;
        DataModelError::check_shape("nominal", &shape, self.nominal.shape())?;
        DataModelError::check_shape("weight", &shape, self.weight.shape())?;
        DataModelError::check_shape(
            "residual",
            &[shape[0], shape[2], shape[3], 2],
            self.residual.shape(),
        )?;
        DataModelError::check_shape("interval", &[shape[0]], self.interval.shape())
    }

    fn assess(&self, context: Option<&str>) -> QualityAssessment {
        let amplitudes = self
            .pointing
            .iter()
            .zip(self.weight.iter())
            .filter(|(_, &w)| w > 0.0)
            .map(|(p, _)| p.abs())
            .collect::<Vec<_>>();
        let reals = self
            .pointing
            .iter()
            .zip(self.weight.iter())
            .filter(|(_, &w)| w > 0.0)
            .map(|(&p, _)| p)
            .collect::<Vec<_>>();
        let mut data = QaStatistics::from_values(&amplitudes, &reals);
        data.mean = Some(mean(&amplitudes));
        data.residual = Some(max_abs(self.residual.iter()));
        QualityAssessment::new("qa_pointingtable", data, context)
    }
}
