// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use hifitime::Epoch;
use ndarray::prelude::*;

use super::{check_baselines, Visibility};
use crate::{
    coords::{datetimes_from_mjd_seconds, Baselines, PolarisationFrame},
    qa::{mean, QaStatistics, QualityAssessment},
    Configuration, DataModel, DataModelError,
};

/// The inputs to [`FlagTable::new`].
#[derive(Debug, Clone, Default)]
pub struct FlagTableFields {
    pub baselines: Baselines,

    /// (time, baseline, frequency, polarisation); 1 is flagged.
    pub flags: Array4<i32>,

    /// \[Hz\]
    pub frequency: Array1<f64>,

    /// \[Hz\]
    pub channel_bandwidth: Array1<f64>,

    pub configuration: Option<Arc<Configuration>>,

    /// UTC MJD \[seconds\].
    pub time: Array1<f64>,

    /// \[seconds\]; ones if absent.
    pub integration_time: Option<Array1<f64>>,

    pub polarisation_frame: PolarisationFrame,
}

/// Flags with the same axes as a [`Visibility`], stored independently of it.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagTable {
    time: Array1<f64>,
    datetime: Vec<Epoch>,
    baselines: Baselines,
    frequency: Array1<f64>,
    polarisation_frame: PolarisationFrame,
    flags: Array4<i32>,
    integration_time: Array1<f64>,
    channel_bandwidth: Array1<f64>,
    configuration: Arc<Configuration>,
}

impl FlagTable {
    pub fn new(fields: FlagTableFields) -> Result<FlagTable, DataModelError> {
        let FlagTableFields {
            baselines,
            flags,
            frequency,
            channel_bandwidth,
            configuration,
            time,
            integration_time,
            polarisation_frame,
        } = fields;
        let configuration =
            configuration.ok_or(DataModelError::MissingRequired("configuration"))?;
        let integration_time = integration_time.unwrap_or_else(|| Array1::ones(time.len()));

        let ft = FlagTable {
            datetime: datetimes_from_mjd_seconds(&time),
            time,
            baselines,
            frequency,
            polarisation_frame,
            flags,
            integration_time,
            channel_bandwidth,
            configuration,
        };
        ft.validate()?;
        Ok(ft)
    }

    /// A flag table matching the flags of a [`Visibility`].
    pub fn from_visibility(vis: &Visibility) -> FlagTable {
        FlagTable {
            time: vis.time().clone(),
            datetime: vis.datetime().to_vec(),
            baselines: vis.baselines().clone(),
            frequency: vis.frequency().clone(),
            polarisation_frame: vis.polarisation_frame(),
            flags: vis.flags().clone(),
            integration_time: vis.integration_time().clone(),
            channel_bandwidth: vis.channel_bandwidth().clone(),
            configuration: Arc::clone(vis.configuration()),
        }
    }

    pub fn into_fields(self) -> FlagTableFields {
        FlagTableFields {
            baselines: self.baselines,
            flags: self.flags,
            frequency: self.frequency,
            channel_bandwidth: self.channel_bandwidth,
            configuration: Some(self.configuration),
            time: self.time,
            integration_time: Some(self.integration_time),
            polarisation_frame: self.polarisation_frame,
        }
    }

    pub fn time(&self) -> &Array1<f64> {
        &self.time
    }

    pub fn datetime(&self) -> &[Epoch] {
        &self.datetime
    }

    pub fn baselines(&self) -> &Baselines {
        &self.baselines
    }

    pub fn frequency(&self) -> &Array1<f64> {
        &self.frequency
    }

    pub fn polarisation_frame(&self) -> PolarisationFrame {
        self.polarisation_frame
    }

    pub fn flags(&self) -> &Array4<i32> {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> ArrayViewMut4<i32> {
        self.flags.view_mut()
    }

    pub fn integration_time(&self) -> &Array1<f64> {
        &self.integration_time
    }

    pub fn channel_bandwidth(&self) -> &Array1<f64> {
        &self.channel_bandwidth
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    pub fn nchan(&self) -> usize {
        self.frequency.len()
    }

    pub fn npol(&self) -> usize {
        self.polarisation_frame.npol()
    }
}

impl DataModel for FlagTable {
    const DATA_MODEL: &'static str = "FlagTable";

    fn validate(&self) -> Result<(), DataModelError> {
        let shape = [
            self.time.len(),
            self.baselines.len(),
            self.frequency.len(),
            self.polarisation_frame.npol(),
        ];
        DataModelError::check_shape("flags", &shape, self.flags.shape())?;
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
        let values = self
            .flags
            .iter()
            .map(|&f| f64::from(f.abs()))
            .collect::<Vec<_>>();
        let mut data = QaStatistics::from_values(&values, &values);
        data.sum = Some(values.iter().sum());
        data.mean = Some(mean(&values));
        QualityAssessment::new("qa_flagtable", data, context)
    }
}
