// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Quality assessment: summary statistics of a data model's contents.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::DataModel;

/// A summary of a data model. `origin` names the routine that made it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub origin: String,
    pub data: QaStatistics,
    pub context: Option<String>,
}

/// Statistics of a data model's primary array. `max`, `min` and `medianabs`
/// are of amplitudes; `median` is of the real part. `rms` is the population
/// standard deviation of the amplitudes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaStatistics {
    pub max: f64,
    pub min: f64,
    pub rms: f64,
    pub median: f64,
    pub medianabs: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,

    /// The largest residual amplitude (gain and pointing tables only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residual: Option<f64>,
}

/// Assess any data model.
pub fn assess<T: DataModel>(model: &T, context: Option<&str>) -> QualityAssessment {
    model.assess(context)
}

impl QualityAssessment {
    pub(crate) fn new(origin: &str, data: QaStatistics, context: Option<&str>) -> Self {
        QualityAssessment {
            origin: origin.to_string(),
            data,
            context: context.map(|c| c.to_string()),
        }
    }
}

impl QaStatistics {
    /// Summarise some values. `amplitudes` and `reals` must be 1:1. Empty
    /// inputs give NaNs.
    pub(crate) fn from_values(amplitudes: &[f64], reals: &[f64]) -> QaStatistics {
        let (max, min) = amplitudes.iter().fold(
            (f64::NEG_INFINITY, f64::INFINITY),
            |(max, min), &a| (max.max(a), min.min(a)),
        );
        let (max, min) = if amplitudes.is_empty() {
            (f64::NAN, f64::NAN)
        } else {
            (max, min)
        };

        QaStatistics {
            max,
            min,
            rms: std_dev(amplitudes),
            median: median(reals.to_vec()),
            medianabs: median(amplitudes.to_vec()),
            sum: None,
            mean: None,
            residual: None,
        }
    }
}

impl Display for QualityAssessment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Quality assessment from {}", self.origin)?;
        if let Some(c) = &self.context {
            writeln!(f, "  context:   {c}")?;
        }
        let d = &self.data;
        writeln!(f, "  max:       {}", d.max)?;
        writeln!(f, "  min:       {}", d.min)?;
        writeln!(f, "  rms:       {}", d.rms)?;
        writeln!(f, "  median:    {}", d.median)?;
        write!(f, "  medianabs: {}", d.medianabs)?;
        if let Some(s) = d.sum {
            write!(f, "\n  sum:       {s}")?;
        }
        if let Some(m) = d.mean {
            write!(f, "\n  mean:      {m}")?;
        }
        if let Some(r) = d.residual {
            write!(f, "\n  residual:  {r}")?;
        }
        Ok(())
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    let mean = mean(values);
    if mean.is_nan() {
        return mean;
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// The median; the mean of the middle two values for even lengths.
pub(crate) fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
