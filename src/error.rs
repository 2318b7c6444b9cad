// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error types for constructing and manipulating data models, and an error
//! type for all crate-related errors.

use thiserror::Error;

/// Errors raised when building or manipulating a data model. None of these are
/// recovered internally; they are propagated to the caller at the point of
/// detection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataModelError {
    #[error("Expected {what} to have shape {expected:?}, but it has shape {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("A {0} is required, but none was supplied")]
    MissingRequired(&'static str),

    #[error("The {what} selection removed every sample ({filtered} of {total} were filtered)")]
    EmptySelection {
        what: &'static str,
        filtered: usize,
        total: usize,
    },

    #[error("Replacement {what} has shape {actual:?}, which is incompatible with the container's shape {expected:?}")]
    IncompatibleUpdate {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Polarisation labels {labels:?} do not match the '{frame}' frame")]
    PolarisationMismatch { frame: String, labels: Vec<String> },

    #[error("Index {index} is out of range for the {axis} axis (length {len})")]
    IndexOutOfRange {
        axis: &'static str,
        index: usize,
        len: usize,
    },

    #[error("The baselines are not in canonical order for antennas {antennas:?}")]
    NonCanonicalBaselines { antennas: Vec<usize> },
}

impl DataModelError {
    /// Make a [`DataModelError::ShapeMismatch`] out of two shapes.
    pub(crate) fn shape(what: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        DataModelError::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Return a [`DataModelError::ShapeMismatch`] error if the shapes differ.
    pub(crate) fn check_shape(
        what: &'static str,
        expected: &[usize],
        actual: &[usize],
    ) -> Result<(), DataModelError> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::shape(what, expected, actual))
        }
    }
}

/// Everything that can go wrong in this crate.
#[derive(Error, Debug)]
pub enum SdpError {
    #[error(transparent)]
    DataModel(#[from] DataModelError),

    #[error(transparent)]
    Hdf5Read(#[from] crate::io::Hdf5ReadError),

    #[error(transparent)]
    Hdf5Write(#[from] crate::io::Hdf5WriteError),

    #[error(transparent)]
    CalTable(#[from] crate::calibration::CalTableError),

    #[error(transparent)]
    Params(#[from] crate::params::ParamsFileError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
