// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with reading and writing HDF5 files.

use thiserror::Error;

use crate::DataModelError;

#[derive(Error, Debug)]
pub enum Hdf5ReadError {
    #[error("HDF5 group '{group}' holds a '{found}', not a '{expected}'")]
    NotThisType {
        group: String,
        expected: &'static str,
        found: String,
    },

    #[error("HDF5 group '{group}' holds an unknown data model '{found}'")]
    UnknownDataModel { group: String, found: String },

    #[error("HDF5 group '{group}' has no attribute '{attr}'")]
    MissingAttribute { group: String, attr: String },

    #[error("HDF5 group '{group}' has no member '{member}'")]
    MissingMember { group: String, member: String },

    #[error("Attribute '{attr}' of HDF5 group '{group}' has an unusable value: {value}")]
    BadAttribute {
        group: String,
        attr: &'static str,
        value: String,
    },

    #[error("'{value}' is not a recognised {what} frame")]
    BadFrame { what: &'static str, value: String },

    #[error("The file claims to hold {0} data models; at least one is needed")]
    NoDataModels(i64),

    #[error("Couldn't decode metadata json: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    DataModel(#[from] DataModelError),

    #[error(transparent)]
    Hdf5(#[from] hdf5::Error),
}

#[derive(Error, Debug)]
pub enum Hdf5WriteError {
    #[error("No data models were given to write")]
    NoDataModels,

    #[error("Couldn't store '{value}' as an HDF5 string: {err}")]
    BadString { value: String, err: String },

    #[error("Couldn't encode metadata json: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Hdf5(#[from] hdf5::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
