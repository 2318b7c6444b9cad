// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parameters for creating data models. These can be read from toml or json
//! settings files.

#[cfg(test)]
mod tests;

use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    str::FromStr,
};

use hifitime::Epoch;
use itertools::Itertools;
use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::{
    constants::DEFAULT_ELEVATION_LIMIT_DEG, coords::PolarisationFrame, visibility::Meta,
    Precision,
};

#[derive(Debug, Display, EnumIter, EnumString)]
pub(crate) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

lazy_static::lazy_static! {
    pub(crate) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");
}

#[derive(Error, Debug)]
pub enum ParamsFileError {
    #[error("Settings file '{}' doesn't have a recognised file extension! Valid extensions are: {}", file.display(), *ARG_FILE_TYPES_COMMA_SEPARATED)]
    UnrecognisedExtension { file: PathBuf },

    #[error("Couldn't decode toml structure from {}:\n{err}", file.display())]
    Toml { file: PathBuf, err: toml::de::Error },

    #[error("Couldn't decode json structure from {}:\n{err}", file.display())]
    Json {
        file: PathBuf,
        err: serde_json::Error,
    },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

/// Read a toml or json settings file, choosing the format by the file's
/// extension.
pub fn read_params_file<T: DeserializeOwned, P: AsRef<Path>>(
    file: P,
) -> Result<T, ParamsFileError> {
    fn inner<T: DeserializeOwned>(file: &Path) -> Result<T, ParamsFileError> {
        debug!("Attempting to parse settings file {}", file.display());

        let file_type = file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());
        let mut contents = String::new();
        match file_type {
            Some(ArgFileTypes::Toml) => {
                debug!("Parsing toml file...");
                File::open(file)?.read_to_string(&mut contents)?;
                toml::from_str(&contents).map_err(|err| ParamsFileError::Toml {
                    file: file.to_path_buf(),
                    err,
                })
            }
            Some(ArgFileTypes::Json) => {
                debug!("Parsing json file...");
                File::open(file)?.read_to_string(&mut contents)?;
                serde_json::from_str(&contents).map_err(|err| ParamsFileError::Json {
                    file: file.to_path_buf(),
                    err,
                })
            }
            None => Err(ParamsFileError::UnrecognisedExtension {
                file: file.to_path_buf(),
            }),
        }
    }
    inner(file.as_ref())
}

/// Parameters for [`crate::create_visibility`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateVisibilityParams {
    /// The weight given to every cross-correlation sample.
    pub weight: f64,

    /// If not given, the correlation of the configuration's receptor frame.
    pub polarisation_frame: Option<PolarisationFrame>,

    /// Used only when a single time survives \[seconds\].
    pub integration_time: f64,

    /// Set all w terms to zero.
    pub zerow: bool,

    /// Times with the phase centre at or below this elevation are dropped.
    /// `None` keeps all times \[degrees\].
    pub elevation_limit_deg: Option<f64>,

    pub source: String,

    pub meta: Option<Meta>,

    /// The time near which the phase centre's transit defines hour angle
    /// zero, e.g. "2023-01-01T00:00:00 UTC".
    #[serde(with = "epoch_string", skip_serializing_if = "Option::is_none")]
    pub utc_time: Option<Epoch>,

    /// Are the supplied times hour angles? Otherwise they are UTC
    /// \[radians\].
    pub times_are_ha: bool,

    /// The storage precision of `weight` and `integration_time`.
    pub low_precision: Precision,
}

impl Default for CreateVisibilityParams {
    fn default() -> Self {
        CreateVisibilityParams {
            weight: 1.0,
            polarisation_frame: None,
            integration_time: 1.0,
            zerow: false,
            elevation_limit_deg: Some(DEFAULT_ELEVATION_LIMIT_DEG),
            source: "unknown".to_string(),
            meta: None,
            utc_time: None,
            times_are_ha: true,
            low_precision: Precision::F64,
        }
    }
}

impl CreateVisibilityParams {
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self, ParamsFileError> {
        read_params_file(file)
    }
}

/// (De)serialise an optional [`Epoch`] as a string.
mod epoch_string {
    use std::str::FromStr;

    use hifitime::Epoch;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        epoch: &Option<Epoch>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match epoch {
            Some(e) => serializer.serialize_str(&e.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Epoch>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| Epoch::from_str(&s).map_err(|e| D::Error::custom(format!("{e:?}"))))
            .transpose()
    }
}
