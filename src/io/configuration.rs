// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The HDF5 form of a [`Configuration`]. Data models carry theirs in a
//! "configuration" sub-group.

use std::sync::Arc;

use hdf5::Group;
use log::trace;
use marlu::LatLngHeight;
use ndarray::prelude::*;

use super::{helpers::*, Hdf5ReadError, Hdf5WriteError};
use crate::Configuration;

pub(super) const CONFIGURATION_GROUP: &str = "configuration";

const DATA_MODEL: &str = "Configuration";

pub(super) fn configuration_to_hdf5(
    config: &Configuration,
    group: &Group,
) -> Result<(), Hdf5WriteError> {
    trace!("Writing configuration '{}' to {}", config.name, group.name());
    write_str_attr(group, "data_model", DATA_MODEL)?;
    write_str_attr(group, "name", &config.name)?;
    let LatLngHeight {
        longitude_rad,
        latitude_rad,
        height_metres,
    } = config.location;
    write_f64s_attr(
        group,
        "location",
        &[longitude_rad, latitude_rad, height_metres],
    )?;
    write_str_attr(group, "frame", &config.frame)?;
    write_str_attr(group, "receptor_frame", &config.receptor_frame.to_string())?;

    write_strings_dataset(group, "names", &config.names)?;
    write_dataset(group, "xyz", config.xyz.view())?;
    write_strings_dataset(group, "mount", &config.mount)?;
    write_dataset(group, "diameter", config.diameter.view())?;
    write_dataset(group, "offset", config.offset.view())?;
    write_strings_dataset(group, "stations", &config.stations)?;
    write_strings_dataset(group, "vp_type", &config.vp_type)?;
    Ok(())
}

pub(super) fn configuration_from_hdf5(group: &Group) -> Result<Configuration, Hdf5ReadError> {
    check_data_model(group, DATA_MODEL)?;
    let location = match read_f64s_attr(group, "location")?.as_slice() {
        &[longitude_rad, latitude_rad, height_metres] => LatLngHeight {
            longitude_rad,
            latitude_rad,
            height_metres,
        },
        other => {
            return Err(Hdf5ReadError::BadAttribute {
                group: group.name(),
                attr: "location",
                value: format!("{other:?}"),
            })
        }
    };

    let config = Configuration::new(
        read_str_attr(group, "name")?,
        location,
        read_strings_dataset(group, "names")?,
        read_dataset::<f64, Ix2>(group, "xyz")?,
        read_strings_dataset(group, "mount")?,
        read_str_attr(group, "frame")?,
        read_frame_attr(group, "receptor_frame")?,
        read_dataset::<f64, Ix1>(group, "diameter")?,
        read_dataset::<f64, Ix2>(group, "offset")?,
        read_strings_dataset(group, "stations")?,
        read_strings_dataset(group, "vp_type")?,
    )?;
    Ok(config)
}

/// Write a configuration into a new sub-group of `parent`.
pub(super) fn write_configuration_group(
    parent: &Group,
    config: &Configuration,
) -> Result<(), Hdf5WriteError> {
    let group = parent.create_group(CONFIGURATION_GROUP)?;
    configuration_to_hdf5(config, &group)
}

pub(super) fn read_configuration_group(
    parent: &Group,
) -> Result<Arc<Configuration>, Hdf5ReadError> {
    let group = require_group(parent, CONFIGURATION_GROUP)?;
    configuration_from_hdf5(&group).map(Arc::new)
}

/// Some data models may not have a configuration.
pub(super) fn read_optional_configuration_group(
    parent: &Group,
) -> Result<Option<Arc<Configuration>>, Hdf5ReadError> {
    if parent
        .member_names()?
        .iter()
        .any(|n| n == CONFIGURATION_GROUP)
    {
        read_configuration_group(parent).map(Some)
    } else {
        Ok(None)
    }
}
