// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The HDF5 forms of [`GainTable`] and [`PointingTable`].

use hdf5::Group;
use ndarray::prelude::*;

use super::{configuration::*, helpers::*, Hdf5DataModel, Hdf5ReadError, Hdf5WriteError};
use crate::{
    calibration::{GainTableFields, PointingTableFields, DEFAULT_JONES_TYPE},
    DataModel, GainTable, PointingTable,
};

impl Hdf5DataModel for GainTable {
    fn to_hdf5_group(&self, group: &Group) -> Result<(), Hdf5WriteError> {
        let (frame1, frame2) = self.receptor_frames();
        write_str_attr(group, "data_model", Self::DATA_MODEL)?;
        write_str_attr(group, "receptor_frame1", &frame1.to_string())?;
        write_str_attr(group, "receptor_frame2", &frame2.to_string())?;
        write_sky_coord(group, "phasecentre", self.phase_centre())?;
        write_str_attr(group, "jones_type", self.jones_type())?;

        write_dataset(group, "data_time", self.time().view())?;
        write_complex_dataset(group, "data_gain", self.gain())?;
        write_dataset(group, "data_weight", self.weight().view())?;
        write_dataset(group, "data_residual", self.residual().view())?;
        write_dataset(group, "data_interval", self.interval().view())?;
        write_dataset(group, "data_frequency", self.frequency().view())?;
        if let Some(config) = self.configuration() {
            write_configuration_group(group, config)?;
        }
        Ok(())
    }

    fn from_hdf5_group(group: &Group) -> Result<Self, Hdf5ReadError> {
        check_data_model(group, Self::DATA_MODEL)?;
        // Older files don't record the Jones type.
        let jones_type = if has_attr(group, "jones_type")? {
            read_str_attr(group, "jones_type")?
        } else {
            DEFAULT_JONES_TYPE.to_string()
        };

        let gt = GainTable::new(GainTableFields {
            gain: read_complex_dataset::<Ix5>(group, "data_gain")?,
            time: read_dataset::<f64, Ix1>(group, "data_time")?,
            interval: Some(read_dataset::<f64, Ix1>(group, "data_interval")?),
            weight: Some(read_dataset::<f64, Ix5>(group, "data_weight")?),
            residual: Some(read_dataset::<f64, Ix4>(group, "data_residual")?),
            frequency: read_dataset::<f64, Ix1>(group, "data_frequency")?,
            receptor_frames: (
                read_frame_attr(group, "receptor_frame1")?,
                read_frame_attr(group, "receptor_frame2")?,
            ),
            phase_centre: Some(read_sky_coord(
                group,
                "phasecentre_coords",
                "phasecentre_frame",
            )?),
            configuration: read_optional_configuration_group(group)?,
            jones_type,
        })?;
        Ok(gt)
    }
}

impl Hdf5DataModel for PointingTable {
    fn to_hdf5_group(&self, group: &Group) -> Result<(), Hdf5WriteError> {
        write_str_attr(group, "data_model", Self::DATA_MODEL)?;
        write_str_attr(group, "receptor_frame", &self.receptor_frame().to_string())?;
        write_sky_coord(group, "pointingcentre", self.pointing_centre())?;
        write_str_attr(group, "pointing_frame", self.pointing_frame())?;

        write_dataset(group, "data_time", self.time().view())?;
        write_dataset(group, "data_nominal", self.nominal().view())?;
        write_dataset(group, "data_pointing", self.pointing().view())?;
        write_dataset(group, "data_weight", self.weight().view())?;
        write_dataset(group, "data_residual", self.residual().view())?;
        write_dataset(group, "data_interval", self.interval().view())?;
        write_dataset(group, "data_frequency", self.frequency().view())?;
        write_configuration_group(group, self.configuration())
    }

    fn from_hdf5_group(group: &Group) -> Result<Self, Hdf5ReadError> {
        check_data_model(group, Self::DATA_MODEL)?;
        let pt = PointingTable::new(PointingTableFields {
            pointing: read_dataset::<f64, Ix5>(group, "data_pointing")?,
            nominal: Some(read_dataset::<f64, Ix5>(group, "data_nominal")?),
            time: read_dataset::<f64, Ix1>(group, "data_time")?,
            interval: Some(read_dataset::<f64, Ix1>(group, "data_interval")?),
            weight: Some(read_dataset::<f64, Ix5>(group, "data_weight")?),
            residual: Some(read_dataset::<f64, Ix4>(group, "data_residual")?),
            frequency: read_dataset::<f64, Ix1>(group, "data_frequency")?,
            receptor_frame: read_frame_attr(group, "receptor_frame")?,
            pointing_centre: Some(read_sky_coord(
                group,
                "pointingcentre_coords",
                "pointingcentre_frame",
            )?),
            pointing_frame: read_str_attr(group, "pointing_frame")?,
            configuration: Some(read_configuration_group(group)?),
        })?;
        Ok(pt)
    }
}
