// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The HDF5 forms of [`Visibility`] and [`FlagTable`].

use hdf5::Group;
use ndarray::prelude::*;

use super::{configuration::*, helpers::*, Hdf5DataModel, Hdf5ReadError, Hdf5WriteError};
use crate::{
    coords::Baselines,
    visibility::{FlagTableFields, VisibilityFields},
    DataModel, FlagTable, Visibility,
};

fn read_baselines(group: &Group) -> Result<Baselines, Hdf5ReadError> {
    let antenna1 = read_indices_dataset(group, "data_antenna1")?;
    let antenna2 = read_indices_dataset(group, "data_antenna2")?;
    Ok(Baselines::from_antenna_lists(&antenna1, &antenna2)?)
}

fn write_baselines(group: &Group, baselines: &Baselines) -> Result<(), Hdf5WriteError> {
    write_indices_dataset(group, "data_antenna1", &baselines.antenna1())?;
    write_indices_dataset(group, "data_antenna2", &baselines.antenna2())
}

impl Hdf5DataModel for Visibility {
    fn to_hdf5_group(&self, group: &Group) -> Result<(), Hdf5WriteError> {
        let precision = self.low_precision();
        write_str_attr(group, "data_model", Self::DATA_MODEL)?;
        write_str_attr(
            group,
            "polarisation_frame",
            &self.polarisation_frame().to_string(),
        )?;
        write_str_attr(group, "source", self.source())?;
        write_sky_coord(group, "phasecentre", self.phase_centre())?;
        if let Some(meta) = self.meta() {
            write_str_attr(group, "meta", &serde_json::to_string(meta)?)?;
        }

        write_complex_dataset(group, "data_vis", self.vis())?;
        write_float_dataset(group, "data_weight", self.weight(), precision)?;
        write_dataset(group, "data_flags", self.flags().view())?;
        write_dataset(group, "data_uvw", self.uvw().view())?;
        write_dataset(group, "data_time", self.time().view())?;
        write_dataset(group, "data_frequency", self.frequency().view())?;
        write_dataset(
            group,
            "data_channel_bandwidth",
            self.channel_bandwidth().view(),
        )?;
        write_float_dataset(
            group,
            "data_integration_time",
            self.integration_time(),
            precision,
        )?;
        write_baselines(group, self.baselines())?;
        write_configuration_group(group, self.configuration())
    }

    fn from_hdf5_group(group: &Group) -> Result<Self, Hdf5ReadError> {
        check_data_model(group, Self::DATA_MODEL)?;
        let meta = if has_attr(group, "meta")? {
            Some(serde_json::from_str(&read_str_attr(group, "meta")?)?)
        } else {
            None
        };

        let vis = Visibility::new(VisibilityFields {
            frequency: read_dataset::<f64, Ix1>(group, "data_frequency")?,
            channel_bandwidth: read_dataset::<f64, Ix1>(group, "data_channel_bandwidth")?,
            phase_centre: Some(read_sky_coord(
                group,
                "phasecentre_coords",
                "phasecentre_frame",
            )?),
            configuration: Some(read_configuration_group(group)?),
            uvw: read_dataset::<f64, Ix3>(group, "data_uvw")?,
            time: read_dataset::<f64, Ix1>(group, "data_time")?,
            vis: read_complex_dataset::<Ix4>(group, "data_vis")?,
            weight: Some(read_dataset::<f64, Ix4>(group, "data_weight")?),
            integration_time: Some(read_dataset::<f64, Ix1>(group, "data_integration_time")?),
            flags: read_dataset::<i32, Ix4>(group, "data_flags")?,
            baselines: read_baselines(group)?,
            polarisation_frame: read_frame_attr(group, "polarisation_frame")?,
            source: read_str_attr(group, "source")?,
            meta,
            low_precision: dataset_precision(group, "data_weight")?,
        })?;
        Ok(vis)
    }
}

impl Hdf5DataModel for FlagTable {
    fn to_hdf5_group(&self, group: &Group) -> Result<(), Hdf5WriteError> {
        write_str_attr(group, "data_model", Self::DATA_MODEL)?;
        write_str_attr(
            group,
            "polarisation_frame",
            &self.polarisation_frame().to_string(),
        )?;

        write_dataset(group, "data_flags", self.flags().view())?;
        write_dataset(group, "data_time", self.time().view())?;
        write_dataset(group, "data_frequency", self.frequency().view())?;
        write_dataset(
            group,
            "data_channel_bandwidth",
            self.channel_bandwidth().view(),
        )?;
        write_dataset(
            group,
            "data_integration_time",
            self.integration_time().view(),
        )?;
        write_baselines(group, self.baselines())?;
        write_configuration_group(group, self.configuration())
    }

    fn from_hdf5_group(group: &Group) -> Result<Self, Hdf5ReadError> {
        check_data_model(group, Self::DATA_MODEL)?;
        let ft = FlagTable::new(FlagTableFields {
            baselines: read_baselines(group)?,
            flags: read_dataset::<i32, Ix4>(group, "data_flags")?,
            frequency: read_dataset::<f64, Ix1>(group, "data_frequency")?,
            channel_bandwidth: read_dataset::<f64, Ix1>(group, "data_channel_bandwidth")?,
            configuration: Some(read_configuration_group(group)?),
            time: read_dataset::<f64, Ix1>(group, "data_time")?,
            integration_time: Some(read_dataset::<f64, Ix1>(group, "data_integration_time")?),
            polarisation_frame: read_frame_attr(group, "polarisation_frame")?,
        })?;
        Ok(ft)
    }
}
