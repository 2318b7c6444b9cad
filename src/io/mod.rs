// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reading and writing data models as HDF5 files.
//!
//! A file holds one or more data models of a single type. The root group has
//! an integer attribute "number_data_models" (N), and the data models are in
//! groups named "<type><i>" for i in 0..N, e.g. "GainTable0". Each group has
//! a "data_model" attribute naming its type, other scalar metadata as
//! attributes, bulk arrays as "data_<field>" datasets, and (usually) the
//! telescope configuration in a "configuration" sub-group.

mod calibration;
mod configuration;
mod error;
mod helpers;
#[cfg(test)]
mod tests;
mod visibility;

pub use error::{Hdf5ReadError, Hdf5WriteError};

use std::{fmt::Display, path::Path};

use hdf5::Group;
use log::{debug, trace, warn};
use scopeguard::ScopeGuard;

use crate::{
    constants::NUMBER_DATA_MODELS_ATTR, qa::QualityAssessment, DataModel, FlagTable, GainTable,
    PointingTable, Visibility,
};
use helpers::{check_data_model, read_i64_attr, read_str_attr};

/// The data models that can be stored in HDF5 files.
const DATA_MODELS: [&str; 4] = [
    Visibility::DATA_MODEL,
    FlagTable::DATA_MODEL,
    GainTable::DATA_MODEL,
    PointingTable::DATA_MODEL,
];

/// A data model that can be written to and read from an HDF5 group.
pub trait Hdf5DataModel: DataModel {
    /// Write this data model's attributes, datasets and sub-groups into
    /// `group`.
    fn to_hdf5_group(&self, group: &Group) -> Result<(), Hdf5WriteError>;

    /// Read a data model from `group`. It is built with its validating
    /// constructor, so derived fields are recomputed.
    fn from_hdf5_group(group: &Group) -> Result<Self, Hdf5ReadError>;
}

/// What an import returns: a file with one data model gives `One`, otherwise
/// `Many`.
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn len(&self) -> usize {
        match self {
            OneOrMany::One(_) => 1,
            OneOrMany::Many(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(t) => vec![t],
            OneOrMany::Many(v) => v,
        }
    }

    /// Get the data model if there is exactly one.
    pub fn into_one(self) -> Option<T> {
        match self {
            OneOrMany::One(t) => Some(t),
            OneOrMany::Many(mut v) if v.len() == 1 => v.pop(),
            OneOrMany::Many(_) => None,
        }
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(mut v: Vec<T>) -> Self {
        if v.len() == 1 {
            if let Some(t) = v.pop() {
                return OneOrMany::One(t);
            }
        }
        OneOrMany::Many(v)
    }
}

fn group_name(data_model: &str, index: usize) -> String {
    format!("{data_model}{index}")
}

/// Write data models of the same type to a new HDF5 file, overwriting any
/// existing file. To write a single data model, use
/// [`std::slice::from_ref`].
///
/// The file is flushed before returning. If anything goes wrong, the file is
/// removed, so a file claiming N data models always has all N groups.
pub fn export_to_hdf5<T: Hdf5DataModel, P: AsRef<Path>>(
    models: &[T],
    file: P,
) -> Result<(), Hdf5WriteError> {
    let file = file.as_ref();
    if models.is_empty() {
        return Err(Hdf5WriteError::NoDataModels);
    }
    debug!(
        "Writing {} {}(s) to {}",
        models.len(),
        T::DATA_MODEL,
        file.display()
    );

    let h5 = hdf5::File::create(file)?;
    let h5 = scopeguard::guard(h5, |h5| {
        // The handle must be closed before the file can be removed.
        drop(h5);
        warn!("Removing incomplete HDF5 file {}", file.display());
        if let Err(e) = std::fs::remove_file(file) {
            warn!("Couldn't remove {}: {e}", file.display());
        }
    });
    for (i, model) in models.iter().enumerate() {
        let name = group_name(T::DATA_MODEL, i);
        trace!("Writing group {name}");
        let group = h5.create_group(&name)?;
        model.to_hdf5_group(&group)?;
    }
    // Written last; a file with this attribute has all of its groups.
    h5.new_attr::<i64>()
        .create(NUMBER_DATA_MODELS_ATTR)?
        .write_scalar(&(models.len() as i64))?;
    h5.flush()?;

    let h5 = ScopeGuard::into_inner(h5);
    drop(h5);
    Ok(())
}

fn read_number_data_models(file: &Group) -> Result<usize, Hdf5ReadError> {
    let n = read_i64_attr(file, NUMBER_DATA_MODELS_ATTR)?;
    trace!("File has {n} data models");
    if n <= 0 {
        return Err(Hdf5ReadError::NoDataModels(n));
    }
    Ok(n as usize)
}

/// Get the group of the `index`th data model, which should be a
/// `data_model`.
fn model_group(
    file: &Group,
    data_model: &'static str,
    index: usize,
) -> Result<Group, Hdf5ReadError> {
    let members = file.member_names()?;
    let name = group_name(data_model, index);
    if members.contains(&name) {
        return Ok(file.group(&name)?);
    }
    // Another data model in this slot means that this file holds something
    // else.
    for other in DATA_MODELS {
        let other_name = group_name(other, index);
        if members.contains(&other_name) {
            let group = file.group(&other_name)?;
            check_data_model(&group, data_model)?;
            return Ok(group);
        }
    }
    Err(Hdf5ReadError::MissingMember {
        group: file.name(),
        member: name,
    })
}

/// Read all of the data models from an HDF5 file. They must all be `T`s,
/// otherwise [`Hdf5ReadError::NotThisType`] is returned.
pub fn import_from_hdf5<T: Hdf5DataModel, P: AsRef<Path>>(
    file: P,
) -> Result<OneOrMany<T>, Hdf5ReadError> {
    let file = file.as_ref();
    debug!("Reading {}(s) from {}", T::DATA_MODEL, file.display());
    let h5 = hdf5::File::open(file)?;
    let n = read_number_data_models(&h5)?;
    let models = (0..n)
        .map(|i| {
            let group = model_group(&h5, T::DATA_MODEL, i)?;
            T::from_hdf5_group(&group)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(OneOrMany::from(models))
}

/// Any data model that can be stored in an HDF5 file.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyDataModel {
    Visibility(Visibility),
    FlagTable(FlagTable),
    GainTable(GainTable),
    PointingTable(PointingTable),
}

impl AnyDataModel {
    pub fn data_model(&self) -> &'static str {
        match self {
            AnyDataModel::Visibility(_) => Visibility::DATA_MODEL,
            AnyDataModel::FlagTable(_) => FlagTable::DATA_MODEL,
            AnyDataModel::GainTable(_) => GainTable::DATA_MODEL,
            AnyDataModel::PointingTable(_) => PointingTable::DATA_MODEL,
        }
    }

    pub fn assess(&self, context: Option<&str>) -> QualityAssessment {
        match self {
            AnyDataModel::Visibility(m) => m.assess(context),
            AnyDataModel::FlagTable(m) => m.assess(context),
            AnyDataModel::GainTable(m) => m.assess(context),
            AnyDataModel::PointingTable(m) => m.assess(context),
        }
    }
}

impl Display for AnyDataModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnyDataModel::Visibility(v) => write!(
                f,
                "Visibility of '{}': {} times, {} baselines, {} channels, {} polarisation, phase centre {}",
                v.source(),
                v.ntimes(),
                v.nbaselines(),
                v.nchan(),
                v.polarisation_frame(),
                v.phase_centre()
            ),
            AnyDataModel::FlagTable(ft) => write!(
                f,
                "FlagTable: {} times, {} baselines, {} channels, {} polarisation",
                ft.time().len(),
                ft.baselines().len(),
                ft.nchan(),
                ft.polarisation_frame()
            ),
            AnyDataModel::GainTable(gt) => {
                let (frame1, frame2) = gt.receptor_frames();
                write!(
                    f,
                    "GainTable ({} Jones): {} times, {} antennas, {} channels, receptors {frame1}/{frame2}, phase centre {}",
                    gt.jones_type(),
                    gt.ntimes(),
                    gt.nants(),
                    gt.nchan(),
                    gt.phase_centre()
                )
            }
            AnyDataModel::PointingTable(pt) => write!(
                f,
                "PointingTable ({}): {} times, {} antennas, {} channels, {} receptors, pointing centre {}",
                pt.pointing_frame(),
                pt.ntimes(),
                pt.nants(),
                pt.nchan(),
                pt.receptor_frame(),
                pt.pointing_centre()
            ),
        }
    }
}

/// Read all of the data models from an HDF5 file, whatever their type.
pub fn import_any_from_hdf5<P: AsRef<Path>>(
    file: P,
) -> Result<Vec<AnyDataModel>, Hdf5ReadError> {
    let file = file.as_ref();
    debug!("Reading data models from {}", file.display());
    let h5 = hdf5::File::open(file)?;
    let n = read_number_data_models(&h5)?;
    let members = h5.member_names()?;

    let mut models = Vec::with_capacity(n);
    for i in 0..n {
        let name = DATA_MODELS
            .iter()
            .map(|dm| group_name(dm, i))
            .find(|name| members.contains(name))
            .ok_or_else(|| Hdf5ReadError::MissingMember {
                group: h5.name(),
                member: format!("<data model>{i}"),
            })?;
        let group = h5.group(&name)?;
        let found = read_str_attr(&group, "data_model")?;
        let model = match found.as_str() {
            s if s == Visibility::DATA_MODEL => {
                AnyDataModel::Visibility(Visibility::from_hdf5_group(&group)?)
            }
            s if s == FlagTable::DATA_MODEL => {
                AnyDataModel::FlagTable(FlagTable::from_hdf5_group(&group)?)
            }
            s if s == GainTable::DATA_MODEL => {
                AnyDataModel::GainTable(GainTable::from_hdf5_group(&group)?)
            }
            s if s == PointingTable::DATA_MODEL => {
                AnyDataModel::PointingTable(PointingTable::from_hdf5_group(&group)?)
            }
            _ => {
                return Err(Hdf5ReadError::UnknownDataModel {
                    group: group.name(),
                    found,
                })
            }
        };
        models.push(model);
    }
    Ok(models)
}
