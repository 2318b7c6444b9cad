// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Small wrappers over `hdf5` for attributes and datasets.

use std::str::FromStr;

use hdf5::{types::VarLenUnicode, Group, H5Type};
use marlu::c64;
use ndarray::prelude::*;

use super::{Hdf5ReadError, Hdf5WriteError};
use crate::{coords::SkyCoord, Precision};

/// A complex number laid out the way h5py stores them.
#[derive(H5Type, Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub(super) struct H5Complex {
    r: f64,
    i: f64,
}

impl From<c64> for H5Complex {
    fn from(c: c64) -> Self {
        H5Complex { r: c.re, i: c.im }
    }
}

impl From<H5Complex> for c64 {
    fn from(c: H5Complex) -> Self {
        c64::new(c.r, c.i)
    }
}

fn to_var_len_unicode(value: &str) -> Result<VarLenUnicode, Hdf5WriteError> {
    VarLenUnicode::from_str(value).map_err(|e| Hdf5WriteError::BadString {
        value: value.to_string(),
        err: e.to_string(),
    })
}

pub(super) fn write_str_attr(group: &Group, name: &str, value: &str) -> Result<(), Hdf5WriteError> {
    let value = to_var_len_unicode(value)?;
    group
        .new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

pub(super) fn write_f64s_attr(
    group: &Group,
    name: &str,
    values: &[f64],
) -> Result<(), Hdf5WriteError> {
    group
        .new_attr::<f64>()
        .shape(values.len())
        .create(name)?
        .write(ArrayView1::from(values))?;
    Ok(())
}

pub(super) fn has_attr(group: &Group, name: &str) -> Result<bool, Hdf5ReadError> {
    Ok(group.attr_names()?.iter().any(|n| n == name))
}

fn require_attr(group: &Group, name: &str) -> Result<hdf5::Attribute, Hdf5ReadError> {
    if !has_attr(group, name)? {
        return Err(Hdf5ReadError::MissingAttribute {
            group: group.name(),
            attr: name.to_string(),
        });
    }
    Ok(group.attr(name)?)
}

pub(super) fn read_str_attr(group: &Group, name: &str) -> Result<String, Hdf5ReadError> {
    let value: VarLenUnicode = require_attr(group, name)?.read_scalar()?;
    Ok(value.to_string())
}

pub(super) fn read_f64s_attr(group: &Group, name: &str) -> Result<Vec<f64>, Hdf5ReadError> {
    Ok(require_attr(group, name)?.read_raw()?)
}

pub(super) fn read_i64_attr(group: &Group, name: &str) -> Result<i64, Hdf5ReadError> {
    Ok(require_attr(group, name)?.read_scalar()?)
}

/// Read a frame-like attribute that parses with [`FromStr`], e.g. a
/// [`crate::PolarisationFrame`].
pub(super) fn read_frame_attr<T: FromStr>(
    group: &Group,
    name: &'static str,
) -> Result<T, Hdf5ReadError> {
    let value = read_str_attr(group, name)?;
    T::from_str(&value).map_err(|_| Hdf5ReadError::BadFrame { what: name, value })
}

/// Check the `data_model` attribute of a group.
pub(super) fn check_data_model(group: &Group, expected: &'static str) -> Result<(), Hdf5ReadError> {
    let found = read_str_attr(group, "data_model")?;
    if found == expected {
        Ok(())
    } else {
        Err(Hdf5ReadError::NotThisType {
            group: group.name(),
            expected,
            found,
        })
    }
}

/// Write a sky coordinate as "<prefix>_coords" and "<prefix>_frame"
/// attributes.
pub(super) fn write_sky_coord(
    group: &Group,
    prefix: &str,
    coord: &SkyCoord,
) -> Result<(), Hdf5WriteError> {
    write_str_attr(group, &format!("{prefix}_coords"), &coord.to_coord_string())?;
    write_str_attr(group, &format!("{prefix}_frame"), &coord.frame)
}

pub(super) fn read_sky_coord(
    group: &Group,
    coords_attr: &'static str,
    frame_attr: &'static str,
) -> Result<SkyCoord, Hdf5ReadError> {
    let coords = read_str_attr(group, coords_attr)?;
    let frame = read_str_attr(group, frame_attr)?;
    SkyCoord::from_coord_string(&coords, frame).ok_or_else(|| Hdf5ReadError::BadAttribute {
        group: group.name(),
        attr: coords_attr,
        value: coords,
    })
}

pub(super) fn write_dataset<T: H5Type, D: Dimension>(
    group: &Group,
    name: &str,
    data: ArrayView<T, D>,
) -> Result<(), Hdf5WriteError> {
    group.new_dataset_builder().with_data(data).create(name)?;
    Ok(())
}

pub(super) fn read_dataset<T: H5Type, D: Dimension>(
    group: &Group,
    name: &str,
) -> Result<Array<T, D>, Hdf5ReadError> {
    Ok(group.dataset(name)?.read::<T, D>()?)
}

pub(super) fn write_complex_dataset<D: Dimension>(
    group: &Group,
    name: &str,
    data: &Array<c64, D>,
) -> Result<(), Hdf5WriteError> {
    write_dataset(group, name, data.mapv(H5Complex::from).view())
}

pub(super) fn read_complex_dataset<D: Dimension>(
    group: &Group,
    name: &str,
) -> Result<Array<c64, D>, Hdf5ReadError> {
    Ok(read_dataset::<H5Complex, D>(group, name)?.mapv(c64::from))
}

/// Write floats with the given storage precision.
pub(super) fn write_float_dataset<D: Dimension>(
    group: &Group,
    name: &str,
    data: &Array<f64, D>,
    precision: Precision,
) -> Result<(), Hdf5WriteError> {
    match precision {
        Precision::F32 => write_dataset(group, name, data.mapv(|v| v as f32).view()),
        Precision::F64 => write_dataset(group, name, data.view()),
    }
}

/// The storage precision of a float dataset.
pub(super) fn dataset_precision(
    group: &Group,
    name: &'static str,
) -> Result<Precision, Hdf5ReadError> {
    let size = group.dataset(name)?.dtype()?.size();
    Precision::from_size(size).ok_or_else(|| Hdf5ReadError::BadAttribute {
        group: group.name(),
        attr: name,
        value: format!("{size}-byte floats"),
    })
}

pub(super) fn write_strings_dataset(
    group: &Group,
    name: &str,
    values: &[String],
) -> Result<(), Hdf5WriteError> {
    let values = values
        .iter()
        .map(|v| to_var_len_unicode(v))
        .collect::<Result<Vec<_>, _>>()?;
    write_dataset(group, name, ArrayView1::from(&values[..]))
}

pub(super) fn read_strings_dataset(
    group: &Group,
    name: &str,
) -> Result<Vec<String>, Hdf5ReadError> {
    let values: Vec<VarLenUnicode> = group.dataset(name)?.read_raw()?;
    Ok(values.into_iter().map(|v| v.to_string()).collect())
}

/// Antenna indices are stored as 64-bit integers.
pub(super) fn write_indices_dataset(
    group: &Group,
    name: &str,
    values: &[usize],
) -> Result<(), Hdf5WriteError> {
    let values = values.iter().map(|&v| v as i64).collect::<Vec<_>>();
    write_dataset(group, name, ArrayView1::from(&values[..]))
}

pub(super) fn read_indices_dataset(
    group: &Group,
    name: &'static str,
) -> Result<Vec<usize>, Hdf5ReadError> {
    let values: Vec<i64> = group.dataset(name)?.read_raw()?;
    values
        .into_iter()
        .map(|v| {
            usize::try_from(v).map_err(|_| Hdf5ReadError::BadAttribute {
                group: group.name(),
                attr: name,
                value: v.to_string(),
            })
        })
        .collect()
}

/// Get a member group, with a useful error if it doesn't exist.
pub(super) fn require_group(group: &Group, name: &str) -> Result<Group, Hdf5ReadError> {
    if !group.member_names()?.iter().any(|n| n == name) {
        return Err(Hdf5ReadError::MissingMember {
            group: group.name(),
            member: name.to_string(),
        });
    }
    Ok(group.group(name)?)
}
