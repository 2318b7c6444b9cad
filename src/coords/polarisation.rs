// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Polarisation and receptor frames.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::DataModelError;

/// A polarisation frame. The [`Display`] and [`std::str::FromStr`] forms are
/// the names used when persisting, e.g. "linear" or "stokesIQUV".
#[derive(
    Debug,
    Display,
    EnumIter,
    EnumString,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
)]
pub enum PolarisationFrame {
    #[strum(serialize = "circular")]
    #[serde(rename = "circular")]
    Circular,

    #[strum(serialize = "circularnp")]
    #[serde(rename = "circularnp")]
    CircularNp,

    #[strum(serialize = "linear")]
    #[serde(rename = "linear")]
    Linear,

    #[strum(serialize = "linearnp")]
    #[serde(rename = "linearnp")]
    LinearNp,

    #[strum(serialize = "stokesIQUV")]
    #[serde(rename = "stokesIQUV")]
    StokesIQUV,

    #[strum(serialize = "stokesIV")]
    #[serde(rename = "stokesIV")]
    StokesIV,

    #[strum(serialize = "stokesIQ")]
    #[serde(rename = "stokesIQ")]
    StokesIQ,

    #[default]
    #[strum(serialize = "stokesI")]
    #[serde(rename = "stokesI")]
    StokesI,
}

impl PolarisationFrame {
    /// The polarisation labels of this frame, in storage order.
    pub fn names(self) -> &'static [&'static str] {
        match self {
            PolarisationFrame::Circular => &["RR", "RL", "LR", "LL"],
            PolarisationFrame::CircularNp => &["RR", "LL"],
            PolarisationFrame::Linear => &["XX", "XY", "YX", "YY"],
            PolarisationFrame::LinearNp => &["XX", "YY"],
            PolarisationFrame::StokesIQUV => &["I", "Q", "U", "V"],
            PolarisationFrame::StokesIV => &["I", "V"],
            PolarisationFrame::StokesIQ => &["I", "Q"],
            PolarisationFrame::StokesI => &["I"],
        }
    }

    /// The number of polarisations in this frame.
    pub fn npol(self) -> usize {
        self.names().len()
    }

    /// FITS/AIPS Stokes codes of this frame's polarisations.
    pub fn fits_codes(self) -> &'static [i32] {
        match self {
            PolarisationFrame::Circular => &[-1, -3, -4, -2],
            PolarisationFrame::CircularNp => &[-1, -2],
            PolarisationFrame::Linear => &[-5, -7, -8, -6],
            PolarisationFrame::LinearNp => &[-5, -6],
            PolarisationFrame::StokesIQUV => &[1, 2, 3, 4],
            PolarisationFrame::StokesIV => &[1, 4],
            PolarisationFrame::StokesIQ => &[1, 2],
            PolarisationFrame::StokesI => &[1],
        }
    }

    /// Check that some polarisation labels are exactly the labels of this
    /// frame.
    pub fn check_labels<S: AsRef<str>>(self, labels: &[S]) -> Result<(), DataModelError> {
        let names = self.names();
        if labels.len() == names.len()
            && labels.iter().zip(names).all(|(l, n)| l.as_ref() == *n)
        {
            Ok(())
        } else {
            Err(DataModelError::PolarisationMismatch {
                frame: self.to_string(),
                labels: labels.iter().map(|l| l.as_ref().to_string()).collect(),
            })
        }
    }
}

/// The receptors of the antennas in an array.
#[derive(
    Debug,
    Display,
    EnumIter,
    EnumString,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
)]
pub enum ReceptorFrame {
    #[strum(serialize = "circular")]
    #[serde(rename = "circular")]
    Circular,

    #[default]
    #[strum(serialize = "linear")]
    #[serde(rename = "linear")]
    Linear,

    #[strum(serialize = "stokesI")]
    #[serde(rename = "stokesI")]
    StokesI,
}

impl ReceptorFrame {
    /// The receptor labels of this frame.
    pub fn names(self) -> &'static [&'static str] {
        match self {
            ReceptorFrame::Circular => &["R", "L"],
            ReceptorFrame::Linear => &["X", "Y"],
            ReceptorFrame::StokesI => &["I"],
        }
    }

    /// The number of receptors.
    pub fn nrec(self) -> usize {
        self.names().len()
    }
}

/// The polarisation frame produced by correlating receptors of the given
/// frame.
pub fn correlate_polarisation(receptor_frame: ReceptorFrame) -> PolarisationFrame {
    match receptor_frame {
        ReceptorFrame::Circular => PolarisationFrame::Circular,
        ReceptorFrame::Linear => PolarisationFrame::Linear,
        ReceptorFrame::StokesI => PolarisationFrame::StokesI,
    }
}
