// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Data models for radio-interferometer data: visibilities, flags, antenna gains
and pointings, along with the telescope configuration they refer to, quality
assessments, and lossless persistence to HDF5.
 */

pub mod calibration;
pub mod configuration;
pub mod constants;
pub mod coords;
mod error;
pub mod io;
pub mod params;
pub mod qa;
pub mod visibility;

// Re-exports.
pub use calibration::{GainTable, PointingTable};
pub use configuration::Configuration;
pub use coords::{Baselines, PolarisationFrame, ReceptorFrame, SkyCoord};
pub use error::{DataModelError, SdpError};
pub use io::{
    export_to_hdf5, import_any_from_hdf5, import_from_hdf5, AnyDataModel, Hdf5DataModel, OneOrMany,
};
pub use qa::{QaStatistics, QualityAssessment};
pub use visibility::{create_visibility, FlagTable, Meta, Precision, Visibility};

// External re-exports.
pub use hifitime::{self, Epoch};
pub use marlu::{self, c64, LatLngHeight};
pub use ndarray;

use log::LevelFilter;

/// Behaviour common to every data model.
pub trait DataModel: Sized {
    /// The tag identifying this type of data model when persisted, e.g.
    /// "Visibility".
    const DATA_MODEL: &'static str;

    /// Check that the model's arrays agree with its coordinates.
    fn validate(&self) -> Result<(), DataModelError>;

    /// Summarise the model's contents.
    fn assess(&self, context: Option<&str>) -> QualityAssessment;
}

/// Activate a logger. All log messages are put onto `stdout`. `env_logger`
/// automatically only uses colours and fancy symbols if we're on a tty (e.g. a
/// terminal); piped output will be formatted sensibly. Source code lines are
/// displayed in log messages when verbosity >= 3.
pub fn setup_logging(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(LevelFilter::Info),
        1 => builder.filter_level(LevelFilter::Debug),
        2 => builder.filter_level(LevelFilter::Trace),
        _ => {
            builder.filter_level(LevelFilter::Trace);
            builder.format(|buf, record| {
                use std::io::Write;

                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    builder.try_init()
}
