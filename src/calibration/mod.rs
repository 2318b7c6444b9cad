// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calibration data models: antenna gains and pointings.

pub mod cal_table;
mod gain_table;
mod pointing_table;

pub use cal_table::{import_gaintable_from_cal_table, CalTableError, CalTableSource, CalTables};
pub use gain_table::{GainTable, GainTableFields, DEFAULT_JONES_TYPE};
pub use pointing_table::{PointingTable, PointingTableFields, DEFAULT_POINTING_FRAME};
