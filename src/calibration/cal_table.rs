// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Import [`GainTable`]s from CASA calibration tables.
//!
//! A calibration table is a main (solution) table with ANTENNA, FIELD,
//! OBSERVATION and SPECTRAL_WINDOW sub-tables. Anything that can produce
//! these tables implements [`CalTableSource`]; with the "casa" feature,
//! [`CasaCalTable`] reads them with casacore.

use std::sync::Arc;

use itertools::Itertools;
use log::{debug, trace, warn};
use marlu::{c64, XyzGeocentric};
use ndarray::prelude::*;
use thiserror::Error;

use super::{GainTable, GainTableFields};
use crate::{
    configuration::DEFAULT_VP_TYPE, coords::ReceptorFrame, Configuration, DataModelError,
    SkyCoord,
};

#[derive(Error, Debug)]
pub enum CalTableError {
    #[error("The {0} table of the calibration table contains no rows!")]
    EmptyTable(&'static str),

    #[error("Calibration table {what} has an unexpected shape: expected {expected:?}, got {actual:?}")]
    BadShape {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Found a negative antenna number ({0}); all antenna numbers must be positive")]
    AntennaNumNegative(i32),

    #[error("Found a negative spectral window ID ({0}); all spectral window IDs must be positive")]
    SpectralWindowNegative(i32),

    #[error("There is more than one solution for antenna {antenna} at time {time}")]
    DuplicateSolution { time: f64, antenna: usize },

    #[error("Spectral window {id} was referenced, but only {num} spectral windows exist")]
    NoSuchSpectralWindow { id: usize, num: usize },

    #[error("No antennas in the ANTENNA table have a name")]
    NoValidAntennas,

    #[error(transparent)]
    DataModel(#[from] DataModelError),

    #[cfg(feature = "casa")]
    #[error("Error when trying to interface with calibration table: {0}")]
    Table(#[from] marlu::rubbl_casatables::TableError),

    #[cfg(feature = "casa")]
    #[error("Error from casacore: {0}")]
    Casacore(#[from] marlu::rubbl_casatables::CasacoreError),
}

/// The columns of the main table of a calibration table, one entry per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolutionTable {
    /// UTC MJD \[seconds\].
    pub time: Vec<f64>,

    /// \[seconds\]
    pub interval: Vec<f64>,

    pub antenna1: Vec<i32>,

    pub spectral_window_id: Vec<i32>,

    /// (row, channel, correlation)
    pub cparam: Array3<c64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectralWindowTable {
    /// The channel frequencies of each spectral window \[Hz\].
    pub chan_freq: Vec<Vec<f64>>,

    pub num_chan: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AntennaTable {
    pub name: Vec<String>,

    pub mount: Vec<String>,

    /// \[metres\]
    pub dish_diameter: Vec<f64>,

    /// Geocentric positions with shape (row, 3) \[metres\].
    pub position: Array2<f64>,

    /// (row, 3) \[metres\]
    pub offset: Array2<f64>,

    pub station: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldTable {
    /// The first polynomial term of each field's PHASE_DIR as (RA, Dec)
    /// \[radians\].
    pub phase_dir: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    pub telescope_name: Vec<String>,
}

/// A provider of the tables that make up a calibration table.
pub trait CalTableSource {
    fn read_solution_table(&self) -> Result<SolutionTable, CalTableError>;

    fn read_spectral_window_table(&self) -> Result<SpectralWindowTable, CalTableError>;

    fn read_antenna_table(&self) -> Result<AntennaTable, CalTableError>;

    fn read_field_table(&self) -> Result<FieldTable, CalTableError>;

    fn read_observation_table(&self) -> Result<ObservationTable, CalTableError>;
}

/// Calibration tables already in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalTables {
    pub solution: SolutionTable,
    pub spectral_window: SpectralWindowTable,
    pub antenna: AntennaTable,
    pub field: FieldTable,
    pub observation: ObservationTable,
}

impl CalTableSource for CalTables {
    fn read_solution_table(&self) -> Result<SolutionTable, CalTableError> {
        Ok(self.solution.clone())
    }

    fn read_spectral_window_table(&self) -> Result<SpectralWindowTable, CalTableError> {
        Ok(self.spectral_window.clone())
    }

    fn read_antenna_table(&self) -> Result<AntennaTable, CalTableError> {
        Ok(self.antenna.clone())
    }

    fn read_field_table(&self) -> Result<FieldTable, CalTableError> {
        Ok(self.field.clone())
    }

    fn read_observation_table(&self) -> Result<ObservationTable, CalTableError> {
        Ok(self.observation.clone())
    }
}

/// Make a [`GainTable`] from a calibration table.
///
/// Repeated solution times are collapsed, so the time axis is the sorted,
/// unique TIME values. Solution rows are placed by their time and antenna,
/// and each (time, antenna) pair must appear exactly once. INTERVAL may have
/// one value per row, in which case each time takes the interval of its
/// first row, or one value per unique time.
/// With more than one receptor, the first two correlations of CPARAM fill the
/// diagonal of each Jones matrix and the off-diagonals are zero; with one
/// receptor, the first correlation is used. Weights are one and residuals are
/// zero, as calibration tables don't provide them.
pub fn import_gaintable_from_cal_table<S: CalTableSource + ?Sized>(
    source: &S,
    jones_type: &str,
    receptor_frame: ReceptorFrame,
) -> Result<GainTable, CalTableError> {
    let solutions = source.read_solution_table()?;
    let num_rows = solutions.time.len();
    if num_rows == 0 {
        return Err(CalTableError::EmptyTable("main"));
    }

    let times = solutions
        .time
        .iter()
        .copied()
        .sorted_by(f64::total_cmp)
        .dedup()
        .collect::<Vec<_>>();
    let antennas = solutions
        .antenna1
        .iter()
        .map(|&a| usize::try_from(a).map_err(|_| CalTableError::AntennaNumNegative(a)))
        .collect::<Result<Vec<_>, _>>()?;
    let unique_antennas = antennas.iter().copied().sorted().dedup().collect::<Vec<_>>();
    let num_times = times.len();
    let num_ants = unique_antennas.len();
    debug!(
        "Calibration table has {num_rows} rows, {num_times} unique times and {num_ants} antennas"
    );
    if num_rows != num_times * num_ants {
        return Err(CalTableError::BadShape {
            what: "rows",
            expected: vec![num_times * num_ants],
            actual: vec![num_rows],
        });
    }

    let spw = source.read_spectral_window_table()?;
    let spw_id = match solutions.spectral_window_id.first() {
        Some(&id) => usize::try_from(id).map_err(|_| CalTableError::SpectralWindowNegative(id))?,
        None => 0,
    };
    let frequency = spw
        .chan_freq
        .get(spw_id)
        .ok_or(CalTableError::NoSuchSpectralWindow {
            id: spw_id,
            num: spw.chan_freq.len(),
        })?;
    let num_chans = spw.num_chan.get(spw_id).copied().unwrap_or(frequency.len());
    if frequency.len() != num_chans {
        return Err(CalTableError::BadShape {
            what: "CHAN_FREQ",
            expected: vec![num_chans],
            actual: vec![frequency.len()],
        });
    }
    let frequency = Array1::from(frequency.clone());

    let nrec = receptor_frame.nrec();
    let num_corrs_needed = nrec.min(2);
    let (cparam_rows, cparam_chans, cparam_corrs) = solutions.cparam.dim();
    if cparam_rows != num_rows || cparam_chans != num_chans || cparam_corrs < num_corrs_needed {
        return Err(CalTableError::BadShape {
            what: "CPARAM",
            expected: vec![num_rows, num_chans, num_corrs_needed],
            actual: vec![cparam_rows, cparam_chans, cparam_corrs],
        });
    }

    // Intervals are either one per row or one per time.
    let intervals_per_row = match solutions.interval.len() {
        n if n == num_rows => true,
        n if n == num_times => false,
        n => {
            return Err(CalTableError::BadShape {
                what: "INTERVAL",
                expected: vec![num_rows],
                actual: vec![n],
            })
        }
    };
    let mut interval = if intervals_per_row {
        Array1::zeros(num_times)
    } else {
        Array1::from(solutions.interval.clone())
    };

    let mut gain = Array5::from_elem(
        (num_times, num_ants, num_chans, nrec, nrec),
        c64::new(1.0, 0.0),
    );
    // There are as many rows as slots, so without duplicates every slot gets
    // filled.
    let mut filled = Array2::from_elem((num_times, num_ants), false);
    for (i_row, (cparam, (&time, &ant))) in solutions
        .cparam
        .outer_iter()
        .zip(solutions.time.iter().zip(antennas.iter()))
        .enumerate()
    {
        // Both searches succeed; the axes were made from these values.
        let i_time = times
            .binary_search_by(|t| t.total_cmp(&time))
            .unwrap_or_default();
        let i_ant = unique_antennas.binary_search(&ant).unwrap_or_default();
        trace!("Row {i_row} is time {i_time}, antenna {i_ant}");
        if filled[(i_time, i_ant)] {
            return Err(CalTableError::DuplicateSolution { time, antenna: ant });
        }
        if intervals_per_row {
            // The antennas of a time share its interval; the first row wins.
            if !filled.row(i_time).iter().any(|&f| f) {
                interval[i_time] = solutions.interval[i_row];
            } else if interval[i_time] != solutions.interval[i_row] {
                warn!(
                    "Row {i_row} has interval {} but time {i_time} already has {}",
                    solutions.interval[i_row], interval[i_time]
                );
            }
        }
        filled[(i_time, i_ant)] = true;

        let mut jones = gain.slice_mut(s![i_time, i_ant, .., .., ..]);
        if nrec > 1 {
            jones.fill(c64::new(0.0, 0.0));
            jones.slice_mut(s![.., 0, 0]).assign(&cparam.slice(s![.., 0]));
            jones.slice_mut(s![.., 1, 1]).assign(&cparam.slice(s![.., 1]));
        } else {
            jones.slice_mut(s![.., 0, 0]).assign(&cparam.slice(s![.., 0]));
        }
    }

    let observation = source.read_observation_table()?;
    let telescope_name = observation
        .telescope_name
        .first()
        .ok_or(CalTableError::EmptyTable("OBSERVATION"))?;
    let configuration = configuration_from_antenna_table(
        &source.read_antenna_table()?,
        telescope_name,
        receptor_frame,
    )?;

    let field = source.read_field_table()?;
    let [ra, dec] = *field
        .phase_dir
        .first()
        .ok_or(CalTableError::EmptyTable("FIELD"))?;
    let phase_centre = SkyCoord::from_radians(ra, dec);

    let gt = GainTable::new(GainTableFields {
        gain,
        time: Array1::from(times),
        interval: Some(interval),
        weight: None,
        residual: None,
        frequency,
        receptor_frames: (receptor_frame, receptor_frame),
        phase_centre: Some(phase_centre),
        configuration: Some(Arc::new(configuration)),
        jones_type: jones_type.to_string(),
    })?;
    Ok(gt)
}

/// Antennas without names are unused; they are left out of the
/// configuration. The array location is the first antenna's position.
fn configuration_from_antenna_table(
    antennas: &AntennaTable,
    telescope_name: &str,
    receptor_frame: ReceptorFrame,
) -> Result<Configuration, CalTableError> {
    let num_rows = antennas.name.len();
    for (what, len) in [
        ("MOUNT", antennas.mount.len()),
        ("DISH_DIAMETER", antennas.dish_diameter.len()),
        ("POSITION", antennas.position.len_of(Axis(0))),
        ("OFFSET", antennas.offset.len_of(Axis(0))),
        ("STATION", antennas.station.len()),
    ] {
        if len != num_rows {
            return Err(CalTableError::BadShape {
                what,
                expected: vec![num_rows],
                actual: vec![len],
            });
        }
    }

    let valid = antennas
        .name
        .iter()
        .positions(|n| !n.is_empty())
        .collect::<Vec<_>>();
    if valid.is_empty() {
        return Err(CalTableError::NoValidAntennas);
    }
    if valid.len() < num_rows {
        warn!(
            "Ignoring {} unnamed antennas in the ANTENNA table",
            num_rows - valid.len()
        );
    }

    let xyz = antennas.position.select(Axis(0), &valid);
    let location = XyzGeocentric {
        x: xyz[[0, 0]],
        y: xyz[[0, 1]],
        z: xyz[[0, 2]],
    }
    .to_earth_wgs84();
    let pick = |column: &[String]| valid.iter().map(|&i| column[i].clone()).collect::<Vec<_>>();

    let config = Configuration::new(
        telescope_name.to_string(),
        location,
        pick(&antennas.name),
        xyz,
        pick(&antennas.mount),
        "ITRF".to_string(),
        receptor_frame,
        valid.iter().map(|&i| antennas.dish_diameter[i]).collect(),
        antennas.offset.select(Axis(0), &valid),
        pick(&antennas.station),
        vec![DEFAULT_VP_TYPE.to_string(); valid.len()],
    )?;
    Ok(config)
}

#[cfg(feature = "casa")]
pub use casa::CasaCalTable;

#[cfg(feature = "casa")]
mod casa {
    use std::path::{Path, PathBuf};

    use marlu::{
        c32,
        rubbl_casatables::{Table, TableOpenMode},
    };

    use super::*;

    /// A calibration table on disk, read with casacore.
    #[derive(Debug, Clone)]
    pub struct CasaCalTable {
        path: PathBuf,
    }

    impl CasaCalTable {
        pub fn new<P: AsRef<Path>>(path: P) -> CasaCalTable {
            CasaCalTable {
                path: path.as_ref().to_path_buf(),
            }
        }

        /// Open a table read only. If `table` is `None`, then open the main
        /// table.
        fn read_table(&self, table: Option<&str>) -> Result<Table, CalTableError> {
            let t = Table::open(
                format!("{}/{}", self.path.display(), table.unwrap_or("")),
                TableOpenMode::Read,
            )?;
            Ok(t)
        }
    }

    impl CalTableSource for CasaCalTable {
        fn read_solution_table(&self) -> Result<SolutionTable, CalTableError> {
            let mut table = self.read_table(None)?;
            let time: Vec<f64> = table.get_col_as_vec("TIME")?;
            let interval: Vec<f64> = table.get_col_as_vec("INTERVAL")?;
            let antenna1: Vec<i32> = table.get_col_as_vec("ANTENNA1")?;
            let spectral_window_id: Vec<i32> = table.get_col_as_vec("SPECTRAL_WINDOW_ID")?;

            let mut rows: Vec<Array2<c64>> = Vec::with_capacity(time.len());
            table.for_each_row(|row| {
                let cparam: Array2<c32> = row.get_cell("CPARAM")?;
                rows.push(cparam.mapv(|c| c64::new(c.re.into(), c.im.into())));
                Ok(())
            })?;
            let (num_chans, num_corrs) = rows.first().map(|r| r.dim()).unwrap_or((0, 0));
            let mut cparam = Array3::zeros((rows.len(), num_chans, num_corrs));
            for (mut out, row) in cparam.outer_iter_mut().zip(rows.iter()) {
                if row.dim() != (num_chans, num_corrs) {
                    return Err(CalTableError::BadShape {
                        what: "CPARAM",
                        expected: vec![num_chans, num_corrs],
                        actual: row.shape().to_vec(),
                    });
                }
                out.assign(row);
            }

            Ok(SolutionTable {
                time,
                interval,
                antenna1,
                spectral_window_id,
                cparam,
            })
        }

        fn read_spectral_window_table(&self) -> Result<SpectralWindowTable, CalTableError> {
            let mut table = self.read_table(Some("SPECTRAL_WINDOW"))?;
            let num_chan: Vec<i32> = table.get_col_as_vec("NUM_CHAN")?;
            let mut chan_freq = Vec::with_capacity(num_chan.len());
            for i_row in 0..table.n_rows() {
                let freqs: Vec<f64> = table.get_cell_as_vec("CHAN_FREQ", i_row)?;
                chan_freq.push(freqs);
            }
            Ok(SpectralWindowTable {
                chan_freq,
                num_chan: num_chan.into_iter().map(|n| n.max(0) as usize).collect(),
            })
        }

        fn read_antenna_table(&self) -> Result<AntennaTable, CalTableError> {
            let mut table = self.read_table(Some("ANTENNA"))?;
            let name: Vec<String> = table.get_col_as_vec("NAME")?;
            let mount: Vec<String> = table.get_col_as_vec("MOUNT")?;
            let dish_diameter: Vec<f64> = table.get_col_as_vec("DISH_DIAMETER")?;
            let station: Vec<String> = table.get_col_as_vec("STATION")?;

            let mut position = Array2::zeros((name.len(), 3));
            let mut offset = Array2::zeros((name.len(), 3));
            let mut i_row = 0;
            table.for_each_row(|row| {
                let pos: Vec<f64> = row.get_cell("POSITION")?;
                let off: Vec<f64> = row.get_cell("OFFSET")?;
                if let (Some(mut p), Some(mut o)) = (
                    position.outer_iter_mut().nth(i_row),
                    offset.outer_iter_mut().nth(i_row),
                ) {
                    p.iter_mut().zip(pos).for_each(|(p, v)| *p = v);
                    o.iter_mut().zip(off).for_each(|(o, v)| *o = v);
                }
                i_row += 1;
                Ok(())
            })?;

            Ok(AntennaTable {
                name,
                mount,
                dish_diameter,
                position,
                offset,
                station,
            })
        }

        fn read_field_table(&self) -> Result<FieldTable, CalTableError> {
            let mut table = self.read_table(Some("FIELD"))?;
            let mut phase_dir = Vec::with_capacity(table.n_rows() as usize);
            for i_row in 0..table.n_rows() {
                let dir: Vec<f64> = table.get_cell_as_vec("PHASE_DIR", i_row)?;
                if dir.len() < 2 {
                    return Err(CalTableError::BadShape {
                        what: "PHASE_DIR",
                        expected: vec![2],
                        actual: vec![dir.len()],
                    });
                }
                phase_dir.push([dir[0], dir[1]]);
            }
            Ok(FieldTable { phase_dir })
        }

        fn read_observation_table(&self) -> Result<ObservationTable, CalTableError> {
            let mut table = self.read_table(Some("OBSERVATION"))?;
            let telescope_name: Vec<String> = table.get_col_as_vec("TELESCOPE_NAME")?;
            Ok(ObservationTable { telescope_name })
        }
    }
}
