// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use itertools::Itertools;

use crate::DataModelError;

/// The baseline axis: an ordered list of antenna pairs (a1, a2) with a1 <= a2.
/// Autocorrelations are included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Baselines(Vec<(usize, usize)>);

impl Baselines {
    /// All baselines of an array with `nants` antennas, in the canonical order
    /// (0,0), (0,1), ..., (0,n-1), (1,1), ..., (n-1,n-1).
    pub fn generate(nants: usize) -> Baselines {
        let ids = (0..nants).collect::<Vec<_>>();
        Baselines::from_antenna_ids(&ids)
    }

    /// The baselines between the given antennas, in the same order as
    /// [`Baselines::generate`] would produce for them.
    pub fn from_antenna_ids(ids: &[usize]) -> Baselines {
        let mut pairs = Vec::with_capacity(ids.len() * (ids.len() + 1) / 2);
        for &a1 in ids {
            for &a2 in ids {
                if a2 >= a1 {
                    pairs.push((a1, a2));
                }
            }
        }
        Baselines(pairs)
    }

    /// Pair up two antenna index lists. Each pair must have a1 <= a2.
    pub fn from_antenna_lists(
        antenna1: &[usize],
        antenna2: &[usize],
    ) -> Result<Baselines, DataModelError> {
        DataModelError::check_shape("antenna2", &[antenna1.len()], &[antenna2.len()])?;
        let pairs = antenna1
            .iter()
            .copied()
            .zip(antenna2.iter().copied())
            .collect::<Vec<_>>();
        if pairs.iter().any(|(a1, a2)| a1 > a2) {
            return Err(DataModelError::NonCanonicalBaselines {
                antennas: antenna1.iter().chain(antenna2).copied().unique().collect(),
            });
        }
        Ok(Baselines(pairs))
    }

    /// The number of baselines (including autos) formed by `nants` antennas.
    pub fn num_baselines(nants: usize) -> usize {
        nants * (nants + 1) / 2
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(usize, usize)> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[(usize, usize)] {
        &self.0
    }

    pub fn antenna1(&self) -> Vec<usize> {
        self.0.iter().map(|&(a1, _)| a1).collect()
    }

    pub fn antenna2(&self) -> Vec<usize> {
        self.0.iter().map(|&(_, a2)| a2).collect()
    }

    /// The sorted, unique antenna indices participating in these baselines.
    pub fn antenna_ids(&self) -> Vec<usize> {
        self.0
            .iter()
            .flat_map(|&(a1, a2)| [a1, a2])
            .sorted()
            .dedup()
            .collect()
    }

    /// The index of a pair on the baseline axis.
    pub fn position(&self, pair: (usize, usize)) -> Option<usize> {
        self.0.iter().position(|&p| p == pair)
    }

    /// Check that these baselines are exactly those that
    /// [`Baselines::from_antenna_ids`] makes from the participating antennas.
    pub fn check_canonical(&self) -> Result<(), DataModelError> {
        let ids = self.antenna_ids();
        if Baselines::from_antenna_ids(&ids) == *self {
            Ok(())
        } else {
            Err(DataModelError::NonCanonicalBaselines { antennas: ids })
        }
    }
}

impl From<Vec<(usize, usize)>> for Baselines {
    fn from(pairs: Vec<(usize, usize)>) -> Self {
        Baselines(pairs)
    }
}
