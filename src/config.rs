//! Inbound configuration (spec section 6).
//!
//! Temperature and potential are consumed by the (external) catalog
//! only; the core never reads them, but they travel with the
//! configuration because a caller constructing both the lattice and the
//! catalog from one input needs a single source of truth.

use crate::error::ConfigError;
use crate::lattice::Lattice;
use crate::solution::SolutionState;

/// `{lattice_constant, box bounds, periodicity flags, temperature,
/// potential}` plus the history chunk size and declared species count
/// (spec sections 3 and 6).
#[derive(Debug, Clone, Copy, PartialEq, derive_new::new)]
pub struct LgmcConfig {
    pub lattice_constant: f64,
    pub box_bounds: [i64; 6],
    pub periodicity: [bool; 3],
    pub temperature: f64,
    pub potential: f64,
    pub chunk_size: usize,
    /// The number of species the catalog knows about; initial lattice
    /// occupancy and solution populations are checked against this
    /// bound (spec section 7, "unknown species").
    pub num_species: usize,
}

impl LgmcConfig {
    /// Checks the parts of the configuration the core itself is
    /// responsible for validating before any step executes (spec
    /// section 7). Lattice-specific checks are re-validated by
    /// `Lattice::new`, which is the authority on that error; this catches
    /// the chunk-size check `Lattice::new` cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.lattice_constant > 0.0) {
            return Err(ConfigError::NonPositiveLatticeConstant(self.lattice_constant));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::NonPositiveChunkSize);
        }
        Ok(())
    }

    /// Checks that an initial lattice occupancy and solution population
    /// vector reference only species ids in `0..num_species` (spec
    /// section 7, "unknown species"). Called once by the caller that
    /// assembles the initial state, before any step executes.
    pub fn validate_species(&self, lattice: &Lattice, solution: &SolutionState) -> Result<(), ConfigError> {
        if solution.num_species() > self.num_species {
            return Err(ConfigError::UnknownSpecies(solution.num_species() as i64 - 1));
        }
        for site in 0..lattice.num_sites() {
            let species = lattice.occupancy(site);
            if species >= self.num_species as i64 {
                return Err(ConfigError::UnknownSpecies(species));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_chunk_size() {
        let config = LgmcConfig::new(1.0, [0, 2, 0, 2, 0, 2], [true, true, true], 300.0, 0.0, 0, 1);
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveChunkSize));
    }

    #[test]
    fn accepts_sane_configuration() {
        let config = LgmcConfig::new(1.0, [0, 2, 0, 2, 0, 2], [true, true, true], 300.0, 0.0, 256, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_lattice_occupancy_outside_declared_species_count() {
        let config = LgmcConfig::new(1.0, [0, 1, 0, 1, 0, 1], [true, true, true], 300.0, 0.0, 256, 1);
        let mut lattice = Lattice::new(1.0, [0, 1, 0, 1, 0, 1], [true, true, true]).unwrap();
        lattice.set_occupancy(0, 5);
        let solution = SolutionState::new(vec![0]);
        assert_eq!(config.validate_species(&lattice, &solution), Err(ConfigError::UnknownSpecies(5)));
    }

    #[test]
    fn accepts_occupancy_within_declared_species_count() {
        let config = LgmcConfig::new(1.0, [0, 1, 0, 1, 0, 1], [true, true, true], 300.0, 0.0, 256, 1);
        let mut lattice = Lattice::new(1.0, [0, 1, 0, 1, 0, 1], [true, true, true]).unwrap();
        lattice.set_occupancy(0, 0);
        let solution = SolutionState::new(vec![10]);
        assert!(config.validate_species(&lattice, &solution).is_ok());
    }
}
