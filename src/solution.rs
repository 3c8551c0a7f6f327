//! The homogeneous-phase (solution) populations.

use crate::error::InvariantViolation;
use crate::SpeciesId;

/// Per-species solution populations. Mutated exclusively by
/// `LatticeReactionNetwork::update_state` (spec section 3).
#[derive(Debug, Clone, Default)]
pub struct SolutionState {
    populations: Vec<i64>,
}

impl SolutionState {
    pub fn new(populations: Vec<i64>) -> SolutionState {
        SolutionState { populations }
    }

    pub fn population(&self, species: SpeciesId) -> i64 {
        self.populations[species as usize]
    }

    pub fn num_species(&self) -> usize {
        self.populations.len()
    }

    /// Applies `delta` to `species`'s population, raising (I5) if the
    /// result would be negative.
    pub fn apply_delta(
        &mut self,
        species: SpeciesId,
        delta: i64,
        step: u64,
    ) -> Result<(), InvariantViolation> {
        let slot = &mut self.populations[species as usize];
        let next = *slot + delta;
        if next < 0 {
            return Err(InvariantViolation::PopulationUnderflow { species, step });
        }
        *slot = next;
        Ok(())
    }
}
