//! Error types shared across the crate.
//!
//! Configuration errors surface before a single step executes (spec
//! section 7); invariant violations are raised mid-step and are always
//! fatal, never recovered from.

use thiserror::Error;

use crate::{ReactionId, SiteId, SpeciesId};

/// Failures detected while validating a configuration, before any
/// simulation step runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("lattice constant must be positive, got {0}")]
    NonPositiveLatticeConstant(f64),

    #[error("box on axis {axis} has non-positive extent (lo={lo}, hi={hi})")]
    EmptyBox { axis: &'static str, lo: i64, hi: i64 },

    #[error("unknown species id {0} referenced by initial state or catalog")]
    UnknownSpecies(SpeciesId),

    #[error("chunk_size must be positive")]
    NonPositiveChunkSize,
}

/// A corrupted propensity set or state mutation detected mid-step.
///
/// These always indicate an engine bug, not a recoverable runtime
/// condition (spec section 7); the driver logs and aborts on these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("population of species {species} would go negative at step {step}")]
    PopulationUnderflow { species: SpeciesId, step: u64 },

    #[error("adsorption reaction {reaction_id} attempted on occupied site {site} at step {step}")]
    OccupiedSiteAdsorption {
        site: SiteId,
        reaction_id: ReactionId,
        step: u64,
    },

    #[error("reaction {reaction_id} expected species {expected} at site {site}, found {found} at step {step}")]
    SpeciesMismatch {
        site: SiteId,
        expected: SpeciesId,
        found: SpeciesId,
        reaction_id: ReactionId,
        step: u64,
    },

    #[error("neighbor {neighbor} of site {site} is out of range")]
    NeighborOutOfRange { site: SiteId, neighbor: SiteId },
}
