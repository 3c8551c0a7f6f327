//! Core state, propensity, and sampling loop for a lattice Gillespie
//! Monte Carlo simulator: a homogeneous solution phase coupled to a
//! discrete lattice surface, advanced by a deterministic direct-method
//! sampler (spec section 1).

pub mod catalog;
pub mod config;
pub mod error;
pub mod history;
pub mod lattice;
pub mod network;
pub mod propensity;
pub mod sampler;
pub mod simulation;
pub mod solution;

/// A site index into the lattice's flat `Vec<Site>`.
pub type SiteId = usize;

/// A chemical species identifier; `-1` denotes an empty lattice site
/// (spec GLOSSARY).
pub type SpeciesId = i64;

/// A reaction identifier, stable for the lifetime of a `ReactionCatalog`.
pub type ReactionId = usize;

pub use catalog::{CatalogReaction, ReactionCatalog, ReactionPhase, StaticCatalog};
pub use config::LgmcConfig;
pub use error::{ConfigError, InvariantViolation};
pub use history::{ChannelHistoryQueue, HistoryElement, HistoryPacket, HistoryQueue};
pub use lattice::Lattice;
pub use network::{Event, LatticeReactionNetwork};
pub use propensity::PropensityStore;
pub use sampler::SampledEvent;
pub use simulation::Simulation;
pub use solution::SolutionState;
