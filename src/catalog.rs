//! The reaction catalog contract.
//!
//! The catalog is an external collaborator (spec section 1/6): something
//! else loads reaction networks from persistent storage and answers
//! queries here. This module defines that contract (`ReactionCatalog`)
//! and a small in-memory implementation, `StaticCatalog`, that exists
//! only so the core is exercisable without a storage layer. Reactions
//! are a tagged union of phases (spec section 9) rather than a single
//! well-mixed shape with assert-false placeholder methods for the rest.

use rustc_hash::FxHashMap;

use crate::{ReactionId, SpeciesId};

/// Which of the five reaction phases spec section 2/GLOSSARY describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionPhase {
    Solution,
    Adsorption,
    Desorption,
    /// Two-site diffusion or on-lattice reaction; both reshuffle species
    /// between two occupied/empty neighboring sites and are handled
    /// identically by the update engine.
    OnLattice,
}

/// One reaction as the catalog reports it: id, phase, reactants,
/// products, and a precomputed `k_effective` that already folds in
/// temperature, potential, and site-geometry factors (spec section 4.3).
#[derive(Debug, Clone)]
pub enum CatalogReaction {
    Solution {
        id: ReactionId,
        reactants: Vec<(SpeciesId, u64)>,
        products: Vec<(SpeciesId, u64)>,
        k: f64,
    },
    Adsorption {
        id: ReactionId,
        solution_reactant: SpeciesId,
        site_product: SpeciesId,
        k: f64,
    },
    Desorption {
        id: ReactionId,
        site_reactant: SpeciesId,
        solution_product: SpeciesId,
        k: f64,
    },
    OnLattice {
        id: ReactionId,
        reactant_one: SpeciesId,
        reactant_two: SpeciesId,
        product_one: SpeciesId,
        product_two: SpeciesId,
        k: f64,
    },
}

impl CatalogReaction {
    pub fn id(&self) -> ReactionId {
        match self {
            CatalogReaction::Solution { id, .. }
            | CatalogReaction::Adsorption { id, .. }
            | CatalogReaction::Desorption { id, .. }
            | CatalogReaction::OnLattice { id, .. } => *id,
        }
    }

    pub fn phase(&self) -> ReactionPhase {
        match self {
            CatalogReaction::Solution { .. } => ReactionPhase::Solution,
            CatalogReaction::Adsorption { .. } => ReactionPhase::Adsorption,
            CatalogReaction::Desorption { .. } => ReactionPhase::Desorption,
            CatalogReaction::OnLattice { .. } => ReactionPhase::OnLattice,
        }
    }

    pub fn k_effective(&self) -> f64 {
        match self {
            CatalogReaction::Solution { k, .. }
            | CatalogReaction::Adsorption { k, .. }
            | CatalogReaction::Desorption { k, .. }
            | CatalogReaction::OnLattice { k, .. } => *k,
        }
    }
}

/// The external contract: answer reaction lookups by id, by changed
/// species, or by the occupancy of a site and (optionally) one of its
/// neighbors. Persistence-backed implementations are out of scope here;
/// see `StaticCatalog` for the in-memory stand-in this crate tests
/// against.
pub trait ReactionCatalog {
    /// Number of homogeneous-phase (solution) reactions, `R_hom`; these
    /// occupy contiguous ids `0..num_homogeneous()` in `hom_props`.
    fn num_homogeneous(&self) -> usize;

    /// Any reaction, looked up by id, regardless of phase. Used by the
    /// update engine to resolve the full reaction a sampled event's id
    /// refers to.
    fn reaction(&self, id: ReactionId) -> &CatalogReaction;

    /// Solution reactions whose reactant or product set contains `species`.
    fn solution_reactions_touching(&self, species: SpeciesId) -> &[ReactionId];

    /// Adsorption/desorption reactions compatible with a site currently
    /// occupied by `species` (`-1` for empty).
    fn site_reactions(&self, species: SpeciesId) -> &[CatalogReaction];

    /// Two-site (diffusion or on-lattice) reactions compatible with the
    /// ordered pair `(species_at_site, species_at_neighbor)`.
    fn pair_reactions(&self, species_at_site: SpeciesId, species_at_neighbor: SpeciesId) -> &[CatalogReaction];
}

/// An in-memory catalog built once from explicit reaction lists.
///
/// Since catalog persistence is out of scope here, callers build a
/// `StaticCatalog` directly from already-typed reactant/product lists
/// via the `add_*` methods, which assign and return each reaction's id.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    num_solution: usize,
    next_id: ReactionId,
    by_id: FxHashMap<ReactionId, CatalogReaction>,
    solution_by_species: FxHashMap<SpeciesId, Vec<ReactionId>>,
    site_by_species: FxHashMap<SpeciesId, Vec<CatalogReaction>>,
    pair_by_species: FxHashMap<(SpeciesId, SpeciesId), Vec<CatalogReaction>>,
}

impl StaticCatalog {
    pub fn new() -> StaticCatalog {
        StaticCatalog::default()
    }

    /// Registers a homogeneous-phase reaction. Solution reactions are
    /// the first `num_homogeneous()` ids allocated, so `hom_props`
    /// stays densely indexed regardless of what is registered after.
    pub fn add_solution(&mut self, reactants: Vec<(SpeciesId, u64)>, products: Vec<(SpeciesId, u64)>, k: f64) -> ReactionId {
        assert_eq!(
            self.next_id, self.num_solution,
            "solution reactions must all be registered before any site-anchored reaction"
        );
        let id = self.alloc_id();
        self.num_solution += 1;
        for &(species, _) in reactants.iter().chain(products.iter()) {
            self.solution_by_species.entry(species).or_default().push(id);
        }
        self.by_id.insert(id, CatalogReaction::Solution { id, reactants, products, k });
        id
    }

    pub fn add_adsorption(&mut self, solution_reactant: SpeciesId, site_product: SpeciesId, k: f64) -> ReactionId {
        let id = self.alloc_id();
        let rxn = CatalogReaction::Adsorption { id, solution_reactant, site_product, k };
        self.site_by_species.entry(-1).or_default().push(rxn.clone());
        self.by_id.insert(id, rxn);
        id
    }

    pub fn add_desorption(&mut self, site_reactant: SpeciesId, solution_product: SpeciesId, k: f64) -> ReactionId {
        let id = self.alloc_id();
        let rxn = CatalogReaction::Desorption { id, site_reactant, solution_product, k };
        self.site_by_species.entry(site_reactant).or_default().push(rxn.clone());
        self.by_id.insert(id, rxn);
        id
    }

    pub fn add_on_lattice(
        &mut self,
        reactant_one: SpeciesId,
        reactant_two: SpeciesId,
        product_one: SpeciesId,
        product_two: SpeciesId,
        k: f64,
    ) -> ReactionId {
        let id = self.alloc_id();
        let rxn = CatalogReaction::OnLattice {
            id,
            reactant_one,
            reactant_two,
            product_one,
            product_two,
            k,
        };
        self.pair_by_species.entry((reactant_one, reactant_two)).or_default().push(rxn.clone());
        if reactant_one != reactant_two {
            self.pair_by_species.entry((reactant_two, reactant_one)).or_default().push(rxn.clone());
        }
        self.by_id.insert(id, rxn);
        id
    }

    fn alloc_id(&mut self) -> ReactionId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

const EMPTY_IDS: &[ReactionId] = &[];
const EMPTY_REACTIONS: &[CatalogReaction] = &[];

impl ReactionCatalog for StaticCatalog {
    fn num_homogeneous(&self) -> usize {
        self.num_solution
    }

    fn reaction(&self, id: ReactionId) -> &CatalogReaction {
        self.by_id.get(&id).unwrap_or_else(|| panic!("no catalog reaction registered for id {id}"))
    }

    fn solution_reactions_touching(&self, species: SpeciesId) -> &[ReactionId] {
        self.solution_by_species.get(&species).map(Vec::as_slice).unwrap_or(EMPTY_IDS)
    }

    fn site_reactions(&self, species: SpeciesId) -> &[CatalogReaction] {
        self.site_by_species.get(&species).map(Vec::as_slice).unwrap_or(EMPTY_REACTIONS)
    }

    fn pair_reactions(&self, species_at_site: SpeciesId, species_at_neighbor: SpeciesId) -> &[CatalogReaction] {
        self.pair_by_species
            .get(&(species_at_site, species_at_neighbor))
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_REACTIONS)
    }
}
