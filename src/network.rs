//! The update engine: `update_state` and `update_propensities` (spec
//! section 4.3). Reworked from a `std::function` callback style into
//! direct mutation of `Lattice`/`SolutionState`/`PropensityStore`.

use itertools::Itertools;

use crate::catalog::{CatalogReaction, ReactionCatalog, ReactionPhase};
use crate::error::InvariantViolation;
use crate::lattice::Lattice;
use crate::propensity::{PropKey, PropensityStore};
use crate::solution::SolutionState;
use crate::{ReactionId, SiteId};

/// A sampled or about-to-be-applied reaction event. `site_two` is set
/// only for on-lattice (diffusion / two-site reaction) events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub reaction_id: ReactionId,
    pub site_one: Option<SiteId>,
    pub site_two: Option<SiteId>,
}

/// `k · n₁[· n₂]`: the reactant-count factor is 1 for every site-bound
/// partner (occupancy is binary) and the solution population for every
/// solution partner (spec section 4.3 `compute_propensity`).
pub fn compute_propensity(reaction: &CatalogReaction, solution: &SolutionState) -> f64 {
    match reaction {
        CatalogReaction::Solution { reactants, k, .. } => {
            let factor: f64 = reactants
                .iter()
                .map(|&(species, count)| (solution.population(species).max(0) as f64).powi(count as i32))
                .product();
            k * factor
        }
        CatalogReaction::Adsorption { solution_reactant, k, .. } => {
            k * solution.population(*solution_reactant).max(0) as f64
        }
        CatalogReaction::Desorption { k, .. } => *k,
        CatalogReaction::OnLattice { k, .. } => *k,
    }
}

/// The update engine. Holds only a catalog reference; `Lattice`,
/// `SolutionState`, and `PropensityStore` are owned by the `Simulation`
/// that calls into it each step.
pub struct LatticeReactionNetwork<'c, C: ReactionCatalog> {
    catalog: &'c C,
}

impl<'c, C: ReactionCatalog> LatticeReactionNetwork<'c, C> {
    pub fn new(catalog: &'c C) -> LatticeReactionNetwork<'c, C> {
        LatticeReactionNetwork { catalog }
    }

    /// Mutates lattice occupancy and solution populations for a fired
    /// event. All failures here are invariant violations (I5): fatal,
    /// never recovered (spec section 4.3/7).
    pub fn update_state(
        &self,
        lattice: &mut Lattice,
        solution: &mut SolutionState,
        event: &Event,
        step: u64,
    ) -> Result<(), InvariantViolation> {
        let reaction = self.catalog.reaction(event.reaction_id);
        match reaction {
            CatalogReaction::Solution { reactants, products, .. } => {
                for &(species, count) in reactants {
                    solution.apply_delta(species, -(count as i64), step)?;
                }
                for &(species, count) in products {
                    solution.apply_delta(species, count as i64, step)?;
                }
            }
            CatalogReaction::Adsorption { id, solution_reactant, site_product, .. } => {
                let site_one = event.site_one.expect("adsorption event carries no site_one");
                if lattice.occupancy(site_one) != -1 {
                    return Err(InvariantViolation::OccupiedSiteAdsorption { site: site_one, reaction_id: *id, step });
                }
                solution.apply_delta(*solution_reactant, -1, step)?;
                lattice.set_occupancy(site_one, *site_product);
            }
            CatalogReaction::Desorption { id, site_reactant, solution_product, .. } => {
                let site_one = event.site_one.expect("desorption event carries no site_one");
                let found = lattice.occupancy(site_one);
                if found != *site_reactant {
                    return Err(InvariantViolation::SpeciesMismatch {
                        site: site_one,
                        expected: *site_reactant,
                        found,
                        reaction_id: *id,
                        step,
                    });
                }
                lattice.set_occupancy(site_one, -1);
                solution.apply_delta(*solution_product, 1, step)?;
            }
            CatalogReaction::OnLattice { id, reactant_one, reactant_two, product_one, product_two, .. } => {
                let site_one = event.site_one.expect("on-lattice event carries no site_one");
                let site_two = event.site_two.expect("on-lattice event carries no site_two");
                let found_one = lattice.occupancy(site_one);
                let found_two = lattice.occupancy(site_two);
                if found_one != *reactant_one {
                    return Err(InvariantViolation::SpeciesMismatch {
                        site: site_one,
                        expected: *reactant_one,
                        found: found_one,
                        reaction_id: *id,
                        step,
                    });
                }
                if found_two != *reactant_two {
                    return Err(InvariantViolation::SpeciesMismatch {
                        site: site_two,
                        expected: *reactant_two,
                        found: found_two,
                        reaction_id: *id,
                        step,
                    });
                }
                lattice.set_occupancy(site_one, *product_one);
                lattice.set_occupancy(site_two, *product_two);
            }
        }
        Ok(())
    }

    /// Recomputes exactly the propensities that could have changed
    /// after `event` was applied (spec section 4.3).
    pub fn update_propensities(
        &self,
        lattice: &Lattice,
        solution: &SolutionState,
        store: &mut PropensityStore,
        event: &Event,
    ) {
        let reaction = self.catalog.reaction(event.reaction_id);
        match reaction.phase() {
            ReactionPhase::Solution => {
                let CatalogReaction::Solution { reactants, products, .. } = reaction else {
                    unreachable!("phase() said Solution");
                };
                let touched_species = reactants.iter().chain(products).map(|&(s, _)| s).unique();
                for species in touched_species {
                    self.refresh_solution_touching(solution, store, species);
                }
            }
            ReactionPhase::Adsorption | ReactionPhase::Desorption => {
                let site_one = event.site_one.expect("adsorption/desorption event carries no site_one");
                self.clear_site(lattice, store, site_one, None);
                self.relevant_react(lattice, solution, store, site_one, None);
                let changed_solution_species = match reaction {
                    CatalogReaction::Adsorption { solution_reactant, .. } => *solution_reactant,
                    CatalogReaction::Desorption { solution_product, .. } => *solution_product,
                    _ => unreachable!("phase() said Adsorption/Desorption"),
                };
                self.refresh_solution_touching(solution, store, changed_solution_species);
            }
            ReactionPhase::OnLattice => {
                let site_one = event.site_one.expect("on-lattice event carries no site_one");
                let site_two = event.site_two.expect("on-lattice event carries no site_two");
                self.clear_site(lattice, store, site_one, Some(site_two));
                self.clear_site(lattice, store, site_two, Some(site_one));
                // The shared pair row is deliberately untouched by either
                // `clear_site` call above; the engine clears and rebuilds
                // it canonically here, once per raw neighbor-table
                // adjacency between the two sites. An ordinary lattice has
                // exactly one such adjacency; a periodic axis with only
                // two cells has two (the pair is reachable by a hop in
                // either direction), and both must be re-inserted or
                // `prop_sum` collapses after the first event (spec
                // section 8, S4).
                store.clear_row(PropKey::pair(site_one, site_two));
                self.relevant_react(lattice, solution, store, site_one, Some(site_two));
                self.relevant_react(lattice, solution, store, site_two, Some(site_one));
                let multiplicity = lattice.neighbors(site_one).iter().filter(|&&n| n == site_two).count();
                for _ in 0..multiplicity {
                    self.insert_pair_row(lattice, solution, store, site_one, site_two);
                }
            }
        }
    }

    /// Populates every row of `store` from scratch against the current
    /// lattice and solution state. Unlike `relevant_react`, each
    /// canonical pair row is filled exactly once: every site's
    /// single-site row is inserted, but a pair row `(s, n)` is only
    /// built from `s`'s side when `n > s`, so a lattice where every
    /// neighbor relation is mutual (the ordinary case) is not
    /// double-counted. A periodic axis with only two cells still
    /// produces two duplicate neighbor-table entries for the same
    /// `(s, n)`, and both legitimately land in that one row, since they
    /// represent the two distinct hop directions (spec section 8, S4).
    pub fn initialize_propensities(&self, lattice: &Lattice, solution: &SolutionState, store: &mut PropensityStore) {
        for site in 0..lattice.num_sites() {
            let species = lattice.occupancy(site);
            for rxn in self.catalog.site_reactions(species) {
                let p = compute_propensity(rxn, solution);
                store.insert(PropKey::single(site), rxn.id(), p);
            }
            for &n in lattice.neighbors(site) {
                if n > site {
                    self.insert_pair_row(lattice, solution, store, site, n);
                }
            }
        }
        for rid in 0..self.catalog.num_homogeneous() {
            let rxn = self.catalog.reaction(rid);
            store.set_hom(rid, compute_propensity(rxn, solution));
        }
    }

    fn refresh_solution_touching(&self, solution: &SolutionState, store: &mut PropensityStore, species: crate::SpeciesId) {
        for &rid in self.catalog.solution_reactions_touching(species) {
            let rxn = self.catalog.reaction(rid);
            store.set_hom(rid, compute_propensity(rxn, solution));
        }
    }

    /// For each neighbor `n` of `site` other than `ignore`, removes the
    /// canonical pair row `(site, n)`; also clears the single-site
    /// (adsorption/desorption) row for `site`.
    pub fn clear_site(&self, lattice: &Lattice, store: &mut PropensityStore, site: SiteId, ignore: Option<SiteId>) {
        for &n in lattice.neighbors(site) {
            if Some(n) == ignore {
                continue;
            }
            store.clear_row(PropKey::pair(site, n));
        }
        store.clear_row(PropKey::single(site));
    }

    /// Re-enumerates and re-inserts every reaction now possible at
    /// `site`: adsorption/desorption under the single-site key, and
    /// every two-site reaction with each neighbor other than `ignore`
    /// under the canonical pair key.
    pub fn relevant_react(
        &self,
        lattice: &Lattice,
        solution: &SolutionState,
        store: &mut PropensityStore,
        site: SiteId,
        ignore: Option<SiteId>,
    ) {
        let species = lattice.occupancy(site);
        for rxn in self.catalog.site_reactions(species) {
            let p = compute_propensity(rxn, solution);
            store.insert(PropKey::single(site), rxn.id(), p);
        }
        for &n in lattice.neighbors(site) {
            if Some(n) == ignore {
                continue;
            }
            self.insert_pair_row(lattice, solution, store, site, n);
        }
    }

    fn insert_pair_row(&self, lattice: &Lattice, solution: &SolutionState, store: &mut PropensityStore, site: SiteId, neighbor: SiteId) {
        let species = lattice.occupancy(site);
        let neighbor_species = lattice.occupancy(neighbor);
        for rxn in self.catalog.pair_reactions(species, neighbor_species) {
            let p = compute_propensity(rxn, solution);
            store.insert(PropKey::pair(site, neighbor), rxn.id(), p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;

    fn two_site_diffusion_catalog() -> StaticCatalog {
        let mut catalog = StaticCatalog::new();
        // A* + empty <-> empty + A*, symmetric diffusion.
        catalog.add_on_lattice(0, -1, -1, 0, 1.0);
        catalog
    }

    #[test]
    fn diffusion_swaps_species_between_sites() {
        let catalog = two_site_diffusion_catalog();
        let mut lattice = Lattice::new(1.0, [0, 2, 0, 1, 0, 1], [true, false, false]).unwrap();
        lattice.set_occupancy(0, 0);
        let mut solution = SolutionState::new(vec![]);
        let network = LatticeReactionNetwork::new(&catalog);
        let event = Event { reaction_id: 0, site_one: Some(0), site_two: Some(1) };
        network.update_state(&mut lattice, &mut solution, &event, 0).unwrap();
        assert_eq!(lattice.occupancy(0), -1);
        assert_eq!(lattice.occupancy(1), 0);
    }

    #[test]
    fn mismatched_species_is_an_invariant_violation() {
        let catalog = two_site_diffusion_catalog();
        let mut lattice = Lattice::new(1.0, [0, 2, 0, 1, 0, 1], [true, false, false]).unwrap();
        // Neither site occupied by the expected reactant species (-1,-1).
        lattice.set_occupancy(0, 3);
        let mut solution = SolutionState::new(vec![]);
        let network = LatticeReactionNetwork::new(&catalog);
        let event = Event { reaction_id: 0, site_one: Some(0), site_two: Some(1) };
        assert!(network.update_state(&mut lattice, &mut solution, &event, 0).is_err());
    }

    #[test]
    fn solution_reaction_consumes_and_produces() {
        let mut catalog = StaticCatalog::new();
        catalog.add_solution(vec![(0, 1)], vec![(1, 1)], 1.0);
        let lattice = Lattice::new(1.0, [0, 1, 0, 1, 0, 1], [false, false, false]).unwrap();
        let mut lattice = lattice;
        let mut solution = SolutionState::new(vec![10, 0]);
        let network = LatticeReactionNetwork::new(&catalog);
        let event = Event { reaction_id: 0, site_one: None, site_two: None };
        network.update_state(&mut lattice, &mut solution, &event, 0).unwrap();
        assert_eq!(solution.population(0), 9);
        assert_eq!(solution.population(1), 1);
    }
}
