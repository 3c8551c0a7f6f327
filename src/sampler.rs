//! The direct-method sampler.
//!
//! `dt ~ Exp(prop_sum)` via `rand_distr::Exp`, then a threshold walk
//! picks which reaction fires. The walk is linear over `hom_props`
//! followed by `PropensityStore`'s ordered site rows, so that two runs
//! seeded identically traverse rows in the same fixed order rather than
//! descending a tree shaped by insertion history.

use rand::Rng;
use rand_distr::{Distribution, Exp};

use crate::catalog::{CatalogReaction, ReactionCatalog};
use crate::lattice::Lattice;
use crate::network::Event;
use crate::propensity::{PropKey, PropensityStore};

/// A drawn waiting time paired with the event it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledEvent {
    pub event: Event,
    pub dt: f64,
}

/// Below this, `prop_sum` is treated as exhausted rather than risking a
/// `rand_distr::Exp::new` failure on a zero or near-zero rate.
pub const PROP_SUM_EPSILON: f64 = 1e-9;

/// Draws `dt` and a reaction. Returns `None` when `prop_sum` is
/// exhausted (spec section 4.4: "prop_sum <= 0 yields no event"), which
/// the driver treats as sampler exhaustion, not an error (spec section 7).
pub fn sample<C: ReactionCatalog>(
    catalog: &C,
    lattice: &Lattice,
    store: &PropensityStore,
    rng: &mut impl Rng,
) -> Option<SampledEvent> {
    let total = store.total();
    if total <= PROP_SUM_EPSILON {
        return None;
    }
    let dt = rng.sample(Exp::new(total).unwrap());
    let mut threshold = rng.random::<f64>() * total;

    for (rid, &p) in store.hom_props().iter().enumerate() {
        if threshold < p {
            return Some(SampledEvent { event: Event { reaction_id: rid, site_one: None, site_two: None }, dt });
        }
        threshold -= p;
    }

    for (key, row) in store.site_rows() {
        for &(p, rid) in row {
            if threshold < p {
                let (site_one, site_two) = match *key {
                    PropKey::Single(s) => (Some(s), None),
                    PropKey::Pair(a, b) => {
                        let reaction = catalog.reaction(rid);
                        let (s1, s2) = orient_pair(reaction, lattice, a, b);
                        (Some(s1), Some(s2))
                    }
                };
                return Some(SampledEvent { event: Event { reaction_id: rid, site_one, site_two }, dt });
            }
            threshold -= p;
        }
    }

    // Floating-point rounding pushed the threshold past the last row
    // despite `total` passing the epsilon check above; treat as
    // exhaustion rather than panicking.
    None
}

/// `PropKey::Pair` stores sites in canonical `(min, max)` order, which
/// may not match the reaction's own `reactant_one`/`reactant_two`
/// orientation; recovers the right orientation from current occupancy.
fn orient_pair(reaction: &CatalogReaction, lattice: &Lattice, a: crate::SiteId, b: crate::SiteId) -> (crate::SiteId, crate::SiteId) {
    if let CatalogReaction::OnLattice { reactant_one, .. } = reaction {
        if lattice.occupancy(a) == *reactant_one {
            (a, b)
        } else {
            (b, a)
        }
    } else {
        (a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn exhausted_propensity_yields_no_event() {
        let catalog = StaticCatalog::new();
        let lattice = Lattice::new(1.0, [0, 1, 0, 1, 0, 1], [false, false, false]).unwrap();
        let store = PropensityStore::new(0);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sample(&catalog, &lattice, &store, &mut rng).is_none());
    }

    #[test]
    fn single_hom_reaction_always_fires() {
        let mut catalog = StaticCatalog::new();
        catalog.add_solution(vec![(0, 1)], vec![(1, 1)], 1.0);
        let lattice = Lattice::new(1.0, [0, 1, 0, 1, 0, 1], [false, false, false]).unwrap();
        let mut store = PropensityStore::new(1);
        store.set_hom(0, 3.0);
        let mut rng = StdRng::seed_from_u64(42);
        let sampled = sample(&catalog, &lattice, &store, &mut rng).unwrap();
        assert_eq!(sampled.event.reaction_id, 0);
        assert!(sampled.dt > 0.0);
    }

    #[test]
    fn pair_event_resolves_sites_to_reactant_orientation() {
        let mut catalog = StaticCatalog::new();
        let rid = catalog.add_on_lattice(0, -1, -1, 0, 1.0);
        let mut lattice = Lattice::new(1.0, [0, 1, 0, 1, 0, 1], [true, false, false]).unwrap();
        lattice.set_occupancy(1, 0);
        let mut store = PropensityStore::new(0);
        // Site 0 is empty (-1), site 1 holds species 0: orientation must
        // place site_one at 1 (species 0, matching reactant_one) and
        // site_two at 0 (empty, matching reactant_two).
        store.insert(PropKey::pair(0, 1), rid, 1.0);
        let mut rng = StdRng::seed_from_u64(7);
        let sampled = sample(&catalog, &lattice, &store, &mut rng).unwrap();
        assert_eq!(sampled.event.site_one, Some(1));
        assert_eq!(sampled.event.site_two, Some(0));
    }
}
