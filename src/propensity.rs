//! The dense/sparse propensity partition (spec section 3/4.2).
//!
//! `hom_props` holds homogeneous (solution-phase) reaction propensities
//! indexed by reaction id, a plain dense `Vec`. `site_props` holds
//! everything site-anchored (adsorption/desorption rows keyed by a
//! single site, diffusion/surface reaction rows keyed by a canonical
//! site pair) as a `BTreeMap` rather than a hash map: the direct-method
//! sampler's walk must see the same row order on every run given the
//! same seed (spec section 4.4/9), which an unordered hash map does not
//! guarantee.

use std::collections::BTreeMap;

use crate::{ReactionId, SiteId};

/// How often (in steps) to re-sum `prop_sum` from scratch to bound
/// floating-point drift (spec sections 4.2 and 9).
pub const RESUM_EPOCH: u64 = 1_000_000;

/// A key into the sparse site-anchored propensity partition.
///
/// Pair keys are always canonicalized so a reaction registered from
/// either endpoint of a site pair lands in the same row (spec section
/// 9's `ignore_neighbor` design note).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropKey {
    Single(SiteId),
    Pair(SiteId, SiteId),
}

impl PropKey {
    pub fn single(site: SiteId) -> PropKey {
        PropKey::Single(site)
    }

    pub fn pair(a: SiteId, b: SiteId) -> PropKey {
        PropKey::Pair(a.min(b), a.max(b))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PropensityStore {
    hom_props: Vec<f64>,
    site_props: BTreeMap<PropKey, Vec<(f64, ReactionId)>>,
    prop_sum: f64,
    active_indices: usize,
}

impl PropensityStore {
    pub fn new(num_homogeneous: usize) -> PropensityStore {
        PropensityStore {
            hom_props: vec![0.0; num_homogeneous],
            site_props: BTreeMap::new(),
            prop_sum: 0.0,
            active_indices: 0,
        }
    }

    pub fn get_hom(&self, rid: ReactionId) -> f64 {
        self.hom_props[rid]
    }

    pub fn set_hom(&mut self, rid: ReactionId, p: f64) {
        let old = self.hom_props[rid];
        if old == 0.0 && p != 0.0 {
            self.active_indices += 1;
        } else if old != 0.0 && p == 0.0 {
            self.active_indices -= 1;
        }
        self.prop_sum += p - old;
        self.hom_props[rid] = p;
        self.clamp_if_negative();
    }

    /// Returns the mutable entry list for a site-key; a missing key
    /// starts out as an (owned, empty) row.
    pub fn row(&mut self, key: PropKey) -> &mut Vec<(f64, ReactionId)> {
        self.site_props.entry(key).or_default()
    }

    pub fn insert(&mut self, key: PropKey, rid: ReactionId, p: f64) {
        self.row(key).push((p, rid));
        self.prop_sum += p;
        if p != 0.0 {
            self.active_indices += 1;
        }
        self.clamp_if_negative();
    }

    /// Removes a row, subtracting its exact sum (via `sum_row`, not the
    /// accumulated delta) from `prop_sum` — the long-term-drift guard
    /// called for by spec section 4.3's `clear_site`.
    pub fn clear_row(&mut self, key: PropKey) {
        if let Some(row) = self.site_props.remove(&key) {
            let sum: f64 = row.iter().map(|&(p, _)| p).sum();
            let nonzero = row.iter().filter(|&&(p, _)| p != 0.0).count();
            self.prop_sum -= sum;
            self.active_indices -= nonzero;
            self.clamp_if_negative();
        }
    }

    pub fn sum_row(&self, key: PropKey) -> f64 {
        self.site_props.get(&key).map_or(0.0, |row| row.iter().map(|&(p, _)| p).sum())
    }

    pub fn total(&self) -> f64 {
        self.prop_sum
    }

    pub fn active_indices(&self) -> usize {
        self.active_indices
    }

    pub fn hom_props(&self) -> &[f64] {
        &self.hom_props
    }

    /// A stable, ordered view over the sparse rows, used by the sampler
    /// to continue its linear walk past `hom_props`.
    pub fn site_rows(&self) -> impl Iterator<Item = (&PropKey, &Vec<(f64, ReactionId)>)> {
        self.site_props.iter()
    }

    /// Recomputes `prop_sum` and `active_indices` from scratch. Called
    /// periodically (`resum_if_due`) and whenever cancellation would
    /// otherwise drive `prop_sum` negative.
    pub fn resum_exact(&mut self) {
        let hom_sum: f64 = self.hom_props.iter().sum();
        let hom_active = self.hom_props.iter().filter(|&&p| p != 0.0).count();
        let site_sum: f64 = self.site_props.values().flatten().map(|&(p, _)| p).sum();
        let site_active = self
            .site_props
            .values()
            .flatten()
            .filter(|&&(p, _)| p != 0.0)
            .count();
        self.prop_sum = hom_sum + site_sum;
        self.active_indices = hom_active + site_active;
    }

    pub fn resum_if_due(&mut self, step: u64) {
        if step != 0 && step % RESUM_EPOCH == 0 {
            log::debug!("step {step}: periodic propensity re-sum (drift guard)");
            self.resum_exact();
        }
    }

    fn clamp_if_negative(&mut self) {
        if self.prop_sum < 0.0 {
            log::warn!("prop_sum went negative ({}), clamping to 0", self.prop_sum);
            self.prop_sum = 0.0;
        }
    }
}
