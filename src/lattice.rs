//! The 3-D orthorhombic site grid: construction, neighbor table, occupancy.
//!
//! Site-id ordering and neighbor-offset generation follow spec section
//! 9's resolution of the open questions there: `nx = (hi - lo)` with
//! parentheses applied consistently, and `nsites` used for both the id
//! table and the count table.

use tinyvec::ArrayVec;

use crate::error::ConfigError;
use crate::{SiteId, SpeciesId};

/// Coordination number for a simple-cubic nearest-neighbor lattice.
pub const Z: usize = 6;

/// One fixed point on the lattice.
///
/// `species` is the only field that changes after construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site {
    pub i: i64,
    pub j: i64,
    pub k: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub species: SpeciesId,
}

/// A 3-D orthorhombic grid of sites with per-axis periodicity.
#[derive(Debug, Clone)]
pub struct Lattice {
    latconst: f64,
    xlo: i64,
    xhi: i64,
    ylo: i64,
    yhi: i64,
    zlo: i64,
    zhi: i64,
    periodic: [bool; 3],
    sites: Vec<Site>,
    neighbor_ids: Vec<ArrayVec<[SiteId; Z]>>,
}

impl Lattice {
    /// Builds a lattice from a lattice constant, box bounds given as
    /// lattice-unit integers `[xlo,xhi,ylo,yhi,zlo,zhi]`, and per-axis
    /// periodicity flags.
    ///
    /// For a periodic axis the box bounds are reinterpreted as a cell
    /// count and the lattice is re-indexed from `0`; for a non-periodic
    /// axis the given integer bounds are used as-is, matching
    /// `structured_lattice`'s two branches.
    pub fn new(
        latconst: f64,
        box_bounds: [i64; 6],
        periodic: [bool; 3],
    ) -> Result<Lattice, ConfigError> {
        if !(latconst > 0.0) {
            return Err(ConfigError::NonPositiveLatticeConstant(latconst));
        }
        let [boxxlo, boxxhi, boxylo, boxyhi, boxzlo, boxzhi] = box_bounds;
        for (axis, lo, hi, axis_periodic) in [
            ("x", boxxlo, boxxhi, periodic[0]),
            ("y", boxylo, boxyhi, periodic[1]),
            ("z", boxzlo, boxzhi, periodic[2]),
        ] {
            // A periodic axis spans a cell count (hi - lo), which must be
            // at least 1; a non-periodic axis spans an inclusive index
            // range (hi - lo + 1), so hi == lo (a single site) is valid.
            let extent_ok = if axis_periodic { hi > lo } else { hi >= lo };
            if !extent_ok {
                return Err(ConfigError::EmptyBox { axis, lo, hi });
            }
        }

        let (xlo, xhi) = axis_bounds(boxxlo, boxxhi, periodic[0]);
        let (ylo, yhi) = axis_bounds(boxylo, boxyhi, periodic[1]);
        let (zlo, zhi) = axis_bounds(boxzlo, boxzhi, periodic[2]);

        let nx = xhi - xlo + 1;
        let ny = yhi - ylo + 1;
        let nsites = (nx * ny * (zhi - zlo + 1)) as usize;

        let mut sites = Vec::with_capacity(nsites);
        for k in zlo..=zhi {
            for j in ylo..=yhi {
                for i in xlo..=xhi {
                    sites.push(Site {
                        i,
                        j,
                        k,
                        x: i as f64 * latconst,
                        y: j as f64 * latconst,
                        z: k as f64 * latconst,
                        species: -1,
                    });
                }
            }
        }
        debug_assert_eq!(sites.len(), nsites);

        let offsets = offsets_3d(latconst);

        let mut neighbor_ids = Vec::with_capacity(nsites);
        for site in &sites {
            let mut row = ArrayVec::<[SiteId; Z]>::new();
            for &(di, dj, dk) in &offsets {
                if let Some(n) = wrapped_neighbor(
                    site.i, site.j, site.k, di, dj, dk, xlo, xhi, ylo, yhi, zlo, zhi, periodic,
                ) {
                    let gid = site_id(n.0, n.1, n.2, xlo, ylo, zlo, nx, ny);
                    assert!(
                        row.len() < Z,
                        "site emitted more than {Z} neighbors: engine bug, not a runtime condition"
                    );
                    row.push(gid);
                }
            }
            neighbor_ids.push(row);
        }

        log::debug!(
            "lattice built: {nsites} sites, avg neighbors = {:.2}",
            neighbor_ids.iter().map(|r| r.len()).sum::<usize>() as f64 / nsites as f64
        );

        Ok(Lattice {
            latconst,
            xlo,
            xhi,
            ylo,
            yhi,
            zlo,
            zhi,
            periodic,
            sites,
            neighbor_ids,
        })
    }

    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    pub fn occupancy(&self, site: SiteId) -> SpeciesId {
        self.sites[site].species
    }

    pub fn set_occupancy(&mut self, site: SiteId, species: SpeciesId) {
        self.sites[site].species = species;
    }

    pub fn neighbors(&self, site: SiteId) -> &[SiteId] {
        &self.neighbor_ids[site]
    }

    pub fn site(&self, site: SiteId) -> &Site {
        &self.sites[site]
    }

    pub fn latconst(&self) -> f64 {
        self.latconst
    }
}

fn axis_bounds(lo_in: i64, hi_in: i64, periodic: bool) -> (i64, i64) {
    if periodic {
        (0, (hi_in - lo_in) - 1)
    } else {
        (lo_in, hi_in)
    }
}

/// Canonical site-id ordering: `id(i,j,k) = (k-zlo)*Ny*Nx + (j-ylo)*Nx + (i-xlo)`.
fn site_id(i: i64, j: i64, k: i64, xlo: i64, ylo: i64, zlo: i64, nx: i64, ny: i64) -> SiteId {
    ((k - zlo) * ny * nx + (j - ylo) * nx + (i - xlo)) as SiteId
}

/// The 6 nearest-neighbor unit-cell offsets: every `(di,dj,dk)` whose
/// Euclidean norm (scaled by `latconst`) is within a relative epsilon
/// of `latconst` itself.
fn offsets_3d(latconst: f64) -> Vec<(i64, i64, i64)> {
    let mut offsets = Vec::with_capacity(Z);
    let eps = latconst * 1e-4;
    for di in -1..=1i64 {
        for dj in -1..=1i64 {
            for dk in -1..=1i64 {
                let dx = di as f64 * latconst;
                let dy = dj as f64 * latconst;
                let dz = dk as f64 * latconst;
                let r = (dx * dx + dy * dy + dz * dz).sqrt();
                if (r - latconst).abs() < eps {
                    offsets.push((di, dj, dk));
                }
            }
        }
    }
    assert_eq!(offsets.len(), Z, "expected exactly {Z} neighbor offsets");
    offsets
}

#[allow(clippy::too_many_arguments)]
fn wrapped_neighbor(
    i: i64,
    j: i64,
    k: i64,
    di: i64,
    dj: i64,
    dk: i64,
    xlo: i64,
    xhi: i64,
    ylo: i64,
    yhi: i64,
    zlo: i64,
    zhi: i64,
    periodic: [bool; 3],
) -> Option<(i64, i64, i64)> {
    let ni = wrap_or_discard(i + di, xlo, xhi, periodic[0])?;
    let nj = wrap_or_discard(j + dj, ylo, yhi, periodic[1])?;
    let nk = wrap_or_discard(k + dk, zlo, zhi, periodic[2])?;
    Some((ni, nj, nk))
}

fn wrap_or_discard(v: i64, lo: i64, hi: i64, periodic: bool) -> Option<i64> {
    let n = hi - lo + 1;
    if periodic {
        Some(lo + (v - lo).rem_euclid(n))
    } else if v < lo || v > hi {
        None
    } else {
        Some(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_2x2x2_has_six_neighbors_per_site() {
        let lattice = Lattice::new(1.0, [0, 2, 0, 2, 0, 2], [true, true, true]).unwrap();
        assert_eq!(lattice.num_sites(), 8);
        for s in 0..lattice.num_sites() {
            assert_eq!(lattice.neighbors(s).len(), Z);
        }
    }

    #[test]
    fn nonperiodic_3x3x3_neighbor_counts_match_position() {
        // S2: corner=3, edge=4, face=5, interior=6.
        let lattice = Lattice::new(1.0, [0, 2, 0, 2, 0, 2], [false, false, false]).unwrap();
        assert_eq!(lattice.num_sites(), 27);
        let mut counts = std::collections::HashMap::new();
        for s in 0..lattice.num_sites() {
            *counts.entry(lattice.neighbors(s).len()).or_insert(0) += 1;
        }
        // 8 corners, 12 edges, 6 faces, 1 interior for a 3x3x3 cube.
        assert_eq!(counts.get(&3), Some(&8));
        assert_eq!(counts.get(&4), Some(&12));
        assert_eq!(counts.get(&5), Some(&6));
        assert_eq!(counts.get(&6), Some(&1));
    }

    #[test]
    fn neighbor_symmetry_on_periodic_axes() {
        let lattice = Lattice::new(1.0, [0, 4, 0, 4, 0, 1], [true, true, false]).unwrap();
        for s in 0..lattice.num_sites() {
            for &n in lattice.neighbors(s) {
                assert!(
                    lattice.neighbors(n).contains(&s),
                    "neighbor relation not symmetric for {s} <-> {n}"
                );
            }
        }
    }

    #[test]
    fn id_ordering_is_deterministic_kji_scan() {
        let lattice = Lattice::new(1.0, [0, 2, 0, 2, 0, 2], [true, true, true]).unwrap();
        let mut n = 0;
        for k in 0..2 {
            for j in 0..2 {
                for i in 0..2 {
                    let site = lattice.site(n);
                    assert_eq!((site.i, site.j, site.k), (i, j, k));
                    n += 1;
                }
            }
        }
    }

    #[test]
    fn rejects_bad_configuration() {
        assert!(Lattice::new(0.0, [0, 2, 0, 2, 0, 2], [true, true, true]).is_err());
        assert!(Lattice::new(1.0, [2, 2, 0, 2, 0, 2], [true, true, true]).is_err());
    }
}
