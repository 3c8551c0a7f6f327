//! The per-seed driver loop (spec section 5).
//!
//! `execute_step`/`execute_steps`/`execute_time`, history buffering
//! flushed at `history_chunk_size`, and a step counter kept alongside
//! simulated time, built around `sampler::sample` returning
//! `Option<SampledEvent>` and direct calls into
//! `LatticeReactionNetwork` rather than a callback indirection.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::catalog::ReactionCatalog;
use crate::error::InvariantViolation;
use crate::history::{HistoryElement, HistoryPacket, HistoryQueue};
use crate::lattice::Lattice;
use crate::network::LatticeReactionNetwork;
use crate::propensity::PropensityStore;
use crate::sampler;
use crate::solution::SolutionState;

/// One independent trajectory: its own lattice, solution state,
/// propensity store, and RNG stream, all seeded from `seed` (spec
/// section 5's "independent seeds" property).
pub struct Simulation<'c, C: ReactionCatalog, H: HistoryQueue> {
    catalog: &'c C,
    network: LatticeReactionNetwork<'c, C>,
    lattice: Lattice,
    solution: SolutionState,
    propensities: PropensityStore,
    rng: SmallRng,
    history_queue: H,
    history_buffer: Vec<HistoryElement>,
    chunk_size: usize,
    seed: u64,
    pub time: f64,
    pub step: u64,
}

impl<'c, C: ReactionCatalog, H: HistoryQueue> Simulation<'c, C, H> {
    pub fn new(
        catalog: &'c C,
        lattice: Lattice,
        solution: SolutionState,
        propensities: PropensityStore,
        seed: u64,
        chunk_size: usize,
        history_queue: H,
    ) -> Simulation<'c, C, H> {
        Simulation {
            catalog,
            network: LatticeReactionNetwork::new(catalog),
            lattice,
            solution,
            propensities,
            rng: SmallRng::seed_from_u64(seed),
            history_queue,
            history_buffer: Vec::with_capacity(chunk_size),
            chunk_size,
            seed,
            time: 0.0,
            step: 0,
        }
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn solution(&self) -> &SolutionState {
        &self.solution
    }

    pub fn propensities(&self) -> &PropensityStore {
        &self.propensities
    }

    /// Samples, applies, and records one event. Returns `Ok(false)` on
    /// sampler exhaustion (spec section 7: not an error), `Ok(true)`
    /// after a normal step, or `Err` on an invariant violation, at which
    /// point the simulation must not be stepped further (spec section 7).
    pub fn execute_step(&mut self) -> Result<bool, InvariantViolation> {
        let sampled = match sampler::sample(self.catalog, &self.lattice, &self.propensities, &mut self.rng) {
            Some(sampled) => sampled,
            None => return Ok(false),
        };

        self.time += sampled.dt;

        self.history_buffer.push(HistoryElement {
            seed: self.seed,
            reaction_id: sampled.event.reaction_id,
            time: self.time,
            step: self.step,
        });
        if self.history_buffer.len() == self.chunk_size {
            self.flush_history();
        }

        self.step += 1;

        if let Err(violation) = self.network.update_state(&mut self.lattice, &mut self.solution, &sampled.event, self.step) {
            log::error!("seed {}: invariant violated at step {}: {violation}", self.seed, self.step);
            return Err(violation);
        }
        self.network.update_propensities(&self.lattice, &self.solution, &mut self.propensities, &sampled.event);
        self.propensities.resum_if_due(self.step);

        Ok(true)
    }

    /// Runs until `step` exceeds `step_cutoff` or the sampler is exhausted.
    pub fn execute_steps(&mut self, step_cutoff: u64) -> Result<(), InvariantViolation> {
        while self.execute_step()? {
            if self.step > step_cutoff {
                break;
            }
        }
        Ok(())
    }

    /// Runs until `time` exceeds `time_cutoff` or the sampler is exhausted.
    pub fn execute_time(&mut self, time_cutoff: f64) -> Result<(), InvariantViolation> {
        while self.execute_step()? {
            if self.time > time_cutoff {
                break;
            }
        }
        Ok(())
    }

    /// Flushes any buffered history, even a partial chunk. Callers
    /// finishing a run must call this or trailing events are lost.
    pub fn finish(&mut self) {
        if !self.history_buffer.is_empty() {
            self.flush_history();
        }
    }

    fn flush_history(&mut self) {
        let history = std::mem::replace(&mut self.history_buffer, Vec::with_capacity(self.chunk_size));
        self.history_queue.insert_history(HistoryPacket { seed: self.seed, history });
    }
}
