//! Demo CLI: runs one seed of a toy adsorption/desorption/diffusion
//! network to completion and prints the final state. Grounded on the
//! teacher's `src/main.rs` CLI shape (clap derive, `clap_cargo` styling,
//! tab-separated sample output), standing in for the out-of-scope
//! persistence-backed catalog and history sink with `StaticCatalog` and
//! `ChannelHistoryQueue`.

use std::sync::mpsc::channel;
use std::thread;

use clap::Parser;
use rand::{rng, Rng};

use lgmc::config::LgmcConfig;
use lgmc::history::ChannelHistoryQueue;
use lgmc::lattice::Lattice;
use lgmc::propensity::PropensityStore;
use lgmc::simulation::Simulation;
use lgmc::solution::SolutionState;
use lgmc::StaticCatalog;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

#[derive(Debug, Parser)]
#[command(
    name = "lgmc-demo",
    about = "Runs a toy lattice Gillespie Monte Carlo simulation.",
    long_about = "Builds a small periodic lattice, seeds it with a single adsorbing/desorbing/\
diffusing species plus one homogeneous solution reaction, and advances one seed to a \
time cutoff, printing the final solution populations and lattice occupancy.",
    styles = CLAP_STYLING,
)]
struct Cli {
    /// The amount of simulated time to advance.
    #[arg(long, default_value_t = 10.0)]
    time: f64,

    /// Cells per axis of a periodic cubic lattice.
    #[arg(long, default_value_t = 4)]
    cells_per_axis: i64,

    /// History chunk size before a packet is pushed to the sink.
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,

    /// The seed to use for random number generation. Random if omitted.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    env_logger::init();
    run_cli(Cli::parse());
}

fn run_cli(args: Cli) {
    let seed = args.seed.unwrap_or_else(|| rng().random());

    let config = LgmcConfig::new(
        1.0,
        [0, args.cells_per_axis, 0, args.cells_per_axis, 0, args.cells_per_axis],
        [true, true, true],
        300.0,
        0.0,
        args.chunk_size,
        2,
    );
    config.validate().expect("invalid demo configuration");

    let lattice = Lattice::new(config.lattice_constant, config.box_bounds, config.periodicity)
        .expect("invalid lattice configuration");

    let mut catalog = StaticCatalog::new();
    // A solution-phase species 0 (the adsorbate) interconverts with an
    // inert species 1 so `hom_props` is exercised alongside the lattice.
    catalog.add_solution(vec![(0, 1)], vec![(1, 1)], 0.2);
    catalog.add_solution(vec![(1, 1)], vec![(0, 1)], 0.2);
    // Species 0 adsorbs onto empty sites and desorbs back into solution.
    catalog.add_adsorption(0, 0, 0.5);
    catalog.add_desorption(0, 0, 1.0);
    // Adsorbed species 0 hops between neighboring sites.
    catalog.add_on_lattice(0, -1, -1, 0, 2.0);

    let solution = SolutionState::new(vec![50, 50]);
    config.validate_species(&lattice, &solution).expect("unknown species in initial configuration");

    let mut propensities = PropensityStore::new(catalog.num_homogeneous());
    let network = lgmc::LatticeReactionNetwork::new(&catalog);
    network.initialize_propensities(&lattice, &solution, &mut propensities);

    let (tx, rx) = channel();
    let queue = ChannelHistoryQueue::new(tx);
    let sink = thread::spawn(move || {
        let mut packets = 0usize;
        while let Ok(packet) = rx.recv() {
            packets += 1;
            log::debug!("received history packet {packets} with {} events", packet.history.len());
        }
        packets
    });

    let mut simulation = Simulation::new(&catalog, lattice, solution, propensities, seed, args.chunk_size, queue);
    simulation
        .execute_time(args.time)
        .expect("invariant violated during demo run");
    simulation.finish();

    println!("seed\t{seed}");
    println!("time\t{:.6}", simulation.time);
    println!("steps\t{}", simulation.step);
    println!("population(0)\t{}", simulation.solution().population(0));
    println!("population(1)\t{}", simulation.solution().population(1));
    let occupied = (0..simulation.lattice().num_sites())
        .filter(|&s| simulation.lattice().occupancy(s) != -1)
        .count();
    println!("occupied_sites\t{occupied}/{}", simulation.lattice().num_sites());

    drop(simulation);
    let packets = sink.join().expect("history sink thread panicked");
    log::info!("history sink drained {packets} packets");
}
