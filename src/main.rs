//! Arenabot - headless duels between ledge-routing AI agents
//!
//! Runs every requested level and profile pairing and reports how each
//! profile moved, routed and held range.
//!
//! Usage:
//!   cargo run -- --help
//!   cargo run -- --levels Shelves --runs 3
//!   cargo run -- --seed 42 --parallel 8 --output results.json

use arenabot::simulation::{SimConfig, run_simulation};
use bevy::log::LogPlugin;
use bevy::prelude::*;

fn main() {
    let config = SimConfig::from_args();

    // Matches run in their own apps; this one only installs the global logger
    if !config.quiet {
        App::new().add_plugins(LogPlugin::default());
    }

    if let Err(e) = run_simulation(config) {
        error!("Simulation failed: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
