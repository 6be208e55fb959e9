//! Render a generated world.

use anyhow::Result;
use colored::Colorize;
use mirage::prelude::*;

use crate::config::Config;

pub fn run(seed: Option<u64>) -> Result<()> {
    let mut config = Config::load()?.simulation;
    if let Some(seed) = seed {
        config.seed = seed;
    }

    let sim = Simulation::new(config.clone(), |_| Box::new(IdleBrain))?;
    let world = sim.world();

    println!(
        "{} World {}x{} (seed {})",
        "→".blue(),
        world.width().to_string().cyan(),
        world.height().to_string().cyan(),
        config.seed.to_string().cyan()
    );
    println!();
    print!("{}", sim.render());
    println!();
    println!(
        "  Water: {}  Solid: {}  Empty: {}",
        world.count(Tile::Water).to_string().blue(),
        world.count(Tile::Solid).to_string().yellow(),
        world.count(Tile::Empty).to_string().green()
    );
    println!("  Agents: {}", sim.agents().len().to_string().cyan());
    println!("  World checksum: {}", format!("{:016x}", world.checksum()).dimmed());

    Ok(())
}
