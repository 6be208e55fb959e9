//! Run and score one episode.

use anyhow::Result;
use colored::Colorize;
use mirage::prelude::*;
use std::path::Path;

use super::brains::{BrainKind, BrainSpec};
use crate::config::Config;

pub struct EpisodeArgs<'a> {
    pub brain: BrainKind,
    pub genome: Option<&'a Path>,
    pub seed: Option<u64>,
    pub ticks: Option<u64>,
    pub json: bool,
    pub render: bool,
}

pub fn run(args: EpisodeArgs<'_>, verbose: bool) -> Result<()> {
    let mut config = Config::load()?.simulation;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(ticks) = args.ticks {
        config.ticks_per_episode = ticks;
    }
    let spec = BrainSpec::resolve(args.brain, args.genome, &config)?;

    let mut sim = Simulation::new(config.clone(), |i| spec.make(i))?;
    while sim.step().is_some() {
        if verbose && sim.tick() % 50 == 0 {
            eprintln!(
                "  tick {:>6}  alive {:>3}  checksum {:016x}",
                sim.tick(),
                sim.alive_count(),
                sim.total_checksum()
            );
        }
    }
    if args.render {
        print!("{}", sim.render());
        println!();
    }
    let result = EpisodeResult::from_simulation(&sim);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "{} Episode complete ({}, seed {})",
        "✓".green().bold(),
        sim.brain_id().cyan(),
        config.seed.to_string().cyan()
    );
    println!(
        "  Ticks:        {} / {}",
        result.ticks_survived.to_string().green(),
        result.ticks_requested
    );
    println!("  Survival:     {:.3}", result.survival());
    println!(
        "  Drinks:       {} ok, {} failed",
        result.successful_drinks.to_string().green(),
        result.failed_drinks.to_string().yellow()
    );
    println!("  Avg thirst:   {:.3}", result.average_thirst);
    println!("  Distance:     {:.2}", result.distance_traveled);
    println!(
        "  Visited:      {} cells ({} next to water)",
        result.visited_cells, result.drinkable_cells_visited
    );
    println!("  Fitness:      {}", format!("{:.4}", result.fitness).bold());
    println!("  Checksum:     {}", format!("{:016x}", result.checksum).dimmed());

    Ok(())
}
