//! Train a population.
//!
//! Each run gets its own directory under the output root, named by a
//! random run id:
//!
//! - `manifest.json`: run id, version, full configuration
//! - `generations.jsonl`: one summary line per generation
//! - `best_genome.json`: best genome seen so far (by adjusted fitness)
//! - `checkpoint.json`: resumable trainer state after the last generation

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mirage::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::Config;

pub struct TrainArgs {
    pub generations: Option<u64>,
    pub out: PathBuf,
    pub resume: Option<PathBuf>,
    pub sequential: bool,
    pub threads: Option<usize>,
}

#[derive(Serialize)]
struct RunManifest<'a> {
    run_id: Uuid,
    mirage_version: &'static str,
    resumed_from: Option<String>,
    start_generation: u64,
    generations: u64,
    config: &'a Config,
}

#[derive(Serialize)]
struct GenerationLine<'a> {
    generation: u64,
    best_adjusted: f64,
    mean_adjusted: f64,
    worst_adjusted: f64,
    best_raw: f64,
    best_nodes: usize,
    best_connections: usize,
    phase: &'a CurriculumPhase,
    best_stats: &'a EpisodeStats,
}

impl<'a> From<&'a GenerationResult> for GenerationLine<'a> {
    fn from(result: &'a GenerationResult) -> Self {
        Self {
            generation: result.generation,
            best_adjusted: result.best_adjusted,
            mean_adjusted: result.mean_adjusted,
            worst_adjusted: result.worst_adjusted,
            best_raw: result.best_raw,
            best_nodes: result.best_node_count,
            best_connections: result.best_connection_count,
            phase: &result.phase,
            best_stats: &result.best_stats,
        }
    }
}

pub fn run(args: TrainArgs) -> Result<()> {
    let (mut trainer, config) = match &args.resume {
        Some(path) => {
            let mut checkpoint = load_checkpoint(path)
                .with_context(|| format!("Failed to read checkpoint: {}", path.display()))?;
            apply_overrides(&mut checkpoint.training, &args);
            let config = Config {
                simulation: checkpoint.simulation.clone(),
                training: checkpoint.training.clone(),
                mutation: checkpoint.mutation.clone(),
                curriculum: checkpoint.curriculum.clone(),
            };
            (Trainer::resume(checkpoint)?, config)
        }
        None => {
            let mut config = Config::load()?;
            apply_overrides(&mut config.training, &args);
            let trainer = Trainer::new(
                config.simulation.clone(),
                config.training.clone(),
                config.mutation.clone(),
                config.curriculum.clone(),
            )?;
            (trainer, config)
        }
    };
    let generations = args.generations.unwrap_or(config.training.generations);

    let run_id = Uuid::new_v4();
    let run_dir = args.out.join(run_id.to_string());
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create {}", run_dir.display()))?;

    let manifest = RunManifest {
        run_id,
        mirage_version: env!("CARGO_PKG_VERSION"),
        resumed_from: args.resume.as_ref().map(|p| p.display().to_string()),
        start_generation: trainer.generation(),
        generations,
        config: &config,
    };
    write_json(&run_dir.join("manifest.json"), &manifest)?;

    println!(
        "{} Training run {} ({} genomes, {} generations{})",
        "→".blue(),
        run_id.to_string().cyan(),
        config.training.population_size.to_string().cyan(),
        generations.to_string().cyan(),
        if config.training.parallel { ", parallel" } else { "" }
    );

    let log_path = run_dir.join("generations.jsonl");
    let mut log = BufWriter::new(
        File::create(&log_path)
            .with_context(|| format!("Failed to create {}", log_path.display()))?,
    );

    let pb = ProgressBar::new(generations);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} generations {msg}")?
            .progress_chars("#>-"),
    );

    let mut best: Option<GenerationResult> = None;
    for _ in 0..generations {
        let result = trainer.run_generation()?;
        writeln!(log, "{}", serde_json::to_string(&GenerationLine::from(&result))?)?;
        pb.set_message(format!("best {:.4}", result.best_adjusted));
        pb.inc(1);

        let improved = best
            .as_ref()
            .map_or(true, |b| result.best_adjusted > b.best_adjusted);
        if improved {
            save_genome(&result.best_genome, &run_dir.join("best_genome.json"))?;
            best = Some(result);
        }
        save_checkpoint(&trainer.checkpoint(), &run_dir.join("checkpoint.json"))?;
    }
    log.flush()?;
    pb.finish_with_message("done");

    println!();
    println!("{} Training complete!", "✓".green().bold());
    if let Some(best) = &best {
        println!(
            "  Best:        {} (generation {})",
            format!("{:.4}", best.best_adjusted).green(),
            best.generation
        );
        println!(
            "  Topology:    {} nodes, {} connections",
            best.best_node_count, best.best_connection_count
        );
        println!(
            "  Survival:    {:.1} ticks, {:.2} drinks per episode",
            best.best_stats.mean_ticks_survived, best.best_stats.mean_successful_drinks
        );
    }
    println!("  Output:      {}", run_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  {} mirage episode --brain genome --genome {}",
        "1.".blue(),
        run_dir.join("best_genome.json").display()
    );
    println!(
        "  {} mirage train --resume {}",
        "2.".blue(),
        run_dir.join("checkpoint.json").display()
    );

    Ok(())
}

/// Command-line evaluation flags win over the config file or checkpoint.
fn apply_overrides(training: &mut TrainerConfig, args: &TrainArgs) {
    if args.sequential {
        training.parallel = false;
    }
    if args.threads.is_some() {
        training.threads = args.threads;
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
