//! Trainer — the generation loop.
//!
//! Each generation: pick the curriculum phase, evaluate every genome
//! (in parallel when enabled), rank, then breed the next population on a
//! single thread. Episode seeds are `base + genome_index·1000 + episode`,
//! so no evaluation shares RNG or world state with another and results do
//! not depend on thread count or scheduling.

use crate::curriculum::{CurriculumPhase, CurriculumSchedule};
use crate::genome::Genome;
use crate::innovation::InnovationTracker;
use crate::mutation::{Evolver, MutationConfig};
use crate::network::GenomeBrain;
use crate::population::Population;
use crate::selection::{next_generation, rank};
use crate::serialize::GenomeFile;
use mirage_core::checksum::fold;
use mirage_core::config::SimulationConfig;
use mirage_core::error::{ensure_unit_interval, MirageError, Result};
use mirage_core::rng::DeterministicRng;
use mirage_sim::brain::Brain;
use mirage_sim::episode::{run_episode, EpisodeResult, EpisodeStats};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Seed stride between consecutive genomes.
pub const GENOME_SEED_STRIDE: u64 = 1000;
/// Checkpoint file format version.
pub const CHECKPOINT_FORMAT_VERSION: u32 = 1;

const EVOLUTION_STREAM: u64 = 0x4556_4f4c_5645_0001;

/// Training loop parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Best genomes copied unchanged into the next generation.
    #[serde(default = "default_elite_count")]
    pub elite_count: usize,
    /// Chance that a non-elite child is mutated after cloning.
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    #[serde(default = "default_episodes_per_genome")]
    pub episodes_per_genome: u64,
    #[serde(default = "default_generations")]
    pub generations: u64,
    /// Evaluate genomes with rayon.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Dedicated thread pool size; `None` uses rayon's global pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

fn default_population_size() -> usize { 32 }
fn default_elite_count() -> usize { 2 }
fn default_mutation_rate() -> f64 { 0.8 }
fn default_episodes_per_genome() -> u64 { 2 }
fn default_generations() -> u64 { 25 }
fn default_parallel() -> bool { true }

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            elite_count: default_elite_count(),
            mutation_rate: default_mutation_rate(),
            episodes_per_genome: default_episodes_per_genome(),
            generations: default_generations(),
            parallel: default_parallel(),
            threads: None,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(MirageError::invalid_config("training.population_size", "must be positive"));
        }
        if self.elite_count > self.population_size {
            return Err(MirageError::invalid_config(
                "training.elite_count",
                format!(
                    "{} exceeds population size {}",
                    self.elite_count, self.population_size
                ),
            ));
        }
        ensure_unit_interval("training.mutation_rate", self.mutation_rate)?;
        if self.episodes_per_genome == 0 {
            return Err(MirageError::invalid_config(
                "training.episodes_per_genome",
                "must be positive",
            ));
        }
        if self.threads == Some(0) {
            return Err(MirageError::invalid_config("training.threads", "must be positive"));
        }
        Ok(())
    }
}

/// Everything reported about one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub generation: u64,
    pub phase: CurriculumPhase,
    pub best_adjusted: f64,
    pub mean_adjusted: f64,
    pub worst_adjusted: f64,
    pub best_raw: f64,
    pub best_index: usize,
    pub best_genome: Genome,
    pub best_node_count: usize,
    pub best_connection_count: usize,
    /// Episode statistics for the best genome.
    pub best_stats: EpisodeStats,
    /// Raw fitness per genome, in population order.
    pub raw_fitness: Vec<f64>,
    /// Adjusted fitness per genome, in population order.
    pub adjusted_fitness: Vec<f64>,
}

/// Resumable snapshot of a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerCheckpoint {
    pub format_version: u32,
    /// Generation the stored population is about to be evaluated as.
    pub generation: u64,
    pub genomes: Vec<GenomeFile>,
    pub rng_state: u64,
    pub simulation: SimulationConfig,
    pub training: TrainerConfig,
    pub mutation: MutationConfig,
    pub curriculum: CurriculumSchedule,
}

pub struct Trainer {
    base: SimulationConfig,
    config: TrainerConfig,
    curriculum: CurriculumSchedule,
    evolver: Evolver,
    population: Population,
    rng: DeterministicRng,
    pool: Option<rayon::ThreadPool>,
}

impl Trainer {
    /// Start a fresh run. The initial population is fully connected with
    /// inputs and outputs sized from `base`.
    pub fn new(
        base: SimulationConfig,
        config: TrainerConfig,
        mutation: MutationConfig,
        curriculum: CurriculumSchedule,
    ) -> Result<Self> {
        base.validate()?;
        config.validate()?;
        curriculum.validate()?;
        mutation.check_capacity(
            base.brain_input_count() + base.brain_output_count(),
            base.brain_input_count() * base.brain_output_count(),
        )?;
        let mut evolver = Evolver::new(mutation)?;
        let mut rng = DeterministicRng::new(fold([base.seed, EVOLUTION_STREAM]));
        let population = Population::initial(
            config.population_size,
            base.brain_input_count(),
            base.brain_output_count(),
            &mut evolver,
            &mut rng,
        )?;
        let pool = build_pool(config.threads)?;
        info!(
            population = config.population_size,
            inputs = base.brain_input_count(),
            outputs = base.brain_output_count(),
            "trainer initialized"
        );
        Ok(Self {
            base,
            config,
            curriculum,
            evolver,
            population,
            rng,
            pool,
        })
    }

    /// Continue from a checkpoint. The innovation table is rebuilt by
    /// scanning the stored genomes.
    pub fn resume(checkpoint: TrainerCheckpoint) -> Result<Self> {
        if checkpoint.format_version != CHECKPOINT_FORMAT_VERSION {
            return Err(MirageError::invalid_config(
                "checkpoint.format_version",
                format!("unsupported version {}", checkpoint.format_version),
            ));
        }
        checkpoint.simulation.validate()?;
        checkpoint.training.validate()?;
        checkpoint.curriculum.validate()?;
        let genomes = checkpoint
            .genomes
            .into_iter()
            .map(GenomeFile::into_genome)
            .collect::<Result<Vec<_>>>()?;
        if genomes.len() != checkpoint.training.population_size {
            return Err(MirageError::invalid_config(
                "checkpoint.genomes",
                format!(
                    "{} genomes for population size {}",
                    genomes.len(),
                    checkpoint.training.population_size
                ),
            ));
        }
        for genome in &genomes {
            checkpoint
                .mutation
                .check_capacity(genome.node_count(), genome.connection_count())?;
        }
        let tracker = InnovationTracker::resume(&genomes)?;
        let evolver = Evolver::with_tracker(checkpoint.mutation, tracker)?;
        let population = Population::new(genomes, checkpoint.generation)?;
        let pool = build_pool(checkpoint.training.threads)?;
        info!(generation = checkpoint.generation, "trainer resumed");
        Ok(Self {
            base: checkpoint.simulation,
            config: checkpoint.training,
            curriculum: checkpoint.curriculum,
            evolver,
            population,
            rng: DeterministicRng::from_state(checkpoint.rng_state),
            pool,
        })
    }

    pub fn checkpoint(&self) -> TrainerCheckpoint {
        TrainerCheckpoint {
            format_version: CHECKPOINT_FORMAT_VERSION,
            generation: self.population.generation(),
            genomes: self.population.genomes().iter().map(GenomeFile::from).collect(),
            rng_state: self.rng.state(),
            simulation: self.base.clone(),
            training: self.config.clone(),
            mutation: self.evolver.config().clone(),
            curriculum: self.curriculum.clone(),
        }
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Generation the current population will be evaluated as.
    pub fn generation(&self) -> u64 {
        self.population.generation()
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn base_config(&self) -> &SimulationConfig {
        &self.base
    }

    pub fn evolver(&self) -> &Evolver {
        &self.evolver
    }

    /// Episode results per genome for the current population under `config`.
    pub fn evaluate(&self, config: &SimulationConfig) -> Result<Vec<Vec<EpisodeResult>>> {
        let genomes = self.population.genomes();
        let episodes = self.config.episodes_per_genome;
        if !self.config.parallel {
            return genomes
                .iter()
                .enumerate()
                .map(|(index, genome)| evaluate_genome(genome, index, config, episodes))
                .collect();
        }
        let run = || {
            genomes
                .par_iter()
                .enumerate()
                .map(|(index, genome)| evaluate_genome(genome, index, config, episodes))
                .collect::<Result<Vec<_>>>()
        };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    /// Evaluate the current population, then replace it with the next one.
    pub fn run_generation(&mut self) -> Result<GenerationResult> {
        let generation = self.population.generation();
        let phase = self.curriculum.phase_for(generation);
        let config = phase.apply(&self.base);

        let episodes = self.evaluate(&config)?;
        let raw_fitness: Vec<f64> = episodes
            .iter()
            .map(|results| EpisodeStats::from_results(results).mean_fitness)
            .collect();
        let genomes = self.population.genomes();
        let ranked = rank(genomes, &raw_fitness)?;

        let mut adjusted_fitness = vec![0.0; genomes.len()];
        for r in &ranked {
            adjusted_fitness[r.index] = r.adjusted;
        }
        // rank() guarantees at least one entry for a non-empty population.
        let best = ranked[0];
        let worst = ranked[ranked.len() - 1];
        let best_genome = genomes[best.index].clone();
        let result = GenerationResult {
            generation,
            phase,
            best_adjusted: best.adjusted,
            mean_adjusted: adjusted_fitness.iter().sum::<f64>() / adjusted_fitness.len() as f64,
            worst_adjusted: worst.adjusted,
            best_raw: best.raw,
            best_index: best.index,
            best_node_count: best_genome.node_count(),
            best_connection_count: best_genome.connection_count(),
            best_genome,
            best_stats: EpisodeStats::from_results(&episodes[best.index]),
            raw_fitness,
            adjusted_fitness,
        };

        let next = next_generation(
            genomes,
            &result.raw_fitness,
            self.config.elite_count,
            self.config.mutation_rate,
            &mut self.evolver,
            &mut self.rng,
        )?;
        self.population = self.population.successor(next)?;

        info!(
            generation,
            best = result.best_adjusted,
            mean = result.mean_adjusted,
            worst = result.worst_adjusted,
            nodes = result.best_node_count,
            connections = result.best_connection_count,
            "generation complete"
        );
        Ok(result)
    }

    /// Run `config.generations` generations.
    pub fn run(&mut self) -> Result<Vec<GenerationResult>> {
        let mut results = Vec::with_capacity(self.config.generations as usize);
        for _ in 0..self.config.generations {
            results.push(self.run_generation()?);
        }
        Ok(results)
    }
}

/// Seed for one genome's episode.
pub fn episode_seed(base: u64, genome_index: usize, episode: u64) -> u64 {
    base.wrapping_add((genome_index as u64).wrapping_mul(GENOME_SEED_STRIDE))
        .wrapping_add(episode)
}

/// Run every episode of one genome. Every agent gets its own copy of the
/// compiled network.
pub fn evaluate_genome(
    genome: &Genome,
    index: usize,
    config: &SimulationConfig,
    episodes: u64,
) -> Result<Vec<EpisodeResult>> {
    let brain = GenomeBrain::for_simulation(genome, config)?;
    (0..episodes)
        .map(|episode| {
            let seeded = config.with_seed(episode_seed(config.seed, index, episode));
            let result = run_episode(&seeded, |_| -> Box<dyn Brain> { Box::new(brain.clone()) })?;
            debug!(
                genome = index,
                episode,
                seed = seeded.seed,
                fitness = result.fitness,
                "episode evaluated"
            );
            Ok(result)
        })
        .collect()
}

fn build_pool(threads: Option<usize>) -> Result<Option<rayon::ThreadPool>> {
    threads
        .map(|n| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| MirageError::invalid_config("training.threads", e.to_string()))
        })
        .transpose()
}

pub fn save_checkpoint(checkpoint: &TrainerCheckpoint, path: &Path) -> Result<()> {
    std::fs::write(path, serde_json::to_string(checkpoint)?)?;
    Ok(())
}

pub fn load_checkpoint(path: &Path) -> Result<TrainerCheckpoint> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_world() -> SimulationConfig {
        SimulationConfig {
            seed: 99,
            world_width: 12,
            world_height: 12,
            agent_count: 2,
            ticks_per_episode: 30,
            vision_ray_count: 3,
            embedding_dim: 2,
            ..Default::default()
        }
    }

    fn small_training() -> TrainerConfig {
        TrainerConfig {
            population_size: 6,
            elite_count: 1,
            episodes_per_genome: 2,
            generations: 2,
            parallel: false,
            ..Default::default()
        }
    }

    #[test]
    fn seed_formula() {
        assert_eq!(episode_seed(100, 0, 0), 100);
        assert_eq!(episode_seed(100, 3, 1), 3101);
        assert_eq!(episode_seed(u64::MAX, 0, 1), 0);
    }

    #[test]
    fn initial_population_matches_brain_shape() {
        let trainer = Trainer::new(
            small_world(),
            small_training(),
            MutationConfig::default(),
            CurriculumSchedule::default(),
        )
        .unwrap();
        let genome = &trainer.population().genomes()[0];
        assert_eq!(genome.input_count(), 3 * 3 + 2);
        assert_eq!(genome.output_count(), 3 + 2);
        assert_eq!(trainer.generation(), 0);
    }

    #[test]
    fn generation_result_is_consistent() {
        let mut trainer = Trainer::new(
            small_world(),
            small_training(),
            MutationConfig::default(),
            CurriculumSchedule::fixed_from(&small_world()),
        )
        .unwrap();
        let result = trainer.run_generation().unwrap();
        assert_eq!(result.generation, 0);
        assert_eq!(result.raw_fitness.len(), 6);
        assert!(result.best_adjusted >= result.mean_adjusted);
        assert!(result.mean_adjusted >= result.worst_adjusted);
        assert_eq!(result.adjusted_fitness[result.best_index], result.best_adjusted);
        assert_eq!(result.best_stats.episodes, 2);
        assert_eq!(trainer.generation(), 1);
        // The elite leads the next population unchanged.
        assert_eq!(trainer.population().genomes()[0], result.best_genome);
    }

    #[test]
    fn invalid_training_config_fails_fast() {
        let bad = TrainerConfig {
            elite_count: 10,
            ..small_training()
        };
        let err = Trainer::new(small_world(), bad, MutationConfig::default(), CurriculumSchedule::default());
        assert!(err.err().map(|e| e.is_invalid_config()).unwrap_or(false));
        assert!(TrainerConfig { threads: Some(0), ..Default::default() }.validate().is_err());
    }

    #[test]
    fn starting_genome_over_the_caps_is_rejected() {
        let wide = SimulationConfig {
            vision_ray_count: 16,
            ..Default::default()
        };
        // 16 rays · (1 + 3) + 2 inputs plus 5 outputs: 71 nodes.
        let err = Trainer::new(
            wide,
            small_training(),
            MutationConfig::default(),
            CurriculumSchedule::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(
            &err,
            MirageError::InvalidConfiguration { field, .. } if field == "mutation.max_nodes"
        ));

        // 11 inputs · 5 outputs: 55 connections.
        let tight = MutationConfig {
            max_connections: 40,
            ..Default::default()
        };
        let err = Trainer::new(small_world(), small_training(), tight, CurriculumSchedule::default())
            .err()
            .unwrap();
        assert!(matches!(
            &err,
            MirageError::InvalidConfiguration { field, .. } if field == "mutation.max_connections"
        ));
    }

    #[test]
    fn resume_rejects_genomes_over_the_caps() {
        let mut checkpoint = Trainer::new(
            small_world(),
            small_training(),
            MutationConfig::default(),
            CurriculumSchedule::default(),
        )
        .unwrap()
        .checkpoint();
        checkpoint.mutation.max_nodes = 8;
        let err = Trainer::resume(checkpoint).err().unwrap();
        assert!(err.is_invalid_config());
    }

    #[test]
    fn checkpoint_restores_population_and_rng() {
        let mut trainer = Trainer::new(
            small_world(),
            small_training(),
            MutationConfig::default(),
            CurriculumSchedule::default(),
        )
        .unwrap();
        trainer.run_generation().unwrap();
        let checkpoint = trainer.checkpoint();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        save_checkpoint(&checkpoint, &path).unwrap();
        let resumed = Trainer::resume(load_checkpoint(&path).unwrap()).unwrap();

        assert_eq!(resumed.generation(), 1);
        assert_eq!(resumed.population(), trainer.population());
        assert_eq!(resumed.checkpoint().rng_state, checkpoint.rng_state);
        assert!(resumed.evolver().tracker().next_node_id() <= trainer.evolver().tracker().next_node_id());
    }
}
