//! Selection and generational replacement.
//!
//! Ranking is a total order (adjusted fitness, raw fitness, complexity,
//! original index) so the same fitness array always selects the same
//! parents.

use crate::genome::Genome;
use crate::mutation::Evolver;
use mirage_core::error::{MirageError, Result};
use mirage_core::rng::DeterministicRng;
use std::cmp::Ordering;

/// Penalty per node in the adjusted fitness.
pub const NODE_PENALTY: f64 = 0.01;
/// Penalty per connection gene in the adjusted fitness.
pub const CONNECTION_PENALTY: f64 = 0.001;
/// Share of the ranked population eligible as parents.
pub const PARENT_POOL_FRACTION: f64 = 0.2;

/// Raw fitness minus the complexity penalty. Used for ranking only.
pub fn adjusted_fitness(raw: f64, genome: &Genome) -> f64 {
    raw - (NODE_PENALTY * genome.node_count() as f64
        + CONNECTION_PENALTY * genome.connection_count() as f64)
}

/// One genome's ranking keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    pub index: usize,
    pub adjusted: f64,
    pub raw: f64,
    pub complexity: usize,
}

fn rank_order(a: &Ranked, b: &Ranked) -> Ordering {
    b.adjusted
        .total_cmp(&a.adjusted)
        .then_with(|| b.raw.total_cmp(&a.raw))
        .then_with(|| a.complexity.cmp(&b.complexity))
        .then_with(|| a.index.cmp(&b.index))
}

/// Rank genomes best first. NaN fitness ranks last.
pub fn rank(genomes: &[Genome], raw_fitness: &[f64]) -> Result<Vec<Ranked>> {
    if genomes.len() != raw_fitness.len() {
        return Err(MirageError::invalid_config(
            "fitness",
            format!(
                "{} fitness values for {} genomes",
                raw_fitness.len(),
                genomes.len()
            ),
        ));
    }
    let mut ranked: Vec<Ranked> = genomes
        .iter()
        .zip(raw_fitness)
        .enumerate()
        .map(|(index, (genome, &raw))| {
            let raw = if raw.is_nan() { f64::NEG_INFINITY } else { raw };
            Ranked {
                index,
                adjusted: adjusted_fitness(raw, genome),
                raw,
                complexity: genome.complexity(),
            }
        })
        .collect();
    ranked.sort_by(rank_order);
    Ok(ranked)
}

/// Size of the parent pool: `⌈0.2·n⌉`, at least one.
pub fn parent_pool_size(population_size: usize) -> usize {
    let pool = (PARENT_POOL_FRACTION * population_size as f64).ceil() as usize;
    pool.clamp(1, population_size.max(1))
}

/// Build the next generation: elites unchanged, the rest cloned from the
/// parent pool and mutated with probability `mutation_rate`.
pub fn next_generation(
    genomes: &[Genome],
    raw_fitness: &[f64],
    elite_count: usize,
    mutation_rate: f64,
    evolver: &mut Evolver,
    rng: &mut DeterministicRng,
) -> Result<Vec<Genome>> {
    if genomes.is_empty() {
        return Err(MirageError::invalid_config("population", "must not be empty"));
    }
    if elite_count > genomes.len() {
        return Err(MirageError::invalid_config(
            "elite_count",
            format!("{} exceeds population size {}", elite_count, genomes.len()),
        ));
    }
    let ranked = rank(genomes, raw_fitness)?;
    let pool = parent_pool_size(genomes.len()).min(ranked.len());

    let mut next = Vec::with_capacity(genomes.len());
    next.extend(ranked.iter().take(elite_count).map(|r| genomes[r.index].clone()));
    while next.len() < genomes.len() {
        let parent = &genomes[ranked[rng.next_index(pool)].index];
        if rng.chance(mutation_rate) {
            next.push(evolver.mutate(parent, rng).0);
        } else {
            next.push(parent.clone());
        }
    }
    Ok(next)
}
