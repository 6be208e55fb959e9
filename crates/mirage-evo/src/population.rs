//! One generation of genomes.

use crate::genome::Genome;
use crate::mutation::Evolver;
use mirage_core::error::{MirageError, Result};
use mirage_core::rng::DeterministicRng;
use serde::{Deserialize, Serialize};

/// An ordered list of genomes plus its generation number.
///
/// Replaced wholesale each generation, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    genomes: Vec<Genome>,
    generation: u64,
}

impl Population {
    pub fn new(genomes: Vec<Genome>, generation: u64) -> Result<Self> {
        if genomes.is_empty() {
            return Err(MirageError::invalid_config("population_size", "must be positive"));
        }
        Ok(Self { genomes, generation })
    }

    /// Generation zero: `size` fully connected genomes with random weights.
    pub fn initial(
        size: usize,
        input_count: usize,
        output_count: usize,
        evolver: &mut Evolver,
        rng: &mut DeterministicRng,
    ) -> Result<Self> {
        let genomes = (0..size)
            .map(|_| evolver.minimal_genome(input_count, output_count, rng))
            .collect::<Result<Vec<_>>>()?;
        Self::new(genomes, 0)
    }

    /// The population that follows this one.
    pub fn successor(&self, genomes: Vec<Genome>) -> Result<Self> {
        Self::new(genomes, self.generation + 1)
    }

    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    pub fn into_genomes(self) -> Vec<Genome> {
        self.genomes
    }
}
