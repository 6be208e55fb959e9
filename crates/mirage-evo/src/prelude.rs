//! Mirage Evo Prelude — convenient imports for common usage.
//!
//! ```rust
//! use mirage_evo::prelude::*;
//! ```

pub use mirage_sim::prelude::*;

pub use crate::curriculum::{CurriculumPhase, CurriculumSchedule};
pub use crate::genome::{ConnectionGene, Genome, NodeGene, NodeKind};
pub use crate::innovation::InnovationTracker;
pub use crate::mutation::{connection_candidates, Evolver, MutationConfig, MutationReport};
pub use crate::network::GenomeBrain;
pub use crate::population::Population;
pub use crate::selection::{adjusted_fitness, next_generation, rank, Ranked};
pub use crate::serialize::{genome_from_json, genome_to_json, load_genome, save_genome, GenomeFile};
pub use crate::trainer::{
    episode_seed, evaluate_genome, load_checkpoint, save_checkpoint, GenerationResult, Trainer,
    TrainerCheckpoint, TrainerConfig,
};
