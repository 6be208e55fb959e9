//! # Mirage Evo
//!
//! Mutation-only neuroevolution of variable-topology feed-forward networks:
//!
//! - **genome** — node and connection genes with structural invariants
//! - **innovation** — run-wide innovation ids, resumable from saved genomes
//! - **mutation** — add-connection, add-node and weight operators
//! - **selection** — complexity-penalized ranking and generational replacement
//! - **network** — `GenomeBrain`, the compiled evaluator that drives agents
//! - **curriculum** — easy-to-hard environment schedule
//! - **trainer** — the generation loop with parallel evaluation
//!
//! ## Quick Start
//!
//! ```rust
//! use mirage_evo::prelude::*;
//!
//! let base = SimulationConfig {
//!     world_width: 12,
//!     world_height: 12,
//!     agent_count: 2,
//!     ticks_per_episode: 20,
//!     ..Default::default()
//! };
//! let training = TrainerConfig {
//!     population_size: 4,
//!     generations: 1,
//!     episodes_per_genome: 1,
//!     ..Default::default()
//! };
//! let mut trainer = Trainer::new(
//!     base,
//!     training,
//!     MutationConfig::default(),
//!     CurriculumSchedule::default(),
//! )
//! .unwrap();
//! let result = trainer.run_generation().unwrap();
//! assert_eq!(result.raw_fitness.len(), 4);
//! ```

pub mod curriculum;
pub mod genome;
pub mod innovation;
pub mod mutation;
pub mod network;
pub mod population;
pub mod selection;
pub mod serialize;
pub mod trainer;
pub mod prelude;
