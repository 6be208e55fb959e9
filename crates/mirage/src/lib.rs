//! # Mirage
//!
//! Neuroevolution of simple survival controllers in a procedurally
//! generated grid world.
//!
//! Agents manage thirst, avoid death and explore. Their brains are
//! feed-forward networks whose topology grows by mutation, and every
//! episode is bit-for-bit reproducible from its seed, sequentially or in
//! parallel, so any run can be replayed and checked.
//!
//! ## Quick Start
//!
//! ```rust
//! use mirage::prelude::*;
//!
//! // Score a hand-written brain on one episode
//! let config = SimulationConfig {
//!     ticks_per_episode: 60,
//!     ..Default::default()
//! };
//! let result = run_episode(&config, |_| Box::new(WaterSeekerBrain::new(&config))).unwrap();
//! println!("fitness {:.3}, checksum {:016x}", result.fitness, result.checksum);
//!
//! // Record the same episode and verify it tick by tick
//! let recording = record(&config, |_| Box::new(WaterSeekerBrain::new(&config))).unwrap();
//! let report = verify(&recording, |_| Box::new(WaterSeekerBrain::new(&config))).unwrap();
//! assert!(report.success);
//! ```
//!
//! ## Architecture
//!
//! - [`mirage_core`] - RNG, checksums, geometry, configuration, errors
//! - [`mirage_sim`] - world, vision, agents, brains, simulation, replay
//! - [`mirage_evo`] - genomes, mutation, selection, network compiler, trainer
//!
//! ## Key Concepts
//!
//! | Concept | What It Is |
//! |---------|------------|
//! | Episode | One bounded simulation run used to score a genome |
//! | Innovation id | Run-wide marker for one `(source, target)` connection |
//! | Adjusted fitness | Raw fitness minus a complexity penalty |
//! | Checksum | 64-bit FNV-1a fold over world and agent state |
//! | Curriculum phase | Environment difficulty assigned to a generation |

pub use mirage_core;
pub use mirage_evo;
pub use mirage_sim;

/// Prelude module for convenient imports.
///
/// ```rust
/// use mirage::prelude::*;
/// ```
pub mod prelude {
    // Core, simulation and evolution types
    pub use mirage_evo::prelude::*;
}
