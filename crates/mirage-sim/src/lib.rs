//! # Mirage Sim
//!
//! The deterministic simulation substrate the evolver uses as its fitness
//! oracle:
//!
//! - **world** — seeded tile grid (empty, solid, water)
//! - **vision** — ray-marched perception with per-tile embeddings
//! - **agent** — thirst, death grace, movement, drinking
//! - **brain** — the `Brain` capability plus hand-coded brains
//! - **simulation** — the tick loop and checksums
//! - **episode** — `EpisodeResult` and the fitness function
//! - **replay** — record and verify exact reproduction
//!
//! ## Quick Start
//!
//! ```rust
//! use mirage_sim::prelude::*;
//!
//! let config = SimulationConfig {
//!     ticks_per_episode: 50,
//!     ..Default::default()
//! };
//! let result = run_episode(&config, |_| Box::new(WaterSeekerBrain::new(&config))).unwrap();
//! assert!(result.ticks_survived <= 50);
//! ```

pub mod agent;
pub mod brain;
pub mod episode;
pub mod replay;
pub mod simulation;
pub mod vision;
pub mod world;
pub mod prelude;
