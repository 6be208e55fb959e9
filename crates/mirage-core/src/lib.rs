//! # Mirage Core
//!
//! Foundations shared by the simulation and evolution crates:
//!
//! - **rng** — splitmix64 generator; every reproducible draw comes from one
//! - **checksum** — the FNV-1a fold used for world, agent and total checksums
//! - **config** — `SimulationConfig` and its validation
//! - **error** — `MirageError` and the crate-wide `Result`
//!
//! ## Quick Start
//!
//! ```rust
//! use mirage_core::prelude::*;
//!
//! let mut rng = DeterministicRng::new(42);
//! let x = rng.range_f64(-1.0, 1.0);
//! assert!((-1.0..1.0).contains(&x));
//!
//! let config = SimulationConfig::default();
//! assert!(config.validate().is_ok());
//! ```

pub mod checksum;
pub mod config;
pub mod error;
pub mod rng;
pub mod types;
pub mod prelude;
