//! Mirage Core Prelude — convenient imports for common usage.
//!
//! ```rust
//! use mirage_core::prelude::*;
//! ```

pub use crate::checksum::{combine, fold, quantize_milli, Fnv1a};
pub use crate::config::SimulationConfig;
pub use crate::error::{MirageError, Result};
pub use crate::rng::DeterministicRng;
pub use crate::types::{round3, wrap_angle, Tick, Vec2};
