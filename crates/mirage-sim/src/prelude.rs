//! Mirage Sim Prelude — convenient imports for common usage.
//!
//! ```rust
//! use mirage_sim::prelude::*;
//! ```

pub use mirage_core::prelude::*;

pub use crate::agent::{AgentState, MoveOutcome};
pub use crate::brain::{
    AgentAction, AlwaysDrinkBrain, Brain, BrainInput, BrainOutput, FixedBrain, IdleBrain,
    WanderBrain, WaterSeekerBrain,
};
pub use crate::episode::{run_episode, EpisodeResult, EpisodeStats};
pub use crate::replay::{
    load_replay, record, save_replay, verify, AgentSnapshot, DivergenceField, ReplayRecord,
    VerificationReport,
};
pub use crate::simulation::Simulation;
pub use crate::vision::{TileEmbeddings, VisionConfig, VisionSensor};
pub use crate::world::{GridWorld, Tile, WorldParams};
