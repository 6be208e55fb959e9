//! Simulation configuration.
//!
//! Everything needed to regenerate an episode bit-for-bit lives here; a
//! replay header stores a full copy of this struct.

use crate::error::{ensure_non_negative, ensure_positive, ensure_unit_interval, MirageError, Result};
use serde::{Deserialize, Serialize};

/// Parameters for one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Episode seed; drives world generation and spawning.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Seconds per tick.
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Tick budget for one episode.
    #[serde(default = "default_ticks")]
    pub ticks_per_episode: u64,
    #[serde(default = "default_world_size")]
    pub world_width: u32,
    #[serde(default = "default_world_size")]
    pub world_height: u32,
    /// Agents sharing the world.
    #[serde(default = "default_agent_count")]
    pub agent_count: u32,

    #[serde(default = "default_ray_count")]
    pub vision_ray_count: u32,
    /// Maximum ray length, in tiles.
    #[serde(default = "default_vision_range")]
    pub vision_range: f64,
    /// Total field of view, in radians.
    #[serde(default = "default_vision_fov")]
    pub vision_fov: f64,
    /// Distance between ray samples, in tiles.
    #[serde(default = "default_vision_step")]
    pub vision_step: f64,

    /// Tiles per second.
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
    /// Radians per second.
    #[serde(default = "default_turn_rate")]
    pub turn_rate: f64,
    /// Steering requests shorter than this are ignored.
    #[serde(default = "default_move_deadzone")]
    pub move_deadzone: f64,

    /// Thirst gained per second.
    #[serde(default = "default_thirst_rate")]
    pub thirst_rate: f64,
    /// Seconds an agent survives at full thirst.
    #[serde(default = "default_death_grace")]
    pub death_grace_seconds: f64,
    /// Thirst removed by one successful drink.
    #[serde(default = "default_drink_amount")]
    pub drink_amount: f64,

    /// How strongly the water blob is pulled toward the spawn area.
    #[serde(default = "default_water_bias")]
    pub water_bias: f64,
    /// Fraction of tiles turned into obstacles.
    #[serde(default = "default_obstacle_density")]
    pub obstacle_density: f64,

    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: u32,
    #[serde(default = "default_embedding_seed")]
    pub embedding_seed: u64,
    /// Length of the brain's action-preference vector.
    #[serde(default = "default_action_preference_count")]
    pub action_preference_count: u32,
}

// Default value functions
fn default_seed() -> u64 { 12345 }
fn default_dt() -> f64 { 1.0 }
fn default_ticks() -> u64 { 400 }
fn default_world_size() -> u32 { 32 }
fn default_agent_count() -> u32 { 4 }
fn default_ray_count() -> u32 { 5 }
fn default_vision_range() -> f64 { 8.0 }
fn default_vision_fov() -> f64 { std::f64::consts::FRAC_PI_2 }
fn default_vision_step() -> f64 { 0.5 }
fn default_max_speed() -> f64 { 1.0 }
fn default_turn_rate() -> f64 { std::f64::consts::FRAC_PI_4 }
fn default_move_deadzone() -> f64 { 0.05 }
fn default_thirst_rate() -> f64 { 0.01 }
fn default_death_grace() -> f64 { 10.0 }
fn default_drink_amount() -> f64 { 0.5 }
fn default_water_bias() -> f64 { 0.5 }
fn default_obstacle_density() -> f64 { 0.08 }
fn default_embedding_dim() -> u32 { 3 }
fn default_embedding_seed() -> u64 { 7 }
fn default_action_preference_count() -> u32 { 2 }

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            dt: default_dt(),
            ticks_per_episode: default_ticks(),
            world_width: default_world_size(),
            world_height: default_world_size(),
            agent_count: default_agent_count(),
            vision_ray_count: default_ray_count(),
            vision_range: default_vision_range(),
            vision_fov: default_vision_fov(),
            vision_step: default_vision_step(),
            max_speed: default_max_speed(),
            turn_rate: default_turn_rate(),
            move_deadzone: default_move_deadzone(),
            thirst_rate: default_thirst_rate(),
            death_grace_seconds: default_death_grace(),
            drink_amount: default_drink_amount(),
            water_bias: default_water_bias(),
            obstacle_density: default_obstacle_density(),
            embedding_dim: default_embedding_dim(),
            embedding_seed: default_embedding_seed(),
            action_preference_count: default_action_preference_count(),
        }
    }
}

impl SimulationConfig {
    /// Copy of this config with a different seed.
    pub fn with_seed(&self, seed: u64) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }

    /// Length of the perception vector produced per agent-tick.
    pub fn vision_len(&self) -> usize {
        self.vision_ray_count as usize * (1 + self.embedding_dim as usize)
    }

    /// Brain input width: vision, thirst, bias.
    pub fn brain_input_count(&self) -> usize {
        self.vision_len() + 2
    }

    /// Brain output width: steer x/y, action score, action preferences.
    pub fn brain_output_count(&self) -> usize {
        3 + self.action_preference_count as usize
    }

    /// Check every field; violations are reported, never clamped.
    pub fn validate(&self) -> Result<()> {
        ensure_positive("dt", self.dt)?;
        if self.ticks_per_episode == 0 {
            return Err(MirageError::invalid_config("ticks_per_episode", "must be positive"));
        }
        if self.world_width == 0 || self.world_height == 0 {
            return Err(MirageError::invalid_config(
                "world_width/world_height",
                format!("{}x{} must be positive", self.world_width, self.world_height),
            ));
        }
        if self.agent_count == 0 {
            return Err(MirageError::invalid_config("agent_count", "must be positive"));
        }
        if self.vision_ray_count == 0 {
            return Err(MirageError::invalid_config("vision_ray_count", "must be positive"));
        }
        ensure_positive("vision_range", self.vision_range)?;
        ensure_positive("vision_step", self.vision_step)?;
        ensure_non_negative("vision_fov", self.vision_fov)?;
        if self.vision_fov > std::f64::consts::TAU {
            return Err(MirageError::invalid_config("vision_fov", "must not exceed 2π"));
        }
        ensure_non_negative("max_speed", self.max_speed)?;
        ensure_non_negative("turn_rate", self.turn_rate)?;
        ensure_non_negative("move_deadzone", self.move_deadzone)?;
        ensure_non_negative("thirst_rate", self.thirst_rate)?;
        ensure_non_negative("death_grace_seconds", self.death_grace_seconds)?;
        ensure_non_negative("drink_amount", self.drink_amount)?;
        ensure_unit_interval("water_bias", self.water_bias)?;
        ensure_unit_interval("obstacle_density", self.obstacle_density)?;
        Ok(())
    }
}
