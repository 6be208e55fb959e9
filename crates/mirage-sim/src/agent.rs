//! Agent physiology.
//!
//! Thirst rises every tick; an agent that sits at full thirst for the
//! whole death grace period dies, and death is final. Movement and drinking
//! are resolved against the world here, but the order of the per-tick
//! phases belongs to the simulation.

use crate::world::{GridWorld, Tile};
use mirage_core::config::SimulationConfig;
use mirage_core::types::{wrap_angle, Vec2};
use serde::{Deserialize, Serialize};

/// Per-agent mutable state, owned by exactly one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub position: Vec2,
    /// Facing, in radians within `[-π, π)`.
    pub heading: f64,
    /// Thirst in `[0, 1]`.
    pub thirst: f64,
    /// Seconds left at full thirst before death.
    pub grace_remaining: f64,
    pub alive: bool,
    /// Ticks this agent has been alive for.
    pub ticks_alive: u64,
    pub successful_drinks: u64,
    pub failed_drinks: u64,
    pub distance_traveled: f64,
}

/// Result of a movement request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// Request shorter than the deadzone; nothing happened.
    Suppressed,
    /// Destination tile is blocked; the agent turned but stayed put.
    Blocked,
    /// The agent moved by this distance.
    Moved(f64),
}

impl AgentState {
    pub fn new(position: Vec2, heading: f64, death_grace_seconds: f64) -> Self {
        Self {
            position,
            heading: wrap_angle(heading),
            thirst: 0.0,
            grace_remaining: death_grace_seconds,
            alive: true,
            ticks_alive: 0,
            successful_drinks: 0,
            failed_drinks: 0,
            distance_traveled: 0.0,
        }
    }

    /// Advance thirst by one tick. Returns `false` if the agent died.
    pub fn advance_thirst(&mut self, config: &SimulationConfig) -> bool {
        if !self.alive {
            return false;
        }
        self.thirst = (self.thirst + config.thirst_rate * config.dt).clamp(0.0, 1.0);
        if self.thirst >= 1.0 {
            self.grace_remaining -= config.dt;
            if self.grace_remaining <= 0.0 {
                self.grace_remaining = 0.0;
                self.alive = false;
                return false;
            }
        } else {
            self.grace_remaining = config.death_grace_seconds;
        }
        true
    }

    /// Apply a steering request given in the agent's local frame
    /// (x forward, y left).
    pub fn steer(&mut self, world: &GridWorld, request: Vec2, config: &SimulationConfig) -> MoveOutcome {
        let magnitude = request.length();
        if !magnitude.is_finite() || magnitude < config.move_deadzone || magnitude == 0.0 {
            return MoveOutcome::Suppressed;
        }
        let max_turn = config.turn_rate * config.dt;
        let turn = request.angle().clamp(-max_turn, max_turn);
        self.heading = wrap_angle(self.heading + turn);

        let speed = magnitude.min(1.0) * config.max_speed * config.dt;
        let target = self.position.add(&Vec2::from_angle(self.heading).scale(speed));
        if world.tile_at_point(&target).is_blocking() {
            return MoveOutcome::Blocked;
        }
        let moved = self.position.distance_to(&target);
        self.position = target;
        self.distance_traveled += moved;
        MoveOutcome::Moved(moved)
    }

    /// Attempt to drink. Succeeds only with water on or next to the agent's tile.
    pub fn drink(&mut self, world: &GridWorld, config: &SimulationConfig) -> bool {
        let (x, y) = self.position.tile();
        if world.water_adjacent(x, y) {
            self.thirst = (self.thirst - config.drink_amount).max(0.0);
            self.successful_drinks += 1;
            true
        } else {
            self.failed_drinks += 1;
            false
        }
    }

    /// Whether the agent currently stands where a drink would succeed.
    pub fn can_drink(&self, world: &GridWorld) -> bool {
        let (x, y) = self.position.tile();
        world.water_adjacent(x, y)
    }

    /// Tile the agent occupies.
    pub fn cell(&self) -> (i64, i64) {
        self.position.tile()
    }

    /// Tile under the agent; always `Empty` for a valid state.
    pub fn standing_on(&self, world: &GridWorld) -> Tile {
        world.tile_at_point(&self.position)
    }
}
