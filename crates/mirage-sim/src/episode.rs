//! Episode results and the fitness function.

use crate::brain::Brain;
use crate::simulation::Simulation;
use mirage_core::config::SimulationConfig;
use mirage_core::error::Result;
use serde::{Deserialize, Serialize};

/// Weight of the survival term.
pub const SURVIVAL_WEIGHT: f64 = 1.0;
/// Weight of the hydration term (1 - mean thirst).
pub const HYDRATION_WEIGHT: f64 = 0.5;
/// Weight of the exploration term (visited share of the world).
pub const EXPLORATION_WEIGHT: f64 = 0.25;
/// Weight per successful drink, per agent.
pub const DRINK_WEIGHT: f64 = 0.05;

/// Summary of one finished episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeResult {
    pub seed: u64,
    pub ticks_requested: u64,
    /// Ticks actually executed (stops early once every agent is dead).
    pub ticks_survived: u64,
    pub agent_count: u64,
    /// Sum of every agent's lifetime, in ticks.
    pub agent_ticks_alive: u64,
    pub successful_drinks: u64,
    pub failed_drinks: u64,
    pub average_thirst: f64,
    pub distance_traveled: f64,
    pub visited_cells: u64,
    pub drinkable_cells_visited: u64,
    pub fitness: f64,
    pub checksum: u64,
}

impl EpisodeResult {
    pub fn from_simulation(sim: &Simulation) -> Self {
        let config = sim.config();
        let agents = sim.agents();
        let mut result = Self {
            seed: config.seed,
            ticks_requested: config.ticks_per_episode,
            ticks_survived: sim.tick(),
            agent_count: agents.len() as u64,
            agent_ticks_alive: agents.iter().map(|a| a.ticks_alive).sum(),
            successful_drinks: agents.iter().map(|a| a.successful_drinks).sum(),
            failed_drinks: agents.iter().map(|a| a.failed_drinks).sum(),
            average_thirst: sim.average_thirst(),
            distance_traveled: sim.distance_traveled(),
            visited_cells: sim.visited_cells() as u64,
            drinkable_cells_visited: sim.drinkable_cells_visited() as u64,
            fitness: 0.0,
            checksum: sim.total_checksum(),
        };
        let world_cells = u64::from(config.world_width) * u64::from(config.world_height);
        result.fitness = result.score(world_cells);
        result
    }

    /// Mean agent lifetime as a fraction of the tick budget.
    pub fn survival(&self) -> f64 {
        if self.agent_count == 0 || self.ticks_requested == 0 {
            return 0.0;
        }
        self.agent_ticks_alive as f64 / (self.agent_count * self.ticks_requested) as f64
    }

    fn score(&self, world_cells: u64) -> f64 {
        let hydration = 1.0 - self.average_thirst;
        let exploration = (self.visited_cells as f64 / world_cells.max(1) as f64).min(1.0);
        let drinks_per_agent = self.successful_drinks as f64 / self.agent_count.max(1) as f64;
        SURVIVAL_WEIGHT * self.survival()
            + HYDRATION_WEIGHT * hydration
            + EXPLORATION_WEIGHT * exploration
            + DRINK_WEIGHT * drinks_per_agent
    }
}

/// Build, run and summarize one episode.
pub fn run_episode<F>(config: &SimulationConfig, make_brain: F) -> Result<EpisodeResult>
where
    F: FnMut(usize) -> Box<dyn Brain>,
{
    Ok(Simulation::new(config.clone(), make_brain)?.run())
}

/// Means over a set of episodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    pub episodes: u64,
    pub mean_fitness: f64,
    pub mean_ticks_survived: f64,
    pub mean_successful_drinks: f64,
    pub mean_average_thirst: f64,
    pub mean_distance_traveled: f64,
    pub mean_visited_cells: f64,
    pub mean_drinkable_cells_visited: f64,
}

impl EpisodeStats {
    pub fn from_results(results: &[EpisodeResult]) -> Self {
        if results.is_empty() {
            return Self::default();
        }
        let n = results.len() as f64;
        let mean = |f: fn(&EpisodeResult) -> f64| results.iter().map(f).sum::<f64>() / n;
        Self {
            episodes: results.len() as u64,
            mean_fitness: mean(|r| r.fitness),
            mean_ticks_survived: mean(|r| r.ticks_survived as f64),
            mean_successful_drinks: mean(|r| r.successful_drinks as f64),
            mean_average_thirst: mean(|r| r.average_thirst),
            mean_distance_traveled: mean(|r| r.distance_traveled),
            mean_visited_cells: mean(|r| r.visited_cells as f64),
            mean_drinkable_cells_visited: mean(|r| r.drinkable_cells_visited as f64),
        }
    }
}
