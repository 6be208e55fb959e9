//! One episode: a world, its agents, and the tick loop.
//!
//! Each tick visits living agents in index order and runs the same phases
//! for each: thirst, vision, brain, movement, discrete action. Ticks are
//! strictly sequential; nothing here is shared across threads.

use crate::agent::{AgentState, MoveOutcome};
use crate::brain::{AgentAction, Brain, BrainInput};
use crate::episode::EpisodeResult;
use crate::replay::AgentSnapshot;
use crate::vision::VisionSensor;
use crate::world::{GridWorld, Tile, WorldParams};
use mirage_core::checksum::{combine, fold, quantize_milli, Fnv1a};
use mirage_core::config::SimulationConfig;
use mirage_core::error::{MirageError, Result};
use mirage_core::rng::DeterministicRng;
use mirage_core::types::{Tick, Vec2};
use std::collections::HashSet;
use std::hash::Hasher;
use tracing::debug;

/// Salt separating the spawn stream from the world-generation stream.
const SPAWN_STREAM: u64 = 0x5350_4157_4E00_0001;
/// Attempts per agent before falling back to a row-major scan.
const SPAWN_ATTEMPTS: usize = 64;

/// A running episode.
pub struct Simulation {
    config: SimulationConfig,
    world: GridWorld,
    world_checksum: u64,
    sensor: VisionSensor,
    agents: Vec<AgentState>,
    brains: Vec<Box<dyn Brain>>,
    tick: Tick,
    distance_traveled: f64,
    visited: HashSet<(i64, i64)>,
    drinkable_visited: HashSet<(i64, i64)>,
    thirst_sum: f64,
    thirst_samples: u64,
}

impl Simulation {
    /// Generate the world from `config.seed` and spawn `config.agent_count`
    /// agents, asking `make_brain` for one brain per agent index.
    pub fn new<F>(config: SimulationConfig, make_brain: F) -> Result<Self>
    where
        F: FnMut(usize) -> Box<dyn Brain>,
    {
        config.validate()?;
        let world = GridWorld::generate(&WorldParams {
            width: config.world_width,
            height: config.world_height,
            seed: config.seed,
            obstacle_density: config.obstacle_density,
            water_bias: config.water_bias,
            spawn_hint: Some(spawn_hint(&config)),
        })?;
        Self::with_world(config, world, make_brain)
    }

    /// Run on a caller-supplied world (tests, debugging). The world must
    /// match the configured dimensions.
    pub fn with_world<F>(config: SimulationConfig, world: GridWorld, mut make_brain: F) -> Result<Self>
    where
        F: FnMut(usize) -> Box<dyn Brain>,
    {
        config.validate()?;
        if world.width() != config.world_width || world.height() != config.world_height {
            return Err(MirageError::invalid_config(
                "world",
                format!(
                    "world is {}x{} but config says {}x{}",
                    world.width(),
                    world.height(),
                    config.world_width,
                    config.world_height
                ),
            ));
        }

        let sensor = VisionSensor::from_simulation(&config)?;
        let agents = spawn_agents(&config, &world)?;
        let brains = (0..agents.len()).map(&mut make_brain).collect();
        let world_checksum = world.checksum();

        let mut sim = Self {
            config,
            world,
            world_checksum,
            sensor,
            agents,
            brains,
            tick: 0,
            distance_traveled: 0.0,
            visited: HashSet::new(),
            drinkable_visited: HashSet::new(),
            thirst_sum: 0.0,
            thirst_samples: 0,
        };
        for index in 0..sim.agents.len() {
            sim.mark_visited(index);
        }
        Ok(sim)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    pub fn agents(&self) -> &[AgentState] {
        &self.agents
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Brain identifier of agent 0, used for replay headers.
    pub fn brain_id(&self) -> String {
        self.brains
            .first()
            .map(|b| b.brain_id())
            .unwrap_or_default()
    }

    pub fn alive_count(&self) -> usize {
        self.agents.iter().filter(|a| a.alive).count()
    }

    /// Tick budget used up, or every agent dead.
    pub fn is_finished(&self) -> bool {
        self.tick >= self.config.ticks_per_episode || self.alive_count() == 0
    }

    /// Test/debug override: move an agent onto an unblocked tile before or between ticks.
    pub fn teleport_agent(&mut self, index: usize, position: Vec2) -> Result<()> {
        if index >= self.agents.len() {
            return Err(MirageError::invalid_config(
                "agent",
                format!("index {} out of range ({} agents)", index, self.agents.len()),
            ));
        }
        if self.world.tile_at_point(&position).is_blocking() {
            return Err(MirageError::invalid_config(
                "position",
                format!("({}, {}) is on a blocked tile", position.x, position.y),
            ));
        }
        self.agents[index].position = position;
        self.mark_visited(index);
        Ok(())
    }

    /// Advance one tick. Returns the tick's total checksum, or `None` once
    /// the episode has finished.
    pub fn step(&mut self) -> Option<u64> {
        if self.is_finished() {
            return None;
        }
        let config = &self.config;
        for index in 0..self.agents.len() {
            let agent = &mut self.agents[index];
            if !agent.alive {
                continue;
            }
            if !agent.advance_thirst(config) {
                debug!(tick = self.tick, agent = index, "agent died of thirst");
                continue;
            }

            let vision = self.sensor.sense(&self.world, &agent.position, agent.heading);
            let output = self.brains[index].decide_action(&BrainInput {
                vision: &vision,
                thirst: agent.thirst,
                bias: 1.0,
            });

            if let MoveOutcome::Moved(distance) = agent.steer(&self.world, output.steer, config) {
                self.distance_traveled += distance;
            }
            if output.action() == AgentAction::Drink {
                agent.drink(&self.world, config);
            }

            agent.ticks_alive += 1;
            self.thirst_sum += agent.thirst;
            self.thirst_samples += 1;

            let cell = agent.cell();
            if self.visited.insert(cell) && self.world.water_adjacent(cell.0, cell.1) {
                self.drinkable_visited.insert(cell);
            }
        }
        self.tick += 1;
        Some(self.total_checksum())
    }

    /// Step until the episode finishes; returns the final checksum.
    pub fn run_to_end(&mut self) -> u64 {
        while self.step().is_some() {}
        self.total_checksum()
    }

    /// Run to the end and summarize.
    pub fn run(mut self) -> EpisodeResult {
        self.run_to_end();
        let result = EpisodeResult::from_simulation(&self);
        debug!(
            seed = result.seed,
            ticks = result.ticks_survived,
            drinks = result.successful_drinks,
            fitness = result.fitness,
            "episode finished"
        );
        result
    }

    pub fn world_checksum(&self) -> u64 {
        self.world_checksum
    }

    /// Fold of tick, agent count, and every agent's fixed-point position.
    pub fn agents_checksum(&self) -> u64 {
        let mut hasher = Fnv1a::new();
        hasher.write_u64(self.tick);
        hasher.write_u64(self.agents.len() as u64);
        for agent in &self.agents {
            hasher.write_signed(quantize_milli(agent.position.x));
            hasher.write_signed(quantize_milli(agent.position.y));
        }
        hasher.finish()
    }

    pub fn total_checksum(&self) -> u64 {
        combine(self.world_checksum, self.agents_checksum())
    }

    /// Per-agent snapshot for replay frames.
    pub fn snapshot(&self) -> Vec<AgentSnapshot> {
        self.agents.iter().map(AgentSnapshot::from).collect()
    }

    pub fn distance_traveled(&self) -> f64 {
        self.distance_traveled
    }

    pub fn visited_cells(&self) -> usize {
        self.visited.len()
    }

    pub fn drinkable_cells_visited(&self) -> usize {
        self.drinkable_visited.len()
    }

    /// Mean thirst over all living agent-ticks.
    pub fn average_thirst(&self) -> f64 {
        if self.thirst_samples == 0 {
            0.0
        } else {
            self.thirst_sum / self.thirst_samples as f64
        }
    }

    /// Text snapshot: the world with `@` for living and `x` for dead agents.
    pub fn render(&self) -> String {
        let width = self.world.width() as usize;
        let mut grid: Vec<char> = self.world.tiles().iter().map(|t| t.glyph()).collect();
        for agent in &self.agents {
            let (x, y) = agent.cell();
            if self.world.in_bounds(x, y) {
                grid[y as usize * width + x as usize] = if agent.alive { '@' } else { 'x' };
            }
        }
        let mut out = String::with_capacity(grid.len() + self.world.height() as usize);
        for row in grid.chunks(width) {
            out.extend(row.iter());
            out.push('\n');
        }
        out
    }

    fn mark_visited(&mut self, index: usize) {
        let cell = self.agents[index].cell();
        if self.visited.insert(cell) && self.world.water_adjacent(cell.0, cell.1) {
            self.drinkable_visited.insert(cell);
        }
    }
}

/// Spawn hint handed to the world generator: the world centre.
pub fn spawn_hint(config: &SimulationConfig) -> Vec2 {
    Vec2::new(
        f64::from(config.world_width) / 2.0,
        f64::from(config.world_height) / 2.0,
    )
}

/// Place agents on empty tiles near the spawn hint.
fn spawn_agents(config: &SimulationConfig, world: &GridWorld) -> Result<Vec<AgentState>> {
    let mut rng = DeterministicRng::new(fold([config.seed, SPAWN_STREAM]));
    let (hx, hy) = spawn_hint(config).tile();
    let min_dim = i64::from(config.world_width.min(config.world_height));
    let half = (min_dim / 4).max(1);

    let mut agents = Vec::with_capacity(config.agent_count as usize);
    for _ in 0..config.agent_count {
        let mut cell = None;
        for _ in 0..SPAWN_ATTEMPTS {
            let x = hx + rng.next_int(-half, half + 1);
            let y = hy + rng.next_int(-half, half + 1);
            if world.tile_at(x, y) == Some(Tile::Empty) {
                cell = Some((x, y));
                break;
            }
        }
        let (x, y) = match cell {
            Some(c) => c,
            None => first_empty(world).ok_or_else(|| {
                MirageError::invalid_config("world", "no empty tile to spawn agents on")
            })?,
        };
        let heading = rng.range_f64(-std::f64::consts::PI, std::f64::consts::PI);
        agents.push(AgentState::new(
            Vec2::new(x as f64 + 0.5, y as f64 + 0.5),
            heading,
            config.death_grace_seconds,
        ));
    }
    Ok(agents)
}

fn first_empty(world: &GridWorld) -> Option<(i64, i64)> {
    world
        .tiles()
        .iter()
        .position(|t| *t == Tile::Empty)
        .map(|i| {
            let width = world.width() as usize;
            ((i % width) as i64, (i / width) as i64)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::{AlwaysDrinkBrain, IdleBrain, WanderBrain};

    fn small_config(seed: u64) -> SimulationConfig {
        SimulationConfig {
            seed,
            ticks_per_episode: 50,
            world_width: 16,
            world_height: 16,
            agent_count: 3,
            ..Default::default()
        }
    }

    #[test]
    fn agents_spawn_on_empty_tiles() {
        for seed in 0..20 {
            let sim = Simulation::new(small_config(seed), |_| Box::new(IdleBrain)).unwrap();
            for agent in sim.agents() {
                assert_eq!(agent.standing_on(sim.world()), Tile::Empty);
            }
        }
    }

    #[test]
    fn step_stops_at_tick_limit() {
        let mut sim = Simulation::new(small_config(1), |_| Box::new(IdleBrain)).unwrap();
        let mut steps = 0;
        while sim.step().is_some() {
            steps += 1;
        }
        assert_eq!(steps, 50);
        assert_eq!(sim.tick(), 50);
        assert!(sim.step().is_none());
    }

    #[test]
    fn episode_ends_when_all_agents_die() {
        let config = SimulationConfig {
            thirst_rate: 0.5,
            death_grace_seconds: 1.0,
            ..small_config(2)
        };
        let mut sim = Simulation::new(config, |_| Box::new(IdleBrain)).unwrap();
        sim.run_to_end();
        // 0.5, 1.0 (grace 0 -> dead) on tick 2
        assert_eq!(sim.tick(), 2);
        assert_eq!(sim.alive_count(), 0);
    }

    #[test]
    fn agents_never_stand_on_blocked_tiles() {
        let config = SimulationConfig {
            ticks_per_episode: 300,
            obstacle_density: 0.3,
            thirst_rate: 0.0,
            ..small_config(9)
        };
        let mut sim =
            Simulation::new(config, |i| Box::new(WanderBrain::new(i as u64))).unwrap();
        while sim.step().is_some() {
            for agent in sim.agents() {
                assert_eq!(agent.standing_on(sim.world()), Tile::Empty);
            }
        }
        assert!(sim.distance_traveled() > 0.0);
        assert!(sim.visited_cells() > 3);
    }

    #[test]
    fn checksum_tracks_tick() {
        let mut sim = Simulation::new(small_config(4), |_| Box::new(IdleBrain)).unwrap();
        let before = sim.total_checksum();
        let after = sim.step().unwrap();
        assert_ne!(before, after, "tick is folded into the agent checksum");
    }

    #[test]
    fn teleport_rejects_blocked_tiles() {
        let mut world = GridWorld::filled(16, 16, Tile::Empty).unwrap();
        world.set(3, 3, Tile::Solid);
        let mut sim =
            Simulation::with_world(small_config(5), world, |_| Box::new(AlwaysDrinkBrain)).unwrap();
        assert!(sim.teleport_agent(0, Vec2::new(3.5, 3.5)).is_err());
        assert!(sim.teleport_agent(0, Vec2::new(4.5, 3.5)).is_ok());
        assert!(sim.teleport_agent(7, Vec2::new(4.5, 3.5)).is_err());
    }

    #[test]
    fn mismatched_world_is_rejected() {
        let world = GridWorld::filled(8, 8, Tile::Empty).unwrap();
        let result = Simulation::with_world(small_config(5), world, |_| Box::new(IdleBrain));
        assert!(result.is_err());
    }

    #[test]
    fn render_marks_agents() {
        let sim = Simulation::new(small_config(6), |_| Box::new(IdleBrain)).unwrap();
        let text = sim.render();
        assert_eq!(text.lines().count(), 16);
        assert!(text.contains('@'));
    }
}
