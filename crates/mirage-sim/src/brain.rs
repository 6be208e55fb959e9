//! Brains turn a perception into an action.
//!
//! The simulation only sees the [`Brain`] capability. Hand-coded
//! heuristics live here; compiled genome networks implement the same trait
//! in the evolution crate, and tests plug in fixed stubs.

use crate::vision::TileEmbeddings;
use crate::world::Tile;
use mirage_core::config::SimulationConfig;
use mirage_core::rng::DeterministicRng;
use mirage_core::types::Vec2;

/// What a brain is given each tick.
#[derive(Debug, Clone, Copy)]
pub struct BrainInput<'a> {
    /// Perception vector: per ray `[distance, embedding...]`.
    pub vision: &'a [f64],
    /// Thirst in `[0, 1]`.
    pub thirst: f64,
    /// Constant bias input, always 1.
    pub bias: f64,
}

/// What a brain decides each tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrainOutput {
    /// Steering request in the agent's local frame (x forward, y left).
    pub steer: Vec2,
    /// Gate for the discrete action; nothing happens unless positive.
    pub action_score: f64,
    /// Preference per discrete action; index 0 is drink.
    pub action_preferences: Vec<f64>,
}

/// Discrete actions an agent can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentAction {
    Rest,
    Drink,
}

/// Index of the drink action in the preference vector.
pub const DRINK_ACTION: usize = 0;

impl BrainOutput {
    pub fn new(steer: Vec2, action_score: f64, action_preferences: Vec<f64>) -> Self {
        Self {
            steer,
            action_score,
            action_preferences,
        }
    }

    /// Decode the discrete action: the gate must be open and drink must be
    /// the preferred action (lowest index wins ties).
    pub fn action(&self) -> AgentAction {
        if self.action_score.is_nan() || self.action_score <= 0.0 {
            return AgentAction::Rest;
        }
        let mut best = DRINK_ACTION;
        for (index, value) in self.action_preferences.iter().enumerate() {
            if *value > self.action_preferences[best] {
                best = index;
            }
        }
        if best == DRINK_ACTION {
            AgentAction::Drink
        } else {
            AgentAction::Rest
        }
    }
}

/// Capability interface driving one agent.
pub trait Brain {
    /// Decide this tick's action.
    fn decide_action(&mut self, input: &BrainInput<'_>) -> BrainOutput;

    /// Identifier recorded in replay headers.
    fn brain_id(&self) -> String;
}

impl<B: Brain + ?Sized> Brain for Box<B> {
    fn decide_action(&mut self, input: &BrainInput<'_>) -> BrainOutput {
        (**self).decide_action(input)
    }

    fn brain_id(&self) -> String {
        (**self).brain_id()
    }
}

/// Never moves, never drinks.
#[derive(Debug, Clone, Default)]
pub struct IdleBrain;

impl Brain for IdleBrain {
    fn decide_action(&mut self, _input: &BrainInput<'_>) -> BrainOutput {
        BrainOutput::default()
    }

    fn brain_id(&self) -> String {
        "idle".into()
    }
}

/// Stands still and tries to drink every tick.
#[derive(Debug, Clone, Default)]
pub struct AlwaysDrinkBrain;

impl Brain for AlwaysDrinkBrain {
    fn decide_action(&mut self, _input: &BrainInput<'_>) -> BrainOutput {
        BrainOutput::new(Vec2::ZERO, 1.0, vec![1.0])
    }

    fn brain_id(&self) -> String {
        "always-drink".into()
    }
}

/// Random walk driven by its own generator; drinks when thirsty.
#[derive(Debug, Clone)]
pub struct WanderBrain {
    rng: DeterministicRng,
    seed: u64,
}

impl WanderBrain {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: DeterministicRng::new(seed),
            seed,
        }
    }
}

impl Brain for WanderBrain {
    fn decide_action(&mut self, input: &BrainInput<'_>) -> BrainOutput {
        let steer = Vec2::new(self.rng.range_f64(0.0, 1.0), self.rng.range_f64(-1.0, 1.0));
        let score = if input.thirst > 0.3 { 1.0 } else { -1.0 };
        BrainOutput::new(steer, score, vec![1.0, 0.0])
    }

    fn brain_id(&self) -> String {
        format!("wander:{}", self.seed)
    }
}

/// Hand-coded water seeker.
///
/// Recognises the water embedding in its vision, steers along the closest
/// ray that sees water, and tries to drink whenever it is thirsty and water
/// is within reach. Otherwise it walks forward and veers away from walls.
#[derive(Debug, Clone)]
pub struct WaterSeekerBrain {
    water: Vec<f64>,
    ray_count: usize,
    fov: f64,
    reach: f64,
}

impl WaterSeekerBrain {
    pub fn new(config: &SimulationConfig) -> Self {
        let mut embeddings =
            TileEmbeddings::new(config.embedding_seed, config.embedding_dim as usize);
        Self {
            water: embeddings.embedding(Tile::Water).to_vec(),
            ray_count: config.vision_ray_count as usize,
            fov: config.vision_fov,
            // Within ~1.5 tiles, a drink from the current tile usually succeeds.
            reach: 1.5 / config.vision_range,
        }
    }

    fn ray_offset(&self, index: usize) -> f64 {
        if self.ray_count <= 1 {
            return 0.0;
        }
        -self.fov / 2.0 + self.fov * index as f64 / (self.ray_count - 1) as f64
    }
}

impl Brain for WaterSeekerBrain {
    fn decide_action(&mut self, input: &BrainInput<'_>) -> BrainOutput {
        let stride = 1 + self.water.len();
        let mut nearest_water: Option<(usize, f64)> = None;
        let mut nearest_wall: Option<(usize, f64)> = None;
        for (index, ray) in input.vision.chunks(stride).enumerate() {
            let distance = ray[0];
            if distance >= 1.0 {
                continue;
            }
            let slot = if ray[1..] == self.water[..] {
                &mut nearest_water
            } else {
                &mut nearest_wall
            };
            if slot.map_or(true, |(_, d)| distance < d) {
                *slot = Some((index, distance));
            }
        }

        let thirsty = input.thirst > 0.2;
        match nearest_water {
            Some((index, distance)) => {
                let close = distance <= self.reach;
                let steer = if close {
                    Vec2::ZERO
                } else {
                    Vec2::from_angle(self.ray_offset(index))
                };
                let score = if thirsty || close { 1.0 } else { -1.0 };
                BrainOutput::new(steer, score, vec![1.0, 0.0])
            }
            None => {
                let steer = match nearest_wall {
                    Some((index, distance)) if distance < 0.3 => {
                        // Turn away from the wall side.
                        let away = if self.ray_offset(index) >= 0.0 { -1.0 } else { 1.0 };
                        Vec2::new(0.2, away)
                    }
                    _ => Vec2::new(1.0, 0.0),
                };
                BrainOutput::new(steer, if thirsty { 1.0 } else { -1.0 }, vec![1.0, 0.0])
            }
        }
    }

    fn brain_id(&self) -> String {
        "water-seeker".into()
    }
}

/// Replays a fixed output every tick.
#[derive(Debug, Clone)]
pub struct FixedBrain {
    output: BrainOutput,
}

impl FixedBrain {
    pub fn new(output: BrainOutput) -> Self {
        Self { output }
    }
}

impl Brain for FixedBrain {
    fn decide_action(&mut self, _input: &BrainInput<'_>) -> BrainOutput {
        self.output.clone()
    }

    fn brain_id(&self) -> String {
        "fixed".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(vision: &[f64], thirst: f64) -> BrainInput<'_> {
        BrainInput {
            vision,
            thirst,
            bias: 1.0,
        }
    }

    #[test]
    fn action_requires_open_gate() {
        let out = BrainOutput::new(Vec2::ZERO, 0.0, vec![1.0]);
        assert_eq!(out.action(), AgentAction::Rest);
        let out = BrainOutput::new(Vec2::ZERO, 0.1, vec![1.0]);
        assert_eq!(out.action(), AgentAction::Drink);
        let out = BrainOutput::new(Vec2::ZERO, f64::NAN, vec![1.0]);
        assert_eq!(out.action(), AgentAction::Rest);
    }

    #[test]
    fn preferences_pick_action_with_low_index_ties() {
        let out = BrainOutput::new(Vec2::ZERO, 1.0, vec![0.5, 0.5]);
        assert_eq!(out.action(), AgentAction::Drink);
        let out = BrainOutput::new(Vec2::ZERO, 1.0, vec![0.2, 0.9]);
        assert_eq!(out.action(), AgentAction::Rest);
        let out = BrainOutput::new(Vec2::ZERO, 1.0, vec![]);
        assert_eq!(out.action(), AgentAction::Drink);
    }

    #[test]
    fn wander_is_reproducible() {
        let mut a = WanderBrain::new(5);
        let mut b = WanderBrain::new(5);
        for _ in 0..10 {
            assert_eq!(
                a.decide_action(&input(&[], 0.5)),
                b.decide_action(&input(&[], 0.5))
            );
        }
    }

    #[test]
    fn seeker_steers_toward_water_ray() {
        let config = SimulationConfig {
            vision_ray_count: 3,
            embedding_dim: 2,
            ..Default::default()
        };
        let mut brain = WaterSeekerBrain::new(&config);
        let water = TileEmbeddings::new(config.embedding_seed, 2)
            .embedding(Tile::Water)
            .to_vec();
        let vision = vec![
            1.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            0.5, water[0], water[1],
        ];
        let out = brain.decide_action(&input(&vision, 0.5));
        assert!(out.steer.y > 0.0, "should steer left toward the last ray");
        assert_eq!(out.action(), AgentAction::Drink);
    }

    #[test]
    fn boxed_brains_delegate() {
        let mut brain: Box<dyn Brain> = Box::new(AlwaysDrinkBrain);
        assert_eq!(brain.brain_id(), "always-drink");
        assert_eq!(
            brain.decide_action(&input(&[], 0.0)).action(),
            AgentAction::Drink
        );
    }
}
