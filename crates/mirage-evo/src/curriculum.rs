//! Curriculum scheduling — environment difficulty over generations.
//!
//! A schedule interpolates linearly from an easy phase to a hard phase
//! over `ramp_generations`, then stays at the hard phase.

use mirage_core::config::SimulationConfig;
use mirage_core::error::{ensure_non_negative, ensure_unit_interval, MirageError, Result};
use serde::{Deserialize, Serialize};

/// Environment parameters assigned to one generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurriculumPhase {
    pub obstacle_density: f64,
    pub water_bias: f64,
    pub thirst_rate: f64,
    pub ticks_per_episode: u64,
}

impl CurriculumPhase {
    pub fn validate(&self, name: &str) -> Result<()> {
        ensure_unit_interval(&format!("curriculum.{name}.obstacle_density"), self.obstacle_density)?;
        ensure_unit_interval(&format!("curriculum.{name}.water_bias"), self.water_bias)?;
        ensure_non_negative(&format!("curriculum.{name}.thirst_rate"), self.thirst_rate)?;
        if self.ticks_per_episode == 0 {
            return Err(MirageError::invalid_config(
                format!("curriculum.{name}.ticks_per_episode"),
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Overwrite the difficulty fields of a base config.
    pub fn apply(&self, base: &SimulationConfig) -> SimulationConfig {
        SimulationConfig {
            obstacle_density: self.obstacle_density,
            water_bias: self.water_bias,
            thirst_rate: self.thirst_rate,
            ticks_per_episode: self.ticks_per_episode,
            ..base.clone()
        }
    }

    fn lerp(&self, other: &CurriculumPhase, t: f64) -> CurriculumPhase {
        let mix = |a: f64, b: f64| a * (1.0 - t) + b * t;
        CurriculumPhase {
            obstacle_density: mix(self.obstacle_density, other.obstacle_density),
            water_bias: mix(self.water_bias, other.water_bias),
            thirst_rate: mix(self.thirst_rate, other.thirst_rate),
            ticks_per_episode: mix(self.ticks_per_episode as f64, other.ticks_per_episode as f64)
                .round()
                .max(1.0) as u64,
        }
    }
}

/// Easy-to-hard ramp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumSchedule {
    /// Generations to reach the hard phase; 0 starts there.
    #[serde(default = "default_ramp_generations")]
    pub ramp_generations: u64,
    #[serde(default = "default_easy")]
    pub easy: CurriculumPhase,
    #[serde(default = "default_hard")]
    pub hard: CurriculumPhase,
}

fn default_easy() -> CurriculumPhase {
    CurriculumPhase {
        obstacle_density: 0.02,
        water_bias: 0.9,
        thirst_rate: 0.005,
        ticks_per_episode: 200,
    }
}

fn default_hard() -> CurriculumPhase {
    CurriculumPhase {
        obstacle_density: 0.12,
        water_bias: 0.3,
        thirst_rate: 0.015,
        ticks_per_episode: 400,
    }
}

fn default_ramp_generations() -> u64 {
    50
}

impl Default for CurriculumSchedule {
    fn default() -> Self {
        Self {
            easy: default_easy(),
            hard: default_hard(),
            ramp_generations: default_ramp_generations(),
        }
    }
}

impl CurriculumSchedule {
    /// A schedule that never changes the environment.
    pub fn constant(phase: CurriculumPhase) -> Self {
        Self {
            easy: phase,
            hard: phase,
            ramp_generations: 0,
        }
    }

    /// Take the difficulty fields straight from a config.
    pub fn fixed_from(config: &SimulationConfig) -> Self {
        Self::constant(CurriculumPhase {
            obstacle_density: config.obstacle_density,
            water_bias: config.water_bias,
            thirst_rate: config.thirst_rate,
            ticks_per_episode: config.ticks_per_episode,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.easy.validate("easy")?;
        self.hard.validate("hard")
    }

    /// Interpolation factor in `[0, 1]` for a generation.
    pub fn progress(&self, generation: u64) -> f64 {
        if self.ramp_generations == 0 {
            return 1.0;
        }
        (generation as f64 / self.ramp_generations as f64).min(1.0)
    }

    pub fn phase_for(&self, generation: u64) -> CurriculumPhase {
        self.easy.lerp(&self.hard, self.progress(generation))
    }

    /// Base config with this generation's difficulty applied.
    pub fn config_for(&self, base: &SimulationConfig, generation: u64) -> SimulationConfig {
        self.phase_for(generation).apply(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_phases() {
        let schedule = CurriculumSchedule::default();
        assert_eq!(schedule.phase_for(0), schedule.easy);
        assert_eq!(schedule.phase_for(50), schedule.hard);
        assert_eq!(schedule.phase_for(500), schedule.hard);
    }

    #[test]
    fn midpoint_interpolates() {
        let schedule = CurriculumSchedule {
            ramp_generations: 10,
            ..Default::default()
        };
        let mid = schedule.phase_for(5);
        assert!((mid.obstacle_density - 0.07).abs() < 1e-12);
        assert!((mid.water_bias - 0.6).abs() < 1e-12);
        assert_eq!(mid.ticks_per_episode, 300);
    }

    #[test]
    fn zero_ramp_starts_hard() {
        let schedule = CurriculumSchedule {
            ramp_generations: 0,
            ..Default::default()
        };
        assert_eq!(schedule.progress(0), 1.0);
        assert_eq!(schedule.phase_for(0), schedule.hard);
    }

    #[test]
    fn apply_keeps_other_fields() {
        let base = SimulationConfig {
            seed: 5,
            agent_count: 9,
            ..Default::default()
        };
        let config = CurriculumSchedule::default().config_for(&base, 0);
        assert_eq!(config.seed, 5);
        assert_eq!(config.agent_count, 9);
        assert_eq!(config.ticks_per_episode, 200);
        assert_eq!(CurriculumSchedule::fixed_from(&base).config_for(&base, 7), base);
    }

    #[test]
    fn invalid_phase_is_rejected() {
        let mut schedule = CurriculumSchedule::default();
        schedule.hard.water_bias = 2.0;
        assert!(schedule.validate().unwrap_err().is_invalid_config());
    }
}
