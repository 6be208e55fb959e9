//! Brain selection shared by `episode` and `replay`.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use mirage::prelude::*;
use std::path::Path;

/// Brain kinds selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BrainKind {
    /// Never moves, never drinks
    Idle,
    /// Stands still and always tries to drink
    Drink,
    /// Random walk with its own seeded RNG
    Wander,
    /// Steers toward visible water and drinks when thirsty
    Seeker,
    /// A saved genome (requires --genome)
    Genome,
}

impl BrainKind {
    /// The kind that produced a recorded brain id, if it is one of ours.
    pub fn from_brain_id(id: &str) -> Option<Self> {
        match id {
            "idle" => Some(BrainKind::Idle),
            "always-drink" => Some(BrainKind::Drink),
            "water-seeker" => Some(BrainKind::Seeker),
            _ if id.starts_with("wander:") => Some(BrainKind::Wander),
            _ if id.starts_with("genome:") => Some(BrainKind::Genome),
            _ => None,
        }
    }
}

/// A resolved brain choice that can build one brain per agent.
pub enum BrainSpec {
    Idle,
    AlwaysDrink,
    Wander { seed: u64 },
    Seeker { config: SimulationConfig },
    Genome(GenomeBrain),
}

impl BrainSpec {
    pub fn resolve(kind: BrainKind, genome: Option<&Path>, config: &SimulationConfig) -> Result<Self> {
        Ok(match kind {
            BrainKind::Idle => BrainSpec::Idle,
            BrainKind::Drink => BrainSpec::AlwaysDrink,
            BrainKind::Wander => BrainSpec::Wander { seed: config.seed },
            BrainKind::Seeker => BrainSpec::Seeker {
                config: config.clone(),
            },
            BrainKind::Genome => {
                let Some(path) = genome else {
                    bail!("--brain genome needs --genome <file>");
                };
                let genome = load_genome(path)
                    .with_context(|| format!("Failed to load genome: {}", path.display()))?;
                let brain = GenomeBrain::for_simulation(&genome, config)
                    .context("Genome does not fit this simulation config")?;
                BrainSpec::Genome(brain)
            }
        })
    }

    /// Brain for agent `index`.
    pub fn make(&self, index: usize) -> Box<dyn Brain> {
        match self {
            BrainSpec::Idle => Box::new(IdleBrain),
            BrainSpec::AlwaysDrink => Box::new(AlwaysDrinkBrain),
            BrainSpec::Wander { seed } => Box::new(WanderBrain::new(seed.wrapping_add(index as u64))),
            BrainSpec::Seeker { config } => Box::new(WaterSeekerBrain::new(config)),
            BrainSpec::Genome(brain) => Box::new(brain.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_ids_map_back_to_their_kind() {
        let config = SimulationConfig::default();
        for kind in [BrainKind::Idle, BrainKind::Drink, BrainKind::Wander, BrainKind::Seeker] {
            let id = BrainSpec::resolve(kind, None, &config).unwrap().make(0).brain_id();
            assert_eq!(BrainKind::from_brain_id(&id), Some(kind), "{id}");
        }
        assert_eq!(
            BrainKind::from_brain_id("genome:00000000deadbeef"),
            Some(BrainKind::Genome)
        );
        assert_eq!(BrainKind::from_brain_id("fixed"), None);
    }

    #[test]
    fn genome_kind_needs_a_file() {
        let config = SimulationConfig::default();
        assert!(BrainSpec::resolve(BrainKind::Genome, None, &config).is_err());
    }
}
