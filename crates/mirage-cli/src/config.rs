//! Configuration management for the Mirage CLI.

use anyhow::{Context, Result};
use mirage::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the project config file.
pub const CONFIG_FILE: &str = "mirage.toml";

/// Mirage project configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub training: TrainerConfig,
    #[serde(default)]
    pub mutation: MutationConfig,
    #[serde(default)]
    pub curriculum: CurriculumSchedule,
}

impl Config {
    /// Load config from mirage.toml in the current or parent directories.
    pub fn load() -> Result<Self> {
        match find_config_file() {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        Ok(config)
    }

    /// Save config to the specified path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> mirage::mirage_core::error::Result<()> {
        self.simulation.validate()?;
        self.training.validate()?;
        self.mutation.validate()?;
        self.curriculum.validate()
    }
}

/// Find mirage.toml in current or parent directories.
fn find_config_file() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("[simulation]"));
        assert!(text.contains("[curriculum.easy]"));
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str(
            "[simulation]\nseed = 7\nagent_count = 2\n\n[training]\npopulation_size = 10\n",
        )
        .unwrap();
        assert_eq!(parsed.simulation.seed, 7);
        assert_eq!(parsed.simulation.agent_count, 2);
        assert_eq!(parsed.simulation.world_width, SimulationConfig::default().world_width);
        assert_eq!(parsed.training.population_size, 10);
        assert_eq!(parsed.mutation, MutationConfig::default());
    }

    #[test]
    fn invalid_values_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[simulation]\nworld_width = 0\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("world_width"));
    }
}
