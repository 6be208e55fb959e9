//! Record and verify replays.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use mirage::prelude::*;
use std::path::Path;

use super::brains::{BrainKind, BrainSpec};
use crate::config::Config;

pub fn record_cmd(
    output: &Path,
    brain: BrainKind,
    genome: Option<&Path>,
    seed: Option<u64>,
    ticks: Option<u64>,
) -> Result<()> {
    let mut config = Config::load()?.simulation;
    if let Some(seed) = seed {
        config.seed = seed;
    }
    if let Some(ticks) = ticks {
        config.ticks_per_episode = ticks;
    }
    let spec = BrainSpec::resolve(brain, genome, &config)?;

    println!("{} Recording episode (seed {})...", "→".blue(), config.seed.to_string().cyan());
    let recording = record(&config, |i| spec.make(i))?;
    save_replay(&recording, output)
        .with_context(|| format!("Failed to write replay: {}", output.display()))?;

    println!("{} Replay saved to {}", "✓".green().bold(), output.display());
    println!("  Brain:    {}", recording.header.brain_id.cyan());
    println!("  Frames:   {}", recording.frames.len());
    println!(
        "  Checksum: {}",
        format!("{:016x}", recording.final_checksum).dimmed()
    );
    Ok(())
}

/// Verify a replay. Without `--brain`, the kind is taken from the
/// recorded brain id.
pub fn verify_cmd(input: &Path, brain: Option<BrainKind>, genome: Option<&Path>) -> Result<()> {
    let recording = load_replay(input)
        .with_context(|| format!("Failed to read replay: {}", input.display()))?;
    let kind = match brain {
        Some(kind) => kind,
        None => match BrainKind::from_brain_id(&recording.header.brain_id) {
            Some(kind) => kind,
            None => bail!(
                "Cannot infer a brain from '{}'; pass --brain",
                recording.header.brain_id
            ),
        },
    };
    let spec = BrainSpec::resolve(kind, genome, &recording.header.config)?;

    let probe = spec.make(0).brain_id();
    if probe != recording.header.brain_id {
        println!(
            "  {} recorded with {}, verifying with {}",
            "•".yellow(),
            recording.header.brain_id.yellow(),
            probe.yellow()
        );
    }

    println!(
        "{} Verifying {} frames from {}...",
        "→".blue(),
        recording.frames.len().to_string().cyan(),
        input.display()
    );
    let report = verify(&recording, |i| spec.make(i))?;

    if report.success {
        println!("{} Replay verified", "✓".green().bold());
        println!("  Ticks compared: {}", report.ticks_compared);
        println!(
            "  Checksum:       {}",
            format!("{:016x}", report.actual_checksum).dimmed()
        );
        return Ok(());
    }

    println!("{} Replay diverged", "✗".red().bold());
    if let Some(tick) = report.divergent_tick {
        println!("  Tick:     {}", tick.to_string().red());
    }
    if let Some(field) = report.field {
        println!("  Field:    {}", field.to_string().red());
    }
    if let Some(agent) = report.agent {
        println!("  Agent:    {}", agent);
    }
    println!("  Expected: {:016x}", report.expected_checksum);
    println!("  Actual:   {:016x}", report.actual_checksum);
    bail!(
        "{}",
        report.reason.unwrap_or_else(|| "replay diverged".to_string())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            seed: 31,
            world_width: 12,
            world_height: 12,
            agent_count: 3,
            ticks_per_episode: 60,
            ..Default::default()
        }
    }

    #[test]
    fn verify_infers_the_recorded_brain() {
        let config = small_config();
        let spec = BrainSpec::resolve(BrainKind::Wander, None, &config).unwrap();
        let recording = record(&config, |i| spec.make(i)).unwrap();
        assert!(recording.header.brain_id.starts_with("wander:"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wander.json");
        save_replay(&recording, &path).unwrap();

        verify_cmd(&path, None, None).unwrap();
        // Forcing a different brain still reports the divergence.
        assert!(verify_cmd(&path, Some(BrainKind::Idle), None).is_err());
    }
}
