//! Replay recording and verification.
//!
//! A replay stores the full configuration plus a per-tick agent snapshot
//! and checksum. Verification re-runs the same brains on the same config
//! and compares tick by tick. Divergence is reported in a
//! [`VerificationReport`], not raised as an error; callers decide whether a
//! mismatch is fatal.

use crate::agent::AgentState;
use crate::brain::Brain;
use crate::simulation::Simulation;
use mirage_core::config::SimulationConfig;
use mirage_core::error::Result;
use mirage_core::types::{Tick, Vec2};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Replay file format version.
pub const REPLAY_FORMAT_VERSION: u32 = 1;

/// Everything needed to regenerate the episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayHeader {
    pub format_version: u32,
    pub seed: u64,
    pub config: SimulationConfig,
    pub brain_id: String,
    pub world_checksum: u64,
}

/// One agent's observable state at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub position: Vec2,
    pub heading: f64,
    pub thirst: f64,
    pub alive: bool,
}

impl From<&AgentState> for AgentSnapshot {
    fn from(agent: &AgentState) -> Self {
        Self {
            position: agent.position,
            heading: agent.heading,
            thirst: agent.thirst,
            alive: agent.alive,
        }
    }
}

/// State after one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub tick: Tick,
    pub agents: Vec<AgentSnapshot>,
    pub checksum: u64,
}

/// A recorded episode. Written once, read for verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecord {
    pub header: ReplayHeader,
    pub frames: Vec<ReplayFrame>,
    pub final_checksum: u64,
}

/// The state field in which two runs first disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DivergenceField {
    /// Different number of agents, or one run ended before the other.
    Count,
    Position,
    Heading,
    Thirst,
    Liveness,
    /// Snapshots agree but the checksum does not (world state differs).
    Checksum,
}

impl std::fmt::Display for DivergenceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DivergenceField::Count => write!(f, "count"),
            DivergenceField::Position => write!(f, "position"),
            DivergenceField::Heading => write!(f, "heading"),
            DivergenceField::Thirst => write!(f, "thirst"),
            DivergenceField::Liveness => write!(f, "liveness"),
            DivergenceField::Checksum => write!(f, "checksum"),
        }
    }
}

/// Outcome of verifying a replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub success: bool,
    /// Checksum from the record at the divergent tick, or the final one.
    pub expected_checksum: u64,
    /// Checksum from the re-run at the divergent tick, or the final one.
    pub actual_checksum: u64,
    pub ticks_compared: u64,
    pub divergent_tick: Option<Tick>,
    pub field: Option<DivergenceField>,
    pub agent: Option<usize>,
    pub reason: Option<String>,
}

impl VerificationReport {
    fn diverged(
        expected: u64,
        actual: u64,
        ticks_compared: u64,
        tick: Tick,
        field: DivergenceField,
        agent: Option<usize>,
    ) -> Self {
        let reason = match agent {
            Some(index) => format!("tick {}: agent {} {} differs", tick, index, field),
            None => format!("tick {}: {} differs", tick, field),
        };
        Self {
            success: false,
            expected_checksum: expected,
            actual_checksum: actual,
            ticks_compared,
            divergent_tick: Some(tick),
            field: Some(field),
            agent,
            reason: Some(reason),
        }
    }
}

/// Run an episode to the end, capturing a frame per tick.
pub fn record<F>(config: &SimulationConfig, make_brain: F) -> Result<ReplayRecord>
where
    F: FnMut(usize) -> Box<dyn Brain>,
{
    let mut sim = Simulation::new(config.clone(), make_brain)?;
    let header = ReplayHeader {
        format_version: REPLAY_FORMAT_VERSION,
        seed: config.seed,
        config: config.clone(),
        brain_id: sim.brain_id(),
        world_checksum: sim.world_checksum(),
    };
    let mut frames = Vec::with_capacity(config.ticks_per_episode as usize);
    while let Some(checksum) = sim.step() {
        frames.push(ReplayFrame {
            tick: sim.tick(),
            agents: sim.snapshot(),
            checksum,
        });
    }
    let final_checksum = sim.total_checksum();
    debug!(frames = frames.len(), final_checksum, "recorded replay");
    Ok(ReplayRecord {
        header,
        frames,
        final_checksum,
    })
}

/// Re-run the recorded configuration with fresh brains and compare every tick.
pub fn verify<F>(record: &ReplayRecord, make_brain: F) -> Result<VerificationReport>
where
    F: FnMut(usize) -> Box<dyn Brain>,
{
    let mut sim = Simulation::new(record.header.config.clone(), make_brain)?;
    let mut compared = 0u64;

    for frame in &record.frames {
        let actual = match sim.step() {
            Some(checksum) => checksum,
            None => {
                let report = VerificationReport::diverged(
                    frame.checksum,
                    sim.total_checksum(),
                    compared,
                    frame.tick,
                    DivergenceField::Count,
                    None,
                );
                warn!(reason = ?report.reason, "replay ended early on re-run");
                return Ok(report);
            }
        };
        let snapshot = sim.snapshot();
        if let Some((field, agent)) = compare_frame(&frame.agents, &snapshot) {
            let report = VerificationReport::diverged(
                frame.checksum,
                actual,
                compared,
                frame.tick,
                field,
                agent,
            );
            warn!(reason = ?report.reason, "replay diverged");
            return Ok(report);
        }
        if actual != frame.checksum {
            let report = VerificationReport::diverged(
                frame.checksum,
                actual,
                compared,
                frame.tick,
                DivergenceField::Checksum,
                None,
            );
            warn!(reason = ?report.reason, "replay checksum diverged");
            return Ok(report);
        }
        compared += 1;
    }

    if sim.step().is_some() {
        let report = VerificationReport::diverged(
            record.final_checksum,
            sim.total_checksum(),
            compared,
            sim.tick(),
            DivergenceField::Count,
            None,
        );
        warn!(reason = ?report.reason, "re-run outlived the recording");
        return Ok(report);
    }

    let actual = sim.total_checksum();
    if actual != record.final_checksum {
        return Ok(VerificationReport::diverged(
            record.final_checksum,
            actual,
            compared,
            sim.tick(),
            DivergenceField::Checksum,
            None,
        ));
    }

    Ok(VerificationReport {
        success: true,
        expected_checksum: record.final_checksum,
        actual_checksum: actual,
        ticks_compared: compared,
        divergent_tick: None,
        field: None,
        agent: None,
        reason: None,
    })
}

/// First differing field between two frames, checked in a fixed order.
fn compare_frame(
    expected: &[AgentSnapshot],
    actual: &[AgentSnapshot],
) -> Option<(DivergenceField, Option<usize>)> {
    if expected.len() != actual.len() {
        return Some((DivergenceField::Count, None));
    }
    for (index, (e, a)) in expected.iter().zip(actual).enumerate() {
        let field = if !same_bits(e.position.x, a.position.x) || !same_bits(e.position.y, a.position.y) {
            Some(DivergenceField::Position)
        } else if !same_bits(e.heading, a.heading) {
            Some(DivergenceField::Heading)
        } else if !same_bits(e.thirst, a.thirst) {
            Some(DivergenceField::Thirst)
        } else if e.alive != a.alive {
            Some(DivergenceField::Liveness)
        } else {
            None
        };
        if let Some(field) = field {
            return Some((field, Some(index)));
        }
    }
    None
}

fn same_bits(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits()
}

/// Save a replay as JSON.
pub fn save_replay(record: &ReplayRecord, path: &Path) -> Result<()> {
    let json = serde_json::to_string(record)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Load a replay saved by [`save_replay`].
pub fn load_replay(path: &Path) -> Result<ReplayRecord> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::{IdleBrain, WanderBrain};

    fn config() -> SimulationConfig {
        SimulationConfig {
            seed: 31,
            ticks_per_episode: 40,
            world_width: 16,
            world_height: 16,
            agent_count: 2,
            ..Default::default()
        }
    }

    fn wander(i: usize) -> Box<dyn Brain> {
        Box::new(WanderBrain::new(100 + i as u64))
    }

    #[test]
    fn record_captures_every_tick() {
        let rec = record(&config(), wander).unwrap();
        assert_eq!(rec.frames.len(), 40);
        assert_eq!(rec.frames[0].tick, 1);
        assert_eq!(rec.header.brain_id, "wander:100");
        assert_eq!(rec.frames.last().unwrap().checksum, rec.final_checksum);
    }

    #[test]
    fn verify_succeeds_on_same_brains() {
        let rec = record(&config(), wander).unwrap();
        let report = verify(&rec, wander).unwrap();
        assert!(report.success, "{:?}", report.reason);
        assert_eq!(report.expected_checksum, report.actual_checksum);
        assert_eq!(report.ticks_compared, 40);
    }

    #[test]
    fn verify_reports_first_divergence() {
        let rec = record(&config(), wander).unwrap();
        let report = verify(&rec, |_| Box::new(IdleBrain)).unwrap();
        assert!(!report.success);
        assert_eq!(report.divergent_tick, Some(1));
        assert!(matches!(
            report.field,
            Some(DivergenceField::Position) | Some(DivergenceField::Heading)
        ));
        assert!(report.reason.unwrap().starts_with("tick 1"));
    }

    #[test]
    fn tampered_thirst_is_named() {
        let mut rec = record(&config(), wander).unwrap();
        rec.frames[5].agents[1].thirst += 0.125;
        let report = verify(&rec, wander).unwrap();
        assert_eq!(report.divergent_tick, Some(6));
        assert_eq!(report.field, Some(DivergenceField::Thirst));
        assert_eq!(report.agent, Some(1));
        // Checksums only cover positions, so they still agree here.
        assert_eq!(report.expected_checksum, report.actual_checksum);
    }

    #[test]
    fn truncated_recording_is_a_count_divergence() {
        let mut rec = record(&config(), wander).unwrap();
        rec.frames.truncate(10);
        let report = verify(&rec, wander).unwrap();
        assert!(!report.success);
        assert_eq!(report.field, Some(DivergenceField::Count));
        assert_eq!(report.ticks_compared, 10);
    }

    #[test]
    fn replay_file_round_trip() {
        let rec = record(&config(), wander).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replay.json");
        save_replay(&rec, &path).unwrap();
        let loaded = load_replay(&path).unwrap();
        assert_eq!(loaded, rec);
    }
}
