//! Mutation operators — structural and weight mutation of cloned genomes.
//!
//! Every operator that finds no legal candidate is a silent no-op. That
//! happens often (dense genomes, caps reached) and is not an error.

use crate::genome::{ConnectionGene, Genome, NodeGene, NodeKind};
use crate::innovation::InnovationTracker;
use mirage_core::error::{ensure_unit_interval, MirageError, Result};
use mirage_core::rng::DeterministicRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Half-width of the uniform weight perturbation.
pub const PERTURB_SCALE: f64 = 0.5;

/// Probabilities and caps for the mutation operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationConfig {
    #[serde(default = "default_add_connection_rate")]
    pub add_connection_rate: f64,
    #[serde(default = "default_add_node_rate")]
    pub add_node_rate: f64,
    /// Chance that a child gets a weight pass at all.
    #[serde(default = "default_weight_mutation_rate")]
    pub weight_mutation_rate: f64,
    /// Per enabled connection: chance of a fresh weight.
    #[serde(default = "default_weight_reset_rate")]
    pub weight_reset_rate: f64,
    /// Per enabled connection, when not reset: chance of a perturbation.
    #[serde(default = "default_weight_perturb_rate")]
    pub weight_perturb_rate: f64,
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    /// Counts disabled connection genes too.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_add_connection_rate() -> f64 { 0.15 }
fn default_add_node_rate() -> f64 { 0.05 }
fn default_weight_mutation_rate() -> f64 { 0.8 }
fn default_weight_reset_rate() -> f64 { 0.1 }
fn default_weight_perturb_rate() -> f64 { 0.8 }
fn default_max_nodes() -> usize { 64 }
fn default_max_connections() -> usize { 512 }

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            add_connection_rate: default_add_connection_rate(),
            add_node_rate: default_add_node_rate(),
            weight_mutation_rate: default_weight_mutation_rate(),
            weight_reset_rate: default_weight_reset_rate(),
            weight_perturb_rate: default_weight_perturb_rate(),
            max_nodes: default_max_nodes(),
            max_connections: default_max_connections(),
        }
    }
}

impl MutationConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_unit_interval("mutation.add_connection_rate", self.add_connection_rate)?;
        ensure_unit_interval("mutation.add_node_rate", self.add_node_rate)?;
        ensure_unit_interval("mutation.weight_mutation_rate", self.weight_mutation_rate)?;
        ensure_unit_interval("mutation.weight_reset_rate", self.weight_reset_rate)?;
        ensure_unit_interval("mutation.weight_perturb_rate", self.weight_perturb_rate)?;
        if self.max_nodes == 0 {
            return Err(MirageError::invalid_config("mutation.max_nodes", "must be positive"));
        }
        if self.max_connections == 0 {
            return Err(MirageError::invalid_config(
                "mutation.max_connections",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Fail when a genome of this size would already break a cap.
    pub fn check_capacity(&self, node_count: usize, connection_count: usize) -> Result<()> {
        if node_count > self.max_nodes {
            return Err(MirageError::invalid_config(
                "mutation.max_nodes",
                format!("genome needs {} nodes, cap is {}", node_count, self.max_nodes),
            ));
        }
        if connection_count > self.max_connections {
            return Err(MirageError::invalid_config(
                "mutation.max_connections",
                format!(
                    "genome needs {} connections, cap is {}",
                    connection_count, self.max_connections
                ),
            ));
        }
        Ok(())
    }
}

/// Which operators changed a genome during one [`Evolver::mutate`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationReport {
    pub added_connection: bool,
    pub added_node: bool,
    pub mutated_weights: bool,
}

/// Owns the run-wide innovation table and applies mutation operators.
#[derive(Debug, Clone)]
pub struct Evolver {
    config: MutationConfig,
    tracker: InnovationTracker,
}

impl Evolver {
    pub fn new(config: MutationConfig) -> Result<Self> {
        Self::with_tracker(config, InnovationTracker::new())
    }

    /// Continue a run whose innovation table was rebuilt from disk.
    pub fn with_tracker(config: MutationConfig, tracker: InnovationTracker) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, tracker })
    }

    pub fn config(&self) -> &MutationConfig {
        &self.config
    }

    pub fn tracker(&self) -> &InnovationTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut InnovationTracker {
        &mut self.tracker
    }

    /// Fully connected starting genome using this run's innovation table.
    /// Fails if that genome would not fit under the caps.
    pub fn minimal_genome(
        &mut self,
        input_count: usize,
        output_count: usize,
        rng: &mut DeterministicRng,
    ) -> Result<Genome> {
        self.config
            .check_capacity(input_count + output_count, input_count.saturating_mul(output_count))?;
        Genome::minimal(input_count, output_count, &mut self.tracker, rng)
    }

    /// Clone `parent` and run every operator with its own draw, in the
    /// order add-connection, add-node, weights.
    pub fn mutate(&mut self, parent: &Genome, rng: &mut DeterministicRng) -> (Genome, MutationReport) {
        let mut child = parent.clone();
        let mut report = MutationReport::default();
        if rng.chance(self.config.add_connection_rate) {
            report.added_connection = self.add_connection(&mut child, rng);
        }
        if rng.chance(self.config.add_node_rate) {
            report.added_node = self.add_node(&mut child, rng);
        }
        if rng.chance(self.config.weight_mutation_rate) {
            report.mutated_weights = self.mutate_weights(&mut child, rng);
        }
        (child, report)
    }

    /// Add one legal, cycle-free connection. Returns whether one was added.
    pub fn add_connection(&mut self, genome: &mut Genome, rng: &mut DeterministicRng) -> bool {
        if genome.connection_count() >= self.config.max_connections {
            return false;
        }
        let candidates = connection_candidates(genome);
        if candidates.is_empty() {
            return false;
        }
        let (from, to) = candidates[rng.next_index(candidates.len())];
        let weight = rng.range_f64(-1.0, 1.0);
        let Some(innovation) = self.tracker.innovation_for(from, to) else {
            return false;
        };
        genome.push_connection(ConnectionGene {
            in_node: from,
            out_node: to,
            weight,
            enabled: true,
            innovation,
        });
        debug!(from, to, innovation, "added connection");
        true
    }

    /// Split one enabled connection with a new hidden node.
    pub fn add_node(&mut self, genome: &mut Genome, rng: &mut DeterministicRng) -> bool {
        if genome.node_count() + 1 > self.config.max_nodes
            || genome.connection_count() + 2 > self.config.max_connections
        {
            return false;
        }
        let enabled: Vec<usize> = genome
            .connections()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.enabled)
            .map(|(i, _)| i)
            .collect();
        if enabled.is_empty() {
            return false;
        }
        let slot = enabled[rng.next_index(enabled.len())];
        let split = genome.connections()[slot];

        let Some(node) = self.tracker.allocate_node() else {
            return false;
        };
        let (Some(incoming), Some(outgoing)) = (
            self.tracker.innovation_for(split.in_node, node),
            self.tracker.innovation_for(node, split.out_node),
        ) else {
            return false;
        };
        genome.connections_mut()[slot].enabled = false;
        genome.push_node(NodeGene { id: node, kind: NodeKind::Hidden });
        genome.push_connection(ConnectionGene {
            in_node: split.in_node,
            out_node: node,
            weight: 1.0,
            enabled: true,
            innovation: incoming,
        });
        genome.push_connection(ConnectionGene {
            in_node: node,
            out_node: split.out_node,
            weight: split.weight,
            enabled: true,
            innovation: outgoing,
        });
        debug!(node, from = split.in_node, to = split.out_node, "added node");
        true
    }

    /// Reset or perturb each enabled weight independently.
    pub fn mutate_weights(&self, genome: &mut Genome, rng: &mut DeterministicRng) -> bool {
        let mut changed = false;
        for c in genome.connections_mut().iter_mut().filter(|c| c.enabled) {
            if rng.chance(self.config.weight_reset_rate) {
                c.weight = rng.range_f64(-1.0, 1.0);
                changed = true;
            } else if rng.chance(self.config.weight_perturb_rate) {
                c.weight += rng.range_f64(-PERTURB_SCALE, PERTURB_SCALE);
                changed = true;
            }
        }
        changed
    }
}

/// Every `(from, to)` pair add-connection may pick, in node-id order.
pub fn connection_candidates(genome: &Genome) -> Vec<(u32, u32)> {
    let targets: Vec<(u32, HashSet<u32>)> = genome
        .nodes()
        .iter()
        .filter(|n| n.kind != NodeKind::Input)
        .map(|n| (n.id, genome.reachable_from(n.id)))
        .collect();
    let mut candidates = Vec::new();
    for from in genome.nodes().iter().filter(|n| n.kind != NodeKind::Output) {
        for (to, downstream) in &targets {
            // `downstream` contains `to` itself, which rules out self-loops.
            if downstream.contains(&from.id) || genome.has_connection(from.id, *to) {
                continue;
            }
            candidates.push((from.id, *to));
        }
    }
    candidates
}
