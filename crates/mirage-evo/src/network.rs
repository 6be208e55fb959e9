//! GenomeBrain — compiles a genome into a feed-forward evaluator.
//!
//! Nodes live in a flat arena indexed by position in the genome's node
//! list; each non-input node keeps a list of `(source slot, weight)` pairs
//! over enabled edges. Evaluation order comes from Kahn's algorithm.

use crate::genome::{Genome, NodeKind};
use mirage_core::config::SimulationConfig;
use mirage_core::error::{MirageError, Result};
use mirage_core::types::Vec2;
use mirage_sim::brain::{Brain, BrainInput, BrainOutput};
use std::collections::HashMap;
use tracing::warn;

/// Outputs before the action-preference block: steer x, steer y, action score.
pub const FIXED_OUTPUTS: usize = 3;

/// A compiled genome, ready to drive an agent.
#[derive(Debug, Clone)]
pub struct GenomeBrain {
    id: String,
    input_slots: Vec<usize>,
    output_slots: Vec<usize>,
    /// Non-input slots in evaluation order.
    order: Vec<usize>,
    incoming: Vec<Vec<(usize, f64)>>,
    activations: Vec<f64>,
    used_fallback: bool,
}

impl GenomeBrain {
    /// Compile a genome. A cyclic enabled-edge graph does not fail: the
    /// evaluator falls back to node-id order and reports it through
    /// [`used_fallback`](Self::used_fallback).
    pub fn compile(genome: &Genome) -> Self {
        let nodes = genome.nodes();
        let slot_of: HashMap<u32, usize> = nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();

        let mut incoming = vec![Vec::new(); nodes.len()];
        for c in genome.connections().iter().filter(|c| c.enabled) {
            if let (Some(&from), Some(&to)) = (slot_of.get(&c.in_node), slot_of.get(&c.out_node)) {
                incoming[to].push((from, c.weight));
            }
        }

        let (order_ids, used_fallback) = match genome.topological_order() {
            Some(order) => (order, false),
            None => {
                warn!(
                    nodes = nodes.len(),
                    connections = genome.enabled_connection_count(),
                    "genome has a cycle, evaluating in node-id order"
                );
                (nodes.iter().map(|n| n.id).collect(), true)
            }
        };
        let order = order_ids
            .iter()
            .filter_map(|id| slot_of.get(id).copied())
            .filter(|&slot| nodes[slot].kind != NodeKind::Input)
            .collect();

        let slots_of = |kind: NodeKind| -> Vec<usize> {
            nodes
                .iter()
                .enumerate()
                .filter(|(_, n)| n.kind == kind)
                .map(|(i, _)| i)
                .collect()
        };

        Self {
            id: format!("genome:{:016x}", genome.fingerprint()),
            input_slots: slots_of(NodeKind::Input),
            output_slots: slots_of(NodeKind::Output),
            order,
            incoming,
            activations: vec![0.0; nodes.len()],
            used_fallback,
        }
    }

    /// Compile and check the genome's I/O shape against a simulation config.
    pub fn for_simulation(genome: &Genome, config: &SimulationConfig) -> Result<Self> {
        let brain = Self::compile(genome);
        if brain.input_count() != config.brain_input_count() {
            return Err(MirageError::invalid_config(
                "genome.inputs",
                format!(
                    "genome has {} inputs, simulation provides {}",
                    brain.input_count(),
                    config.brain_input_count()
                ),
            ));
        }
        if brain.output_count() != config.brain_output_count() {
            return Err(MirageError::invalid_config(
                "genome.outputs",
                format!(
                    "genome has {} outputs, simulation expects {}",
                    brain.output_count(),
                    config.brain_output_count()
                ),
            ));
        }
        Ok(brain)
    }

    pub fn input_count(&self) -> usize {
        self.input_slots.len()
    }

    pub fn output_count(&self) -> usize {
        self.output_slots.len()
    }

    /// True when compilation had to fall back to node-id order.
    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }

    /// Evaluate the network on an explicit input vector.
    pub fn evaluate(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        if inputs.len() != self.input_count() {
            return Err(MirageError::invalid_config(
                "inputs",
                format!("expected {} values, got {}", self.input_count(), inputs.len()),
            ));
        }
        self.activate(inputs.iter().copied());
        Ok(self.outputs())
    }

    fn activate<I: Iterator<Item = f64>>(&mut self, inputs: I) {
        self.activations.iter_mut().for_each(|a| *a = 0.0);
        for (&slot, value) in self.input_slots.iter().zip(inputs) {
            self.activations[slot] = value;
        }
        for &slot in &self.order {
            let sum: f64 = self.incoming[slot]
                .iter()
                .map(|&(from, weight)| weight * self.activations[from])
                .sum();
            self.activations[slot] = sum.tanh();
        }
    }

    fn outputs(&self) -> Vec<f64> {
        self.output_slots.iter().map(|&slot| self.activations[slot]).collect()
    }
}

impl Brain for GenomeBrain {
    fn decide_action(&mut self, input: &BrainInput<'_>) -> BrainOutput {
        let values = input
            .vision
            .iter()
            .copied()
            .chain([input.thirst, input.bias]);
        self.activate(values);
        let out = self.outputs();
        let at = |i: usize| out.get(i).copied().unwrap_or(0.0);
        BrainOutput::new(
            Vec2::new(at(0), at(1)),
            at(2),
            out.iter().skip(FIXED_OUTPUTS).copied().collect(),
        )
    }

    fn brain_id(&self) -> String {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{ConnectionGene, NodeGene};
    use crate::innovation::InnovationTracker;
    use crate::mutation::{Evolver, MutationConfig};
    use mirage_core::rng::DeterministicRng;

    fn node(id: u32, kind: NodeKind) -> NodeGene {
        NodeGene { id, kind }
    }

    fn conn(in_node: u32, out_node: u32, weight: f64, innovation: u64) -> ConnectionGene {
        ConnectionGene {
            in_node,
            out_node,
            weight,
            enabled: true,
            innovation,
        }
    }

    #[test]
    fn single_layer_is_tanh_of_weighted_sum() {
        let g = Genome::from_parts(
            vec![node(0, NodeKind::Input), node(1, NodeKind::Input), node(2, NodeKind::Output)],
            vec![conn(0, 2, 0.5, 0), conn(1, 2, -0.25, 1)],
        )
        .unwrap();
        let mut brain = GenomeBrain::compile(&g);
        let out = brain.evaluate(&[1.0, 2.0]).unwrap();
        assert_eq!(out, vec![(0.5 - 0.5f64).tanh()]);
        let out = brain.evaluate(&[1.0, 0.0]).unwrap();
        assert_eq!(out, vec![0.5f64.tanh()]);
        assert!(!brain.used_fallback());
    }

    #[test]
    fn hidden_nodes_follow_topological_order() {
        // Hidden node 9 feeds hidden node 4: id order would be wrong.
        let g = Genome::from_parts(
            vec![
                node(0, NodeKind::Input),
                node(1, NodeKind::Output),
                node(4, NodeKind::Hidden),
                node(9, NodeKind::Hidden),
            ],
            vec![conn(0, 9, 1.0, 0), conn(9, 4, 1.0, 1), conn(4, 1, 1.0, 2)],
        )
        .unwrap();
        let mut brain = GenomeBrain::compile(&g);
        let out = brain.evaluate(&[0.7]).unwrap();
        assert_eq!(out[0], 0.7f64.tanh().tanh().tanh());
    }

    #[test]
    fn disabled_edges_are_ignored() {
        let mut off = conn(0, 1, 5.0, 1);
        off.enabled = false;
        let g = Genome::from_parts(
            vec![node(0, NodeKind::Input), node(1, NodeKind::Output)],
            vec![off],
        )
        .unwrap();
        let mut brain = GenomeBrain::compile(&g);
        assert_eq!(brain.evaluate(&[1.0]).unwrap(), vec![0.0]);
    }

    #[test]
    fn wrong_input_length_is_rejected() {
        let g = Genome::from_parts(
            vec![node(0, NodeKind::Input), node(1, NodeKind::Output)],
            vec![conn(0, 1, 1.0, 0)],
        )
        .unwrap();
        let mut brain = GenomeBrain::compile(&g);
        assert!(brain.evaluate(&[1.0, 2.0]).unwrap_err().is_invalid_config());
    }

    #[test]
    fn outputs_map_to_brain_output() {
        let config = SimulationConfig::default();
        let mut tracker = InnovationTracker::new();
        let mut rng = DeterministicRng::new(6);
        let g = Genome::minimal(
            config.brain_input_count(),
            config.brain_output_count(),
            &mut tracker,
            &mut rng,
        )
        .unwrap();
        let mut brain = GenomeBrain::for_simulation(&g, &config).unwrap();

        let vision = vec![0.5; config.vision_len()];
        let input = BrainInput { vision: &vision, thirst: 0.3, bias: 1.0 };
        let output = brain.decide_action(&input);

        let mut explicit: Vec<f64> = vision.clone();
        explicit.extend([0.3, 1.0]);
        let raw = brain.evaluate(&explicit).unwrap();
        assert_eq!(output.steer, Vec2::new(raw[0], raw[1]));
        assert_eq!(output.action_score, raw[2]);
        assert_eq!(output.action_preferences, raw[3..].to_vec());
        assert_eq!(output.action_preferences.len(), config.action_preference_count as usize);
        assert!(brain.brain_id().starts_with("genome:"));
    }

    #[test]
    fn shape_mismatch_is_invalid_configuration() {
        let config = SimulationConfig::default();
        let mut tracker = InnovationTracker::new();
        let mut rng = DeterministicRng::new(6);
        let g = Genome::minimal(2, config.brain_output_count(), &mut tracker, &mut rng).unwrap();
        assert!(GenomeBrain::for_simulation(&g, &config).unwrap_err().is_invalid_config());
    }

    #[test]
    fn cyclic_genome_falls_back_to_id_order() {
        // Deserializing directly skips validation, so this cycle gets through.
        let json = r#"{
            "nodes": [
                {"id": 0, "kind": "Input"},
                {"id": 1, "kind": "Hidden"},
                {"id": 2, "kind": "Hidden"},
                {"id": 3, "kind": "Output"}
            ],
            "connections": [
                {"in_node": 0, "out_node": 1, "weight": 1.0, "enabled": true, "innovation": 0},
                {"in_node": 1, "out_node": 2, "weight": 1.0, "enabled": true, "innovation": 1},
                {"in_node": 2, "out_node": 1, "weight": 1.0, "enabled": true, "innovation": 2},
                {"in_node": 2, "out_node": 3, "weight": 1.0, "enabled": true, "innovation": 3}
            ]
        }"#;
        let genome: Genome = serde_json::from_str(json).unwrap();
        assert!(genome.validate().is_err());

        let mut brain = GenomeBrain::compile(&genome);
        assert!(brain.used_fallback());
        // Id order: node 1 sees node 2 still at zero.
        let out = brain.evaluate(&[0.5]).unwrap();
        assert_eq!(out, vec![0.5f64.tanh().tanh().tanh()]);
    }

    #[test]
    fn mutated_genomes_never_need_the_fallback() {
        let config = MutationConfig {
            add_connection_rate: 0.9,
            add_node_rate: 0.5,
            ..Default::default()
        };
        let mut evolver = Evolver::new(config).unwrap();
        let mut rng = DeterministicRng::new(21);
        let mut genome = evolver.minimal_genome(4, 3, &mut rng).unwrap();
        for _ in 0..100 {
            genome = evolver.mutate(&genome, &mut rng).0;
            assert!(!GenomeBrain::compile(&genome).used_fallback());
        }
    }
}
