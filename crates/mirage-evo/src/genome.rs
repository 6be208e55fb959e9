//! Genome — a variable-size feed-forward network topology with weights.
//!
//! Nodes are kept sorted by id and connections by innovation id. Three
//! invariants hold for every genome built through this module: connections
//! only reference existing nodes, no two connections share an
//! `(in, out)` pair, and the enabled-edge graph is acyclic.

use crate::innovation::InnovationTracker;
use mirage_core::checksum::Fnv1a;
use mirage_core::error::{MirageError, Result};
use mirage_core::rng::DeterministicRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::hash::Hasher;

/// Role of a node in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Input,
    Hidden,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeGene {
    pub id: u32,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectionGene {
    pub in_node: u32,
    pub out_node: u32,
    pub weight: f64,
    pub enabled: bool,
    /// Historical marker shared by every `(in_node, out_node)` occurrence in a run.
    pub innovation: u64,
}

/// Node and connection genes describing one candidate network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    nodes: Vec<NodeGene>,
    connections: Vec<ConnectionGene>,
}

impl Genome {
    /// Fully connected input→output genome with weights uniform in `[-1, 1]`.
    ///
    /// Node ids come from the tracker, inputs first then outputs, so every
    /// genome built from a fresh tracker shares the same ids.
    pub fn minimal(
        input_count: usize,
        output_count: usize,
        tracker: &mut InnovationTracker,
        rng: &mut DeterministicRng,
    ) -> Result<Self> {
        if input_count == 0 || output_count == 0 {
            return Err(MirageError::invalid_config(
                "genome",
                format!("{} inputs / {} outputs must both be positive", input_count, output_count),
            ));
        }
        let inputs: Vec<u32> = (0..input_count as u32).collect();
        let outputs: Vec<u32> = (input_count as u32..(input_count + output_count) as u32).collect();
        tracker.reserve_nodes(input_count + output_count);

        let mut nodes = Vec::with_capacity(input_count + output_count);
        nodes.extend(inputs.iter().map(|&id| NodeGene { id, kind: NodeKind::Input }));
        nodes.extend(outputs.iter().map(|&id| NodeGene { id, kind: NodeKind::Output }));

        let mut connections = Vec::with_capacity(input_count * output_count);
        for &from in &inputs {
            for &to in &outputs {
                connections.push(ConnectionGene {
                    in_node: from,
                    out_node: to,
                    weight: rng.range_f64(-1.0, 1.0),
                    enabled: true,
                    innovation: tracker.innovation_for(from, to).ok_or_else(|| {
                        MirageError::invalid_config("innovation", "innovation ids exhausted")
                    })?,
                });
            }
        }
        Self::from_parts(nodes, connections)
    }

    /// Canonicalize (sort by id / innovation) and validate.
    pub fn from_parts(mut nodes: Vec<NodeGene>, mut connections: Vec<ConnectionGene>) -> Result<Self> {
        nodes.sort_by_key(|n| n.id);
        connections.sort_by_key(|c| c.innovation);
        let genome = Self { nodes, connections };
        genome.validate()?;
        Ok(genome)
    }

    pub fn nodes(&self) -> &[NodeGene] {
        &self.nodes
    }

    pub fn connections(&self) -> &[ConnectionGene] {
        &self.connections
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All connection genes, disabled ones included.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn enabled_connection_count(&self) -> usize {
        self.connections.iter().filter(|c| c.enabled).count()
    }

    /// Tie-break measure for selection: nodes plus connections.
    pub fn complexity(&self) -> usize {
        self.node_count() + self.connection_count()
    }

    pub fn node(&self, id: u32) -> Option<&NodeGene> {
        self.nodes
            .binary_search_by_key(&id, |n| n.id)
            .ok()
            .map(|i| &self.nodes[i])
    }

    pub fn ids_of(&self, kind: NodeKind) -> Vec<u32> {
        self.nodes.iter().filter(|n| n.kind == kind).map(|n| n.id).collect()
    }

    pub fn input_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Input).count()
    }

    pub fn output_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Output).count()
    }

    pub fn max_node_id(&self) -> Option<u32> {
        self.nodes.last().map(|n| n.id)
    }

    pub fn max_innovation(&self) -> Option<u64> {
        self.connections.iter().map(|c| c.innovation).max()
    }

    /// Stable 64-bit fingerprint of structure and exact weights.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Fnv1a::new();
        for node in &self.nodes {
            hasher.write_u64(u64::from(node.id));
            hasher.write_u64(node.kind as u64);
        }
        for c in &self.connections {
            hasher.write_u64(c.innovation);
            hasher.write_u64(u64::from(c.in_node));
            hasher.write_u64(u64::from(c.out_node));
            hasher.write_u64(c.weight.to_bits());
            hasher.write_u64(u64::from(c.enabled));
        }
        hasher.finish()
    }

    pub fn has_connection(&self, in_node: u32, out_node: u32) -> bool {
        self.connections
            .iter()
            .any(|c| c.in_node == in_node && c.out_node == out_node)
    }

    /// Every node reachable from `start` over enabled edges, `start` included.
    pub fn reachable_from(&self, start: u32) -> HashSet<u32> {
        let adjacency = self.enabled_adjacency();
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            if let Some(next) = adjacency.get(&node) {
                for &target in next {
                    if seen.insert(target) {
                        queue.push_back(target);
                    }
                }
            }
        }
        seen
    }

    /// Whether `to` can reach `from` over enabled edges, i.e. whether adding
    /// `from → to` would close a cycle.
    pub fn creates_cycle(&self, from: u32, to: u32) -> bool {
        self.reachable_from(to).contains(&from)
    }

    /// Kahn's algorithm over enabled edges; `None` if a cycle exists.
    pub fn topological_order(&self) -> Option<Vec<u32>> {
        let mut in_degree: BTreeMap<u32, usize> = self.nodes.iter().map(|n| (n.id, 0)).collect();
        for c in self.connections.iter().filter(|c| c.enabled) {
            *in_degree.entry(c.out_node).or_insert(0) += 1;
        }
        let adjacency = self.enabled_adjacency();
        let mut queue: VecDeque<u32> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(node) = queue.pop_front() {
            order.push(node);
            if let Some(next) = adjacency.get(&node) {
                for target in next {
                    if let Some(d) = in_degree.get_mut(target) {
                        *d -= 1;
                        if *d == 0 {
                            queue.push_back(*target);
                        }
                    }
                }
            }
        }
        (order.len() == self.nodes.len()).then_some(order)
    }

    pub fn is_acyclic(&self) -> bool {
        self.topological_order().is_some()
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !ids.insert(node.id) {
                return Err(MirageError::corrupt_genome(format!("duplicate node id {}", node.id)));
            }
        }

        let mut pairs = HashSet::with_capacity(self.connections.len());
        let mut innovations: BTreeMap<u64, (u32, u32)> = BTreeMap::new();
        for c in &self.connections {
            let (from, to) = match (self.node(c.in_node), self.node(c.out_node)) {
                (Some(f), Some(t)) => (f, t),
                _ => {
                    return Err(MirageError::corrupt_genome(format!(
                        "connection {}->{} references a missing node",
                        c.in_node, c.out_node
                    )))
                }
            };
            if from.kind == NodeKind::Output || to.kind == NodeKind::Input {
                return Err(MirageError::corrupt_genome(format!(
                    "connection {}->{} runs against the input/output direction",
                    c.in_node, c.out_node
                )));
            }
            if !pairs.insert((c.in_node, c.out_node)) {
                return Err(MirageError::corrupt_genome(format!(
                    "duplicate connection {}->{}",
                    c.in_node, c.out_node
                )));
            }
            if !c.weight.is_finite() {
                return Err(MirageError::corrupt_genome(format!(
                    "connection {}->{} has non-finite weight",
                    c.in_node, c.out_node
                )));
            }
            if let Some(&(i, o)) = innovations.get(&c.innovation) {
                return Err(MirageError::corrupt_genome(format!(
                    "innovation {} used by both {}->{} and {}->{}",
                    c.innovation, i, o, c.in_node, c.out_node
                )));
            }
            innovations.insert(c.innovation, (c.in_node, c.out_node));
        }

        if !self.is_acyclic() {
            return Err(MirageError::corrupt_genome("enabled connections form a cycle"));
        }
        Ok(())
    }

    pub(crate) fn push_node(&mut self, node: NodeGene) {
        let at = self.nodes.partition_point(|n| n.id < node.id);
        self.nodes.insert(at, node);
    }

    pub(crate) fn push_connection(&mut self, connection: ConnectionGene) {
        let at = self
            .connections
            .partition_point(|c| c.innovation < connection.innovation);
        self.connections.insert(at, connection);
    }

    pub(crate) fn connections_mut(&mut self) -> &mut [ConnectionGene] {
        &mut self.connections
    }

    fn enabled_adjacency(&self) -> BTreeMap<u32, Vec<u32>> {
        let mut adjacency: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        for c in self.connections.iter().filter(|c| c.enabled) {
            adjacency.entry(c.in_node).or_default().push(c.out_node);
        }
        adjacency
    }
}
