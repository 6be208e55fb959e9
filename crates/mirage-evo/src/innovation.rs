//! Innovation tracking — run-wide historical markers for structural mutations.
//!
//! The tracker is explicit state owned by the evolver and threaded through
//! every mutation call. The same `(in_node, out_node)` pair always maps to
//! the same innovation id for the lifetime of a run.

use crate::genome::Genome;
use mirage_core::error::{MirageError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Innovation id table plus the node id counter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InnovationTracker {
    table: BTreeMap<(u32, u32), u64>,
    next_innovation: u64,
    next_node_id: u32,
}

impl InnovationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the table from persisted genomes.
    ///
    /// The node counter resumes past the highest node id seen and the
    /// innovation counter past the highest innovation id. A pair carrying
    /// two different ids across genomes, or one id on two pairs, is a
    /// `ConflictingInnovation`.
    pub fn resume<'a, I>(genomes: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Genome>,
    {
        let mut tracker = Self::new();
        let mut owners: BTreeMap<u64, (u32, u32)> = BTreeMap::new();
        for genome in genomes {
            if let Some(max_id) = genome.max_node_id() {
                let next = max_id.checked_add(1).ok_or_else(|| {
                    MirageError::corrupt_genome(format!("node id {max_id} leaves no room for new nodes"))
                })?;
                tracker.next_node_id = tracker.next_node_id.max(next);
            }
            for c in genome.connections() {
                let pair = (c.in_node, c.out_node);
                if let Some(&existing) = tracker.table.get(&pair) {
                    if existing != c.innovation {
                        return Err(MirageError::ConflictingInnovation {
                            in_node: c.in_node,
                            out_node: c.out_node,
                            existing,
                            found: c.innovation,
                        });
                    }
                    continue;
                }
                if let Some(&(i, o)) = owners.get(&c.innovation) {
                    if (i, o) != pair {
                        return Err(MirageError::ConflictingInnovation {
                            in_node: c.in_node,
                            out_node: c.out_node,
                            existing: tracker.table.get(&(i, o)).copied().unwrap_or(c.innovation),
                            found: c.innovation,
                        });
                    }
                }
                let next = c.innovation.checked_add(1).ok_or_else(|| {
                    MirageError::corrupt_genome(format!(
                        "innovation {} leaves no room for new connections",
                        c.innovation
                    ))
                })?;
                owners.insert(c.innovation, pair);
                tracker.table.insert(pair, c.innovation);
                tracker.next_innovation = tracker.next_innovation.max(next);
            }
        }
        Ok(tracker)
    }

    /// Look up the id for a pair, allocating the next one on first sight.
    /// `None` once the id space is exhausted.
    pub fn innovation_for(&mut self, in_node: u32, out_node: u32) -> Option<u64> {
        if let Some(&id) = self.table.get(&(in_node, out_node)) {
            return Some(id);
        }
        let id = self.next_innovation;
        self.next_innovation = id.checked_add(1)?;
        self.table.insert((in_node, out_node), id);
        Some(id)
    }

    /// Id already assigned to a pair, if any.
    pub fn lookup(&self, in_node: u32, out_node: u32) -> Option<u64> {
        self.table.get(&(in_node, out_node)).copied()
    }

    /// Allocate a fresh hidden node id, or `None` once ids run out.
    pub fn allocate_node(&mut self) -> Option<u32> {
        let id = self.next_node_id;
        self.next_node_id = id.checked_add(1)?;
        Some(id)
    }

    /// Make sure ids `0..count` are never handed out by [`allocate_node`](Self::allocate_node).
    pub fn reserve_nodes(&mut self, count: usize) {
        self.next_node_id = self.next_node_id.max(count as u32);
    }

    pub fn next_innovation(&self) -> u64 {
        self.next_innovation
    }

    pub fn next_node_id(&self) -> u32 {
        self.next_node_id
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
