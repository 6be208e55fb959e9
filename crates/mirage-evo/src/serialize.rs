//! Genome persistence.
//!
//! Files are JSON `{format_version, nodes, connections}`. Loading always
//! canonicalizes (nodes by id, connections by innovation id) and checks
//! every structural invariant before handing the genome out.

use crate::genome::{ConnectionGene, Genome, NodeGene};
use mirage_core::error::{MirageError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Genome file format version.
pub const GENOME_FORMAT_VERSION: u32 = 1;

/// On-disk form of a genome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenomeFile {
    pub format_version: u32,
    pub nodes: Vec<NodeGene>,
    pub connections: Vec<ConnectionGene>,
}

impl From<&Genome> for GenomeFile {
    fn from(genome: &Genome) -> Self {
        Self {
            format_version: GENOME_FORMAT_VERSION,
            nodes: genome.nodes().to_vec(),
            connections: genome.connections().to_vec(),
        }
    }
}

impl GenomeFile {
    /// Canonicalize and validate.
    pub fn into_genome(self) -> Result<Genome> {
        if self.format_version != GENOME_FORMAT_VERSION {
            return Err(MirageError::corrupt_genome(format!(
                "unsupported genome format version {}",
                self.format_version
            )));
        }
        Genome::from_parts(self.nodes, self.connections)
    }
}

pub fn genome_to_json(genome: &Genome) -> Result<String> {
    Ok(serde_json::to_string_pretty(&GenomeFile::from(genome))?)
}

pub fn genome_from_json(json: &str) -> Result<Genome> {
    let file: GenomeFile = serde_json::from_str(json)?;
    file.into_genome()
}

/// Save a genome as pretty JSON.
pub fn save_genome(genome: &Genome, path: &Path) -> Result<()> {
    std::fs::write(path, genome_to_json(genome)?)?;
    Ok(())
}

/// Load and validate a genome saved by [`save_genome`].
pub fn load_genome(path: &Path) -> Result<Genome> {
    let json = std::fs::read_to_string(path)?;
    genome_from_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::NodeKind;

    #[test]
    fn out_of_order_file_is_canonicalized() {
        let json = r#"{
            "format_version": 1,
            "nodes": [
                {"id": 3, "kind": "Hidden"},
                {"id": 2, "kind": "Output"},
                {"id": 0, "kind": "Input"},
                {"id": 1, "kind": "Input"}
            ],
            "connections": [
                {"in_node": 3, "out_node": 2, "weight": -0.5, "enabled": true, "innovation": 5},
                {"in_node": 0, "out_node": 2, "weight": 0.25, "enabled": false, "innovation": 0},
                {"in_node": 0, "out_node": 3, "weight": 1.0, "enabled": true, "innovation": 4},
                {"in_node": 1, "out_node": 2, "weight": 0.75, "enabled": true, "innovation": 1}
            ]
        }"#;
        let genome = genome_from_json(json).unwrap();
        let ids: Vec<u32> = genome.nodes().iter().map(|n| n.id).collect();
        let innovations: Vec<u64> = genome.connections().iter().map(|c| c.innovation).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(innovations, vec![0, 1, 4, 5]);
        assert_eq!(genome.node(3).unwrap().kind, NodeKind::Hidden);

        let again = genome_from_json(&genome_to_json(&genome).unwrap()).unwrap();
        assert_eq!(again, genome);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let json = r#"{"format_version": 99, "nodes": [], "connections": []}"#;
        assert!(matches!(
            genome_from_json(json).unwrap_err(),
            MirageError::CorruptGenome(_)
        ));
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        assert!(matches!(
            genome_from_json("{ not json").unwrap_err(),
            MirageError::Serialization(_)
        ));
    }
}
