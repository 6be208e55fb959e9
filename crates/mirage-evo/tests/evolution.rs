//! Structural properties of mutated genomes.

use mirage_evo::prelude::*;
use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;

fn enabled_graph(genome: &Genome) -> DiGraphMap<u32, ()> {
    let mut graph = DiGraphMap::new();
    for node in genome.nodes() {
        graph.add_node(node.id);
    }
    for c in genome.connections().iter().filter(|c| c.enabled) {
        graph.add_edge(c.in_node, c.out_node, ());
    }
    graph
}

fn aggressive() -> MutationConfig {
    MutationConfig {
        add_connection_rate: 0.8,
        add_node_rate: 0.4,
        weight_mutation_rate: 1.0,
        max_nodes: 40,
        max_connections: 120,
        ..Default::default()
    }
}

#[test]
fn mutated_genomes_stay_acyclic() {
    for seed in 0..8u64 {
        let mut evolver = Evolver::new(aggressive()).unwrap();
        let mut rng = DeterministicRng::new(seed);
        let mut genome = evolver.minimal_genome(5, 3, &mut rng).unwrap();
        for _ in 0..60 {
            genome = evolver.mutate(&genome, &mut rng).0;
            assert!(!is_cyclic_directed(&enabled_graph(&genome)), "seed {seed}");
            assert!(genome.topological_order().is_some());
            genome.validate().unwrap();
        }
    }
}

#[test]
fn caps_hold_for_every_mutation_sequence() {
    let config = MutationConfig {
        max_nodes: 12,
        max_connections: 30,
        ..aggressive()
    };
    for seed in 0..8u64 {
        let mut evolver = Evolver::new(config.clone()).unwrap();
        let mut rng = DeterministicRng::new(seed);
        let mut genome = evolver.minimal_genome(4, 3, &mut rng).unwrap();
        for _ in 0..80 {
            genome = evolver.mutate(&genome, &mut rng).0;
            assert!(genome.node_count() <= 12);
            assert!(genome.connection_count() <= 30);
        }
    }
}

#[test]
fn innovation_ids_agree_across_population() {
    let mut evolver = Evolver::new(aggressive()).unwrap();
    let mut rng = DeterministicRng::new(17);
    let parent = evolver.minimal_genome(3, 2, &mut rng).unwrap();
    let children: Vec<Genome> = (0..12)
        .map(|_| evolver.mutate(&parent, &mut rng).0)
        .collect();

    // Resuming over all children must not find two ids for one pair.
    let tracker = InnovationTracker::resume(&children).unwrap();
    for child in &children {
        for c in child.connections() {
            assert_eq!(tracker.lookup(c.in_node, c.out_node), Some(c.innovation));
        }
    }
}

#[test]
fn tie_break_order_is_stable() {
    let mut evolver = Evolver::new(MutationConfig::default()).unwrap();
    let mut rng = DeterministicRng::new(2);
    let small = evolver.minimal_genome(2, 1, &mut rng).unwrap();
    let mut large = small.clone();
    evolver.add_node(&mut large, &mut rng);

    // Identical small genomes tie on every key but the index.
    let genomes = vec![small.clone(), small.clone(), large.clone(), small];
    let raw_large = 0.5 + (adjusted_fitness(0.0, &genomes[0]) - adjusted_fitness(0.0, &large));
    let fitness = vec![0.5, 0.5, raw_large, 0.5];

    let first = rank(&genomes, &fitness).unwrap();
    for _ in 0..5 {
        assert_eq!(rank(&genomes, &fitness).unwrap(), first);
    }
    let order: Vec<usize> = first.iter().map(|r| r.index).collect();
    let small_positions: Vec<usize> = order.iter().copied().filter(|&i| i != 2).collect();
    assert_eq!(small_positions, vec![0, 1, 3]);
}

#[test]
fn genome_file_round_trip_after_mutation() {
    let mut evolver = Evolver::new(aggressive()).unwrap();
    let mut rng = DeterministicRng::new(5);
    let mut genome = evolver.minimal_genome(4, 4, &mut rng).unwrap();
    for _ in 0..20 {
        genome = evolver.mutate(&genome, &mut rng).0;
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("genome.json");
    save_genome(&genome, &path).unwrap();
    let loaded = load_genome(&path).unwrap();
    assert_eq!(loaded, genome);
    assert_eq!(loaded.fingerprint(), genome.fingerprint());
}

#[test]
fn shuffled_genome_file_canonicalizes() {
    let mut evolver = Evolver::new(aggressive()).unwrap();
    let mut rng = DeterministicRng::new(8);
    let mut genome = evolver.minimal_genome(3, 3, &mut rng).unwrap();
    for _ in 0..10 {
        genome = evolver.mutate(&genome, &mut rng).0;
    }
    let mut file = GenomeFile::from(&genome);
    file.nodes.reverse();
    file.connections.rotate_left(3);
    let json = serde_json::to_string(&file).unwrap();

    assert_eq!(genome_from_json(&json).unwrap(), genome);
}
