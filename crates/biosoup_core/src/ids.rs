//! Explicit id minting for genomes, nodes and innovations.

use biosoup_data::Genome;
use serde::{Deserialize, Serialize};

pub const INITIAL_INNOVATION: u64 = 1000;
pub const INITIAL_NODE_ID: u32 = 1000;
pub const INITIAL_GENOME_ID: u64 = 1;

/// Monotonic counters threaded through every operation that creates new structure.
///
/// One generator per evolution run. Innovation numbers are never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdGenerator {
    next_genome: u64,
    next_node: u32,
    next_innovation: u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            next_genome: INITIAL_GENOME_ID,
            next_node: INITIAL_NODE_ID,
            next_innovation: INITIAL_INNOVATION,
        }
    }

    pub fn next_genome_id(&mut self) -> u64 {
        let id = self.next_genome;
        self.next_genome += 1;
        id
    }

    pub fn next_node_id(&mut self) -> u32 {
        let id = self.next_node;
        self.next_node += 1;
        id
    }

    pub fn next_innovation(&mut self) -> u64 {
        let id = self.next_innovation;
        self.next_innovation += 1;
        id
    }

    pub fn peek_innovation(&self) -> u64 {
        self.next_innovation
    }

    pub fn peek_node_id(&self) -> u32 {
        self.next_node
    }

    /// Moves every counter past the ids already used by `genome`.
    pub fn ensure_above(&mut self, genome: &Genome) {
        self.next_genome = self.next_genome.max(genome.id + 1);
        self.next_node = self.next_node.max(genome.max_node_id() + 1);
        self.next_innovation = self.next_innovation.max(genome.max_innovation() + 1);
    }
}
