use crate::config::CompatibilityConfig;
use biosoup_data::{Genome, LinkGene};
use std::collections::BTreeMap;

/// Gene alignment counts between two genomes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Alignment {
    pub matching: usize,
    pub disjoint: usize,
    pub excess: usize,
    pub avg_weight_diff: f32,
}

pub fn align(g1: &Genome, g2: &Genome) -> Alignment {
    let a: BTreeMap<u64, &LinkGene> = g1.genes.iter().map(|g| (g.innovation, g)).collect();
    let b: BTreeMap<u64, &LinkGene> = g2.genes.iter().map(|g| (g.innovation, g)).collect();
    let max_a = a.keys().next_back().copied();
    let max_b = b.keys().next_back().copied();

    let mut result = Alignment::default();
    let mut weight_diff = 0.0f32;
    for (innovation, gene) in &a {
        match b.get(innovation) {
            Some(other) => {
                result.matching += 1;
                weight_diff += (gene.weight - other.weight).abs();
            }
            None if max_b.map_or(true, |m| *innovation > m) => result.excess += 1,
            None => result.disjoint += 1,
        }
    }
    for innovation in b.keys().filter(|i| !a.contains_key(i)) {
        if max_a.map_or(true, |m| *innovation > m) {
            result.excess += 1;
        } else {
            result.disjoint += 1;
        }
    }
    if result.matching > 0 {
        result.avg_weight_diff = weight_diff / result.matching as f32;
    }
    result
}

/// NEAT compatibility distance.
pub fn genome_compatibility(g1: &Genome, g2: &Genome, options: &CompatibilityConfig) -> f32 {
    let alignment = align(g1, g2);
    let largest = g1.genes.len().max(g2.genes.len());
    let n = if largest < options.normalize_threshold {
        1.0
    } else {
        largest as f32
    };
    (options.excess_coeff * alignment.excess as f32
        + options.disjoint_coeff * alignment.disjoint as f32)
        / n
        + options.mutdiff_coeff * alignment.avg_weight_diff
}
