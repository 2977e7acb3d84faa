use crate::error::{CoreError, Result};
use biosoup_data::{Genome, LinkGene, NodeGene, NodeRole};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

/// Chance that a matching gene disabled in either parent stays disabled in the child.
pub const DISABLE_INHERIT_PROB: f64 = 0.75;

/// Aligns both parents by innovation number and builds a child.
///
/// The fitter parent is primary; on a tie `parent1` is primary and genes found only in the
/// other parent are taken with 50% probability.
pub fn crossover_genomes<R: Rng>(
    parent1: Option<&Genome>,
    parent2: Option<&Genome>,
    fitness1: f32,
    fitness2: f32,
    child_id: u64,
    rng: &mut R,
) -> Result<Genome> {
    let p1 = parent1.ok_or(CoreError::MissingGenome("crossover parent1"))?;
    let p2 = parent2.ok_or(CoreError::MissingGenome("crossover parent2"))?;

    let tied = fitness1 == fitness2;
    let (primary, secondary) = if fitness2 > fitness1 { (p2, p1) } else { (p1, p2) };

    let primary_genes: BTreeMap<u64, &LinkGene> =
        primary.genes.iter().map(|g| (g.innovation, g)).collect();
    let secondary_genes: BTreeMap<u64, &LinkGene> =
        secondary.genes.iter().map(|g| (g.innovation, g)).collect();
    let innovations: BTreeSet<u64> = primary_genes
        .keys()
        .chain(secondary_genes.keys())
        .copied()
        .collect();

    let mut genes = Vec::new();
    for innovation in innovations {
        match (primary_genes.get(&innovation), secondary_genes.get(&innovation)) {
            (Some(&a), Some(&b)) => {
                let mut gene = if rng.gen_bool(0.5) { *a } else { *b };
                if (!a.enabled || !b.enabled) && rng.gen_bool(DISABLE_INHERIT_PROB) {
                    gene.enabled = false;
                } else if a.enabled || b.enabled {
                    gene.enabled = true;
                }
                genes.push(gene);
            }
            (Some(&a), None) => genes.push(*a),
            (None, Some(&b)) => {
                if tied && rng.gen_bool(0.5) {
                    genes.push(*b);
                }
            }
            (None, None) => {}
        }
    }

    let mut nodes: BTreeMap<u32, NodeGene> = secondary.nodes.iter().map(|n| (n.id, *n)).collect();
    for n in &primary.nodes {
        nodes.insert(n.id, *n);
    }
    genes.retain(|g| nodes.contains_key(&g.from) && nodes.contains_key(&g.to));

    let mut child = Genome {
        id: child_id,
        nodes: nodes.into_values().collect(),
        genes,
        generation: p1.generation.max(p2.generation) + 1,
    };
    repair_outputs(&mut child, p1, p2);
    Ok(child)
}

/// Re-enables the lowest-innovation incoming gene of every output that lost all enabled
/// inputs even though a parent still fed it.
fn repair_outputs(child: &mut Genome, p1: &Genome, p2: &Genome) {
    let fed_by_parent = |out: u32| {
        p1.genes
            .iter()
            .chain(&p2.genes)
            .any(|g| g.to == out && g.enabled)
    };
    for out in child.ids_with_role(NodeRole::Output) {
        let fed = child.genes.iter().any(|g| g.to == out && g.enabled);
        if fed || !fed_by_parent(out) {
            continue;
        }
        if let Some(gene) = child
            .genes
            .iter_mut()
            .filter(|g| g.to == out)
            .min_by_key(|g| g.innovation)
        {
            gene.enabled = true;
        }
    }
}
