use crate::config::MutationConfig;
use crate::error::{CoreError, Result};
use crate::ids::IdGenerator;
use biosoup_data::{Activation, Genome, LinkGene, NodeGene, NodeRole};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::collections::{BTreeSet, HashMap};

/// Gaussian perturbations are clipped to this many standard deviations.
const PERTURB_CLIP: f32 = 3.0;

/// Applies each structural and parametric mutation with its configured probability.
///
/// Returns whether anything changed. Mutations that find no valid target are skipped.
pub fn mutate_genome<R: Rng>(
    genome: Option<&mut Genome>,
    options: &MutationConfig,
    ids: &mut IdGenerator,
    rng: &mut R,
) -> Result<bool> {
    let genome = genome.ok_or(CoreError::MissingGenome("mutation target"))?;
    let mut mutated = false;

    if rng.gen::<f32>() < options.link_weights_prob {
        mutated |= mutate_weights(genome, options, rng);
    }
    if rng.gen::<f32>() < options.add_node_prob {
        mutated |= mutate_add_node(genome, options.hidden_activation, ids, rng);
    }
    if rng.gen::<f32>() < options.add_link_prob {
        mutated |= mutate_add_link(genome, options, ids, rng);
    }
    if rng.gen::<f32>() < options.toggle_enable_prob {
        mutated |= mutate_toggle_enable(genome, rng);
    }
    Ok(mutated)
}

/// Body genome variant: new hidden nodes draw a random pattern function and existing hidden
/// nodes may switch theirs.
pub fn mutate_cppn_genome<R: Rng>(
    genome: Option<&mut Genome>,
    options: &MutationConfig,
    ids: &mut IdGenerator,
    rng: &mut R,
) -> Result<bool> {
    let genome = genome.ok_or(CoreError::MissingGenome("cppn mutation target"))?;
    let activation = Activation::CPPN_SET[rng.gen_range(0..Activation::CPPN_SET.len())];
    let cppn_options = MutationConfig {
        hidden_activation: activation,
        ..options.clone()
    };
    let mut mutated = mutate_genome(Some(&mut *genome), &cppn_options, ids, rng)?;
    if rng.gen::<f32>() < options.activation_mut_prob {
        mutated |= mutate_activation(genome, rng);
    }
    Ok(mutated)
}

pub fn mutate_weights<R: Rng>(genome: &mut Genome, options: &MutationConfig, rng: &mut R) -> bool {
    let max = options.max_weight;
    for gene in &mut genome.genes {
        if rng.gen::<f32>() < options.perturb_prob {
            let noise: f32 = StandardNormal.sample(rng);
            gene.weight += noise.clamp(-PERTURB_CLIP, PERTURB_CLIP) * options.weight_mut_power;
        } else {
            let range = options.replace_range;
            gene.weight = if range > 0.0 {
                rng.gen_range(-range..=range)
            } else {
                0.0
            };
        }
        gene.weight = gene.weight.clamp(-max, max);
    }
    !genome.genes.is_empty()
}

/// Splits a random enabled gene with a new hidden node.
pub fn mutate_add_node<R: Rng>(
    genome: &mut Genome,
    activation: Activation,
    ids: &mut IdGenerator,
    rng: &mut R,
) -> bool {
    let enabled: Vec<usize> = genome
        .genes
        .iter()
        .enumerate()
        .filter(|(_, g)| g.enabled)
        .map(|(i, _)| i)
        .collect();
    if enabled.is_empty() {
        return false;
    }
    let idx = enabled[rng.gen_range(0..enabled.len())];
    genome.genes[idx].enabled = false;
    let old = genome.genes[idx];

    let mut node_id = ids.next_node_id();
    while genome.has_node(node_id) {
        node_id = ids.next_node_id();
    }
    genome.insert_node(NodeGene {
        id: node_id,
        role: NodeRole::Hidden,
        activation,
    });
    genome.genes.push(LinkGene {
        innovation: ids.next_innovation(),
        from: old.from,
        to: node_id,
        weight: 1.0,
        enabled: true,
        recurrent: old.recurrent,
    });
    genome.genes.push(LinkGene {
        innovation: ids.next_innovation(),
        from: node_id,
        to: old.to,
        weight: old.weight,
        enabled: true,
        recurrent: old.recurrent,
    });
    true
}

/// Tries up to `max_link_attempts` random source/target pairs.
pub fn mutate_add_link<R: Rng>(
    genome: &mut Genome,
    options: &MutationConfig,
    ids: &mut IdGenerator,
    rng: &mut R,
) -> bool {
    let sources: Vec<u32> = genome
        .nodes
        .iter()
        .filter(|n| n.role != NodeRole::Output)
        .map(|n| n.id)
        .collect();
    let targets: Vec<u32> = genome
        .nodes
        .iter()
        .filter(|n| n.role.can_be_target())
        .map(|n| n.id)
        .collect();
    if sources.is_empty() || targets.is_empty() {
        return false;
    }
    let existing: BTreeSet<(u32, u32)> = genome.genes.iter().map(|g| (g.from, g.to)).collect();

    for _ in 0..options.max_link_attempts {
        let from = sources[rng.gen_range(0..sources.len())];
        let to = targets[rng.gen_range(0..targets.len())];
        if from == to || existing.contains(&(from, to)) {
            continue;
        }
        let recurrent = reaches(genome, to, from);
        let range = options.replace_range.max(f32::EPSILON);
        genome.genes.push(LinkGene {
            innovation: ids.next_innovation(),
            from,
            to,
            weight: rng
                .gen_range(-range..=range)
                .clamp(-options.max_weight, options.max_weight),
            enabled: true,
            recurrent,
        });
        return true;
    }
    tracing::trace!(
        genome = genome.id,
        attempts = options.max_link_attempts,
        "add-link found no free pair"
    );
    false
}

/// Flips a random gene, undoing the flip if an output loses its last path from the sensors.
pub fn mutate_toggle_enable<R: Rng>(genome: &mut Genome, rng: &mut R) -> bool {
    if genome.genes.is_empty() {
        return false;
    }
    let idx = rng.gen_range(0..genome.genes.len());
    let before = reachable_outputs(genome);
    genome.genes[idx].enabled = !genome.genes[idx].enabled;
    if genome.genes[idx].enabled {
        return true;
    }
    let after = reachable_outputs(genome);
    if before.is_subset(&after) {
        true
    } else {
        genome.genes[idx].enabled = true;
        false
    }
}

/// Gives a random hidden node a different pattern function.
pub fn mutate_activation<R: Rng>(genome: &mut Genome, rng: &mut R) -> bool {
    let hidden: Vec<usize> = genome
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.role == NodeRole::Hidden)
        .map(|(i, _)| i)
        .collect();
    if hidden.is_empty() {
        return false;
    }
    let idx = hidden[rng.gen_range(0..hidden.len())];
    let choices: Vec<Activation> = Activation::CPPN_SET
        .iter()
        .copied()
        .filter(|&a| a != genome.nodes[idx].activation)
        .collect();
    genome.nodes[idx].activation = choices[rng.gen_range(0..choices.len())];
    true
}

fn enabled_adjacency(genome: &Genome) -> HashMap<u32, Vec<u32>> {
    let mut adjacency: HashMap<u32, Vec<u32>> = HashMap::new();
    for g in genome.genes.iter().filter(|g| g.enabled) {
        adjacency.entry(g.from).or_default().push(g.to);
    }
    adjacency
}

fn flood(adjacency: &HashMap<u32, Vec<u32>>, starts: impl IntoIterator<Item = u32>) -> BTreeSet<u32> {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<u32> = starts.into_iter().collect();
    while let Some(node) = stack.pop() {
        if !seen.insert(node) {
            continue;
        }
        if let Some(next) = adjacency.get(&node) {
            stack.extend(next.iter().copied().filter(|n| !seen.contains(n)));
        }
    }
    seen
}

/// Whether `target` can be reached from `source` over enabled genes.
pub fn reaches(genome: &Genome, source: u32, target: u32) -> bool {
    flood(&enabled_adjacency(genome), [source]).contains(&target)
}

/// Output ids reachable from any input or bias node over enabled genes.
pub fn reachable_outputs(genome: &Genome) -> BTreeSet<u32> {
    let starts = genome
        .nodes
        .iter()
        .filter(|n| n.role.is_sensor())
        .map(|n| n.id);
    let seen = flood(&enabled_adjacency(genome), starts);
    genome
        .ids_with_role(NodeRole::Output)
        .into_iter()
        .filter(|id| seen.contains(id))
        .collect()
}
