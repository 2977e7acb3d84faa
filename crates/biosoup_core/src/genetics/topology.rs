use crate::ids::IdGenerator;
use biosoup_data::{Activation, Genome, LinkGene, NodeGene, NodeRole};
use rand::Rng;

/// CPPN sensor values: x, y, distance, angle / pi, bias.
pub const CPPN_INPUTS: usize = 5;
/// Presence, seven functional outputs, two spectra, armor, storage, brain weight, brain LEO.
pub const CPPN_OUTPUTS: usize = 14;

/// Innovation number of a founder template link, identical across every founder so that
/// initial populations align gene by gene.
pub fn template_innovation(source_index: usize, target_index: usize, targets: usize) -> u64 {
    (source_index * targets + target_index) as u64
}

/// Fully parameterized layered template: `sources` sensors (optionally followed by a bias
/// node) connected to `targets` outputs with probability `connection_prob`. Every output gets
/// at least one incoming link.
#[allow(clippy::too_many_arguments)]
fn create_template<R: Rng>(
    id: u64,
    inputs: usize,
    with_bias: bool,
    outputs: usize,
    output_activation: Activation,
    connection_prob: f32,
    ids: &mut IdGenerator,
    rng: &mut R,
) -> Genome {
    let mut genome = Genome::new(id);
    for i in 0..inputs {
        genome.nodes.push(NodeGene {
            id: i as u32,
            role: NodeRole::Input,
            activation: Activation::Linear,
        });
    }
    let sources = if with_bias {
        genome.nodes.push(NodeGene {
            id: inputs as u32,
            role: NodeRole::Bias,
            activation: Activation::Linear,
        });
        inputs + 1
    } else {
        inputs
    };
    for o in 0..outputs {
        genome.nodes.push(NodeGene {
            id: (sources + o) as u32,
            role: NodeRole::Output,
            activation: output_activation,
        });
    }

    let p = f64::from(connection_prob.clamp(0.0, 1.0));
    for o in 0..outputs {
        let mut connected = false;
        for s in 0..sources {
            if rng.gen_bool(p) {
                genome.genes.push(new_template_link(s, o, sources, outputs, rng));
                connected = true;
            }
        }
        if !connected && sources > 0 {
            let s = rng.gen_range(0..sources);
            genome.genes.push(new_template_link(s, o, sources, outputs, rng));
        }
    }
    genome.genes.sort_by_key(|g| g.innovation);
    ids.ensure_above(&genome);
    genome
}

fn new_template_link<R: Rng>(
    source: usize,
    output: usize,
    sources: usize,
    outputs: usize,
    rng: &mut R,
) -> LinkGene {
    LinkGene {
        innovation: template_innovation(source, output, outputs),
        from: source as u32,
        to: (sources + output) as u32,
        weight: rng.gen_range(-1.0..=1.0),
        enabled: true,
        recurrent: false,
    }
}

/// Brain genome: `inputs` sensors plus a bias node, each linked to each output with
/// probability `connection_prob`.
pub fn create_brain_genome<R: Rng>(
    id: u64,
    inputs: usize,
    outputs: usize,
    connection_prob: f32,
    output_activation: Activation,
    ids: &mut IdGenerator,
    rng: &mut R,
) -> Genome {
    create_template(
        id,
        inputs,
        true,
        outputs,
        output_activation,
        connection_prob,
        ids,
        rng,
    )
}

/// Fully connected brain genome with no hidden nodes.
pub fn create_minimal_brain_genome<R: Rng>(
    id: u64,
    inputs: usize,
    outputs: usize,
    output_activation: Activation,
    ids: &mut IdGenerator,
    rng: &mut R,
) -> Genome {
    create_brain_genome(id, inputs, outputs, 1.0, output_activation, ids, rng)
}

/// Body genome queried over the morphology grid.
pub fn create_cppn_genome<R: Rng>(
    id: u64,
    connection_prob: f32,
    ids: &mut IdGenerator,
    rng: &mut R,
) -> Genome {
    create_template(
        id,
        CPPN_INPUTS,
        false,
        CPPN_OUTPUTS,
        Activation::Tanh,
        connection_prob,
        ids,
        rng,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_brain_genome_layout() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ids = IdGenerator::new();
        let g = create_brain_genome(1, 6, 4, 0.0, Activation::Sigmoid, &mut ids, &mut rng);
        assert_eq!(g.input_count(), 6);
        assert_eq!(g.output_count(), 4);
        assert_eq!(g.ids_with_role(NodeRole::Bias), vec![6]);
        // Zero probability still wires every output once.
        for out in g.ids_with_role(NodeRole::Output) {
            assert_eq!(g.genes.iter().filter(|l| l.to == out).count(), 1);
        }
        assert!(ids.peek_innovation() > g.max_innovation());
    }

    #[test]
    fn test_founders_share_innovations() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut ids = IdGenerator::new();
        let a = create_minimal_brain_genome(1, 3, 2, Activation::Sigmoid, &mut ids, &mut rng);
        let b = create_minimal_brain_genome(2, 3, 2, Activation::Sigmoid, &mut ids, &mut rng);
        let ia: Vec<u64> = a.genes.iter().map(|g| g.innovation).collect();
        let ib: Vec<u64> = b.genes.iter().map(|g| g.innovation).collect();
        assert_eq!(ia, ib);
        assert_eq!(ia.len(), 8);
        assert_ne!(a.genes[0].weight, b.genes[0].weight);
    }

    #[test]
    fn test_cppn_genome_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut ids = IdGenerator::new();
        let g = create_cppn_genome(9, 0.5, &mut ids, &mut rng);
        assert_eq!(g.input_count(), CPPN_INPUTS);
        assert_eq!(g.output_count(), CPPN_OUTPUTS);
        assert!(g
            .nodes
            .iter()
            .filter(|n| n.role == NodeRole::Output)
            .all(|n| n.activation == Activation::Tanh));
    }
}
