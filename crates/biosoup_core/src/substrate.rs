//! Brain genomes painted onto a fixed geometric substrate by the body CPPN.
//!
//! Input nodes sit along the top edge pulled toward the sensor centroid, a 3×3 hidden grid sits
//! in the middle and outputs run along `y = -1`. Every candidate link is queried through the
//! CPPN's brain weight and expression outputs.

use crate::config::BrainConfig;
use crate::error::{CoreError, Result};
use crate::genetics::CPPN_OUTPUTS;
use crate::ids::IdGenerator;
use crate::morphology::{OUT_BRAIN_LEO, OUT_BRAIN_WEIGHT};
use crate::network::Network;
use crate::sensory::BRAIN_OUTPUTS;
use biosoup_data::{Activation, CellType, Genome, LinkGene, MorphologyResult, NodeGene, NodeRole};
use serde::{Deserialize, Serialize};

/// Grid offsets are divided by this to land roughly in `[-1, 1]`.
const GRID_SCALE: f32 = 4.0;
const HIDDEN_GAIN: f32 = 2.0;
const DIRECT_GAIN: f32 = 1.5;
const REPAIR_HIDDEN_WEIGHT: f32 = 1.0;
const REPAIR_OUTPUT_WEIGHT: f32 = 1.5;

pub const HIDDEN_POSITIONS: [(f32, f32); 9] = [
    (-0.5, 0.5),
    (0.0, 0.5),
    (0.5, 0.5),
    (-0.5, 0.0),
    (0.0, 0.0),
    (0.5, 0.0),
    (-0.5, -0.5),
    (0.0, -0.5),
    (0.5, -0.5),
];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SubstratePoint {
    pub x: f32,
    pub y: f32,
}

/// Node coordinates for one organism.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Substrate {
    pub sensors: Vec<SubstratePoint>,
    pub inputs: Vec<SubstratePoint>,
    pub hidden: Vec<SubstratePoint>,
    pub outputs: Vec<SubstratePoint>,
}

fn spread(index: usize, count: usize) -> f32 {
    if count <= 1 {
        return 0.0;
    }
    index as f32 / (count - 1) as f32 * 2.0 - 1.0
}

impl Substrate {
    /// Lays out `inputs` input nodes for the given body. A body without sensors gets one
    /// virtual sensor at the origin.
    pub fn from_morphology(morphology: &MorphologyResult, inputs: usize) -> Self {
        let mut sensors: Vec<SubstratePoint> = morphology
            .cells
            .iter()
            .filter(|c| c.has_function(CellType::Sensor))
            .map(|c| SubstratePoint {
                x: f32::from(c.grid_x) / GRID_SCALE,
                y: f32::from(c.grid_y) / GRID_SCALE,
            })
            .collect();
        if sensors.is_empty() {
            sensors.push(SubstratePoint { x: 0.0, y: 0.0 });
        }
        let n = sensors.len() as f32;
        let cx = sensors.iter().map(|p| p.x).sum::<f32>() / n;
        let cy = sensors.iter().map(|p| p.y).sum::<f32>() / n;

        let inputs = (0..inputs)
            .map(|i| SubstratePoint {
                x: spread(i, inputs) * 0.5 + cx * 0.5,
                y: 0.5 + cy * 0.5,
            })
            .collect();
        let hidden = HIDDEN_POSITIONS
            .iter()
            .map(|&(x, y)| SubstratePoint { x, y })
            .collect();
        let outputs = (0..BRAIN_OUTPUTS)
            .map(|j| SubstratePoint {
                x: spread(j, BRAIN_OUTPUTS),
                y: -1.0,
            })
            .collect();
        Self {
            sensors,
            inputs,
            hidden,
            outputs,
        }
    }
}

/// CPPN inputs for a link: source position, distance, direction / pi, bias.
pub fn link_query_inputs(from: SubstratePoint, to: SubstratePoint) -> [f32; 5] {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let dist = (dx * dx + dy * dy).sqrt();
    let angle = dy.atan2(dx) / std::f32::consts::PI;
    [from.x, from.y, dist, angle, 1.0]
}

/// `(weight, expressed)` for a link. A failed query is not expressed.
pub fn query_link(cppn: &mut Network, from: SubstratePoint, to: SubstratePoint) -> (f32, bool) {
    match cppn.evaluate(&link_query_inputs(from, to), 1) {
        Ok(out) => (out[OUT_BRAIN_WEIGHT], out[OUT_BRAIN_LEO] > 0.0),
        Err(err) => {
            tracing::trace!(error = %err, "Substrate link query failed");
            (0.0, false)
        }
    }
}

struct Layout {
    inputs: usize,
    bias: u32,
    hidden_start: u32,
    output_start: u32,
}

impl Layout {
    fn new(inputs: usize) -> Self {
        let bias = inputs as u32;
        Self {
            inputs,
            bias,
            output_start: bias + 1,
            hidden_start: bias + 1 + BRAIN_OUTPUTS as u32,
        }
    }

    fn input(&self, i: usize) -> u32 {
        i as u32
    }

    fn hidden(&self, h: usize) -> u32 {
        self.hidden_start + h as u32
    }

    fn output(&self, j: usize) -> u32 {
        self.output_start + j as u32
    }
}

/// Input feeding a starved output during repair: right food for turning, front food for
/// thrust and bite, front friend for mating.
fn repair_input(output: usize, inputs: usize) -> usize {
    let cones = inputs.saturating_sub(crate::sensory::SCALAR_INPUTS) / 3;
    let idx = match output {
        0 => 1.min(cones.saturating_sub(1)),
        3 => 2 * cones,
        _ => 0,
    };
    idx.min(inputs.saturating_sub(1))
}

fn push_link(genome: &mut Genome, from: u32, to: u32, weight: f32, innovation: u64) {
    genome.genes.push(LinkGene {
        innovation,
        from,
        to,
        weight,
        enabled: true,
        recurrent: false,
    });
}

/// Builds a brain genome with `inputs` sensors from the body CPPN.
pub fn build_substrate_brain(
    body_genome: Option<&Genome>,
    morphology: &MorphologyResult,
    inputs: usize,
    config: &BrainConfig,
    ids: &mut IdGenerator,
) -> Result<Genome> {
    let body = body_genome.ok_or(CoreError::MissingGenome("body genome"))?;
    if inputs == 0 {
        return Err(CoreError::config("substrate brain needs at least one input"));
    }
    let mut cppn = Network::from_genome(body)
        .map_err(|e| e.with_context(format!("building CPPN for genome {}", body.id)))?;
    if cppn.output_count() < CPPN_OUTPUTS {
        return Err(CoreError::invalid_genome(format!(
            "CPPN genome {} has {} outputs, needs {}",
            body.id,
            cppn.output_count(),
            CPPN_OUTPUTS
        )));
    }

    let substrate = Substrate::from_morphology(morphology, inputs);
    let layout = Layout::new(inputs);
    let mut genome = Genome::new(ids.next_genome_id());
    genome.generation = body.generation;
    for i in 0..inputs {
        genome.nodes.push(NodeGene {
            id: layout.input(i),
            role: NodeRole::Input,
            activation: Activation::Linear,
        });
    }
    genome.nodes.push(NodeGene {
        id: layout.bias,
        role: NodeRole::Bias,
        activation: Activation::Linear,
    });
    for j in 0..BRAIN_OUTPUTS {
        genome.nodes.push(NodeGene {
            id: layout.output(j),
            role: NodeRole::Output,
            activation: config.output_activation,
        });
    }
    for h in 0..substrate.hidden.len() {
        genome.nodes.push(NodeGene {
            id: layout.hidden(h),
            role: NodeRole::Hidden,
            activation: Activation::Tanh,
        });
    }

    // Innovations are positional so substrate brains of different organisms align.
    let mut innovation = 0u64;
    for (i, &src) in substrate.inputs.iter().enumerate() {
        for (h, &dst) in substrate.hidden.iter().enumerate() {
            let (w, expressed) = query_link(&mut cppn, src, dst);
            if expressed {
                push_link(&mut genome, layout.input(i), layout.hidden(h), w * HIDDEN_GAIN, innovation);
            }
            innovation += 1;
        }
    }
    for (h, &src) in substrate.hidden.iter().enumerate() {
        for (j, &dst) in substrate.outputs.iter().enumerate() {
            let (w, expressed) = query_link(&mut cppn, src, dst);
            if expressed {
                push_link(&mut genome, layout.hidden(h), layout.output(j), w * HIDDEN_GAIN, innovation);
            }
            innovation += 1;
        }
    }
    for (i, &src) in substrate.inputs.iter().enumerate() {
        for (j, &dst) in substrate.outputs.iter().enumerate() {
            let (w, expressed) = query_link(&mut cppn, src, dst);
            if expressed && w.abs() > config.substrate_direct_threshold {
                push_link(&mut genome, layout.input(i), layout.output(j), w * DIRECT_GAIN, innovation);
            }
            innovation += 1;
        }
    }

    // Repair links get positional innovations after the template blocks.
    let base = innovation;
    let hidden_count = substrate.hidden.len();
    let mut repaired = 0usize;
    for (h, point) in substrate.hidden.iter().enumerate() {
        let target = layout.hidden(h);
        if !genome.genes.iter().any(|g| g.to == target) {
            let idx = (((point.x + 1.0) * 0.5 * (inputs - 1) as f32) as usize).min(inputs - 1);
            push_link(&mut genome, layout.input(idx), target, REPAIR_HIDDEN_WEIGHT, base + h as u64);
            repaired += 1;
        }
    }
    let output_base = base + hidden_count as u64;
    for j in 0..BRAIN_OUTPUTS {
        let target = layout.output(j);
        if !genome.genes.iter().any(|g| g.to == target) {
            let slot = output_base + 2 * j as u64;
            push_link(
                &mut genome,
                layout.hidden(j % hidden_count),
                target,
                REPAIR_OUTPUT_WEIGHT,
                slot,
            );
            let from = layout.input(repair_input(j, layout.inputs));
            push_link(&mut genome, from, target, REPAIR_HIDDEN_WEIGHT, slot + 1);
            repaired += 1;
        }
    }

    ids.ensure_above(&genome);
    tracing::debug!(
        body = body.id,
        brain = genome.id,
        links = genome.genes.len(),
        repaired,
        "Substrate brain built"
    );
    Ok(genome)
}
