//! Phenotype networks built from genomes.
//!
//! Activation is synchronous: each step every computed node reads the values its sources held
//! after the previous step. A signal therefore needs one step per link to travel, and the
//! caller bounds the number of steps.

pub mod activation;

use crate::error::{CoreError, Result};
use biosoup_data::{Genome, NodeGene, NodeRole};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Network {
    nodes: Vec<NodeGene>,
    inputs: Vec<usize>,
    biases: Vec<usize>,
    outputs: Vec<usize>,
    /// `(source index, weight)` per enabled link, grouped by target.
    incoming_flat: Vec<(usize, f32)>,
    incoming_offsets: Vec<usize>,
    values: Vec<f32>,
    scratch: Vec<f32>,
    depth: usize,
    link_count: usize,
}

impl Network {
    /// Builds the phenotype over the genome's enabled genes.
    pub fn from_genome(genome: &Genome) -> Result<Self> {
        if genome.nodes.is_empty() {
            return Err(CoreError::invalid_genome(format!(
                "genome {} has no nodes",
                genome.id
            )));
        }
        let nodes = genome.nodes.clone();
        let node_idx_map: HashMap<u32, usize> =
            nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();

        let mut per_target: Vec<Vec<(usize, f32)>> = vec![Vec::new(); nodes.len()];
        let mut forward_edges: Vec<(usize, usize)> = Vec::new();
        let mut link_count = 0;
        for gene in genome.genes.iter().filter(|g| g.enabled) {
            let (Some(&from), Some(&to)) =
                (node_idx_map.get(&gene.from), node_idx_map.get(&gene.to))
            else {
                return Err(CoreError::invalid_genome(format!(
                    "gene {} references a missing node",
                    gene.innovation
                )));
            };
            if nodes[to].role.is_sensor() {
                return Err(CoreError::invalid_genome(format!(
                    "gene {} targets sensor node {}",
                    gene.innovation, gene.to
                )));
            }
            per_target[to].push((from, gene.weight));
            if !gene.recurrent {
                forward_edges.push((from, to));
            }
            link_count += 1;
        }

        let mut incoming_flat = Vec::with_capacity(link_count);
        let mut incoming_offsets = Vec::with_capacity(nodes.len() + 1);
        for links in per_target {
            incoming_offsets.push(incoming_flat.len());
            incoming_flat.extend(links);
        }
        incoming_offsets.push(incoming_flat.len());

        let index_of = |role: NodeRole| -> Vec<usize> {
            nodes
                .iter()
                .enumerate()
                .filter(|(_, n)| n.role == role)
                .map(|(i, _)| i)
                .collect()
        };
        let inputs = index_of(NodeRole::Input);
        let biases = index_of(NodeRole::Bias);
        let outputs = index_of(NodeRole::Output);
        let depth = longest_path(&nodes, &forward_edges, &outputs);
        let len = nodes.len();

        let mut network = Self {
            nodes,
            inputs,
            biases,
            outputs,
            incoming_flat,
            incoming_offsets,
            values: vec![0.0; len],
            scratch: vec![0.0; len],
            depth,
            link_count,
        };
        network.flush();
        Ok(network)
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.link_count
    }

    /// Longest sensor-to-output path over enabled non-recurrent links.
    pub fn max_activation_depth(&self) -> usize {
        self.depth
    }

    pub fn load_sensors(&mut self, values: &[f32]) -> Result<()> {
        if values.len() != self.inputs.len() {
            return Err(CoreError::SensorLoad(format!(
                "expected {} sensor values, got {}",
                self.inputs.len(),
                values.len()
            )));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(CoreError::sensor_load(format!(
                "sensor {} is not finite",
                pos
            )));
        }
        for (&idx, &v) in self.inputs.iter().zip(values) {
            self.values[idx] = v;
        }
        Ok(())
    }

    /// Runs one synchronous step.
    pub fn activate(&mut self) -> Result<()> {
        self.scratch.copy_from_slice(&self.values);
        for idx in 0..self.nodes.len() {
            let node = self.nodes[idx];
            if node.role.is_sensor() {
                continue;
            }
            let start = self.incoming_offsets[idx];
            let end = self.incoming_offsets[idx + 1];
            if start == end {
                continue;
            }
            let sum: f32 = self.incoming_flat[start..end]
                .iter()
                .map(|&(from, w)| self.values[from] * w)
                .sum();
            let out = activation::apply(node.activation, sum);
            if !out.is_finite() {
                return Err(CoreError::activation(format!(
                    "node {} produced a non-finite value",
                    node.id
                )));
            }
            self.scratch[idx] = out;
        }
        std::mem::swap(&mut self.values, &mut self.scratch);
        Ok(())
    }

    pub fn read_outputs(&self) -> Vec<f32> {
        self.outputs.iter().map(|&idx| self.values[idx]).collect()
    }

    /// Clears all node state; bias nodes return to 1.0.
    pub fn flush(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
        for &idx in &self.biases {
            self.values[idx] = 1.0;
        }
    }

    /// Loads, activates `max(depth, min_steps)` times, reads and flushes.
    pub fn evaluate(&mut self, inputs: &[f32], min_steps: usize) -> Result<Vec<f32>> {
        let result = self.evaluate_inner(inputs, min_steps);
        self.flush();
        result
    }

    fn evaluate_inner(&mut self, inputs: &[f32], min_steps: usize) -> Result<Vec<f32>> {
        self.load_sensors(inputs)?;
        for _ in 0..self.depth.max(min_steps) {
            self.activate()?;
        }
        Ok(self.read_outputs())
    }
}

/// Longest path (in links) from a sensor to any output, ignoring links that close a cycle.
fn longest_path(nodes: &[NodeGene], edges: &[(usize, usize)], outputs: &[usize]) -> usize {
    let len = nodes.len();
    let mut in_degree = vec![0usize; len];
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); len];
    for &(from, to) in edges {
        adjacency[from].push(to);
        in_degree[to] += 1;
    }
    let mut dist: Vec<Option<usize>> = nodes
        .iter()
        .map(|n| n.role.is_sensor().then_some(0))
        .collect();
    let mut queue: Vec<usize> = (0..len).filter(|&i| in_degree[i] == 0).collect();
    let mut head = 0;
    while head < queue.len() {
        let node = queue[head];
        head += 1;
        for &next in &adjacency[node] {
            if let Some(d) = dist[node] {
                dist[next] = Some(dist[next].map_or(d + 1, |cur| cur.max(d + 1)));
            }
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push(next);
            }
        }
    }
    outputs.iter().filter_map(|&o| dist[o]).max().unwrap_or(0)
}
