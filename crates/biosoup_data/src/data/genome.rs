use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role a node plays inside a genome.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
pub enum NodeRole {
    /// Receives a sensor value.
    Input,
    /// Constant 1.0 source.
    Bias,
    /// Internal node, created by splitting a link.
    Hidden,
    /// Produces a network output.
    Output,
}

impl NodeRole {
    /// Nodes whose value is supplied from outside rather than computed.
    pub fn is_sensor(self) -> bool {
        matches!(self, NodeRole::Input | NodeRole::Bias)
    }

    pub fn can_be_target(self) -> bool {
        matches!(self, NodeRole::Hidden | NodeRole::Output)
    }
}

/// Activation function tag carried by every node gene.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
pub enum Activation {
    /// Steepened logistic, `1 / (1 + e^(-4.924x))`.
    Sigmoid,
    Tanh,
    /// `e^(-(2.5x)^2)`.
    Gaussian,
    Sine,
    Linear,
    Relu,
}

impl Activation {
    pub const CPPN_SET: [Activation; 5] = [
        Activation::Sigmoid,
        Activation::Tanh,
        Activation::Gaussian,
        Activation::Sine,
        Activation::Linear,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Gaussian => "gaussian",
            Activation::Sine => "sine",
            Activation::Linear => "linear",
            Activation::Relu => "relu",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sigmoid" => Some(Activation::Sigmoid),
            "tanh" => Some(Activation::Tanh),
            "gaussian" => Some(Activation::Gaussian),
            "sine" | "sin" => Some(Activation::Sine),
            "linear" | "identity" => Some(Activation::Linear),
            "relu" => Some(Activation::Relu),
            _ => None,
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A node gene.
#[derive(
    Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct NodeGene {
    pub id: u32,
    pub role: NodeRole,
    pub activation: Activation,
}

/// A connection gene, aligned across genomes by its innovation number.
#[derive(
    Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct LinkGene {
    pub innovation: u64,
    pub from: u32,
    pub to: u32,
    pub weight: f32,
    pub enabled: bool,
    pub recurrent: bool,
}

/// Value-typed genome: flat node and gene lists addressed by integer id.
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct Genome {
    pub id: u64,
    /// Nodes kept sorted by id.
    pub nodes: Vec<NodeGene>,
    pub genes: Vec<LinkGene>,
    pub generation: u32,
}

impl Genome {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            nodes: Vec::new(),
            genes: Vec::new(),
            generation: 0,
        }
    }

    pub fn node(&self, id: u32) -> Option<&NodeGene> {
        self.nodes
            .binary_search_by_key(&id, |n| n.id)
            .ok()
            .map(|idx| &self.nodes[idx])
    }

    pub fn node_mut(&mut self, id: u32) -> Option<&mut NodeGene> {
        match self.nodes.binary_search_by_key(&id, |n| n.id) {
            Ok(idx) => Some(&mut self.nodes[idx]),
            Err(_) => None,
        }
    }

    pub fn has_node(&self, id: u32) -> bool {
        self.node(id).is_some()
    }

    /// Inserts a node keeping the list sorted. Returns false if the id is taken.
    pub fn insert_node(&mut self, node: NodeGene) -> bool {
        match self.nodes.binary_search_by_key(&node.id, |n| n.id) {
            Ok(_) => false,
            Err(pos) => {
                self.nodes.insert(pos, node);
                true
            }
        }
    }

    pub fn ids_with_role(&self, role: NodeRole) -> Vec<u32> {
        self.nodes
            .iter()
            .filter(|n| n.role == role)
            .map(|n| n.id)
            .collect()
    }

    pub fn input_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.role == NodeRole::Input).count()
    }

    pub fn output_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.role == NodeRole::Output)
            .count()
    }

    pub fn hidden_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.role == NodeRole::Hidden)
            .count()
    }

    pub fn enabled_gene_count(&self) -> usize {
        self.genes.iter().filter(|g| g.enabled).count()
    }

    pub fn has_link(&self, from: u32, to: u32) -> bool {
        self.genes.iter().any(|g| g.from == from && g.to == to)
    }

    pub fn max_innovation(&self) -> u64 {
        self.genes.iter().map(|g| g.innovation).max().unwrap_or(0)
    }

    pub fn max_node_id(&self) -> u32 {
        self.nodes.last().map(|n| n.id).unwrap_or(0)
    }

    /// Serialize genome to a hex string.
    pub fn to_hex(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(bytes)
    }

    /// Deserialize genome from a hex string.
    pub fn from_hex(hex_str: &str) -> anyhow::Result<Self> {
        let bytes = hex::decode(hex_str)?;
        let genome = serde_json::from_slice(&bytes)?;
        Ok(genome)
    }
}
