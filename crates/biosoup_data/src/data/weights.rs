use super::snapshot::{from_snapshot, to_snapshot};
use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

/// Flattened fixed-topology network parameters.
///
/// `layers` holds every layer width including input and output. Weights are stored per layer,
/// row-major with index `j * fan_in + k`; biases follow the same layer order.
#[derive(
    Debug, Clone, PartialEq, Default, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct BrainWeights {
    pub layers: Vec<u32>,
    pub weights: Vec<f32>,
    pub biases: Vec<f32>,
}

impl BrainWeights {
    pub fn expected_weight_count(&self) -> usize {
        self.layers
            .windows(2)
            .map(|w| w[0] as usize * w[1] as usize)
            .sum()
    }

    pub fn expected_bias_count(&self) -> usize {
        self.layers.iter().skip(1).map(|&n| n as usize).sum()
    }

    pub fn is_consistent(&self) -> bool {
        self.layers.len() >= 2
            && self.layers.iter().all(|&n| n > 0)
            && self.weights.len() == self.expected_weight_count()
            && self.biases.len() == self.expected_bias_count()
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        to_snapshot(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        from_snapshot(bytes)
    }
}
