//! The brain's input and output schema.
//!
//! Inputs are `3N + 11` values for `N` vision cones: normalized food, threat and friend cones
//! followed by the scalar senses and a constant bias. Outputs are turn, thrust, bite and mate.

use crate::vision::PolarVision;
use biosoup_data::BehaviorOutputs;
use serde::{Deserialize, Serialize};

/// Scalar senses following the cone channels, bias included.
pub const SCALAR_INPUTS: usize = 11;

pub const SCALAR_LABELS: [&str; SCALAR_INPUTS] = [
    "LightFB",
    "LightLR",
    "LightLevel",
    "Energy",
    "Speed",
    "CellCount",
    "SensorGain",
    "Actuators",
    "BeingEaten",
    "FlowAlign",
    "Bias",
];

pub const OUTPUT_LABELS: [&str; 4] = ["Turn", "Thrust", "Bite", "Mate"];
pub const BRAIN_OUTPUTS: usize = OUTPUT_LABELS.len();

pub fn input_count(cones: usize) -> usize {
    3 * cones.max(1) + SCALAR_INPUTS
}

pub fn input_labels(cones: usize) -> Vec<String> {
    let n = cones.max(1);
    let mut labels = Vec::with_capacity(input_count(n));
    for channel in ["Food", "Threat", "Friend"] {
        labels.extend((0..n).map(|i| format!("{channel}{i}")));
    }
    labels.extend(SCALAR_LABELS.iter().map(|s| s.to_string()));
    labels
}

/// Everything an organism senses in one tick.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SensoryInputs {
    /// Already normalized, see [`PolarVision::normalized`].
    pub vision: PolarVision,
    pub light_fb: f32,
    pub light_lr: f32,
    pub light_level: f32,
    pub energy: f32,
    pub speed: f32,
    pub cell_count_norm: f32,
    pub sensor_gain_norm: f32,
    pub actuator_norm: f32,
    pub being_eaten: f32,
    pub flow_alignment: f32,
}

impl SensoryInputs {
    pub fn new(vision: PolarVision) -> Self {
        Self {
            vision,
            light_fb: 0.0,
            light_lr: 0.0,
            light_level: 0.0,
            energy: 0.0,
            speed: 0.0,
            cell_count_norm: 0.0,
            sensor_gain_norm: 0.0,
            actuator_norm: 0.0,
            being_eaten: 0.0,
            flow_alignment: 0.0,
        }
    }

    pub fn input_len(&self) -> usize {
        input_count(self.vision.cones())
    }

    /// Flattens into the brain input vector with every value clamped to its range.
    pub fn to_vec(&self) -> Vec<f32> {
        let unit = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        let signed = |v: f32| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };

        let mut out = Vec::with_capacity(self.input_len());
        for channel in [&self.vision.food, &self.vision.threat, &self.vision.friend] {
            out.extend(channel.iter().map(|&v| unit(v)));
        }
        out.extend([
            signed(self.light_fb),
            signed(self.light_lr),
            unit(self.light_level),
            unit(self.energy),
            unit(self.speed),
            unit(self.cell_count_norm),
            unit(self.sensor_gain_norm),
            unit(self.actuator_norm),
            unit(self.being_eaten),
            signed(self.flow_alignment),
            1.0,
        ]);
        out
    }
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Decodes sigmoid-range outputs of a genome network. Short input falls back to defaults.
pub fn decode_outputs(raw: &[f32]) -> BehaviorOutputs {
    if raw.len() < BRAIN_OUTPUTS {
        return default_outputs();
    }
    BehaviorOutputs {
        turn: (finite_or_zero(raw[0]) * 2.0 - 1.0).clamp(-1.0, 1.0),
        thrust: finite_or_zero(raw[1]).clamp(0.0, 1.0),
        bite: finite_or_zero(raw[2]).clamp(0.0, 1.0),
        mate: finite_or_zero(raw[3]).clamp(0.0, 1.0),
    }
}

/// FFNN outputs already carry their final ranges.
pub fn decode_ffnn_outputs(raw: &[f32]) -> BehaviorOutputs {
    if raw.len() < BRAIN_OUTPUTS {
        return default_outputs();
    }
    BehaviorOutputs {
        turn: finite_or_zero(raw[0]).clamp(-1.0, 1.0),
        thrust: finite_or_zero(raw[1]).clamp(0.0, 1.0),
        bite: finite_or_zero(raw[2]).clamp(0.0, 1.0),
        mate: finite_or_zero(raw[3]).clamp(0.0, 1.0),
    }
}

/// Idle behaviour used when thinking fails.
pub fn default_outputs() -> BehaviorOutputs {
    BehaviorOutputs::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_sizes() {
        assert_eq!(input_count(4), 23);
        assert_eq!(input_count(8), 35);
        let labels = input_labels(4);
        assert_eq!(labels.len(), 23);
        assert_eq!(labels[0], "Food0");
        assert_eq!(labels[4], "Threat0");
        assert_eq!(labels[22], "Bias");
    }

    #[test]
    fn test_to_vec_clamps_and_ends_with_bias() {
        let mut vision = PolarVision::new(4);
        vision.food[0] = 3.0;
        vision.threat[1] = f32::NAN;
        let mut inputs = SensoryInputs::new(vision);
        inputs.light_fb = -5.0;
        inputs.energy = 2.0;
        let v = inputs.to_vec();
        assert_eq!(v.len(), inputs.input_len());
        assert_eq!(v[0], 1.0);
        assert_eq!(v[5], 0.0);
        assert_eq!(v[12], -1.0);
        assert_eq!(v[15], 1.0);
        assert_eq!(*v.last().expect("bias"), 1.0);
    }

    #[test]
    fn test_decode_outputs() {
        let out = decode_outputs(&[0.0, 0.5, 1.5, -0.2]);
        assert_eq!(out.turn, -1.0);
        assert_eq!(out.thrust, 0.5);
        assert_eq!(out.bite, 1.0);
        assert_eq!(out.mate, 0.0);
        assert!(out.is_within_bounds());
        assert_eq!(decode_outputs(&[0.9]), default_outputs());

        let out = decode_ffnn_outputs(&[-0.5, 0.25, 0.0, 1.0]);
        assert_eq!(out.turn, -0.5);
        assert_eq!(out.mate, 1.0);
    }
}
