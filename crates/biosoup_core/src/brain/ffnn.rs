//! Fixed-topology feedforward network evolved by weight perturbation only.

use super::fastmath::{fast_tanh, saturate01};
use crate::error::{CoreError, Result};
use biosoup_data::BrainWeights;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Largest magnitude accepted on any input.
const INPUT_LIMIT: f32 = 1e6;

const THRUST_BIAS: f32 = 0.0;
const BITE_BIAS: f32 = -2.0;
const MATE_BIAS: f32 = -2.0;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Ffnn {
    /// Widths of every layer, input and output included.
    layers: Vec<usize>,
    /// Per layer transition, row-major `j * fan_in + k`.
    weights: Vec<Vec<f32>>,
    biases: Vec<Vec<f32>>,
}

/// Layer values recorded during one forward pass.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct FfnnActivations {
    pub inputs: Vec<f32>,
    pub hidden: Vec<Vec<f32>>,
    pub outputs: Vec<f32>,
}

fn gaussian<R: Rng>(rng: &mut R) -> f32 {
    rng.sample::<f32, _>(StandardNormal)
}

impl Ffnn {
    /// He-initialized weights, zero hidden biases and behaviour priors on the output biases.
    pub fn new<R: Rng>(inputs: usize, hidden: &[usize], outputs: usize, rng: &mut R) -> Self {
        let mut layers = Vec::with_capacity(hidden.len() + 2);
        layers.push(inputs.max(1));
        layers.extend(hidden.iter().map(|&n| n.max(1)));
        layers.push(outputs.max(1));

        let mut weights = Vec::with_capacity(layers.len() - 1);
        let mut biases = Vec::with_capacity(layers.len() - 1);
        for pair in layers.windows(2) {
            let (fan_in, fan_out) = (pair[0], pair[1]);
            let scale = (2.0 / fan_in as f32).sqrt();
            weights.push(
                (0..fan_in * fan_out)
                    .map(|_| gaussian(rng) * scale)
                    .collect(),
            );
            biases.push(vec![0.0; fan_out]);
        }

        if let Some(out) = biases.last_mut() {
            for (idx, bias) in [(1, THRUST_BIAS), (2, BITE_BIAS), (3, MATE_BIAS)] {
                if let Some(b) = out.get_mut(idx) {
                    *b = bias;
                }
            }
        }

        Self {
            layers,
            weights,
            biases,
        }
    }

    pub fn input_count(&self) -> usize {
        self.layers[0]
    }

    pub fn output_count(&self) -> usize {
        self.layers[self.layers.len() - 1]
    }

    pub fn layers(&self) -> &[usize] {
        &self.layers
    }

    pub fn hidden_layer_sizes(&self) -> &[usize] {
        &self.layers[1..self.layers.len() - 1]
    }

    pub fn total_hidden_neurons(&self) -> usize {
        self.hidden_layer_sizes().iter().sum()
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.iter().map(Vec::len).sum::<usize>()
            + self.biases.iter().map(Vec::len).sum::<usize>()
    }

    /// Output 0 is a turn in `[-1, 1]`; the rest are gates in `[0, 1]`.
    pub fn forward(&self, inputs: &[f32]) -> Result<Vec<f32>> {
        self.run(inputs, None)
    }

    pub fn forward_with_capture(&self, inputs: &[f32]) -> Result<(Vec<f32>, FfnnActivations)> {
        let mut capture = FfnnActivations::default();
        let outputs = self.run(inputs, Some(&mut capture))?;
        Ok((outputs, capture))
    }

    fn run(&self, inputs: &[f32], mut capture: Option<&mut FfnnActivations>) -> Result<Vec<f32>> {
        if inputs.len() != self.input_count() {
            return Err(CoreError::InputMismatch {
                expected: self.input_count(),
                got: inputs.len(),
            });
        }
        let mut current: Vec<f32> = inputs
            .iter()
            .map(|&v| {
                if v.is_finite() {
                    v.clamp(-INPUT_LIMIT, INPUT_LIMIT)
                } else {
                    0.0
                }
            })
            .collect();
        if let Some(c) = capture.as_deref_mut() {
            c.inputs = current.clone();
        }

        let last = self.weights.len() - 1;
        for (l, (weights, biases)) in self.weights.iter().zip(&self.biases).enumerate() {
            let fan_in = self.layers[l];
            let mut next: Vec<f32> = biases
                .iter()
                .enumerate()
                .map(|(j, &b)| {
                    let row = &weights[j * fan_in..(j + 1) * fan_in];
                    b + row.iter().zip(&current).map(|(w, x)| w * x).sum::<f32>()
                })
                .collect();
            if l < last {
                next.iter_mut().for_each(|v| *v = fast_tanh(*v));
                if let Some(c) = capture.as_deref_mut() {
                    c.hidden.push(next.clone());
                }
            } else {
                for (j, v) in next.iter_mut().enumerate() {
                    *v = if j == 0 {
                        fast_tanh(*v)
                    } else {
                        saturate01(*v * 0.5 + 0.5)
                    };
                }
            }
            current = next;
        }

        if let Some(c) = capture {
            c.outputs = current.clone();
        }
        Ok(current)
    }

    /// Perturbs each parameter with probability `rate` by `N(0, sigma)`.
    pub fn mutate<R: Rng>(&mut self, rate: f32, sigma: f32, rng: &mut R) {
        let p = f64::from(rate.clamp(0.0, 1.0));
        for param in self
            .weights
            .iter_mut()
            .chain(self.biases.iter_mut())
            .flat_map(|layer| layer.iter_mut())
        {
            if rng.gen_bool(p) {
                *param += gaussian(rng) * sigma;
            }
        }
    }

    /// Sparse perturbation: weights at `rate`, biases at `rate / 2`, and a `big_rate` share of
    /// perturbations drawn with `big_sigma`. Returns the mean absolute change.
    pub fn mutate_sparse<R: Rng>(
        &mut self,
        rate: f32,
        sigma: f32,
        big_rate: f32,
        big_sigma: f32,
        rng: &mut R,
    ) -> f32 {
        let mut total = 0.0f32;
        let mut count = 0usize;
        let mut perturb = |param: &mut f32, p: f32, rng: &mut R| {
            if rng.gen::<f32>() < p {
                let s = if rng.gen::<f32>() < big_rate {
                    big_sigma
                } else {
                    sigma
                };
                let delta = gaussian(rng) * s;
                *param += delta;
                total += delta.abs();
                count += 1;
            }
        };
        for (weights, biases) in self.weights.iter_mut().zip(self.biases.iter_mut()) {
            for w in weights.iter_mut() {
                perturb(w, rate, &mut *rng);
            }
            for b in biases.iter_mut() {
                perturb(b, rate * 0.5, &mut *rng);
            }
        }
        if count == 0 {
            0.0
        } else {
            total / count as f32
        }
    }

    pub fn to_weights(&self) -> BrainWeights {
        BrainWeights {
            layers: self.layers.iter().map(|&n| n as u32).collect(),
            weights: self.weights.concat(),
            biases: self.biases.concat(),
        }
    }

    pub fn from_weights(weights: &BrainWeights) -> Result<Self> {
        if !weights.is_consistent() {
            return Err(CoreError::serialization(format!(
                "brain weights for layers {:?} hold {} weights and {} biases",
                weights.layers,
                weights.weights.len(),
                weights.biases.len()
            )));
        }
        let layers: Vec<usize> = weights.layers.iter().map(|&n| n as usize).collect();
        let mut w_rest = weights.weights.as_slice();
        let mut b_rest = weights.biases.as_slice();
        let mut layer_weights = Vec::with_capacity(layers.len() - 1);
        let mut layer_biases = Vec::with_capacity(layers.len() - 1);
        for pair in layers.windows(2) {
            let (w, rest) = w_rest.split_at(pair[0] * pair[1]);
            layer_weights.push(w.to_vec());
            w_rest = rest;
            let (b, rest) = b_rest.split_at(pair[1]);
            layer_biases.push(b.to_vec());
            b_rest = rest;
        }
        Ok(Self {
            layers,
            weights: layer_weights,
            biases: layer_biases,
        })
    }
}
