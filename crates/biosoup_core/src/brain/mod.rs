//! Organism controllers.
//!
//! A brain is either derived from an evolving NEAT genome or a fixed-topology feedforward
//! network. Both consume the sensory vector from [`crate::sensory`] and produce raw outputs
//! that [`Brain::decide`] turns into [`BehaviorOutputs`].

pub mod controller;
pub mod fastmath;
pub mod ffnn;

pub use controller::BrainController;
pub use ffnn::{Ffnn, FfnnActivations};

use crate::error::{CoreError, Result};
use crate::sensory::{decode_ffnn_outputs, decode_outputs, default_outputs};
use biosoup_data::BehaviorOutputs;

pub trait Controller {
    fn think(&mut self, inputs: &[f32]) -> Result<Vec<f32>>;
    fn input_count(&self) -> usize;
    fn output_count(&self) -> usize;
}

impl Controller for BrainController {
    fn think(&mut self, inputs: &[f32]) -> Result<Vec<f32>> {
        BrainController::think(self, inputs)
    }

    fn input_count(&self) -> usize {
        BrainController::input_count(self)
    }

    fn output_count(&self) -> usize {
        BrainController::output_count(self)
    }
}

impl Controller for Ffnn {
    fn think(&mut self, inputs: &[f32]) -> Result<Vec<f32>> {
        self.forward(inputs)
    }

    fn input_count(&self) -> usize {
        Ffnn::input_count(self)
    }

    fn output_count(&self) -> usize {
        Ffnn::output_count(self)
    }
}

#[derive(Debug, Clone)]
pub enum Brain {
    Genome(BrainController),
    Fixed(Ffnn),
}

impl Brain {
    /// Thinks and decodes. Failures degrade to idle behaviour and are reported alongside.
    pub fn decide(&mut self, inputs: &[f32]) -> (BehaviorOutputs, Option<CoreError>) {
        match self.think(inputs) {
            Ok(raw) => {
                let outputs = match self {
                    Brain::Genome(_) => decode_outputs(&raw),
                    Brain::Fixed(_) => decode_ffnn_outputs(&raw),
                };
                (outputs, None)
            }
            Err(err) => {
                tracing::trace!(error = %err, "Think failed, using default outputs");
                (default_outputs(), Some(err))
            }
        }
    }

    pub fn as_genome(&self) -> Option<&BrainController> {
        match self {
            Brain::Genome(controller) => Some(controller),
            Brain::Fixed(_) => None,
        }
    }

    pub fn as_fixed(&self) -> Option<&Ffnn> {
        match self {
            Brain::Fixed(net) => Some(net),
            Brain::Genome(_) => None,
        }
    }
}

impl Controller for Brain {
    fn think(&mut self, inputs: &[f32]) -> Result<Vec<f32>> {
        match self {
            Brain::Genome(controller) => controller.think(inputs),
            Brain::Fixed(net) => net.forward(inputs),
        }
    }

    fn input_count(&self) -> usize {
        match self {
            Brain::Genome(controller) => controller.input_count(),
            Brain::Fixed(net) => net.input_count(),
        }
    }

    fn output_count(&self) -> usize {
        match self {
            Brain::Genome(controller) => controller.output_count(),
            Brain::Fixed(net) => net.output_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetics::create_minimal_brain_genome;
    use crate::ids::IdGenerator;
    use crate::sensory::{input_count, BRAIN_OUTPUTS};
    use biosoup_data::Activation;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn brains() -> Vec<Brain> {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut ids = IdGenerator::new();
        let inputs = input_count(4);
        let genome = create_minimal_brain_genome(
            1,
            inputs,
            BRAIN_OUTPUTS,
            Activation::Sigmoid,
            &mut ids,
            &mut rng,
        );
        vec![
            Brain::Genome(BrainController::new(genome, 5).expect("controller")),
            Brain::Fixed(Ffnn::new(inputs, &[8], BRAIN_OUTPUTS, &mut rng)),
        ]
    }

    #[test]
    fn test_both_kinds_decide_within_bounds() {
        for mut brain in brains() {
            assert_eq!(brain.input_count(), 23);
            assert_eq!(brain.output_count(), 4);
            let (outputs, err) = brain.decide(&[0.5; 23]);
            assert!(err.is_none());
            assert!(outputs.is_within_bounds());
        }
    }

    #[test]
    fn test_failed_think_degrades_to_default() {
        for mut brain in brains() {
            let (outputs, err) = brain.decide(&[0.5; 3]);
            assert_eq!(outputs, default_outputs());
            assert!(matches!(err, Some(CoreError::InputMismatch { got: 3, .. })));
        }
    }
}
