use crate::error::{CoreError, Result};
use crate::network::Network;
use biosoup_data::Genome;

/// A brain genome together with its phenotype network.
#[derive(Debug, Clone)]
pub struct BrainController {
    genome: Genome,
    network: Network,
    fallback_depth: usize,
}

impl BrainController {
    pub fn new(genome: Genome, fallback_depth: usize) -> Result<Self> {
        let network = Network::from_genome(&genome)
            .map_err(|e| e.with_context(format!("building brain for genome {}", genome.id)))?;
        Ok(Self {
            genome,
            network,
            fallback_depth: fallback_depth.max(1),
        })
    }

    pub fn from_genome(genome: Option<&Genome>, fallback_depth: usize) -> Result<Self> {
        let genome = genome.ok_or(CoreError::MissingGenome("brain genome"))?;
        Self::new(genome.clone(), fallback_depth)
    }

    /// One decision: load, activate `max(depth, fallback)` steps, read, flush.
    pub fn think(&mut self, inputs: &[f32]) -> Result<Vec<f32>> {
        let expected = self.network.input_count();
        if inputs.len() != expected {
            return Err(CoreError::InputMismatch {
                expected,
                got: inputs.len(),
            });
        }
        self.network.evaluate(inputs, self.fallback_depth)
    }

    /// Steps `think` will run for the current topology.
    pub fn activation_steps(&self) -> usize {
        self.network.max_activation_depth().max(self.fallback_depth)
    }

    /// Must follow any edit made through [`Self::genome_mut`].
    pub fn rebuild_network(&mut self) -> Result<()> {
        self.network = Network::from_genome(&self.genome)?;
        Ok(())
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn genome_mut(&mut self) -> &mut Genome {
        &mut self.genome
    }

    pub fn into_genome(self) -> Genome {
        self.genome
    }

    pub fn input_count(&self) -> usize {
        self.network.input_count()
    }

    pub fn output_count(&self) -> usize {
        self.network.output_count()
    }

    pub fn node_count(&self) -> usize {
        self.network.node_count()
    }

    pub fn link_count(&self) -> usize {
        self.network.link_count()
    }
}
