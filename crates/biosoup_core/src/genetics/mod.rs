//! NEAT genetic operators over value-typed genomes.

pub mod compatibility;
pub mod crossover;
pub mod mutation;
pub mod topology;

pub use compatibility::{align, genome_compatibility, Alignment};
pub use crossover::crossover_genomes;
pub use mutation::{mutate_cppn_genome, mutate_genome};
pub use topology::{
    create_brain_genome, create_cppn_genome, create_minimal_brain_genome, CPPN_INPUTS,
    CPPN_OUTPUTS,
};

use crate::config::{CompatibilityConfig, MutationConfig};
use crate::error::{CoreError, Result};
use crate::ids::IdGenerator;
use biosoup_data::Genome;
use rand::Rng;
use std::collections::BTreeSet;

pub trait GenomeLogic {
    fn validate(&self) -> Result<()>;
    fn compatibility(&self, other: &Genome, options: &CompatibilityConfig) -> f32;
    fn clone_with_id(&self, id: u64) -> Genome;
    fn crossover_with_rng<R: Rng>(
        &self,
        other: &Genome,
        fitness: f32,
        other_fitness: f32,
        child_id: u64,
        rng: &mut R,
    ) -> Result<Genome>;
    fn mutate_with_rng<R: Rng>(
        &mut self,
        options: &MutationConfig,
        ids: &mut IdGenerator,
        rng: &mut R,
    ) -> Result<bool>;
}

impl GenomeLogic for Genome {
    fn validate(&self) -> Result<()> {
        validate_genome(self)
    }

    fn compatibility(&self, other: &Genome, options: &CompatibilityConfig) -> f32 {
        genome_compatibility(self, other, options)
    }

    fn clone_with_id(&self, id: u64) -> Genome {
        clone_genome(self, id)
    }

    fn crossover_with_rng<R: Rng>(
        &self,
        other: &Genome,
        fitness: f32,
        other_fitness: f32,
        child_id: u64,
        rng: &mut R,
    ) -> Result<Genome> {
        crossover_genomes(Some(self), Some(other), fitness, other_fitness, child_id, rng)
    }

    fn mutate_with_rng<R: Rng>(
        &mut self,
        options: &MutationConfig,
        ids: &mut IdGenerator,
        rng: &mut R,
    ) -> Result<bool> {
        mutate_genome(Some(self), options, ids, rng)
    }
}

/// Deep copy under a new id.
pub fn clone_genome(genome: &Genome, id: u64) -> Genome {
    Genome {
        id,
        ..genome.clone()
    }
}

/// Checks sorted unique node ids, existing endpoints and unique innovations.
pub fn validate_genome(genome: &Genome) -> Result<()> {
    if genome.nodes.windows(2).any(|w| w[0].id >= w[1].id) {
        return Err(CoreError::invalid_genome(format!(
            "genome {} has unsorted or duplicate node ids",
            genome.id
        )));
    }
    let mut innovations = BTreeSet::new();
    for gene in &genome.genes {
        if !genome.has_node(gene.from) || !genome.has_node(gene.to) {
            return Err(CoreError::invalid_genome(format!(
                "gene {} references a missing node",
                gene.innovation
            )));
        }
        if !innovations.insert(gene.innovation) {
            return Err(CoreError::invalid_genome(format!(
                "innovation {} appears twice",
                gene.innovation
            )));
        }
    }
    Ok(())
}

/// Crossover followed by mutation. The child id comes from `ids`.
pub fn create_offspring<R: Rng>(
    parent1: Option<&Genome>,
    parent2: Option<&Genome>,
    fitness1: f32,
    fitness2: f32,
    options: &MutationConfig,
    ids: &mut IdGenerator,
    rng: &mut R,
) -> Result<Genome> {
    let child_id = ids.next_genome_id();
    let mut child = crossover_genomes(parent1, parent2, fitness1, fitness2, child_id, rng)?;
    mutate_genome(Some(&mut child), options, ids, rng)?;
    Ok(child)
}

/// Body genome offspring, using the CPPN mutation variant.
pub fn create_offspring_cppn<R: Rng>(
    parent1: Option<&Genome>,
    parent2: Option<&Genome>,
    fitness1: f32,
    fitness2: f32,
    options: &MutationConfig,
    ids: &mut IdGenerator,
    rng: &mut R,
) -> Result<Genome> {
    let child_id = ids.next_genome_id();
    let mut child = crossover_genomes(parent1, parent2, fitness1, fitness2, child_id, rng)?;
    mutate_cppn_genome(Some(&mut child), options, ids, rng)?;
    Ok(child)
}

#[cfg(test)]
mod tests {
    use super::*;
    use biosoup_data::Activation;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_clone_is_independent() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ids = IdGenerator::new();
        let original = create_minimal_brain_genome(1, 2, 1, Activation::Sigmoid, &mut ids, &mut rng);
        let mut copy = original.clone_with_id(2);
        copy.genes[0].weight = 99.0;
        assert_eq!(copy.id, 2);
        assert_ne!(original.genes[0].weight, 99.0);
    }

    #[test]
    fn test_validate_catches_bad_genes() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut ids = IdGenerator::new();
        let mut g = create_minimal_brain_genome(1, 2, 1, Activation::Sigmoid, &mut ids, &mut rng);
        assert!(g.validate().is_ok());
        let dup = g.genes[0];
        g.genes.push(dup);
        assert!(matches!(g.validate(), Err(CoreError::InvalidGenome(_))));
        g.genes.pop();
        g.genes[0].to = 500;
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_offspring_lineage_stays_valid() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut ids = IdGenerator::new();
        let options = MutationConfig {
            add_node_prob: 0.5,
            add_link_prob: 0.5,
            toggle_enable_prob: 0.2,
            ..Default::default()
        };
        let mut a = create_brain_genome(1, 4, 2, 0.5, Activation::Sigmoid, &mut ids, &mut rng);
        let mut b = create_brain_genome(2, 4, 2, 0.5, Activation::Sigmoid, &mut ids, &mut rng);
        for round in 0..30u32 {
            let child = create_offspring(
                Some(&a),
                Some(&b),
                round as f32,
                1.0,
                &options,
                &mut ids,
                &mut rng,
            )
            .expect("offspring");
            assert!(child.validate().is_ok());
            b = a;
            a = child;
        }
        assert!(a.generation > 1);
    }
}
