//! Speciation by compatibility distance.
//!
//! The manager is an owned context: the host creates one per run and drives the generation
//! cycle explicitly (assign members, report fitness, `end_generation`, `update_representatives`).

use crate::config::{CompatibilityConfig, SpeciationConfig};
use crate::genetics::genome_compatibility;
use biosoup_data::Genome;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Species {
    pub id: u32,
    pub representative: Genome,
    /// Entity ids, rebuilt every generation.
    pub members: Vec<u64>,
    pub best_fitness: f32,
    pub total_fitness: f32,
    pub avg_fitness: f32,
    pub age: u32,
    /// Generations since `best_fitness` last improved.
    pub staleness: u32,
}

impl Species {
    fn new(id: u32, representative: Genome) -> Self {
        Self {
            id,
            representative,
            members: Vec::new(),
            best_fitness: 0.0,
            total_fitness: 0.0,
            avg_fitness: 0.0,
            age: 0,
            staleness: 0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SpeciesStats {
    pub id: u32,
    pub size: usize,
    pub best_fitness: f32,
    pub avg_fitness: f32,
    pub age: u32,
    pub staleness: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SpeciesManager {
    species: Vec<Species>,
    next_species_id: u32,
    speciation: SpeciationConfig,
    compatibility: CompatibilityConfig,
}

impl SpeciesManager {
    pub fn new(speciation: SpeciationConfig, compatibility: CompatibilityConfig) -> Self {
        Self {
            species: Vec::new(),
            next_species_id: 1,
            speciation,
            compatibility,
        }
    }

    /// First species whose representative is within the threshold, else a new species.
    pub fn assign_species(&mut self, genome: &Genome) -> u32 {
        if let Some(id) = self.species_for_genome(genome) {
            return id;
        }
        let id = self.next_species_id;
        self.next_species_id += 1;
        self.species.push(Species::new(id, genome.clone()));
        tracing::debug!(species = id, genome = genome.id, "New species");
        id
    }

    /// Matching species without creating one.
    pub fn species_for_genome(&self, genome: &Genome) -> Option<u32> {
        self.species
            .iter()
            .find(|s| {
                genome_compatibility(&s.representative, genome, &self.compatibility)
                    < self.speciation.compat_threshold
            })
            .map(|s| s.id)
    }

    pub fn add_member(&mut self, species_id: u32, entity_id: u64) -> bool {
        match self.get_mut(species_id) {
            Some(s) => {
                if !s.members.contains(&entity_id) {
                    s.members.push(entity_id);
                }
                true
            }
            None => false,
        }
    }

    pub fn remove_member(&mut self, species_id: u32, entity_id: u64) -> bool {
        match self.get_mut(species_id) {
            Some(s) => {
                let before = s.members.len();
                s.members.retain(|&m| m != entity_id);
                before != s.members.len()
            }
            None => false,
        }
    }

    /// Adds one member's fitness. Improving the best resets staleness.
    pub fn update_fitness(&mut self, species_id: u32, fitness: f32) {
        if let Some(s) = self.get_mut(species_id) {
            s.total_fitness += fitness;
            s.avg_fitness = s.total_fitness / s.members.len().max(1) as f32;
            if fitness > s.best_fitness {
                s.best_fitness = fitness;
                s.staleness = 0;
            }
        }
    }

    /// Ages every species and drops stale or empty ones. Returns how many were removed.
    pub fn end_generation(&mut self) -> usize {
        for s in &mut self.species {
            s.age += 1;
            s.staleness += 1;
        }
        self.remove_stale_species()
    }

    pub fn remove_stale_species(&mut self) -> usize {
        let drop_off = self.speciation.drop_off_age;
        let before = self.species.len();
        self.species
            .retain(|s| !s.members.is_empty() && s.staleness < drop_off);
        let removed = before - self.species.len();
        if removed > 0 {
            tracing::debug!(removed = removed, remaining = self.species.len(), "Species dropped");
        }
        removed
    }

    /// Picks each species' first resolvable member as its representative, then clears members
    /// and fitness totals for the next generation.
    pub fn update_representatives<'a, F>(&mut self, lookup: F)
    where
        F: Fn(u64) -> Option<&'a Genome>,
    {
        for s in &mut self.species {
            if let Some(genome) = s.members.iter().find_map(|&m| lookup(m)) {
                s.representative = genome.clone();
            }
            s.members.clear();
            s.total_fitness = 0.0;
            s.avg_fitness = 0.0;
        }
    }

    pub fn get(&self, species_id: u32) -> Option<&Species> {
        self.species.iter().find(|s| s.id == species_id)
    }

    fn get_mut(&mut self, species_id: u32) -> Option<&mut Species> {
        self.species.iter_mut().find(|s| s.id == species_id)
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn count(&self) -> usize {
        self.species.len()
    }

    pub fn total_members(&self) -> usize {
        self.species.iter().map(|s| s.members.len()).sum()
    }

    pub fn stats(&self) -> Vec<SpeciesStats> {
        self.species
            .iter()
            .map(|s| SpeciesStats {
                id: s.id,
                size: s.members.len(),
                best_fitness: s.best_fitness,
                avg_fitness: s.avg_fitness,
                age: s.age,
                staleness: s.staleness,
            })
            .collect()
    }
}

/// Display color derived from the representative's gene structure.
pub fn species_color(species: &Species) -> (u8, u8, u8) {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(species.id.to_le_bytes());
    for gene in &species.representative.genes {
        hasher.update(gene.innovation.to_le_bytes());
        hasher.update(gene.from.to_le_bytes());
        hasher.update(gene.to.to_le_bytes());
    }
    let digest = hasher.finalize();
    // Lift the floor so colors stay visible on dark backgrounds.
    let lift = |b: u8| 64 + b / 4 * 3;
    (lift(digest[0]), lift(digest[1]), lift(digest[2]))
}

pub fn calculate_fitness(energy_ratio: f32, ticks_alive: u32, offspring: u32) -> f32 {
    energy_ratio.max(0.0) * (ticks_alive as f32 / 1000.0) * (1.0 + 0.5 * offspring as f32)
}

pub fn calculate_breeding_fitness(energy_ratio: f32, cell_count: usize) -> f32 {
    energy_ratio.max(0.0) * (1.0 + 0.1 * cell_count as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetics::create_minimal_brain_genome;
    use crate::ids::IdGenerator;
    use biosoup_data::Activation;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn manager() -> SpeciesManager {
        SpeciesManager::new(SpeciationConfig::default(), CompatibilityConfig::default())
    }

    fn genome(seed: u64) -> Genome {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut ids = IdGenerator::new();
        create_minimal_brain_genome(seed, 3, 2, Activation::Sigmoid, &mut ids, &mut rng)
    }

    #[test]
    fn test_identical_genomes_share_species() {
        let mut m = manager();
        let g = genome(1);
        let a = m.assign_species(&g);
        let b = m.assign_species(&g.clone());
        assert_eq!(a, b);
        assert_eq!(m.count(), 1);
    }

    #[test]
    fn test_distant_genome_founds_species() {
        let mut m = manager();
        let g = genome(1);
        let mut far = g.clone();
        for (i, l) in far.genes.iter_mut().enumerate() {
            l.innovation += 5000 + i as u64;
        }
        let a = m.assign_species(&g);
        let b = m.assign_species(&far);
        assert_ne!(a, b);
        assert_eq!(m.species_for_genome(&far), Some(b));
    }

    #[test]
    fn test_staleness_and_empty_removal() {
        let config = SpeciationConfig {
            drop_off_age: 3,
            ..Default::default()
        };
        let mut m = SpeciesManager::new(config, CompatibilityConfig::default());
        let id = m.assign_species(&genome(1));
        m.add_member(id, 10);
        m.update_fitness(id, 1.0);
        assert_eq!(m.end_generation(), 0);
        assert_eq!(m.end_generation(), 0);
        assert_eq!(m.get(id).map(|s| s.staleness), Some(2));
        assert_eq!(m.end_generation(), 1);
        assert_eq!(m.count(), 0);

        let id = m.assign_species(&genome(2));
        assert_eq!(m.remove_stale_species(), 1, "empty species must go");
        assert!(m.get(id).is_none());
    }

    #[test]
    fn test_fitness_improvement_resets_staleness() {
        let mut m = manager();
        let id = m.assign_species(&genome(1));
        m.add_member(id, 1);
        m.add_member(id, 2);
        m.update_fitness(id, 2.0);
        m.end_generation();
        m.update_fitness(id, 4.0);
        let s = m.get(id).expect("species");
        assert_eq!(s.staleness, 0);
        assert_eq!(s.best_fitness, 4.0);
        assert!((s.avg_fitness - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_update_representatives_clears_members() {
        let mut m = manager();
        let founder = genome(1);
        let id = m.assign_species(&founder);
        let mut member = founder.clone();
        member.id = 77;
        m.add_member(id, 5);
        m.update_representatives(|entity| (entity == 5).then_some(&member));
        let s = m.get(id).expect("species");
        assert_eq!(s.representative.id, 77);
        assert!(s.members.is_empty());
        assert_eq!(m.total_members(), 0);
    }

    #[test]
    fn test_membership_edits() {
        let mut m = manager();
        let id = m.assign_species(&genome(1));
        assert!(m.add_member(id, 3));
        assert!(m.add_member(id, 3));
        assert_eq!(m.total_members(), 1);
        assert!(m.remove_member(id, 3));
        assert!(!m.remove_member(id, 3));
        assert!(!m.add_member(999, 1));
        assert_eq!(m.stats()[0].size, 0);
    }

    #[test]
    fn test_species_color_is_stable() {
        let mut m = manager();
        let id = m.assign_species(&genome(1));
        let s = m.get(id).expect("species");
        assert_eq!(species_color(s), species_color(s));
        let (r, g, b) = species_color(s);
        assert!(r >= 64 && g >= 64 && b >= 64);
    }

    #[test]
    fn test_fitness_helpers() {
        assert!((calculate_fitness(0.5, 2000, 2) - 2.0).abs() < 1e-6);
        assert!((calculate_breeding_fitness(1.0, 10) - 2.0).abs() < 1e-6);
        assert_eq!(calculate_fitness(-1.0, 100, 0), 0.0);
    }
}
