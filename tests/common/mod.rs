pub mod macros;

use biosoup_lib::config::{AppConfig, BrainKind};
use biosoup_lib::data::{Activation, EntityInfo, Genome};
use biosoup_lib::genetics::{create_brain_genome, create_cppn_genome};
use biosoup_lib::ids::IdGenerator;
use biosoup_lib::sensory::{input_count, BRAIN_OUTPUTS};
use biosoup_lib::soup::Soup;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeded rng plus id generator shared by the genome factories.
#[allow(dead_code)]
#[derive(Debug)]
pub struct Lab {
    pub rng: ChaCha8Rng,
    pub ids: IdGenerator,
}

#[allow(dead_code)]
impl Lab {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            ids: IdGenerator::new(),
        }
    }

    pub fn brain(&mut self, connection_prob: f32) -> Genome {
        let id = self.ids.next_genome_id();
        create_brain_genome(
            id,
            input_count(4),
            BRAIN_OUTPUTS,
            connection_prob,
            Activation::Sigmoid,
            &mut self.ids,
            &mut self.rng,
        )
    }

    pub fn body(&mut self, connection_prob: f32) -> Genome {
        let id = self.ids.next_genome_id();
        create_cppn_genome(id, connection_prob, &mut self.ids, &mut self.rng)
    }
}

#[allow(dead_code)]
pub struct SoupBuilder {
    config: AppConfig,
}

#[allow(dead_code)]
impl SoupBuilder {
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.evolution.population = 8;
        config.evolution.ticks_per_generation = 8;
        Self { config }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.evolution.seed = seed;
        self
    }

    pub fn with_brain(mut self, kind: BrainKind) -> Self {
        self.config.brain.kind = kind;
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn config(&self) -> AppConfig {
        self.config.clone()
    }

    pub fn build(self) -> Soup {
        Soup::new(self.config).expect("Failed to create soup")
    }
}

#[allow(dead_code)]
pub struct EntityBuilder {
    info: EntityInfo,
}

#[allow(dead_code)]
impl EntityBuilder {
    pub fn new() -> Self {
        Self {
            info: EntityInfo::default(),
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.info.x = x;
        self.info.y = y;
        self
    }

    pub fn flora(mut self) -> Self {
        self.info.is_flora = true;
        self.info.composition = 1.0;
        self.info.genetic_distance = -1.0;
        self
    }

    pub fn fauna(mut self, composition: f32, spectrum: f32) -> Self {
        self.info.is_flora = false;
        self.info.composition = composition;
        self.info.digestive_spectrum = spectrum;
        self
    }

    pub fn kin(mut self, distance: f32) -> Self {
        self.info.genetic_distance = distance;
        self
    }

    pub fn armor(mut self, armor: f32) -> Self {
        self.info.structural_armor = armor;
        self
    }

    pub fn glowing(mut self, light: f32) -> Self {
        self.info.emitted_light = light;
        self
    }

    pub fn build(self) -> EntityInfo {
        self.info
    }
}
