//! Configuration for the evolutionary core.
//!
//! Every tuning constant lives here and is passed explicitly into the operation that needs it.
//! The core never reads files; hosts parse a TOML document with [`AppConfig::from_toml`].
//!
//! ## Example `biosoup.toml`
//!
//! ```toml
//! [mutation]
//! add_node_prob = 0.05
//!
//! [speciation]
//! compat_threshold = 1.5
//!
//! [vision]
//! cones = 8
//! ```

use biosoup_data::Activation;
use serde::{Deserialize, Serialize};

/// NEAT mutation probabilities and weight bounds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MutationConfig {
    /// Chance that a genome has its weights mutated at all.
    pub link_weights_prob: f32,
    /// Per-gene chance of perturbing rather than replacing.
    pub perturb_prob: f32,
    pub weight_mut_power: f32,
    /// Replacement weights are drawn from `[-replace_range, replace_range]`.
    pub replace_range: f32,
    pub max_weight: f32,
    pub add_node_prob: f32,
    pub add_link_prob: f32,
    pub toggle_enable_prob: f32,
    pub max_link_attempts: u32,
    /// CPPN genomes only.
    pub activation_mut_prob: f32,
    pub hidden_activation: Activation,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            link_weights_prob: 0.8,
            perturb_prob: 0.9,
            weight_mut_power: 2.5,
            replace_range: 2.0,
            max_weight: 8.0,
            add_node_prob: 0.10,
            add_link_prob: 0.15,
            toggle_enable_prob: 0.01,
            max_link_attempts: 20,
            activation_mut_prob: 0.05,
            hidden_activation: Activation::Sigmoid,
        }
    }
}

/// Coefficients of the compatibility distance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CompatibilityConfig {
    pub excess_coeff: f32,
    pub disjoint_coeff: f32,
    pub mutdiff_coeff: f32,
    /// Genomes smaller than this are not normalized by gene count.
    pub normalize_threshold: usize,
}

impl Default for CompatibilityConfig {
    fn default() -> Self {
        Self {
            excess_coeff: 1.0,
            disjoint_coeff: 1.0,
            mutdiff_coeff: 0.4,
            normalize_threshold: 20,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SpeciationConfig {
    pub compat_threshold: f32,
    /// Species this many generations without improvement are dropped.
    pub drop_off_age: u32,
}

impl Default for SpeciationConfig {
    fn default() -> Self {
        Self {
            compat_threshold: 1.2,
            drop_off_age: 25,
        }
    }
}

/// Body generation parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CppnConfig {
    pub grid_size: usize,
    pub max_cells: usize,
    /// Raw presence output a grid cell must exceed.
    pub presence_threshold: f32,
    pub secondary_threshold: f32,
    pub mixed_primary_penalty: f32,
    pub mixed_secondary_scale: f32,
    pub max_armor: f32,
    /// Link probability for freshly created body genomes.
    pub connection_prob: f32,
}

impl Default for CppnConfig {
    fn default() -> Self {
        Self {
            grid_size: 8,
            max_cells: 24,
            presence_threshold: 0.3,
            secondary_threshold: 0.25,
            mixed_primary_penalty: 0.85,
            mixed_secondary_scale: 0.35,
            max_armor: 1.0,
            connection_prob: 0.5,
        }
    }
}

/// Which controller backs new organisms.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BrainKind {
    Genome,
    Substrate,
    Fixed,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BrainConfig {
    pub kind: BrainKind,
    /// Activation steps used when the topology reports a shallower depth.
    pub fallback_depth: usize,
    /// Link probability for freshly created brain genomes.
    pub connection_prob: f32,
    pub output_activation: Activation,
    /// Substrate links below this magnitude are not expressed as direct links.
    pub substrate_direct_threshold: f32,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            kind: BrainKind::Genome,
            fallback_depth: 5,
            connection_prob: 0.3,
            output_activation: Activation::Sigmoid,
            substrate_direct_threshold: 0.3,
        }
    }
}

/// Fixed-topology network shape and sparse mutation parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FfnnConfig {
    pub hidden_layers: Vec<usize>,
    pub mutation_rate: f32,
    pub mutation_sigma: f32,
    pub big_mutation_rate: f32,
    pub big_mutation_sigma: f32,
}

impl Default for FfnnConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![16],
            mutation_rate: 0.05,
            mutation_sigma: 0.1,
            big_mutation_rate: 0.1,
            big_mutation_sigma: 0.5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct VisionConfig {
    pub cones: usize,
    pub radius: f32,
    /// Exponent `k` of the `cos^k` sensor alignment.
    pub focus_exponent: i32,
    pub min_intensity: f32,
    pub max_cone_intensity: f32,
    /// Flat cone weight for organisms without usable sensors.
    pub no_sensor_weight: f32,
    /// Lower bound on any cone weight once sensors exist.
    pub min_sensor_weight: f32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            cones: 4,
            radius: 100.0,
            focus_exponent: 4,
            min_intensity: 1e-6,
            max_cone_intensity: 10.0,
            no_sensor_weight: 0.3,
            min_sensor_weight: 0.1,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FeedingConfig {
    /// Exponent of the nutrition multiplier.
    pub nutrition_exponent: f32,
    /// Armor of flora entities without a body of their own.
    pub flora_armor: f32,
}

impl Default for FeedingConfig {
    fn default() -> Self {
        Self {
            nutrition_exponent: 3.0,
            flora_armor: 0.0,
        }
    }
}

/// Headless run driver parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population: usize,
    pub generations: usize,
    pub ticks_per_generation: usize,
    /// Entities placed around each organism per evaluation tick.
    pub neighbors: usize,
    pub seed: u64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population: 32,
            generations: 10,
            ticks_per_generation: 20,
            neighbors: 6,
            seed: 42,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub mutation: MutationConfig,
    pub compatibility: CompatibilityConfig,
    pub speciation: SpeciationConfig,
    pub cppn: CppnConfig,
    pub brain: BrainConfig,
    pub ffnn: FfnnConfig,
    pub vision: VisionConfig,
    pub feeding: FeedingConfig,
    pub evolution: EvolutionConfig,
}

fn is_probability(p: f32) -> bool {
    (0.0..=1.0).contains(&p)
}

impl AppConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let m = &self.mutation;
        for (name, p) in [
            ("link_weights_prob", m.link_weights_prob),
            ("perturb_prob", m.perturb_prob),
            ("add_node_prob", m.add_node_prob),
            ("add_link_prob", m.add_link_prob),
            ("toggle_enable_prob", m.toggle_enable_prob),
            ("activation_mut_prob", m.activation_mut_prob),
        ] {
            anyhow::ensure!(is_probability(p), "Mutation {} must be in [0, 1]", name);
        }
        anyhow::ensure!(m.max_weight > 0.0, "Max weight must be positive");
        anyhow::ensure!(
            m.weight_mut_power >= 0.0,
            "Weight mutation power must be non-negative"
        );
        anyhow::ensure!(m.replace_range >= 0.0, "Replace range must be non-negative");

        let c = &self.compatibility;
        anyhow::ensure!(
            c.excess_coeff >= 0.0 && c.disjoint_coeff >= 0.0 && c.mutdiff_coeff >= 0.0,
            "Compatibility coefficients must be non-negative"
        );
        anyhow::ensure!(
            self.speciation.compat_threshold > 0.0,
            "Compatibility threshold must be positive"
        );
        anyhow::ensure!(
            self.speciation.drop_off_age > 0,
            "Drop-off age must be positive"
        );

        let cppn = &self.cppn;
        anyhow::ensure!(
            (2..=32).contains(&cppn.grid_size),
            "CPPN grid size must be in [2, 32]"
        );
        anyhow::ensure!(cppn.max_cells >= 1, "Max cells must be at least 1");
        anyhow::ensure!(
            (-1.0..1.0).contains(&cppn.presence_threshold),
            "Presence threshold must be in [-1, 1)"
        );
        anyhow::ensure!(
            is_probability(cppn.secondary_threshold),
            "Secondary threshold must be in [0, 1]"
        );
        anyhow::ensure!(
            is_probability(cppn.mixed_primary_penalty) && is_probability(cppn.mixed_secondary_scale),
            "Mixed-function scales must be in [0, 1]"
        );
        anyhow::ensure!(is_probability(cppn.max_armor), "Max armor must be in [0, 1]");
        anyhow::ensure!(
            is_probability(cppn.connection_prob),
            "CPPN connection probability must be in [0, 1]"
        );

        anyhow::ensure!(
            self.brain.fallback_depth >= 1,
            "Fallback activation depth must be at least 1"
        );
        anyhow::ensure!(
            is_probability(self.brain.connection_prob),
            "Brain connection probability must be in [0, 1]"
        );

        let f = &self.ffnn;
        anyhow::ensure!(
            f.hidden_layers.iter().all(|&n| n > 0),
            "FFNN hidden layers must be non-empty"
        );
        anyhow::ensure!(
            is_probability(f.mutation_rate) && is_probability(f.big_mutation_rate),
            "FFNN mutation rates must be in [0, 1]"
        );
        anyhow::ensure!(
            f.mutation_sigma >= 0.0 && f.big_mutation_sigma >= 0.0,
            "FFNN mutation sigmas must be non-negative"
        );

        let v = &self.vision;
        anyhow::ensure!((1..=64).contains(&v.cones), "Vision cones must be in [1, 64]");
        anyhow::ensure!(v.radius > 0.0, "Vision radius must be positive");
        anyhow::ensure!(v.focus_exponent >= 0, "Focus exponent must be non-negative");
        anyhow::ensure!(
            v.max_cone_intensity > 0.0,
            "Max cone intensity must be positive"
        );
        anyhow::ensure!(
            is_probability(v.no_sensor_weight) && is_probability(v.min_sensor_weight),
            "Sensor weights must be in [0, 1]"
        );

        anyhow::ensure!(
            self.feeding.nutrition_exponent >= 1.0,
            "Nutrition exponent must be at least 1"
        );
        anyhow::ensure!(
            is_probability(self.feeding.flora_armor),
            "Flora armor must be in [0, 1]"
        );

        anyhow::ensure!(
            (2..=10000).contains(&self.evolution.population),
            "Population must be in [2, 10000]"
        );
        anyhow::ensure!(
            self.evolution.ticks_per_generation >= 1,
            "Ticks per generation must be at least 1"
        );
        Ok(())
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Stable digest of every parameter that affects evolution results.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(self).unwrap_or_default());
        hex::encode(hasher.finalize())
    }
}
