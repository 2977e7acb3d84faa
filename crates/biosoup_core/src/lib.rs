//! # Biosoup Core
//!
//! The evolutionary neural-control core for Biosoup, a soup of cell-built organisms that sense,
//! feed and breed.
//!
//! This crate contains:
//! - NEAT genomes and genetic operators (crossover, mutation, compatibility)
//! - Speciation with staleness-based removal
//! - CPPN morphology generation and substrate brain construction
//! - Genome-derived and fixed-topology brain controllers
//! - Polar vision, the sensory schema and the capability-based feeding model
//! - Configuration, typed errors, metrics and structured logging
//!
//! ## Determinism
//!
//! Nothing here reaches for global state. Randomness is threaded through an explicit
//! `&mut impl Rng` and identifiers through an [`ids::IdGenerator`], so identical seeds give
//! identical runs.
//!
//! ## Example
//!
//! ```
//! use biosoup_core::brain::BrainController;
//! use biosoup_core::genetics::create_minimal_brain_genome;
//! use biosoup_core::ids::IdGenerator;
//! use biosoup_core::sensory::{decode_outputs, input_count, BRAIN_OUTPUTS};
//! use biosoup_data::Activation;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let mut ids = IdGenerator::new();
//! let inputs = input_count(4);
//! let genome = create_minimal_brain_genome(
//!     1,
//!     inputs,
//!     BRAIN_OUTPUTS,
//!     Activation::Sigmoid,
//!     &mut ids,
//!     &mut rng,
//! );
//! let mut brain = BrainController::new(genome, 5).unwrap();
//! let raw = brain.think(&vec![0.5; inputs]).unwrap();
//! assert!(decode_outputs(&raw).is_within_bounds());
//! ```

/// Genome-derived and fixed-topology controllers
pub mod brain;
/// Edibility, penetration and threat between organisms
pub mod capability;
/// Tunable parameters for every operation
pub mod config;
/// Typed errors for contract violations
pub mod error;
/// NEAT crossover, mutation and genome factories
pub mod genetics;
/// Explicit id and innovation counters
pub mod ids;
/// Counters and logging setup
pub mod metrics;
/// CPPN body generation
pub mod morphology;
/// Phenotype networks built from genomes
pub mod network;
/// Brain input and output schema
pub mod sensory;
/// Speciation by compatibility distance
pub mod species;
/// HyperNEAT-style brains grown from the body CPPN
pub mod substrate;
/// Polar vision cones
pub mod vision;

pub use biosoup_data::{
    Activation, BehaviorOutputs, BrainWeights, Capabilities, CellSpec, CellType, EntityInfo,
    Genome, LinkGene, MorphologyResult, NodeGene, NodeRole, SensorCell,
};
pub use error::{CoreError, Result};
