//! # Biosoup Data
//!
//! Plain value types exchanged between the evolutionary core and its host: genomes, body
//! layouts, capability aggregates, sensory snapshots and serialized brain weights.

pub mod data;

pub use data::body::{Capabilities, CellSpec, CellType, DietClass, MorphologyResult};
pub use data::genome::{Activation, Genome, LinkGene, NodeGene, NodeRole};
pub use data::sensing::{BehaviorOutputs, EntityInfo, SensorCell};
pub use data::snapshot::{from_snapshot, to_snapshot};
pub use data::weights::BrainWeights;
