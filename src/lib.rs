//! # Biosoup
//!
//! Evolving cell-built organisms: CPPN bodies, NEAT or fixed-topology brains, polar vision
//! and a capability-based feeding model. The [`soup`] module drives headless generations on
//! top of the core crate.

pub mod soup;

pub use biosoup_core::{
    brain, capability, config, error, genetics, ids, metrics, morphology, network, sensory,
    species, substrate, vision,
};
pub use biosoup_data as data;
