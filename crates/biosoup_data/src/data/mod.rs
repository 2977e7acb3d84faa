//! Core data structures shared by the biosoup crates.

pub mod body;
pub mod genome;
pub mod sensing;
pub mod snapshot;
pub mod weights;
