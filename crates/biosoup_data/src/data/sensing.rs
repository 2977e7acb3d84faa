use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

/// Snapshot of a nearby entity, supplied by the world layer each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityInfo {
    pub x: f32,
    pub y: f32,
    /// 1.0 is fully flora-like, 0.0 fully fauna-like.
    pub composition: f32,
    pub digestive_spectrum: f32,
    pub structural_armor: f32,
    /// Negative when unknown.
    pub genetic_distance: f32,
    pub is_flora: bool,
    pub emitted_light: f32,
}

impl Default for EntityInfo {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            composition: 0.5,
            digestive_spectrum: 0.5,
            structural_armor: 0.0,
            genetic_distance: -1.0,
            is_flora: false,
            emitted_light: 0.0,
        }
    }
}

/// One of the observer's own sensor cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorCell {
    pub grid_x: i8,
    pub grid_y: i8,
    pub strength: f32,
}

/// Behaviour intents produced by a brain each tick.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Default,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct BehaviorOutputs {
    /// Turn rate in `[-1, 1]`, positive turns right.
    pub turn: f32,
    /// Forward thrust in `[0, 1]`.
    pub thrust: f32,
    /// Bite gate in `[0, 1]`.
    pub bite: f32,
    /// Mating intent in `[0, 1]`.
    pub mate: f32,
}

impl BehaviorOutputs {
    pub fn is_within_bounds(&self) -> bool {
        (-1.0..=1.0).contains(&self.turn)
            && (0.0..=1.0).contains(&self.thrust)
            && (0.0..=1.0).contains(&self.bite)
            && (0.0..=1.0).contains(&self.mate)
    }
}
