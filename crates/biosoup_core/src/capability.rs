//! Feeding compatibility between diet spectra, body composition and armor.
//!
//! A digestive spectrum of 0 is a pure herbivore and 1 a pure carnivore; a composition of 1 is
//! pure flora and 0 pure fauna. All functions are pure and clamp to `[0, 1]`.

use biosoup_data::{Capabilities, CellSpec, CellType};
use serde::{Deserialize, Serialize};

#[inline]
pub fn clamp01(v: f32) -> f32 {
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(0.0, 1.0)
}

/// How well the eater's spectrum matches the target's composition.
#[inline]
pub fn edibility(eater_spectrum: f32, target_composition: f32) -> f32 {
    clamp01(1.0 - (eater_spectrum + target_composition - 1.0).abs())
}

#[inline]
pub fn penetration(edibility: f32, target_armor: f32) -> f32 {
    clamp01(edibility - target_armor)
}

#[inline]
pub fn can_feed(penetration: f32) -> bool {
    penetration > 0.0
}

/// How well they can eat us.
#[inline]
pub fn threat_level(their_spectrum: f32, my_composition: f32, my_armor: f32) -> f32 {
    penetration(edibility(their_spectrum, my_composition), my_armor)
}

#[inline]
pub fn is_threat(their_spectrum: f32, my_composition: f32, my_armor: f32) -> bool {
    threat_level(their_spectrum, my_composition, my_armor) > 0.0
}

/// `penetration^k`, used for reward shaping only.
pub fn nutrition_multiplier(penetration: f32, k: f32) -> f32 {
    let p = clamp01(penetration);
    if p <= 0.0 {
        return 0.0;
    }
    p.powf(k)
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FeedingOutcome {
    pub edibility: f32,
    pub penetration: f32,
    pub can_feed: bool,
    pub nutrition: f32,
}

/// Full feeding evaluation of `eater` against `target`.
pub fn feeding_outcome(eater: &Capabilities, target: &Capabilities, k: f32) -> FeedingOutcome {
    let e = edibility(eater.digestive_spectrum(), target.composition());
    let p = penetration(e, target.structural_armor);
    FeedingOutcome {
        edibility: e,
        penetration: p,
        can_feed: can_feed(p),
        nutrition: nutrition_multiplier(p, k),
    }
}

pub trait CapabilityLogic {
    fn from_cells(cells: &[CellSpec]) -> Self;
    /// `photo / (photo + actuator)`, 0.5 when both are zero.
    fn composition(&self) -> f32;
    /// Strength-weighted mean spectrum of digestive cells, 0.5 without any.
    fn digestive_spectrum(&self) -> f32;
    fn armor(&self) -> f32;
}

impl CapabilityLogic for Capabilities {
    fn from_cells(cells: &[CellSpec]) -> Self {
        let mut caps = Capabilities::default();
        if cells.is_empty() {
            return caps;
        }
        for cell in cells {
            caps.sensor_weight += cell.strength_of(CellType::Sensor);
            caps.actuator_weight += cell.strength_of(CellType::Actuator);
            caps.photo_weight += cell.strength_of(CellType::Photosynthetic);
            caps.biolum_weight += cell.strength_of(CellType::Bioluminescent);
            caps.mouth_weight += cell.strength_of(CellType::Mouth);
            caps.reproductive_weight += cell.strength_of(CellType::Reproductive);
            let digestive = cell.strength_of(CellType::Digestive);
            if cell.has_function(CellType::Digestive) {
                caps.digestive_count += 1;
                caps.digestive_sum += cell.digestive_spectrum * digestive;
                caps.digestive_weight += digestive;
            }
            caps.structural_armor += cell.structural_armor;
            caps.storage_capacity += cell.storage_capacity;
        }
        let n = cells.len() as f32;
        caps.structural_armor /= n;
        caps.storage_capacity /= n;
        caps
    }

    fn composition(&self) -> f32 {
        let total = self.photo_weight + self.actuator_weight;
        if total <= 1e-6 {
            return 0.5;
        }
        self.photo_weight / total
    }

    fn digestive_spectrum(&self) -> f32 {
        if self.digestive_count == 0 || self.digestive_weight <= 1e-6 {
            return 0.5;
        }
        clamp01(self.digestive_sum / self.digestive_weight)
    }

    fn armor(&self) -> f32 {
        clamp01(self.structural_armor)
    }
}

/// Capabilities of a plain flora entity.
pub fn flora_capabilities(armor: f32) -> Capabilities {
    Capabilities {
        photo_weight: 1.0,
        structural_armor: armor,
        ..Capabilities::default()
    }
}
