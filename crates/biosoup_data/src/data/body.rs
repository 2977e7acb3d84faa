use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

/// Function a body cell can perform.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
pub enum CellType {
    #[default]
    None,
    Sensor,
    Actuator,
    Photosynthetic,
    Bioluminescent,
    Mouth,
    Digestive,
    Reproductive,
}

impl CellType {
    /// Functional types in CPPN output order.
    pub const FUNCTIONAL: [CellType; 7] = [
        CellType::Sensor,
        CellType::Actuator,
        CellType::Photosynthetic,
        CellType::Bioluminescent,
        CellType::Mouth,
        CellType::Digestive,
        CellType::Reproductive,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CellType::None => "none",
            CellType::Sensor => "sensor",
            CellType::Actuator => "actuator",
            CellType::Photosynthetic => "photosynthetic",
            CellType::Bioluminescent => "bioluminescent",
            CellType::Mouth => "mouth",
            CellType::Digestive => "digestive",
            CellType::Reproductive => "reproductive",
        }
    }
}

/// One cell of a generated body.
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
pub struct CellSpec {
    /// Offset from the body centre.
    pub grid_x: i8,
    pub grid_y: i8,
    pub primary: CellType,
    pub primary_strength: f32,
    /// `CellType::None` when the cell does one thing.
    pub secondary: CellType,
    pub secondary_strength: f32,
    pub digestive_spectrum: f32,
    pub reproductive_spectrum: f32,
    pub structural_armor: f32,
    pub storage_capacity: f32,
}

impl CellSpec {
    pub fn has_secondary(&self) -> bool {
        self.secondary != CellType::None
    }

    pub fn has_function(&self, kind: CellType) -> bool {
        kind != CellType::None && (self.primary == kind || self.secondary == kind)
    }

    pub fn strength_of(&self, kind: CellType) -> f32 {
        let mut total = 0.0;
        if kind == CellType::None {
            return total;
        }
        if self.primary == kind {
            total += self.primary_strength;
        }
        if self.secondary == kind {
            total += self.secondary_strength;
        }
        total
    }
}

/// Coarse diet label derived from the mean digestive spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DietClass {
    Herbivore,
    Omnivore,
    Carnivore,
}

impl DietClass {
    pub const HERBIVORE_MAX: f32 = 0.35;
    pub const CARNIVORE_MIN: f32 = 0.65;

    pub fn from_spectrum(spectrum: f32) -> Self {
        if spectrum < Self::HERBIVORE_MAX {
            DietClass::Herbivore
        } else if spectrum > Self::CARNIVORE_MIN {
            DietClass::Carnivore
        } else {
            DietClass::Omnivore
        }
    }
}

/// A generated body: ordered cells plus a diet bias in `[-1, 1]`.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Default,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct MorphologyResult {
    pub cells: Vec<CellSpec>,
    pub diet_bias: f32,
}

impl MorphologyResult {
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn count_of(&self, kind: CellType) -> usize {
        self.cells.iter().filter(|c| c.has_function(kind)).count()
    }

    pub fn has_function(&self, kind: CellType) -> bool {
        self.cells.iter().any(|c| c.has_function(kind))
    }

    pub fn total_strength(&self, kind: CellType) -> f32 {
        self.cells.iter().map(|c| c.strength_of(kind)).sum()
    }

    /// `(min_x, min_y, max_x, max_y)` over the cell offsets.
    pub fn bounds(&self) -> Option<(i8, i8, i8, i8)> {
        let first = self.cells.first()?;
        let init = (first.grid_x, first.grid_y, first.grid_x, first.grid_y);
        Some(self.cells.iter().fold(init, |(x0, y0, x1, y1), c| {
            (
                x0.min(c.grid_x),
                y0.min(c.grid_y),
                x1.max(c.grid_x),
                y1.max(c.grid_y),
            )
        }))
    }

    pub fn width(&self) -> usize {
        self.bounds()
            .map_or(0, |(x0, _, x1, _)| (i16::from(x1) - i16::from(x0)) as usize + 1)
    }

    pub fn height(&self) -> usize {
        self.bounds()
            .map_or(0, |(_, y0, _, y1)| (i16::from(y1) - i16::from(y0)) as usize + 1)
    }

    pub fn centroid(&self) -> (f32, f32) {
        if self.cells.is_empty() {
            return (0.0, 0.0);
        }
        let n = self.cells.len() as f32;
        let (sx, sy) = self.cells.iter().fold((0.0, 0.0), |(sx, sy), c| {
            (sx + f32::from(c.grid_x), sy + f32::from(c.grid_y))
        });
        (sx / n, sy / n)
    }

    /// More than 70% of cells have a mirror across the vertical axis.
    pub fn is_symmetric(&self) -> bool {
        if self.cells.len() <= 1 {
            return true;
        }
        let mirrored = self
            .cells
            .iter()
            .filter(|c| {
                let mx = c.grid_x.saturating_neg();
                self.cells
                    .iter()
                    .any(|o| o.grid_x == mx && o.grid_y == c.grid_y)
            })
            .count();
        mirrored as f32 / self.cells.len() as f32 > 0.7
    }

    pub fn mean_digestive_spectrum(&self) -> f32 {
        (self.diet_bias + 1.0) * 0.5
    }

    pub fn diet_class(&self) -> DietClass {
        DietClass::from_spectrum(self.mean_digestive_spectrum())
    }
}

/// Per-organism aggregates over alive cells. Armor and storage are per-cell averages.
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
pub struct Capabilities {
    pub sensor_weight: f32,
    pub actuator_weight: f32,
    pub mouth_weight: f32,
    pub photo_weight: f32,
    pub biolum_weight: f32,
    pub reproductive_weight: f32,
    /// Strength-weighted sum of digestive spectra.
    pub digestive_sum: f32,
    /// Total digestive strength.
    pub digestive_weight: f32,
    pub digestive_count: u32,
    pub structural_armor: f32,
    pub storage_capacity: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_functions() {
        let cell = CellSpec {
            primary: CellType::Sensor,
            primary_strength: 0.8,
            secondary: CellType::Actuator,
            secondary_strength: 0.2,
            ..CellSpec::default()
        };
        assert!(cell.has_function(CellType::Sensor));
        assert!(cell.has_function(CellType::Actuator));
        assert!(!cell.has_function(CellType::Mouth));
        assert!(!cell.has_function(CellType::None));
        assert!((cell.strength_of(CellType::Actuator) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_bounds_and_diet() {
        let body = MorphologyResult {
            cells: vec![
                CellSpec {
                    grid_x: -2,
                    grid_y: 1,
                    ..CellSpec::default()
                },
                CellSpec {
                    grid_x: 3,
                    grid_y: -1,
                    ..CellSpec::default()
                },
            ],
            diet_bias: 0.8,
        };
        assert_eq!(body.bounds(), Some((-2, -1, 3, 1)));
        assert_eq!((body.width(), body.height()), (6, 3));
        assert_eq!(body.centroid(), (0.5, 0.0));
        assert!(!body.is_symmetric());
        assert_eq!(body.diet_class(), DietClass::Carnivore);
        assert_eq!(MorphologyResult::default().bounds(), None);
        assert_eq!(DietClass::from_spectrum(0.5), DietClass::Omnivore);
        assert_eq!(DietClass::from_spectrum(0.1), DietClass::Herbivore);
    }
}
