//! Body generation by querying a CPPN genome over a coordinate grid.

use crate::config::CppnConfig;
use crate::error::{CoreError, Result};
use crate::genetics::{CPPN_INPUTS, CPPN_OUTPUTS};
use crate::network::Network;
use biosoup_data::{CellSpec, CellType, Genome, MorphologyResult};

pub const OUT_PRESENCE: usize = 0;
/// First of the seven functional outputs, ordered as [`CellType::FUNCTIONAL`].
pub const OUT_FUNCTIONS: usize = 1;
pub const OUT_DIGESTIVE: usize = 8;
pub const OUT_REPRODUCTIVE: usize = 9;
pub const OUT_ARMOR: usize = 10;
pub const OUT_STORAGE: usize = 11;
pub const OUT_BRAIN_WEIGHT: usize = 12;
pub const OUT_BRAIN_LEO: usize = 13;

/// Strength of functions injected by the fallback cell and viability repair.
const DEFAULT_STRENGTH: f32 = 0.5;

/// Maps a tanh output onto `[0, 1]`.
#[inline]
pub fn normalize_output(v: f32) -> f32 {
    ((v + 1.0) * 0.5).clamp(0.0, 1.0)
}

/// CPPN inputs for a normalized grid coordinate.
pub fn cppn_inputs(x: f32, y: f32) -> [f32; CPPN_INPUTS] {
    let d = (x * x + y * y).sqrt();
    let a = y.atan2(x) / std::f32::consts::PI;
    [x, y, d, a, 1.0]
}

/// Grid index to `[-1, 1]`.
#[inline]
pub fn grid_coordinate(index: usize, grid_size: usize) -> f32 {
    if grid_size <= 1 {
        return 0.0;
    }
    index as f32 / (grid_size - 1) as f32 * 2.0 - 1.0
}

/// Primary and optional secondary function of one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionSelection {
    pub primary: CellType,
    pub primary_strength: f32,
    pub secondary: CellType,
    pub secondary_strength: f32,
}

/// Argmax of the normalized functional outputs; the runner-up becomes a secondary function
/// when it clears `secondary_threshold`, at the cost of both strengths.
pub fn select_cell_functions(raw: &[f32], config: &CppnConfig) -> FunctionSelection {
    let mut ranked: Vec<(usize, f32)> = raw
        .iter()
        .take(CellType::FUNCTIONAL.len())
        .map(|&v| normalize_output(v))
        .enumerate()
        .collect();
    // Stable: ties keep output order.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let Some(&(best, best_value)) = ranked.first() else {
        return FunctionSelection {
            primary: CellType::Sensor,
            primary_strength: DEFAULT_STRENGTH,
            secondary: CellType::None,
            secondary_strength: 0.0,
        };
    };
    match ranked.get(1) {
        Some(&(second, value)) if value > config.secondary_threshold => FunctionSelection {
            primary: CellType::FUNCTIONAL[best],
            primary_strength: best_value * config.mixed_primary_penalty,
            secondary: CellType::FUNCTIONAL[second],
            secondary_strength: value * config.mixed_secondary_scale,
        },
        _ => FunctionSelection {
            primary: CellType::FUNCTIONAL[best],
            primary_strength: best_value,
            secondary: CellType::None,
            secondary_strength: 0.0,
        },
    }
}

/// Single cell used when no grid position is present.
pub fn fallback_cell() -> CellSpec {
    CellSpec {
        grid_x: 0,
        grid_y: 0,
        primary: CellType::Sensor,
        primary_strength: DEFAULT_STRENGTH,
        secondary: CellType::Actuator,
        secondary_strength: DEFAULT_STRENGTH,
        digestive_spectrum: 0.5,
        reproductive_spectrum: 0.5,
        structural_armor: 0.0,
        storage_capacity: 0.0,
    }
}

/// Patches in sensor and actuator capability when the body lacks either.
/// Returns whether anything was changed.
pub fn ensure_viability(cells: &mut [CellSpec], config: &CppnConfig) -> bool {
    let mut repaired = false;
    for (need, other) in [
        (CellType::Sensor, CellType::Actuator),
        (CellType::Actuator, CellType::Sensor),
    ] {
        if cells.is_empty() || cells.iter().any(|c| c.has_function(need)) {
            continue;
        }
        repaired = true;
        let injected = DEFAULT_STRENGTH * config.mixed_secondary_scale;

        if let Some(cell) = cells.iter_mut().find(|c| !c.has_secondary()) {
            cell.secondary = need;
            cell.secondary_strength = injected;
            cell.primary_strength *= config.mixed_primary_penalty;
            continue;
        }

        let other_providers = cells.iter().filter(|c| c.has_function(other)).count();
        let sole_provider = |c: &CellSpec| c.secondary == other && other_providers == 1;
        if let Some(cell) = cells.iter_mut().find(|c| !sole_provider(c)) {
            cell.secondary = need;
            cell.secondary_strength = injected;
            continue;
        }

        if let Some(cell) = cells.iter_mut().find(|c| c.primary != other) {
            cell.primary = need;
            cell.primary_strength = DEFAULT_STRENGTH;
        }
    }
    repaired
}

/// What happened while generating one body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MorphologyReport {
    /// Grid positions whose query failed.
    pub skipped: usize,
    /// Positions above the presence threshold before truncation.
    pub candidates: usize,
    pub fallback: bool,
    pub repaired: bool,
}

pub fn generate_morphology(
    body_genome: Option<&Genome>,
    config: &CppnConfig,
) -> Result<MorphologyResult> {
    generate_morphology_with_report(body_genome, config).map(|(result, _)| result)
}

pub fn generate_morphology_with_report(
    body_genome: Option<&Genome>,
    config: &CppnConfig,
) -> Result<(MorphologyResult, MorphologyReport)> {
    let genome = body_genome.ok_or(CoreError::MissingGenome("body genome"))?;
    let mut network = Network::from_genome(genome)
        .map_err(|e| e.with_context(format!("building CPPN for genome {}", genome.id)))?;
    if network.output_count() < CPPN_OUTPUTS {
        return Err(CoreError::invalid_genome(format!(
            "CPPN genome {} has {} outputs, needs {}",
            genome.id,
            network.output_count(),
            CPPN_OUTPUTS
        )));
    }

    let grid = config.grid_size.max(2);
    let half = (grid / 2) as i32;
    let mut report = MorphologyReport::default();
    let mut candidates: Vec<(f32, CellSpec)> = Vec::new();

    for gx in 0..grid {
        for gy in 0..grid {
            let x = grid_coordinate(gx, grid);
            let y = grid_coordinate(gy, grid);
            let outputs = match network.evaluate(&cppn_inputs(x, y), 1) {
                Ok(outputs) => outputs,
                Err(err) => {
                    tracing::debug!(genome = genome.id, gx, gy, error = %err, "CPPN query skipped");
                    report.skipped += 1;
                    continue;
                }
            };
            let presence = outputs[OUT_PRESENCE];
            if presence <= config.presence_threshold {
                continue;
            }
            let functions = select_cell_functions(&outputs[OUT_FUNCTIONS..OUT_DIGESTIVE], config);
            candidates.push((
                presence,
                CellSpec {
                    grid_x: (gx as i32 - half) as i8,
                    grid_y: (gy as i32 - half) as i8,
                    primary: functions.primary,
                    primary_strength: functions.primary_strength,
                    secondary: functions.secondary,
                    secondary_strength: functions.secondary_strength,
                    digestive_spectrum: normalize_output(outputs[OUT_DIGESTIVE]),
                    reproductive_spectrum: normalize_output(outputs[OUT_REPRODUCTIVE]),
                    structural_armor: normalize_output(outputs[OUT_ARMOR]) * config.max_armor,
                    storage_capacity: normalize_output(outputs[OUT_STORAGE]),
                },
            ));
        }
    }

    report.candidates = candidates.len();
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
    let mut cells: Vec<CellSpec> = candidates
        .into_iter()
        .take(config.max_cells.max(1))
        .map(|(_, cell)| cell)
        .collect();

    if cells.is_empty() {
        report.fallback = true;
        cells.push(fallback_cell());
    }
    report.repaired = ensure_viability(&mut cells, config);

    let mean_spectrum =
        cells.iter().map(|c| c.digestive_spectrum).sum::<f32>() / cells.len() as f32;
    let result = MorphologyResult {
        cells,
        diet_bias: (mean_spectrum * 2.0 - 1.0).clamp(-1.0, 1.0),
    };
    Ok((result, report))
}
