//! Polar vision: nearby entities folded into per-cone food, threat, friend and light intensities.
//!
//! Cone 0 is centred on the heading and cones advance clockwise, so positive bearings (to the
//! right) land in cone 1. With four cones the layout is front, right, back, left.

use crate::capability::{edibility, penetration, threat_level};
use crate::config::VisionConfig;
use biosoup_data::{EntityInfo, SensorCell};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Fraction of the scan radius at which directional light is sampled.
pub const LIGHT_SAMPLE_DISTANCE: f32 = 0.5;
pub const LIGHT_GRADIENT_EPSILON: f32 = 1e-6;
/// Light reported when no sampler is available.
pub const DEFAULT_LIGHT: f32 = 0.5;

/// Wraps an angle into `[-PI, PI)`.
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    (angle + PI).rem_euclid(TAU) - PI
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PolarVision {
    pub food: Vec<f32>,
    pub threat: Vec<f32>,
    pub friend: Vec<f32>,
    pub light: Vec<f32>,
}

impl Default for PolarVision {
    fn default() -> Self {
        Self::new(4)
    }
}

/// Observer state for one scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanParams<'a> {
    pub x: f32,
    pub y: f32,
    /// Radians, 0 along +x.
    pub heading: f32,
    pub my_composition: f32,
    pub my_spectrum: f32,
    pub my_armor: f32,
    pub radius: f32,
    /// Ambient illumination in `[0, 1]`.
    pub light_level: f32,
    pub sensors: &'a [SensorCell],
}

impl PolarVision {
    /// At least one cone is always present.
    pub fn new(cones: usize) -> Self {
        let n = cones.max(1);
        Self {
            food: vec![0.0; n],
            threat: vec![0.0; n],
            friend: vec![0.0; n],
            light: vec![0.0; n],
        }
    }

    pub fn cones(&self) -> usize {
        self.food.len()
    }

    fn cone_width(&self) -> f32 {
        TAU / self.cones() as f32
    }

    /// Cone index for a bearing relative to the heading. Every angle maps to exactly one cone.
    pub fn angle_to_cone(&self, angle: f32) -> usize {
        let n = self.cones();
        let w = self.cone_width();
        let shifted = (normalize_angle(angle) + w * 0.5).rem_euclid(TAU);
        ((shifted / w) as usize).min(n - 1)
    }

    /// Centre bearing of cone `i`, in `[-PI, PI)`.
    pub fn cone_center(&self, cone: usize) -> f32 {
        normalize_angle(cone as f32 * self.cone_width())
    }

    pub fn reset(&mut self) {
        for channel in [
            &mut self.food,
            &mut self.threat,
            &mut self.friend,
            &mut self.light,
        ] {
            channel.iter_mut().for_each(|v| *v = 0.0);
        }
    }

    /// Per-cone weight from the observer's sensor layout.
    pub fn sensor_weights(&self, sensors: &[SensorCell], config: &VisionConfig) -> Vec<f32> {
        let n = self.cones();
        let total: f32 = sensors.iter().map(|s| s.strength.max(0.0)).sum();
        if sensors.is_empty() || total < 0.01 {
            return vec![config.no_sensor_weight; n];
        }
        let mut weights = vec![0.0f32; n];
        for sensor in sensors.iter().filter(|s| s.strength > 0.0) {
            let facing = f32::from(sensor.grid_y).atan2(f32::from(sensor.grid_x));
            for (cone, weight) in weights.iter_mut().enumerate() {
                let diff = normalize_angle(facing - self.cone_center(cone));
                let alignment = diff.cos().max(0.0);
                *weight += sensor.strength * alignment.powi(config.focus_exponent);
            }
        }
        weights
            .into_iter()
            .map(|w| (w / total).max(config.min_sensor_weight))
            .collect()
    }

    /// Rebuilds every channel from the given entities.
    pub fn scan_entities(
        &mut self,
        params: &ScanParams<'_>,
        entities: &[EntityInfo],
        config: &VisionConfig,
    ) {
        self.reset();
        let weights = self.sensor_weights(params.sensors, config);
        let max_dist_sq = params.radius * params.radius;

        for entity in entities {
            let dx = entity.x - params.x;
            let dy = entity.y - params.y;
            let dist_sq = dx * dx + dy * dy;
            if !dist_sq.is_finite() || dist_sq > max_dist_sq || dist_sq < config.min_intensity {
                continue;
            }

            let cone = self.angle_to_cone(dy.atan2(dx) - params.heading);
            let light = (params.light_level + entity.emitted_light).clamp(0.0, 1.0);
            let intensity = light / dist_sq * weights[cone];
            if intensity < config.min_intensity {
                continue;
            }

            let target_composition = if entity.is_flora {
                1.0
            } else {
                entity.composition
            };
            let food = penetration(
                edibility(params.my_spectrum, target_composition),
                entity.structural_armor,
            );
            let threat = threat_level(
                entity.digestive_spectrum,
                params.my_composition,
                params.my_armor,
            );
            let friend = if !entity.is_flora && entity.genetic_distance >= 0.0 {
                1.0 / (1.0 + entity.genetic_distance)
            } else {
                0.0
            };

            self.food[cone] += food * intensity;
            self.threat[cone] += threat * intensity;
            self.friend[cone] += friend * intensity;
            self.light[cone] += entity.emitted_light.max(0.0) * intensity;
        }

        let max = config.max_cone_intensity;
        for channel in [
            &mut self.food,
            &mut self.threat,
            &mut self.friend,
            &mut self.light,
        ] {
            channel.iter_mut().for_each(|v| *v = v.clamp(0.0, max));
        }
    }

    /// Log-scaled copy with every value in `[0, 1]`.
    pub fn normalized(&self, config: &VisionConfig) -> PolarVision {
        let max_log = (1.0 + config.max_cone_intensity).ln();
        let scale = |channel: &[f32]| -> Vec<f32> {
            channel
                .iter()
                .map(|&v| {
                    if v <= 0.0 || max_log <= 0.0 {
                        0.0
                    } else {
                        ((1.0 + v).ln() / max_log).clamp(0.0, 1.0)
                    }
                })
                .collect()
        };
        PolarVision {
            food: scale(&self.food),
            threat: scale(&self.threat),
            friend: scale(&self.friend),
            light: scale(&self.light),
        }
    }
}

/// Ambient light around the observer in its four body directions.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    pub front: f32,
    pub right: f32,
    pub back: f32,
    pub left: f32,
}

impl Default for LightSample {
    fn default() -> Self {
        Self {
            front: DEFAULT_LIGHT,
            right: DEFAULT_LIGHT,
            back: DEFAULT_LIGHT,
            left: DEFAULT_LIGHT,
        }
    }
}

impl LightSample {
    pub fn mean(&self) -> f32 {
        (self.front + self.right + self.back + self.left) * 0.25
    }
}

/// Samples `sampler` at half the radius ahead, right, behind and left of the observer.
pub fn sample_directional_light<F>(
    x: f32,
    y: f32,
    heading: f32,
    radius: f32,
    sampler: Option<F>,
) -> LightSample
where
    F: Fn(f32, f32) -> f32,
{
    let Some(sampler) = sampler else {
        return LightSample::default();
    };
    let distance = radius * LIGHT_SAMPLE_DISTANCE;
    let at = |bearing: f32| {
        let angle = heading + bearing;
        sampler(x + distance * angle.cos(), y + distance * angle.sin())
    };
    LightSample {
        front: at(0.0),
        right: at(PI * 0.5),
        back: at(PI),
        left: at(-PI * 0.5),
    }
}

/// `(front-back, right-left)` contrasts in `[-1, 1]`.
pub fn light_gradients(sample: &LightSample) -> (f32, f32) {
    let fb = (sample.front - sample.back) / (sample.front + sample.back + LIGHT_GRADIENT_EPSILON);
    let lr = (sample.right - sample.left) / (sample.right + sample.left + LIGHT_GRADIENT_EPSILON);
    (fb, lr)
}
