//! Headless evolution driver.
//!
//! Each generation every organism lives a short episode in a synthetic neighbourhood of flora
//! and fauna around it: it scans, thinks, steers and bites. The resulting fitness feeds
//! speciation and selection for the next generation.

use crate::brain::{Brain, BrainController, Ffnn};
use crate::capability::{edibility, nutrition_multiplier, penetration, threat_level, CapabilityLogic};
use crate::config::{AppConfig, BrainKind};
use crate::genetics::{
    create_brain_genome, create_cppn_genome, create_offspring_cppn, crossover_genomes,
    mutate_genome,
};
use crate::ids::IdGenerator;
use crate::metrics::EvolutionMetrics;
use crate::morphology::generate_morphology_with_report;
use crate::sensory::{input_count, SensoryInputs, BRAIN_OUTPUTS};
use crate::species::{calculate_breeding_fitness, species_color, SpeciesManager};
use crate::substrate::build_substrate_brain;
use crate::vision::{
    light_gradients, normalize_angle, sample_directional_light, PolarVision, ScanParams,
};
use anyhow::{Context, Result};
use biosoup_data::{
    BehaviorOutputs, Capabilities, CellType, EntityInfo, Genome, MorphologyResult, SensorCell,
};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// Distance within which a bite reaches its target.
const BITE_RANGE: f32 = 30.0;
/// Threats closer than this feed on the organism.
const THREAT_RANGE: f32 = 15.0;
const MOVE_SPEED: f32 = 2.0;
const TURN_RATE: f32 = 0.3;
const BASE_COST: f32 = 0.01;
const THRUST_COST: f32 = 0.02;
const BITE_GAIN: f32 = 0.2;
const PREDATION_LOSS: f32 = 0.05;
const TOURNAMENT_SIZE: usize = 3;

#[derive(Debug, Clone)]
pub struct Organism {
    pub id: u64,
    pub body: Genome,
    /// `None` for fixed-topology brains.
    pub brain_genome: Option<Genome>,
    pub morphology: MorphologyResult,
    pub controller: Brain,
    pub capabilities: Capabilities,
    pub species: Option<u32>,
    pub energy: f32,
    pub fitness: f32,
}

impl Organism {
    /// Genome used for compatibility: the brain when it evolves on its own, else the body.
    pub fn speciation_genome(&self) -> &Genome {
        self.brain_genome.as_ref().unwrap_or(&self.body)
    }

    pub fn max_energy(&self) -> f32 {
        1.0 + self.capabilities.storage_capacity
    }

    pub fn sensor_cells(&self) -> Vec<SensorCell> {
        self.morphology
            .cells
            .iter()
            .filter(|c| c.has_function(CellType::Sensor))
            .map(|c| SensorCell {
                grid_x: c.grid_x,
                grid_y: c.grid_y,
                strength: c.strength_of(CellType::Sensor),
            })
            .collect()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SpeciesSummary {
    pub id: u32,
    pub size: usize,
    pub best_fitness: f32,
    pub color: (u8, u8, u8),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub generation: u32,
    pub population: usize,
    pub species_count: usize,
    pub best_fitness: f32,
    pub mean_fitness: f32,
    pub mean_cells: f32,
    pub think_failures: usize,
    pub species: Vec<SpeciesSummary>,
}

pub struct Soup {
    config: AppConfig,
    rng: ChaCha8Rng,
    ids: IdGenerator,
    species: SpeciesManager,
    metrics: EvolutionMetrics,
    organisms: Vec<Organism>,
    generation: u32,
}

/// Ambient light field: brighter toward +x.
fn ambient_light(x: f32, _y: f32) -> f32 {
    (0.5 + 0.5 * (x * 0.02).tanh()).clamp(0.0, 1.0)
}

impl Soup {
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let seed = config.evolution.seed;
        tracing::info!(
            seed,
            population = config.evolution.population,
            fingerprint = %config.fingerprint(),
            "Creating soup"
        );
        let species = SpeciesManager::new(config.speciation.clone(), config.compatibility.clone());
        let mut soup = Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            ids: IdGenerator::new(),
            species,
            metrics: EvolutionMetrics::new(),
            organisms: Vec::new(),
            generation: 0,
            config,
        };
        for _ in 0..soup.config.evolution.population {
            let id = soup.ids.next_genome_id();
            let body =
                create_cppn_genome(id, soup.config.cppn.connection_prob, &mut soup.ids, &mut soup.rng);
            let organism = soup.build_organism(body, None, None)?;
            soup.organisms.push(organism);
        }
        Ok(soup)
    }

    fn brain_inputs(&self) -> usize {
        input_count(self.config.vision.cones)
    }

    /// Grows a body and wires its controller. `brain_genome` and `ffnn` carry inherited brains;
    /// missing ones are created fresh.
    fn build_organism(
        &mut self,
        body: Genome,
        brain_genome: Option<Genome>,
        ffnn: Option<Ffnn>,
    ) -> Result<Organism> {
        let (morphology, report) = generate_morphology_with_report(Some(&body), &self.config.cppn)
            .with_context(|| format!("growing body {}", body.id))?;
        if report.fallback {
            self.metrics.record_morphology_fallback();
        }
        if report.repaired {
            self.metrics.record_viability_repair();
        }
        let capabilities = Capabilities::from_cells(&morphology.cells);
        let inputs = self.brain_inputs();
        let brain_config = &self.config.brain;

        let (brain_genome, controller) = match brain_config.kind {
            BrainKind::Genome => {
                let genome = match brain_genome {
                    Some(genome) => genome,
                    None => {
                        let id = self.ids.next_genome_id();
                        create_brain_genome(
                            id,
                            inputs,
                            BRAIN_OUTPUTS,
                            brain_config.connection_prob,
                            brain_config.output_activation,
                            &mut self.ids,
                            &mut self.rng,
                        )
                    }
                };
                let controller = BrainController::new(genome.clone(), brain_config.fallback_depth)?;
                (Some(genome), Brain::Genome(controller))
            }
            BrainKind::Substrate => {
                let genome = build_substrate_brain(
                    Some(&body),
                    &morphology,
                    inputs,
                    brain_config,
                    &mut self.ids,
                )?;
                let controller = BrainController::new(genome.clone(), brain_config.fallback_depth)?;
                (Some(genome), Brain::Genome(controller))
            }
            BrainKind::Fixed => {
                let net = match ffnn {
                    Some(net) => net,
                    None => Ffnn::new(
                        inputs,
                        &self.config.ffnn.hidden_layers,
                        BRAIN_OUTPUTS,
                        &mut self.rng,
                    ),
                };
                (None, Brain::Fixed(net))
            }
        };

        let mut organism = Organism {
            id: body.id,
            body,
            brain_genome,
            morphology,
            controller,
            capabilities,
            species: None,
            energy: 0.0,
            fitness: 0.0,
        };
        organism.energy = organism.max_energy() * 0.5;
        Ok(organism)
    }

    fn random_neighbourhood(&mut self, x: f32, y: f32) -> Vec<EntityInfo> {
        let radius = self.config.vision.radius * 0.6;
        let rng = &mut self.rng;
        (0..self.config.evolution.neighbors)
            .map(|_| {
                let angle = rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI);
                let dist = rng.gen_range(1.0..radius.max(1.5));
                let is_flora = rng.gen_bool(0.5);
                EntityInfo {
                    x: x + dist * angle.cos(),
                    y: y + dist * angle.sin(),
                    composition: if is_flora { 1.0 } else { rng.gen_range(0.0..0.5) },
                    digestive_spectrum: if is_flora { 0.0 } else { rng.gen() },
                    structural_armor: if is_flora {
                        self.config.feeding.flora_armor
                    } else {
                        rng.gen_range(0.0..0.3)
                    },
                    genetic_distance: if is_flora { -1.0 } else { rng.gen_range(0.0..3.0) },
                    is_flora,
                    emitted_light: if rng.gen_bool(0.1) { rng.gen() } else { 0.0 },
                }
            })
            .collect()
    }

    /// Lives one episode and returns `(fitness, think failures)`.
    fn evaluate(&mut self, index: usize) -> (f32, usize) {
        let vision_config = self.config.vision.clone();
        let k = self.config.feeding.nutrition_exponent;
        let ticks = self.config.evolution.ticks_per_generation;
        let max_cells = self.config.cppn.max_cells.max(1) as f32;

        let sensors = self.organisms[index].sensor_cells();
        let caps = self.organisms[index].capabilities;
        let cells = self.organisms[index].morphology.cell_count().max(1) as f32;
        let max_energy = self.organisms[index].max_energy();
        let my_spectrum = caps.digestive_spectrum();
        let my_composition = caps.composition();
        let my_armor = caps.armor();

        let (mut x, mut y, mut heading) = (0.0f32, 0.0f32, 0.0f32);
        let mut energy = self.organisms[index].energy;
        let mut eaten = 0.0f32;
        let mut being_eaten = 0.0f32;
        let mut last = BehaviorOutputs::default();
        let mut failures = 0;
        let mut vision = PolarVision::new(vision_config.cones);

        for _ in 0..ticks {
            let entities = self.random_neighbourhood(x, y);
            let light = sample_directional_light(x, y, heading, vision_config.radius, Some(ambient_light));
            let (light_fb, light_lr) = light_gradients(&light);
            let params = ScanParams {
                x,
                y,
                heading,
                my_composition,
                my_spectrum,
                my_armor,
                radius: vision_config.radius,
                light_level: light.mean(),
                sensors: &sensors,
            };
            vision.scan_entities(&params, &entities, &vision_config);

            let mut inputs = SensoryInputs::new(vision.normalized(&vision_config));
            inputs.light_fb = light_fb;
            inputs.light_lr = light_lr;
            inputs.light_level = light.mean();
            inputs.energy = energy / max_energy;
            inputs.speed = last.thrust;
            inputs.cell_count_norm = cells / max_cells;
            inputs.sensor_gain_norm = caps.sensor_weight / cells;
            inputs.actuator_norm = caps.actuator_weight / cells;
            inputs.being_eaten = being_eaten;
            inputs.flow_alignment = heading.cos();

            let (outputs, err) = self.organisms[index].controller.decide(&inputs.to_vec());
            if err.is_some() {
                failures += 1;
                self.metrics.record_think_failure();
            }

            heading = normalize_angle(heading + outputs.turn * TURN_RATE);
            x += heading.cos() * outputs.thrust * MOVE_SPEED;
            y += heading.sin() * outputs.thrust * MOVE_SPEED;
            energy -= BASE_COST + THRUST_COST * outputs.thrust;

            if outputs.bite > 0.5 {
                let target = entities
                    .iter()
                    .filter(|e| {
                        let bearing = (e.y - y).atan2(e.x - x) - heading;
                        vision.angle_to_cone(bearing) == 0
                    })
                    .map(|e| (e, (e.x - x).hypot(e.y - y)))
                    .filter(|(_, d)| *d <= BITE_RANGE)
                    .min_by(|a, b| a.1.total_cmp(&b.1));
                if let Some((e, _)) = target {
                    let composition = if e.is_flora { 1.0 } else { e.composition };
                    let p = penetration(edibility(my_spectrum, composition), e.structural_armor);
                    let gain = nutrition_multiplier(p, k) * BITE_GAIN * (1.0 + caps.mouth_weight);
                    energy += gain;
                    eaten += gain;
                }
            }

            being_eaten = entities
                .iter()
                .filter(|e| !e.is_flora && (e.x - x).hypot(e.y - y) <= THREAT_RANGE)
                .map(|e| threat_level(e.digestive_spectrum, my_composition, my_armor))
                .fold(0.0f32, f32::max);
            energy -= being_eaten * PREDATION_LOSS;
            energy = energy.clamp(0.0, max_energy);
            last = outputs;
            if energy <= 0.0 {
                break;
            }
        }

        self.organisms[index].energy = energy;
        let fitness = calculate_breeding_fitness(energy / max_energy, cells as usize) + eaten;
        (fitness, failures)
    }

    /// Evaluates, speciates and breeds one generation.
    pub fn step_generation(&mut self) -> Result<GenerationReport> {
        let mut failures = 0;
        for i in 0..self.organisms.len() {
            let (fitness, failed) = self.evaluate(i);
            self.organisms[i].fitness = fitness;
            failures += failed;
        }

        let before = self.species.count();
        for organism in &mut self.organisms {
            let sid = self.species.assign_species(organism.speciation_genome());
            self.species.add_member(sid, organism.id);
            organism.species = Some(sid);
        }
        let created = self.species.count() - before;
        for organism in &self.organisms {
            if let Some(sid) = organism.species {
                self.species.update_fitness(sid, organism.fitness);
            }
        }

        let report = self.report(failures);
        let removed = self.species.end_generation();
        self.metrics.record_species(created, removed);
        let organisms = &self.organisms;
        self.species.update_representatives(|id| {
            organisms
                .iter()
                .find(|o| o.id == id)
                .map(Organism::speciation_genome)
        });
        self.metrics.record_generation(
            report.population,
            report.species_count,
            report.best_fitness,
        );

        self.breed()?;
        self.generation += 1;
        Ok(report)
    }

    pub fn run(&mut self, generations: usize) -> Result<Vec<GenerationReport>> {
        (0..generations).map(|_| self.step_generation()).collect()
    }

    fn report(&self, think_failures: usize) -> GenerationReport {
        let n = self.organisms.len().max(1) as f32;
        let best_fitness = self
            .organisms
            .iter()
            .map(|o| o.fitness)
            .fold(f32::MIN, f32::max);
        let species = self
            .species
            .species()
            .iter()
            .map(|s| SpeciesSummary {
                id: s.id,
                size: s.members.len(),
                best_fitness: s.best_fitness,
                color: species_color(s),
            })
            .collect();
        GenerationReport {
            generation: self.generation,
            population: self.organisms.len(),
            species_count: self.species.count(),
            best_fitness,
            mean_fitness: self.organisms.iter().map(|o| o.fitness).sum::<f32>() / n,
            mean_cells: self
                .organisms
                .iter()
                .map(|o| o.morphology.cell_count() as f32)
                .sum::<f32>()
                / n,
            think_failures,
            species,
        }
    }

    /// Fittest of a few random picks, restricted to `species` when it has members.
    fn tournament(&mut self, species: Option<u32>) -> usize {
        let pool: Vec<usize> = match species {
            Some(sid) => (0..self.organisms.len())
                .filter(|&i| self.organisms[i].species == Some(sid))
                .collect(),
            None => Vec::new(),
        };
        let pool = if pool.is_empty() {
            (0..self.organisms.len()).collect()
        } else {
            pool
        };
        let mut best = pool[self.rng.gen_range(0..pool.len())];
        for _ in 1..TOURNAMENT_SIZE {
            let pick = pool[self.rng.gen_range(0..pool.len())];
            if self.organisms[pick].fitness > self.organisms[best].fitness {
                best = pick;
            }
        }
        best
    }

    fn breed(&mut self) -> Result<()> {
        let size = self.organisms.len();
        let mut next = Vec::with_capacity(size);

        // The champion survives unchanged.
        if let Some(champion) = self
            .organisms
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.fitness.total_cmp(&b.1.fitness))
            .map(|(i, _)| i)
        {
            let elite = &self.organisms[champion];
            let (body, brain, ffnn) = (
                elite.body.clone(),
                elite.brain_genome.clone(),
                elite.controller.as_fixed().cloned(),
            );
            next.push(self.build_organism(body, brain, ffnn)?);
        }

        while next.len() < size {
            let a = self.tournament(None);
            let b = self.tournament(self.organisms[a].species);
            let (pa, pb) = (&self.organisms[a], &self.organisms[b]);
            let (fa, fb) = (pa.fitness, pb.fitness);
            let (body_a, body_b) = (pa.body.clone(), pb.body.clone());
            let brains = (pa.brain_genome.clone(), pb.brain_genome.clone());
            let fitter_net = if fa >= fb {
                pa.controller.as_fixed().cloned()
            } else {
                pb.controller.as_fixed().cloned()
            };

            let body = create_offspring_cppn(
                Some(&body_a),
                Some(&body_b),
                fa,
                fb,
                &self.config.mutation,
                &mut self.ids,
                &mut self.rng,
            )?;

            let brain = match (self.config.brain.kind, brains) {
                (BrainKind::Genome, (Some(ga), Some(gb))) => {
                    let child_id = self.ids.next_genome_id();
                    let mut child =
                        crossover_genomes(Some(&ga), Some(&gb), fa, fb, child_id, &mut self.rng)?;
                    let mutated = mutate_genome(
                        Some(&mut child),
                        &self.config.mutation,
                        &mut self.ids,
                        &mut self.rng,
                    )?;
                    self.metrics.record_mutation(mutated);
                    Some(child)
                }
                _ => None,
            };

            let ffnn = fitter_net.map(|mut net| {
                let f = &self.config.ffnn;
                net.mutate_sparse(
                    f.mutation_rate,
                    f.mutation_sigma,
                    f.big_mutation_rate,
                    f.big_mutation_sigma,
                    &mut self.rng,
                );
                net
            });

            next.push(self.build_organism(body, brain, ffnn)?);
            self.metrics.increment_counter("offspring");
        }

        self.organisms = next;
        Ok(())
    }

    pub fn organisms(&self) -> &[Organism] {
        &self.organisms
    }

    pub fn species(&self) -> &SpeciesManager {
        &self.species
    }

    pub fn metrics(&self) -> &EvolutionMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}
