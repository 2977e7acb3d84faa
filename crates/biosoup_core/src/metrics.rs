//! Evolution metrics and structured logging.

use std::collections::BTreeMap;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Counters collected by an evolution run.
///
/// Owned by the run driver; every update is explicit.
#[derive(Debug, Clone)]
pub struct EvolutionMetrics {
    generations: u64,
    species_created: u64,
    species_removed: u64,
    mutations: u64,
    structural_noops: u64,
    morphology_fallbacks: u64,
    viability_repairs: u64,
    think_failures: u64,
    pub counters: BTreeMap<String, u64>,
    start_time: Instant,
}

impl Default for EvolutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EvolutionMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            generations: 0,
            species_created: 0,
            species_removed: 0,
            mutations: 0,
            structural_noops: 0,
            morphology_fallbacks: 0,
            viability_repairs: 0,
            think_failures: 0,
            counters: BTreeMap::new(),
            start_time: Instant::now(),
        }
    }

    /// Records a finished generation and logs a summary line.
    pub fn record_generation(&mut self, population: usize, species: usize, best_fitness: f32) {
        self.generations += 1;
        tracing::info!(
            generation = self.generations,
            population = population,
            species = species,
            best_fitness = best_fitness as f64,
            "Generation complete"
        );
    }

    pub fn record_species(&mut self, created: usize, removed: usize) {
        self.species_created += created as u64;
        self.species_removed += removed as u64;
    }

    pub fn record_mutation(&mut self, mutated: bool) {
        if mutated {
            self.mutations += 1;
        } else {
            self.structural_noops += 1;
        }
    }

    pub fn record_morphology_fallback(&mut self) {
        self.morphology_fallbacks += 1;
    }

    pub fn record_viability_repair(&mut self) {
        self.viability_repairs += 1;
    }

    pub fn record_think_failure(&mut self) {
        self.think_failures += 1;
    }

    /// Increments a named counter.
    pub fn increment_counter(&mut self, name: &str) {
        *self.counters.entry(name.to_string()).or_insert(0) += 1;
    }

    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn generations(&self) -> u64 {
        self.generations
    }

    #[must_use]
    pub fn mutations(&self) -> u64 {
        self.mutations
    }

    #[must_use]
    pub fn species_created(&self) -> u64 {
        self.species_created
    }

    #[must_use]
    pub fn species_removed(&self) -> u64 {
        self.species_removed
    }

    #[must_use]
    pub fn morphology_fallbacks(&self) -> u64 {
        self.morphology_fallbacks
    }

    #[must_use]
    pub fn viability_repairs(&self) -> u64 {
        self.viability_repairs
    }

    #[must_use]
    pub fn think_failures(&self) -> u64 {
        self.think_failures
    }

    pub fn log_summary(&self) {
        tracing::info!(
            generations = self.generations,
            species_created = self.species_created,
            species_removed = self.species_removed,
            mutations = self.mutations,
            structural_noops = self.structural_noops,
            morphology_fallbacks = self.morphology_fallbacks,
            viability_repairs = self.viability_repairs,
            think_failures = self.think_failures,
            elapsed_ms = self.start_time.elapsed().as_millis() as u64,
            "Evolution summary"
        );
    }
}

/// Initialize tracing subscriber for logging. `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .finish(),
    )
    .ok();
}
