use biosoup_core::brain::{BrainController, Ffnn};
use biosoup_core::config::{CppnConfig, MutationConfig, VisionConfig};
use biosoup_core::genetics::{create_brain_genome, create_cppn_genome, create_offspring};
use biosoup_core::ids::IdGenerator;
use biosoup_core::morphology::generate_morphology;
use biosoup_core::sensory::{input_count, BRAIN_OUTPUTS};
use biosoup_core::vision::{PolarVision, ScanParams};
use biosoup_data::{Activation, EntityInfo, SensorCell};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Benchmark one genome-brain decision with the default schema.
fn bench_think(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut ids = IdGenerator::new();
    let inputs = input_count(4);
    let genome = create_brain_genome(
        1,
        inputs,
        BRAIN_OUTPUTS,
        0.5,
        Activation::Sigmoid,
        &mut ids,
        &mut rng,
    );
    let mut brain = BrainController::new(genome, 5).expect("benchmark brain");
    let values = vec![0.5; inputs];

    c.bench_function("brain_think", |b| {
        b.iter(|| {
            let result = brain.think(black_box(&values));
            black_box(result)
        })
    });
}

/// Benchmark the fixed-topology forward pass.
fn bench_ffnn_forward(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let inputs = input_count(4);
    let net = Ffnn::new(inputs, &[16], BRAIN_OUTPUTS, &mut rng);
    let values = vec![0.5; inputs];

    c.bench_function("ffnn_forward", |b| {
        b.iter(|| {
            let result = net.forward(black_box(&values));
            black_box(result)
        })
    });
}

/// Benchmark a vision scan over a crowded neighbourhood.
fn bench_vision_scan(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let config = VisionConfig::default();
    let entities: Vec<EntityInfo> = (0..200)
        .map(|_| EntityInfo {
            x: rng.gen_range(-100.0..100.0),
            y: rng.gen_range(-100.0..100.0),
            composition: rng.gen(),
            digestive_spectrum: rng.gen(),
            is_flora: rng.gen_bool(0.5),
            genetic_distance: rng.gen_range(-1.0..3.0),
            ..Default::default()
        })
        .collect();
    let sensors = [
        SensorCell {
            grid_x: 1,
            grid_y: 0,
            strength: 0.8,
        },
        SensorCell {
            grid_x: -1,
            grid_y: 1,
            strength: 0.4,
        },
    ];
    let params = ScanParams {
        x: 0.0,
        y: 0.0,
        heading: 0.3,
        my_composition: 0.2,
        my_spectrum: 0.7,
        my_armor: 0.1,
        radius: config.radius,
        light_level: 0.8,
        sensors: &sensors,
    };
    let mut vision = PolarVision::new(config.cones);

    c.bench_function("vision_scan", |b| {
        b.iter(|| {
            vision.scan_entities(black_box(&params), black_box(&entities), &config);
            black_box(vision.normalized(&config))
        })
    });
}

/// Benchmark body generation from a fresh CPPN.
fn bench_morphology(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut ids = IdGenerator::new();
    let genome = create_cppn_genome(1, 0.5, &mut ids, &mut rng);
    let config = CppnConfig::default();

    c.bench_function("morphology_generation", |b| {
        b.iter(|| {
            let result = generate_morphology(black_box(Some(&genome)), &config);
            black_box(result)
        })
    });
}

/// Benchmark crossover plus mutation of brain genomes.
fn bench_offspring(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut ids = IdGenerator::new();
    let inputs = input_count(4);
    let p1 = create_brain_genome(1, inputs, BRAIN_OUTPUTS, 0.5, Activation::Sigmoid, &mut ids, &mut rng);
    let p2 = create_brain_genome(2, inputs, BRAIN_OUTPUTS, 0.5, Activation::Sigmoid, &mut ids, &mut rng);
    let options = MutationConfig::default();

    c.bench_function("brain_offspring", |b| {
        b.iter(|| {
            let child = create_offspring(Some(&p1), Some(&p2), 1.0, 0.5, &options, &mut ids, &mut rng);
            black_box(child)
        })
    });
}

criterion_group!(
    benches,
    bench_think,
    bench_ffnn_forward,
    bench_vision_scan,
    bench_morphology,
    bench_offspring
);
criterion_main!(benches);
