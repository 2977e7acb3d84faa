mod common;
use biosoup_lib::config::{CompatibilityConfig, SpeciationConfig};
use biosoup_lib::genetics::{clone_genome, genome_compatibility};
use biosoup_lib::species::{species_color, SpeciesManager};
use common::{Lab, SoupBuilder};

fn manager(threshold: f32, drop_off_age: u32) -> SpeciesManager {
    SpeciesManager::new(
        SpeciationConfig {
            compat_threshold: threshold,
            drop_off_age,
        },
        CompatibilityConfig::default(),
    )
}

#[test]
fn test_clones_share_a_species() {
    let mut lab = Lab::new(3);
    let founder = lab.brain(1.0);
    let mut species = manager(1e-6, 10);

    let a = species.assign_species(&founder);
    let b = species.assign_species(&clone_genome(&founder, 99));
    assert_eq!(a, b);
    assert_eq!(species.count(), 1);
}

#[test]
fn test_weight_divergence_splits_species() {
    let mut lab = Lab::new(3);
    let g1 = lab.brain(1.0);
    let g2 = lab.brain(1.0);
    let distance = genome_compatibility(&g1, &g2, &CompatibilityConfig::default());
    assert!(distance > 0.0, "Independent random weights should differ");

    let mut species = manager(distance * 0.5, 10);
    let a = species.assign_species(&g1);
    let b = species.assign_species(&g2);
    assert_ne!(a, b);
    assert_eq!(species.count(), 2);

    let mut loose = manager(distance * 2.0, 10);
    assert_eq!(loose.assign_species(&g1), loose.assign_species(&g2));
}

#[test]
fn test_stagnant_species_are_dropped() {
    let mut lab = Lab::new(5);
    let genome = lab.brain(0.5);
    let mut species = manager(1.0, 2);

    let id = species.assign_species(&genome);
    species.add_member(id, 1);
    species.update_fitness(id, 1.0);
    assert_eq!(species.end_generation(), 0, "Fresh improvement keeps the species");
    assert_eq!(species.end_generation(), 1, "Two stagnant generations drop it");
    assert_eq!(species.count(), 0);
}

#[test]
fn test_empty_species_are_dropped() {
    let mut lab = Lab::new(5);
    let genome = lab.brain(0.5);
    let mut species = manager(1.0, 10);
    species.assign_species(&genome);
    assert_eq!(species.end_generation(), 1);
}

#[test]
fn test_species_colors_are_stable() {
    let mut lab = Lab::new(8);
    let genome = lab.brain(0.5);
    let mut species = manager(1.0, 10);
    let id = species.assign_species(&genome);
    let s = species.get(id).expect("species");
    assert_eq!(species_color(s), species_color(s));
    let (r, g, b) = species_color(s);
    assert!(r >= 64 && g >= 64 && b >= 64);
}

#[test]
fn test_soup_species_cover_population() {
    let mut soup = SoupBuilder::new().with_seed(21).build();
    for report in soup.run(3).expect("run") {
        let members: usize = report.species.iter().map(|s| s.size).sum();
        assert_eq!(members, report.population);
        assert_eq!(report.species.len(), report.species_count);
    }
}
