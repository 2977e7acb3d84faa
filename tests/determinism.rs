mod common;
use biosoup_lib::config::BrainKind;
use common::SoupBuilder;

#[test]
fn test_identical_seeds_give_identical_runs() {
    for kind in [BrainKind::Genome, BrainKind::Substrate, BrainKind::Fixed] {
        let mut soup1 = SoupBuilder::new().with_seed(12345).with_brain(kind).build();
        let mut soup2 = SoupBuilder::new().with_seed(12345).with_brain(kind).build();

        let r1 = soup1.run(3).expect("run 1");
        let r2 = soup2.run(3).expect("run 2");
        assert_eq!(r1, r2, "Reports should match for {:?}", kind);

        for (a, b) in soup1.organisms().iter().zip(soup2.organisms()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.body, b.body, "Body genomes should match");
            assert_eq!(a.brain_genome, b.brain_genome, "Brain genomes should match");
            assert_eq!(a.morphology, b.morphology);
            assert_eq!(a.energy, b.energy);
        }
    }
}

#[test]
fn test_different_seeds_diverge() {
    let soup1 = SoupBuilder::new().with_seed(1).build();
    let soup2 = SoupBuilder::new().with_seed(2).build();
    let bodies1: Vec<_> = soup1.organisms().iter().map(|o| o.body.to_hex()).collect();
    let bodies2: Vec<_> = soup2.organisms().iter().map(|o| o.body.to_hex()).collect();
    assert_ne!(bodies1, bodies2);
}

#[test]
fn test_metrics_track_generations() {
    let mut soup = SoupBuilder::new().with_seed(7).build();
    soup.run(2).expect("run");
    let metrics = soup.metrics();
    assert_eq!(metrics.generations(), 2);
    assert!(metrics.species_created() >= 1);
    assert!(metrics.counter("offspring") > 0);
    assert_eq!(metrics.think_failures(), 0);
}
