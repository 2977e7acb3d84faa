mod common;
use biosoup_lib::config::VisionConfig;
use biosoup_lib::data::SensorCell;
use biosoup_lib::sensory::{input_count, input_labels, SensoryInputs};
use biosoup_lib::vision::{light_gradients, sample_directional_light, PolarVision, ScanParams};
use common::EntityBuilder;
use std::f32::consts::PI;

fn observer(x: f32, y: f32, heading: f32, sensors: &[SensorCell]) -> ScanParams<'_> {
    ScanParams {
        x,
        y,
        heading,
        my_composition: 0.2,
        my_spectrum: 0.1,
        my_armor: 0.0,
        radius: 100.0,
        light_level: 1.0,
        sensors,
    }
}

#[test]
fn test_cones_rotate_with_heading() {
    let config = VisionConfig::default();
    let mut vision = PolarVision::new(4);
    let north = EntityBuilder::new().at(0.0, 10.0).flora().build();

    // Facing +y puts the entity straight ahead.
    vision.scan_entities(&observer(0.0, 0.0, PI / 2.0, &[]), &[north], &config);
    assert!(vision.food[0] > 0.0);
    assert_all_within!(vision.food[1..], 0.0, 0.0);

    // Facing +x puts it on the right.
    vision.scan_entities(&observer(0.0, 0.0, 0.0, &[]), &[north], &config);
    assert!(vision.food[1] > 0.0);
    assert_eq!(vision.food[0], 0.0);
}

#[test]
fn test_scan_is_relative_to_observer_position() {
    let config = VisionConfig::default();
    let mut at_origin = PolarVision::new(4);
    let mut moved = PolarVision::new(4);
    let here = EntityBuilder::new().at(5.0, 0.0).flora().build();
    let there = EntityBuilder::new().at(55.0, 40.0).flora().build();

    at_origin.scan_entities(&observer(0.0, 0.0, 0.0, &[]), &[here], &config);
    moved.scan_entities(&observer(50.0, 40.0, 0.0, &[]), &[there], &config);
    assert_close!(at_origin.food[0], moved.food[0], 1e-5);
}

#[test]
fn test_eight_cones_partition_the_circle() {
    let config = VisionConfig {
        cones: 8,
        ..VisionConfig::default()
    };
    let mut vision = PolarVision::new(config.cones);
    for cone in 0..8 {
        let bearing = vision.cone_center(cone);
        let entity = EntityBuilder::new()
            .at(10.0 * bearing.cos(), 10.0 * bearing.sin())
            .flora()
            .build();
        vision.scan_entities(&observer(0.0, 0.0, 0.0, &[]), &[entity], &config);
        let lit: Vec<usize> = (0..8).filter(|&i| vision.food[i] > 0.0).collect();
        assert_eq!(lit, vec![cone]);
    }
}

#[test]
fn test_rear_sensors_see_rear_better() {
    let config = VisionConfig::default();
    let rear = [SensorCell {
        grid_x: -1,
        grid_y: 0,
        strength: 1.0,
    }];
    let behind = EntityBuilder::new().at(-10.0, 0.0).flora().build();
    let ahead = EntityBuilder::new().at(10.0, 0.0).flora().build();
    let mut vision = PolarVision::new(4);

    vision.scan_entities(&observer(0.0, 0.0, 0.0, &rear), &[behind], &config);
    let back = vision.food[2];
    vision.scan_entities(&observer(0.0, 0.0, 0.0, &rear), &[ahead], &config);
    let front = vision.food[0];
    assert!(back > front * 5.0, "back {back} front {front}");
}

#[test]
fn test_glowing_entities_fill_light_channel() {
    let config = VisionConfig::default();
    let mut vision = PolarVision::new(4);
    let lamp = EntityBuilder::new()
        .at(0.0, -8.0)
        .fauna(0.3, 0.5)
        .kin(0.0)
        .glowing(1.0)
        .build();
    vision.scan_entities(&observer(0.0, 0.0, 0.0, &[]), &[lamp], &config);
    assert!(vision.light[3] > 0.0);
    assert!(vision.friend[3] > 0.0);
    assert_all_within!(vision.normalized(&config).light, 0.0, 1.0);
}

#[test]
fn test_flora_threat_and_unknown_kin() {
    let config = VisionConfig::default();
    let mut vision = PolarVision::new(4);
    let mut plant = EntityBuilder::new().at(6.0, 0.0).flora().kin(0.0).build();
    plant.digestive_spectrum = 0.0;
    let stranger = EntityBuilder::new().at(0.0, -6.0).fauna(0.3, 0.5).build();
    let photosynth = ScanParams {
        my_composition: 1.0,
        ..observer(0.0, 0.0, 0.0, &[])
    };

    vision.scan_entities(&photosynth, &[plant, stranger], &config);
    assert!(vision.threat[0] > 0.0);
    assert!(vision.food[0] > 0.0);
    assert_all_within!(vision.friend, 0.0, 0.0);
}

#[test]
fn test_light_gradient_follows_heading() {
    let brighter_north = |_x: f32, y: f32| if y > 0.0 { 1.0 } else { 0.2 };
    let facing_north = sample_directional_light(0.0, 0.0, PI / 2.0, 20.0, Some(brighter_north));
    let (fb, lr) = light_gradients(&facing_north);
    assert!(fb > 0.5);
    assert_close!(lr, 0.0, 1e-5);

    let facing_east = sample_directional_light(0.0, 0.0, 0.0, 20.0, Some(brighter_north));
    let (fb, lr) = light_gradients(&facing_east);
    assert_close!(fb, 0.0, 1e-5);
    assert!(lr > 0.5, "north is on the right when facing east");
}

#[test]
fn test_sensory_vector_matches_schema() {
    let config = VisionConfig::default();
    let mut vision = PolarVision::new(config.cones);
    let crowd = [
        EntityBuilder::new().at(3.0, 0.0).flora().build(),
        EntityBuilder::new().at(0.0, 4.0).fauna(0.1, 0.9).kin(0.5).build(),
    ];
    vision.scan_entities(&observer(0.0, 0.0, 0.0, &[]), &crowd, &config);

    let mut inputs = SensoryInputs::new(vision.normalized(&config));
    inputs.energy = 3.0;
    inputs.light_fb = -7.0;
    inputs.flow_alignment = f32::NAN;
    let v = inputs.to_vec();

    assert_eq!(v.len(), input_count(config.cones));
    assert_eq!(v.len(), input_labels(config.cones).len());
    assert_all_within!(v, -1.0, 1.0);
    assert_eq!(v[v.len() - 1], 1.0, "bias last");
    assert_eq!(v[12], -1.0, "light_fb clamps");
    assert_eq!(v[15], 1.0, "energy clamps");
    assert_eq!(v[21], 0.0, "non-finite becomes zero");
}
