//! Mode Controller Tests
//!
//! Tests for:
//! - Immediate authoritative flag flip with asynchronous cross-fade
//! - Atomic channel flush: no stale callback after a mode switch
//! - Freeze-then-staggered-release cascade ordered by trigger distance
//! - Round-trip restoration of the last explicitly set layout
//! - Force application to floor-resting tiles only

mod common;

use common::{EPSILON, TestScene, approx, run};
use tilewall::{
    LayoutSpec, Mode, ShakeOptions, TileWall, WallOptions, layout, wall::FLOOR_Y,
};

fn setup() -> (TileWall, TestScene) {
    let mut wall = TileWall::new(WallOptions {
        layout: LayoutSpec::Named("musicNote".into()),
        colors: vec![tilewall::DEFAULT_PRIMARY],
        seed: Some(3),
    });
    let mut scene = TestScene::new();
    wall.init(&mut scene).expect("init");
    wall.start();
    (wall, scene)
}

// ============================================================================
// Entering physics
// ============================================================================

#[test]
fn flag_flips_immediately_while_fade_runs() {
    let (mut wall, mut scene) = setup();
    let completion = wall.switch_mode(&mut scene, Mode::Physics).unwrap();
    assert_eq!(wall.mode(), Mode::Physics, "flag is authoritative at once");
    assert!(completion.is_pending(), "cross-fade is asynchronous");

    run(&mut wall, &mut scene, 3000.0, 16.0);
    assert!(completion.is_resolved());
    assert!(approx(scene.ground_opacity, 1.0));
    assert!(approx(scene.camera_look.y, -60.0));
    assert!(approx(scene.light_intensity, 1.4));
}

#[test]
fn bodies_are_frozen_then_released_by_trigger_distance() {
    let (mut wall, mut scene) = setup();
    wall.switch_mode(&mut scene, Mode::Physics).unwrap();

    // Handed to the stepper frozen, so no inherited-velocity pop.
    for index in 0..wall.tile_count() {
        assert!(!scene.body(index).kinematic);
        assert!(scene.body(index).frozen);
    }

    run(&mut wall, &mut scene, 2200.0, 16.0);
    let released: Vec<f32> = (0..wall.tile_count())
        .map(|index| {
            scene.body(index).released_at
                .unwrap_or_else(|| panic!("tile {index} never released"))
        })
        .collect();

    // The trigger tile goes first; everything else follows in distance
    // order from it, the cascading collapse.
    let trigger = (0..released.len())
        .min_by(|&a, &b| released[a].total_cmp(&released[b]))
        .unwrap();
    let origin = wall.tile(trigger).unwrap().slot;
    let mut by_distance: Vec<(f32, f32)> = (0..released.len())
        .map(|index| {
            (
                wall.tile(index).unwrap().slot.distance(origin),
                released[index],
            )
        })
        .collect();
    by_distance.sort_by(|a, b| a.0.total_cmp(&b.0));
    for pair in by_distance.windows(2) {
        assert!(
            pair[0].1 <= pair[1].1 + 16.0,
            "release order broke: {pair:?}"
        );
    }
    assert!(released.iter().all(|&t| t >= 120.0), "base hold respected");
}

#[test]
fn mode_switch_cancels_in_flight_animations() {
    let (mut wall, mut scene) = setup();
    let shake = wall.shake_tile(0, &ShakeOptions::default()).unwrap();
    run(&mut wall, &mut scene, 100.0, 16.0);
    assert!(shake.is_pending());

    wall.switch_mode(&mut scene, Mode::Physics).unwrap();
    assert!(shake.is_cancelled(), "flushed signals settle as cancelled");

    // No stale callback may fire after the flush.
    run(&mut wall, &mut scene, 5000.0, 16.0);
    assert!(shake.is_cancelled());
}

#[test]
fn switching_to_the_current_mode_is_a_no_op() {
    let (mut wall, mut scene) = setup();
    let completion = wall.switch_mode(&mut scene, Mode::Basic).unwrap();
    assert!(completion.is_resolved());
    assert_eq!(wall.channel_count(), 0, "no tweens were started");
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn round_trip_restores_the_last_layout() {
    let (mut wall, mut scene) = setup();
    wall.switch_layout(&mut scene, LayoutSpec::Named("play".into()))
        .unwrap();
    run(&mut wall, &mut scene, 1100.0, 16.0);

    wall.switch_mode(&mut scene, Mode::Physics).unwrap();
    run(&mut wall, &mut scene, 3000.0, 16.0);

    let completion = wall.switch_mode(&mut scene, Mode::Basic).unwrap();
    assert_eq!(wall.mode(), Mode::Basic);
    run(&mut wall, &mut scene, 1500.0, 16.0);
    assert!(completion.is_resolved());

    for (index, slot) in layout::PLAY.iter().enumerate() {
        assert!(scene.body(index).kinematic);
        assert!(
            (scene.body(index).position - slot.position()).length() < EPSILON,
            "tile {index} not back on its slot"
        );
    }
    // Tiles dormant before the round trip stay dormant after it.
    for index in 15..17 {
        assert!(wall.tile(index).unwrap().dormant);
        assert!(approx(scene.body(index).opacity, 0.0));
    }
    assert!(approx(scene.ground_opacity, 0.0));
    assert!(approx(scene.camera_look.y, 0.0));
}

// ============================================================================
// Forces
// ============================================================================

#[test]
fn forces_impulse_only_floor_resting_tiles() {
    let (mut wall, mut scene) = setup();
    wall.switch_mode(&mut scene, Mode::Physics).unwrap();
    run(&mut wall, &mut scene, 2200.0, 16.0);

    // Physics (the host's job) has dropped three tiles to the floor.
    for index in 0..3 {
        scene.body_mut(index).position.y = FLOOR_Y;
    }

    wall.apply_forces(&mut scene, &[2.0, 1.0, 0.5]).unwrap();
    for index in 0..3 {
        let impulses = &scene.body(index).impulses;
        assert_eq!(impulses.len(), 1, "tile {index}");
        assert!(impulses[0].y > 0.0, "impulse points upward");
        assert!(approx(impulses[0].x, 0.0));
    }
    for index in 3..wall.tile_count() {
        assert!(
            scene.body(index).impulses.is_empty(),
            "airborne tile {index} must not be impulsed"
        );
    }

    // A second beat while still grounded impulses again; once airborne,
    // nothing more.
    scene.body_mut(0).position.y = FLOOR_Y + 50.0;
    wall.apply_forces(&mut scene, &[2.0]).unwrap();
    assert_eq!(scene.body(0).impulses.len(), 1);
    assert_eq!(scene.body(1).impulses.len(), 2);
}

#[test]
fn forces_are_inert_in_basic_mode() {
    let (mut wall, mut scene) = setup();
    for index in 0..wall.tile_count() {
        scene.body_mut(index).position.y = FLOOR_Y;
    }
    wall.apply_forces(&mut scene, &[3.0]).unwrap();
    assert!(scene.bodies.values().all(|body| body.impulses.is_empty()));
}

#[test]
fn outer_rings_map_to_later_bands() {
    let (mut wall, mut scene) = setup();
    wall.switch_mode(&mut scene, Mode::Physics).unwrap();
    run(&mut wall, &mut scene, 2200.0, 16.0);

    for index in 0..wall.tile_count() {
        scene.body_mut(index).position.y = FLOOR_Y;
    }
    // Band 0 silent, outer bands loud: only tiles beyond the first ring
    // may receive a noticeable impulse.
    wall.apply_forces(&mut scene, &[0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0])
        .unwrap();
    for index in 0..wall.tile_count() {
        let ring = (wall.tile(index).unwrap().slot.truncate().length() / 24.0) as usize;
        let impulse = scene.body(index).impulses.first().map_or(0.0, |i| i.y);
        if ring < 2 {
            assert!(approx(impulse, 0.0), "tile {index} in ring {ring}: {impulse}");
        } else {
            assert!(impulse > 0.0, "tile {index} in ring {ring}: {impulse}");
        }
    }
}

// ============================================================================
// Reactive camera
// ============================================================================

#[test]
fn reactive_camera_sways_with_force_energy() {
    let (mut wall, mut scene) = setup();
    wall.enable_reactive_camera();
    wall.apply_forces(&mut scene, &[6.0, 6.0]).unwrap();
    run(&mut wall, &mut scene, 48.0, 16.0);
    assert!(scene.camera_look.y > 0.0, "camera should sway upward");

    wall.disable_reactive_camera();
    let before = scene.camera_look;
    run(&mut wall, &mut scene, 1000.0, 16.0);
    assert_eq!(scene.camera_look, before, "disabled camera stays put");
}
