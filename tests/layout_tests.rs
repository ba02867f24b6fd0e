//! Layout Switching Tests
//!
//! Tests for:
//! - Named template resolution and the musicNote fallback
//! - Growth: existing tiles untouched, new tiles cloned from a donor
//! - Shrink: dormant retention at the staging point, no removal
//! - Regrowth reusing dormant tiles without creating bodies
//! - The fixed one-second transition window

mod common;

use common::{EPSILON, TestScene, approx, run};
use glam::Vec3;
use tilewall::{
    LayoutSpec, RollOverOptions, STAGING_POINT, Slot, TileWall, WallOptions, layout,
};

fn setup() -> (TileWall, TestScene) {
    let mut wall = TileWall::new(WallOptions {
        layout: LayoutSpec::Named("musicNote".into()),
        colors: vec![tilewall::DEFAULT_PRIMARY],
        seed: Some(11),
    });
    let mut scene = TestScene::new();
    wall.init(&mut scene).expect("init");
    wall.start();
    (wall, scene)
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn templates_sit_on_the_grid() {
    for slots in [
        layout::MUSIC_NOTE,
        layout::PLAY,
        layout::PAUSE,
        layout::STOP,
        layout::PREVIOUS_TRACK,
        layout::NEXT_TRACK,
    ] {
        for slot in slots {
            let [x, y, z] = slot.coords;
            // Grid positions are 12 + 24k on x, multiples of 12 on y.
            assert_eq!((x.abs() as i32 - 12).rem_euclid(24), 0, "x={x}");
            assert_eq!(y.abs() as i32 % 12, 0, "y={y}");
            assert!(approx(z, 0.0));
            assert!((0.0..=1.0).contains(&slot.lightness));
        }
    }
}

#[test]
fn named_templates_resolve() {
    for (name, len) in [
        ("musicNote", 17),
        ("play", 15),
        ("pause", 20),
        ("stop", 16),
        ("previousTrack", 14),
        ("nextTrack", 14),
    ] {
        assert_eq!(layout::by_name(name).map(<[Slot]>::len), Some(len), "{name}");
    }
    assert!(layout::by_name("rewind").is_none());
}

#[test]
fn unknown_name_falls_back_to_music_note() {
    // The fallback is a usability default, not an error path.
    let (mut wall, mut scene) = setup();
    let completion = wall
        .switch_layout(&mut scene, LayoutSpec::Named("doesNotExist".into()))
        .unwrap();
    run(&mut wall, &mut scene, 1100.0, 16.0);
    assert!(completion.is_resolved());
    assert_eq!(wall.tile_count(), 17);
    for (index, slot) in layout::MUSIC_NOTE.iter().enumerate() {
        assert!((wall.tile(index).unwrap().slot - slot.position()).length() < EPSILON);
    }
}

#[test]
fn explicit_slot_lists_round_trip_through_serde() {
    let slots = vec![
        Slot { coords: [12.0, 12.0, 0.0], lightness: 0.1 },
        Slot { coords: [-12.0, 12.0, 0.0], lightness: 0.0 },
    ];
    let spec = LayoutSpec::Explicit(slots);
    let json = serde_json::to_string(&spec).unwrap();
    let back: LayoutSpec = serde_json::from_str(&json).unwrap();
    assert_eq!(back, spec);
}

// ============================================================================
// Growth
// ============================================================================

#[test]
fn growth_preserves_existing_tiles_and_clones_a_donor() {
    let (mut wall, mut scene) = setup();
    let before: Vec<_> = (0..17)
        .map(|i| wall.tile(i).unwrap().base_color)
        .collect();

    let completion = wall
        .switch_layout(&mut scene, LayoutSpec::Named("pause".into()))
        .unwrap();
    assert_eq!(wall.tile_count(), 20, "exactly M-N new tiles");
    assert_eq!(scene.order.len(), 20);

    for (index, color) in before.iter().enumerate() {
        assert_eq!(wall.tile(index).unwrap().base_color, *color);
    }

    // New tiles clone the donor template: the least-shaded non-accent
    // tile, which in a single-color wall carries the primary itself.
    for index in 17..20 {
        let slot = layout::PAUSE[index];
        let expected = tilewall::DEFAULT_PRIMARY.lighten(slot.lightness);
        assert_eq!(wall.tile(index).unwrap().base_color, expected);
    }

    run(&mut wall, &mut scene, 1100.0, 16.0);
    assert!(completion.is_resolved());
    for index in 0..20 {
        let target = layout::PAUSE[index].position();
        assert!(
            (scene.body(index).position - target).length() < EPSILON,
            "tile {index} off target"
        );
        assert!(approx(scene.body(index).opacity, 1.0));
    }
}

#[test]
fn new_tiles_fade_in_from_the_staging_point() {
    let (mut wall, mut scene) = setup();
    wall.switch_layout(&mut scene, LayoutSpec::Named("pause".into()))
        .unwrap();

    // Created invisible at the shared staging point, before any tick.
    for index in 17..20 {
        assert_eq!(scene.body(index).position, STAGING_POINT);
        assert!(approx(scene.body(index).opacity, 0.0));
    }

    run(&mut wall, &mut scene, 500.0, 16.0);
    for index in 17..20 {
        let opacity = scene.body(index).opacity;
        assert!(opacity > 0.0 && opacity < 1.0, "tile {index}: {opacity}");
    }
}

// ============================================================================
// Shrink and regrowth
// ============================================================================

#[test]
fn shrink_retains_dormant_tiles_at_the_staging_point() {
    let (mut wall, mut scene) = setup();
    let completion = wall
        .switch_layout(&mut scene, LayoutSpec::Named("play".into()))
        .unwrap();

    // No removal: identity persists beyond the new layout's length.
    assert_eq!(wall.tile_count(), 17);
    assert!(scene.removed.is_empty());

    run(&mut wall, &mut scene, 1100.0, 16.0);
    assert!(completion.is_resolved());
    for index in 15..17 {
        let tile = wall.tile(index).unwrap();
        assert!(tile.dormant);
        assert!(approx(scene.body(index).opacity, 0.0));
        assert!((scene.body(index).position - STAGING_POINT).length() < EPSILON);
    }
    for index in 0..15 {
        assert!(!wall.tile(index).unwrap().dormant);
        assert!(approx(scene.body(index).opacity, 1.0));
    }
}

#[test]
fn regrowth_reuses_dormant_tiles_without_new_bodies() {
    let (mut wall, mut scene) = setup();
    wall.switch_layout(&mut scene, LayoutSpec::Named("play".into()))
        .unwrap();
    run(&mut wall, &mut scene, 1100.0, 16.0);

    wall.switch_layout(&mut scene, LayoutSpec::Named("musicNote".into()))
        .unwrap();
    assert_eq!(wall.tile_count(), 17);
    assert_eq!(scene.order.len(), 17, "dormant tiles reused, none created");

    run(&mut wall, &mut scene, 1100.0, 16.0);
    for index in 0..17 {
        assert!(!wall.tile(index).unwrap().dormant);
        assert!(approx(scene.body(index).opacity, 1.0));
        let target = layout::MUSIC_NOTE[index].position();
        assert!((scene.body(index).position - target).length() < EPSILON);
    }
}

// ============================================================================
// Interactions with running animations
// ============================================================================

#[test]
fn layout_switch_neutralizes_rolled_rotation() {
    let (mut wall, mut scene) = setup();
    wall.roll_over_tile(0, &RollOverOptions::default()).unwrap();
    run(&mut wall, &mut scene, 600.0, 16.0);
    assert!(approx(scene.body(0).rotation.x, std::f32::consts::PI));

    wall.switch_layout(&mut scene, LayoutSpec::Named("play".into()))
        .unwrap();
    run(&mut wall, &mut scene, 1100.0, 16.0);

    // Committed back to neutral, both in state and on the body.
    assert_eq!(wall.tile(0).unwrap().rotation_offset, Vec3::ZERO);
    assert_eq!(scene.body(0).rotation, Vec3::ZERO);
}

#[test]
fn mid_flight_switch_redirects_without_jumping() {
    let (mut wall, mut scene) = setup();
    wall.switch_layout(&mut scene, LayoutSpec::Named("play".into()))
        .unwrap();
    run(&mut wall, &mut scene, 400.0, 16.0);
    let mid = scene.body(0).position;

    // Re-entrant switch while the first transition is mid-flight: the
    // next tween starts from the interpolated position.
    wall.switch_layout(&mut scene, LayoutSpec::Named("musicNote".into()))
        .unwrap();
    scene.now += 16.0;
    wall.advance(16.0, &mut scene);
    let after = scene.body(0).position;
    assert!(
        (after - mid).length() < 8.0,
        "position jumped from {mid} to {after}"
    );

    run(&mut wall, &mut scene, 1100.0, 16.0);
    let target = layout::MUSIC_NOTE[0].position();
    assert!((scene.body(0).position - target).length() < EPSILON);
}
