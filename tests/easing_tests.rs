//! Easing Catalog Tests
//!
//! Tests for:
//! - Boundary values ease(0) = 0 and ease(1) = 1 for every curve
//! - Monotonicity of the in-out and out curves
//! - ElasticOut overshoot above 1 mid-curve
//! - Characteristic midpoint values

use tilewall::Easing;

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn all_curves() -> Vec<Easing> {
    vec![
        Easing::Linear,
        Easing::CircInOut,
        Easing::QuadInOut,
        Easing::QuartInOut,
        Easing::QuintOut,
        Easing::elastic_out(),
    ]
}

// ============================================================================
// Boundary values
// ============================================================================

#[test]
fn all_curves_pin_boundaries() {
    for easing in all_curves() {
        assert!(
            approx(easing.apply(0.0), 0.0),
            "{easing:?}: ease(0) = {}",
            easing.apply(0.0)
        );
        assert!(
            approx(easing.apply(1.0), 1.0),
            "{easing:?}: ease(1) = {}",
            easing.apply(1.0)
        );
    }
}

// ============================================================================
// Monotonicity
// ============================================================================

#[test]
fn polynomial_and_circular_curves_are_monotonic() {
    for easing in [
        Easing::Linear,
        Easing::CircInOut,
        Easing::QuadInOut,
        Easing::QuartInOut,
        Easing::QuintOut,
    ] {
        let mut last = 0.0;
        for i in 0..=100 {
            let value = easing.apply(i as f32 / 100.0);
            assert!(
                value >= last - EPSILON,
                "{easing:?} not monotonic at t={}: {value} < {last}",
                i as f32 / 100.0
            );
            last = value;
        }
    }
}

// ============================================================================
// Characteristic values
// ============================================================================

#[test]
fn in_out_curves_hit_half_at_midpoint() {
    for easing in [Easing::CircInOut, Easing::QuadInOut, Easing::QuartInOut] {
        assert!(
            approx(easing.apply(0.5), 0.5),
            "{easing:?}: ease(0.5) = {}",
            easing.apply(0.5)
        );
    }
}

#[test]
fn quad_in_out_quarter_point() {
    // 2 * 0.25^2 = 0.125
    assert!(approx(Easing::QuadInOut.apply(0.25), 0.125));
}

#[test]
fn quint_out_decelerates() {
    // 1 - (1 - 0.5)^5 = 0.96875
    assert!(approx(Easing::QuintOut.apply(0.5), 0.96875));
    // Past the halfway mark almost immediately.
    assert!(Easing::QuintOut.apply(0.2) > 0.6);
}

// ============================================================================
// ElasticOut
// ============================================================================

#[test]
fn elastic_out_overshoots_then_settles() {
    let easing = Easing::elastic_out();
    let overshoots = (1..100).any(|i| easing.apply(i as f32 / 100.0) > 1.0);
    assert!(overshoots, "elastic-out should overshoot above 1 mid-curve");

    // The tail converges back toward 1.
    let late = easing.apply(0.95);
    assert!((late - 1.0).abs() < 0.05, "t=0.95: {late}");
}

#[test]
fn elastic_out_amplitude_raises_peak() {
    let soft = Easing::elastic_out();
    let hard = Easing::ElasticOut {
        amplitude: 2.0,
        period: 0.3,
    };
    let peak = |easing: Easing| {
        (1..100)
            .map(|i| easing.apply(i as f32 / 100.0))
            .fold(f32::MIN, f32::max)
    };
    assert!(peak(hard) > peak(soft));
}
