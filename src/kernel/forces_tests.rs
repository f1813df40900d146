use approx::{assert_abs_diff_eq, assert_relative_eq};

use crate::constants_config::SimConstants;
use crate::kernel::{accumulate_forces, apply_uniform, force_on_body, reset_forces};

#[test]
fn test_two_body_magnitude_and_opposition() {
    let constants = SimConstants::default();
    let rx = [0.0, 1000.0];
    let ry = [0.0, 0.0];
    let m = [1.0e15, 1.0e15];

    let (fx0, fy0) = force_on_body(0, &rx, &ry, &m, &constants);
    let (fx1, fy1) = force_on_body(1, &rx, &ry, &m, &constants);

    let d = 1000.0;
    let expected = constants.g * m[0] * m[1] / (d * d + constants.eps * constants.eps);
    assert_relative_eq!(fx0, expected, max_relative = 1e-12);
    assert_eq!(fy0, 0.0);
    // Equal and opposite along the separation axis.
    assert_eq!(fx1, -fx0);
    assert_eq!(fy1, 0.0);
}

#[test]
fn test_symmetric_neighbors_cancel() {
    // A body surrounded by identical bodies placed symmetrically feels no
    // net force.
    let constants = SimConstants::default();
    let rx = [0.0, 500.0, -500.0, 0.0, 0.0];
    let ry = [0.0, 0.0, 0.0, 500.0, -500.0];
    let m = [1.0e15; 5];
    let (fx, fy) = force_on_body(0, &rx, &ry, &m, &constants);
    assert_eq!(fx, 0.0);
    assert_eq!(fy, 0.0);
}

#[test]
fn test_square_configuration_has_zero_total_force() {
    let constants = SimConstants::default();
    let rx = [500.0, -500.0, -500.0, 500.0];
    let ry = [500.0, 500.0, -500.0, -500.0];
    let m = [1.0e15; 4];
    let mut fx = vec![0.0; 4];
    let mut fy = vec![0.0; 4];
    accumulate_forces(&rx, &ry, &m, &mut fx, &mut fy, &constants);
    let scale = fx.iter().map(|f| f.abs()).fold(0.0, f64::max);
    assert!(scale > 0.0);
    assert_abs_diff_eq!(fx.iter().sum::<f64>(), 0.0, epsilon = scale * 1e-12);
    assert_abs_diff_eq!(fy.iter().sum::<f64>(), 0.0, epsilon = scale * 1e-12);
}

#[test]
fn test_coincident_bodies_contribute_nothing() {
    let constants = SimConstants::default();
    let rx = [100.0, 100.0];
    let ry = [-50.0, -50.0];
    let m = [1.0e15, 1.0e15];
    assert_eq!(force_on_body(0, &rx, &ry, &m, &constants), (0.0, 0.0));
}

#[test]
fn test_reset_clears_accumulators() {
    let mut fx = vec![1.0, -2.0, 3.0];
    let mut fy = vec![-4.0, 5.0, -6.0];
    reset_forces(&mut fx, &mut fy);
    assert!(fx.iter().all(|&f| f == 0.0));
    assert!(fy.iter().all(|&f| f == 0.0));
}

#[test]
fn test_accumulate_adds_to_existing_forces() {
    let constants = SimConstants::default();
    let rx = [0.0, 1000.0];
    let ry = [0.0, 0.0];
    let m = [1.0e15, 1.0e15];
    let (pairwise, _) = force_on_body(0, &rx, &ry, &m, &constants);

    let mut fx = vec![10.0, 10.0];
    let mut fy = vec![0.0, 0.0];
    accumulate_forces(&rx, &ry, &m, &mut fx, &mut fy, &constants);
    assert_relative_eq!(fx[0], 10.0 + pairwise, max_relative = 1e-12);
    assert_relative_eq!(fx[1], 10.0 - pairwise, max_relative = 1e-12);
}

#[test]
fn test_apply_uniform_broadcasts_perturbation() {
    let mut fx = vec![1.0, 2.0, 3.0];
    let mut fy = vec![0.0, 0.0, 0.0];
    apply_uniform(&mut fx, &mut fy, 0.5, -0.25);
    assert_eq!(fx, vec![1.5, 2.5, 3.5]);
    assert_eq!(fy, vec![-0.25, -0.25, -0.25]);
}
