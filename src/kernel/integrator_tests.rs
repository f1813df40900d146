use approx::assert_relative_eq;

use crate::constants_config::SimConstants;
use crate::errors::SimError;
use crate::kernel::integrate;

#[test]
fn test_zero_force_advances_linearly() {
    let constants = SimConstants::default();
    let mut rx = vec![0.0];
    let mut ry = vec![0.0];
    let mut vx = vec![3.0];
    let mut vy = vec![-1.5];
    let fx = vec![0.0];
    let fy = vec![0.0];
    let m = vec![2.0];

    let steps = 10;
    for _ in 0..steps {
        integrate(&mut rx, &mut ry, &mut vx, &mut vy, &fx, &fy, &m, &constants)
            .expect("valid masses");
    }
    // Velocity untouched; position advanced by v * dt per step.
    assert_eq!(vx[0], 3.0);
    assert_eq!(vy[0], -1.5);
    assert_relative_eq!(rx[0], 3.0 * constants.dt * steps as f64, max_relative = 1e-12);
    assert_relative_eq!(ry[0], -1.5 * constants.dt * steps as f64, max_relative = 1e-12);
}

#[test]
fn test_velocity_updates_before_position() {
    // Semi-implicit Euler: the position update sees the new velocity.
    let constants = SimConstants::default();
    let mut rx = vec![0.0];
    let mut ry = vec![0.0];
    let mut vx = vec![0.0];
    let mut vy = vec![0.0];
    let fx = vec![2.0];
    let fy = vec![0.0];
    let m = vec![2.0];

    integrate(&mut rx, &mut ry, &mut vx, &mut vy, &fx, &fy, &m, &constants)
        .expect("valid masses");
    assert_relative_eq!(vx[0], constants.dt, max_relative = 1e-12);
    assert_relative_eq!(rx[0], constants.dt * constants.dt, max_relative = 1e-12);
    assert_eq!(vy[0], 0.0);
    assert_eq!(ry[0], 0.0);
}

#[test]
fn test_zero_mass_is_rejected_without_partial_update() {
    let constants = SimConstants::default();
    let mut rx = vec![1.0, 2.0];
    let mut ry = vec![3.0, 4.0];
    let mut vx = vec![5.0, 6.0];
    let mut vy = vec![7.0, 8.0];
    let fx = vec![1.0, 1.0];
    let fy = vec![1.0, 1.0];
    let m = vec![1.0, 0.0];

    let result = integrate(&mut rx, &mut ry, &mut vx, &mut vy, &fx, &fy, &m, &constants);
    assert_eq!(result, Err(SimError::InvalidMass));
    // No element was touched, not even the valid one.
    assert_eq!(rx, vec![1.0, 2.0]);
    assert_eq!(vx, vec![5.0, 6.0]);
}

#[test]
fn test_negative_mass_is_rejected() {
    let constants = SimConstants::default();
    let mut rx = vec![0.0];
    let mut ry = vec![0.0];
    let mut vx = vec![0.0];
    let mut vy = vec![0.0];
    let fx = vec![0.0];
    let fy = vec![0.0];
    let m = vec![-1.0];
    let result = integrate(&mut rx, &mut ry, &mut vx, &mut vy, &fx, &fy, &m, &constants);
    assert_eq!(result, Err(SimError::InvalidMass));
}
