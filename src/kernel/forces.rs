//! Softened pairwise gravity over structure-of-arrays body sets.
//!
//! The same kernel serves both tiers of the pipeline: within a cell the
//! bodies are particles, in the coarse pass they are macro-bodies. Each
//! target body's force is an independent reduction over the (read-only)
//! body set, written to the target's private accumulator slot, so the
//! kernel is data-parallel across targets with no ordering requirements.

use rayon::prelude::*;

use crate::constants_config::SimConstants;

/// Zeroes the force accumulators ahead of a new accumulation pass.
pub fn reset_forces(fx: &mut [f64], fy: &mut [f64]) {
    fx.par_iter_mut().for_each(|f| *f = 0.0);
    fy.par_iter_mut().for_each(|f| *f = 0.0);
}

/// Net force on body `target` from every other body in the set.
///
/// Softened inverse-square law, resolved radially:
/// `F = g * m_i * m_j / (d^2 + eps^2)`, applied along `(dx, dy) / d`.
/// Self-interaction is excluded, and an exactly coincident pair
/// contributes nothing (its direction is undefined; the softened
/// magnitude stays bounded either way).
pub fn force_on_body(
    target: usize,
    rx: &[f64],
    ry: &[f64],
    m: &[f64],
    constants: &SimConstants,
) -> (f64, f64) {
    let mut fx = 0.0;
    let mut fy = 0.0;
    for j in 0..rx.len() {
        if j == target {
            continue;
        }
        let dx = rx[j] - rx[target];
        let dy = ry[j] - ry[target];
        let dist_sq = dx * dx + dy * dy;
        if dist_sq == 0.0 {
            continue;
        }
        let dist = dist_sq.sqrt();
        let force = constants.g * m[target] * m[j] / (dist_sq + constants.eps * constants.eps);
        fx += force * dx / dist;
        fy += force * dy / dist;
    }
    (fx, fy)
}

/// Accumulates pairwise forces for every body in the set, in parallel
/// across targets.
///
/// Adds into `fx`/`fy`; callers reset the accumulators with
/// [`reset_forces`] at the start of the step's force pass.
pub fn accumulate_forces(
    rx: &[f64],
    ry: &[f64],
    m: &[f64],
    fx: &mut [f64],
    fy: &mut [f64],
    constants: &SimConstants,
) {
    fx.par_iter_mut()
        .zip(fy.par_iter_mut())
        .enumerate()
        .for_each(|(i, (fx_i, fy_i))| {
            let (dfx, dfy) = force_on_body(i, rx, ry, m, constants);
            *fx_i += dfx;
            *fy_i += dfy;
        });
}

/// Adds one shared perturbation to every accumulator.
///
/// The coarse pass computes a single force per cell (on its macro-body)
/// and applies it identically to all of the cell's particles.
pub fn apply_uniform(fx: &mut [f64], fy: &mut [f64], dfx: f64, dfy: f64) {
    fx.par_iter_mut().for_each(|f| *f += dfx);
    fy.par_iter_mut().for_each(|f| *f += dfy);
}
