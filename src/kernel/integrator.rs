use rayon::prelude::*;

use crate::constants_config::SimConstants;
use crate::errors::SimError;

/// Semi-implicit Euler update over every body:
/// `v += dt * F / m` followed by `pos += dt * v`.
///
/// Must only be called once all of the step's forces are final - the
/// update consumes the accumulators as-is and there is no partial
/// application. Masses are validated before any element is touched, so a
/// failed call leaves the arrays unchanged.
///
/// # Errors
///
/// Returns `SimError::InvalidMass` if any mass is zero or negative.
pub fn integrate(
    rx: &mut [f64],
    ry: &mut [f64],
    vx: &mut [f64],
    vy: &mut [f64],
    fx: &[f64],
    fy: &[f64],
    m: &[f64],
    constants: &SimConstants,
) -> Result<(), SimError> {
    if m.iter().any(|&mass| mass <= 0.0) {
        return Err(SimError::InvalidMass);
    }
    let dt = constants.dt;
    rx.par_iter_mut()
        .zip(ry.par_iter_mut())
        .zip(vx.par_iter_mut())
        .zip(vy.par_iter_mut())
        .zip(fx.par_iter())
        .zip(fy.par_iter())
        .zip(m.par_iter())
        .for_each(|((((((x, y), vx_i), vy_i), fx_i), fy_i), m_i)| {
            *vx_i += dt * fx_i / m_i;
            *vy_i += dt * fy_i / m_i;
            *x += dt * *vx_i;
            *y += dt * *vy_i;
        });
    Ok(())
}
