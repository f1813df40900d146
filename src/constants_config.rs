// src/constants_config.rs

/// Physical and structural constants of a simulation run.
///
/// `eps` is the softening length: added (squared) to the squared separation
/// in the force law so the force stays bounded as two bodies approach.
#[derive(Debug, Clone, Copy)]
pub struct SimConstants {
    /// Gravitational constant.
    pub g: f64,
    /// Softening length.
    pub eps: f64,
    /// Fixed integration time step.
    pub dt: f64,
    /// Mesh fan-out `n`: one decomposition pass yields `(n/2)^2` cells.
    pub fanout: usize,
    /// Cell population above which the refiner subdivides.
    pub refine_threshold: usize,
}

impl Default for SimConstants {
    fn default() -> Self {
        Self {
            g: 6.67e-11,
            eps: 3.0e4,
            dt: 0.1,
            fanout: 16,
            refine_threshold: 200_000,
        }
    }
}

impl SimConstants {
    pub fn new(
        g: Option<f64>,
        eps: Option<f64>,
        dt: Option<f64>,
        fanout: Option<usize>,
        refine_threshold: Option<usize>,
    ) -> Self {
        let default = SimConstants::default();
        Self {
            g: g.unwrap_or(default.g),
            eps: eps.unwrap_or(default.eps),
            dt: dt.unwrap_or(default.dt),
            fanout: fanout.unwrap_or(default.fanout),
            refine_threshold: refine_threshold.unwrap_or(default.refine_threshold),
        }
    }
}
