pub mod constants_config;
pub mod errors;
pub mod mesh;
pub mod kernel;
pub mod cluster;
pub mod simulation;

pub use constants_config::SimConstants;
pub use errors::SimError;
pub use simulation::{GalaxySystem, Simulation};

/// Default constants for a simulation run: softened Newtonian gravity with
/// the fixed time step and mesh parameters used by the driver.
pub const DEFAULT_SIM_CONSTANTS: SimConstants = SimConstants {
    g: 6.67e-11,
    eps: 3.0e4,
    dt: 0.1,
    fanout: 16,
    refine_threshold: 200_000,
};

/// ### General helper function
/// - Asserts that two floating point numbers are approximately equal.
///
/// ### Arguments
///
/// * `a` - The first floating point number.
/// * `b` - The second floating point number.
/// * `epsilon` - The maximum difference between `a` and `b` for them to be considered equal.
/// * `optional_message` - An optional message to display if the assertion fails.
///
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64, optional_message: Option<&str>) {
    match optional_message {
        Some(message) => assert!((a - b).abs() < epsilon, "a: {:?},\nb: {:?},\nepsilon: {:?},\n message: {:?}", a, b, epsilon, message),
        None => assert!((a - b).abs() < epsilon, "Expected {} to be approximately equal to {} (epsilon: {})", a, b, epsilon),
    }
}
