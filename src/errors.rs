use std::fmt;
use std::error::Error;

/// Represents errors that can occur while building or advancing a simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Indicates invalid mesh parameters (non-positive radius, or a fan-out
    /// that is zero or odd).
    InvalidGridParameters,
    /// Indicates that the configured worker count is zero.
    InvalidWorkerCount,
    /// Indicates that the particle arrays disagree in length.
    MismatchedArrays,
    /// Indicates an invalid mass value (zero or negative mass).
    InvalidMass,
    /// Indicates that a worker rank could not be reached after retrying.
    WorkerUnreachable { rank: usize },
    /// Indicates that a worker rank reported results that do not match its
    /// assignment for the step.
    MalformedPayload { rank: usize },
    /// Indicates that the step barrier collapsed because every peer
    /// disconnected.
    BarrierFailed,
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimError::InvalidGridParameters => write!(f, "Invalid mesh parameters"),
            SimError::InvalidWorkerCount => write!(f, "Worker count must be at least one"),
            SimError::MismatchedArrays => write!(f, "Particle arrays disagree in length"),
            SimError::InvalidMass => write!(f, "Invalid mass value"),
            SimError::WorkerUnreachable { rank } => write!(f, "Worker rank {} is unreachable", rank),
            SimError::MalformedPayload { rank } => {
                write!(f, "Worker rank {} reported a malformed payload", rank)
            }
            SimError::BarrierFailed => write!(f, "Step barrier collapsed"),
        }
    }
}

impl Error for SimError {}
