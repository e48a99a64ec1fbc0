//! Error taxonomy for the simulation core
//!
//! Invariant violations indicate a defect in the update ordering or the
//! safety checks and are propagated rather than silently repaired.

use thiserror::Error;

use super::types::VehicleId;

/// The top-level error type for the simulation core
#[derive(Debug, Error)]
pub enum SimError {
    /// Rejected at construction; the environment is never built
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Grid/vehicle bookkeeping disagreement; fatal by design
    #[error("grid invariant violated: {0}")]
    InvariantViolation(String),

    /// `rewind()` was called with nothing on the history stack
    #[error("no history to rewind")]
    EmptyHistory,

    /// A handle pointed at a vehicle that is no longer in the world
    #[error("{0} not found")]
    VehicleNotFound(VehicleId),
}

/// Shorthand result type for the simulation core
pub type SimResult<T> = Result<T, SimError>;
