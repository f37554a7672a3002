//! Error taxonomy for the oscillator core.

use thiserror::Error;

/// Errors raised while building or stepping a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid static configuration (population out of range, empty mesh, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An operation received an argument it cannot act on.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The compute surface could not provide a buffer of the requested size.
    #[error("resource exhausted: cannot allocate {requested} elements for {what}")]
    ResourceExhausted { what: &'static str, requested: usize },

    /// A pass saw buffers sized differently from the configured population.
    #[error("dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The compute surface stalled or was lost.
    #[error("compute surface failure: {0}")]
    Device(String),
}

impl SimError {
    /// Fatal errors end the run; the rest only abort the current tick.
    pub fn is_fatal(&self) -> bool {
        match self {
            SimError::Configuration(_) | SimError::ResourceExhausted { .. } | SimError::Device(_) => {
                true
            }
            SimError::InvalidArgument(_) | SimError::DimensionMismatch { .. } => false,
        }
    }

    pub(crate) fn mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        SimError::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
