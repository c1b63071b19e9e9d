//! Define an error type for the dcnet-cell crate.
use dcnet_error::{ErrorKind, HasKind};
use thiserror::Error;

/// An error type for the dcnet-cell crate.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A plaintext was too large to fit the fixed-size cell it targets.
    #[error("input of {actual} bytes exceeds the {max}-byte cell capacity")]
    InputTooLarge {
        /// The maximum number of bytes the codec accepts.
        max: usize,
        /// The number of bytes that were supplied.
        actual: usize,
    },
    /// The request-cell parameter tuner found no (R, B) satisfying the
    /// requested collision bound.
    #[error("no request-cell parameters satisfy clients={clients} trap_flip_risk={trap_flip_risk} hash_collision_risk={hash_collision_risk}")]
    RequestParamsInfeasible {
        /// The client count passed to the tuner.
        clients: usize,
        /// The target probability that an arbitrary bit is a trap bit.
        trap_flip_risk: f64,
        /// The maximum acceptable probability of any hash collision.
        hash_collision_risk: f64,
    },
    /// There was a programming error somewhere in the code.
    #[error("internal programming error")]
    Internal(#[from] dcnet_error::InternalError),
}

impl HasKind for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::InputTooLarge { .. } => ErrorKind::InputTooLarge,
            Error::RequestParamsInfeasible { .. } => ErrorKind::BloomCapacityExceeded,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }
}
