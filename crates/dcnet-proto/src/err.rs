//! Define an error type for the dcnet-proto crate.

use dcnet_error::{ErrorKind, HasKind};
use thiserror::Error;

/// An error from the dcnet-proto crate.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A cell's trap bits did not match the noise a trustee expected,
    /// indicating the cell was disrupted in transit.
    #[error("cell failed its trap-bit check")]
    TrapMismatch,

    /// A nym index was used that no `add_nyms` call has registered.
    #[error("unknown nym index {index}")]
    UnknownNym {
        /// The offending index.
        index: usize,
    },

    /// An operation was attempted with an interval number that didn't match
    /// the one the participant last synced to.
    #[error("expected interval {expected}, got {actual}")]
    IntervalMismatch {
        /// The interval the participant is currently in.
        expected: u64,
        /// The interval the caller supplied.
        actual: u64,
    },

    /// The caller used this type in a way its state machine doesn't allow
    /// (e.g. producing ciphertexts before `sync`).
    #[error("bad API usage: {0}")]
    BadApiUsage(&'static str),

    /// A lower-level cell-codec error.
    #[error("cell codec error: {0}")]
    Cell(#[from] dcnet_cell::Error),

    /// A lower-level group or signature error.
    #[error("cryptography error: {0}")]
    Llcrypto(#[from] dcnet_llcrypto::Error),

    /// There was a programming error somewhere in the calling code.
    #[error("internal programming error")]
    Internal(#[from] dcnet_error::InternalError),
}

impl HasKind for Error {
    fn kind(&self) -> ErrorKind {
        use Error as E;
        use ErrorKind as EK;
        match self {
            E::TrapMismatch => EK::TrapMismatch,
            E::UnknownNym { .. } => EK::UnknownNym,
            E::IntervalMismatch { .. } => EK::IntervalMismatch,
            E::BadApiUsage(_) => EK::BadApiUsage,
            E::Cell(e) => e.kind(),
            E::Llcrypto(e) => e.kind(),
            E::Internal(_) => EK::Internal,
        }
    }
}
