//! Define an error type for the dcnet-llcrypto crate.

use dcnet_error::{ErrorKind, HasKind};
use thiserror::Error;

/// An error from the dcnet-llcrypto crate.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A byte string did not decode to a valid element of the group: either
    /// it lacked the `0xFF` sentinel bytes, or the resulting integer is not
    /// a member of the order-`q` subgroup.
    #[error("invalid group element encoding")]
    BadElementEncoding,

    /// A message was too long to encode into a single group element, even
    /// after exhausting every padding byte.
    #[error("message too large to encode as a group element")]
    MessageTooLarge,

    /// A Schnorr signature's `(r, s)` components were out of the valid
    /// range, or did not verify.
    #[error("signature verification failed")]
    BadSignature,

    /// There was a programming error somewhere in the calling code.
    #[error("internal programming error")]
    Internal(#[from] dcnet_error::InternalError),
}

impl HasKind for Error {
    fn kind(&self) -> ErrorKind {
        use Error as E;
        use ErrorKind as EK;
        match self {
            E::BadElementEncoding => EK::GroupEncoding,
            E::MessageTooLarge => EK::InputTooLarge,
            E::BadSignature => EK::BadSignature,
            E::Internal(_) => EK::Internal,
        }
    }
}
