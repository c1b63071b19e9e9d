#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(noop_method_call)]
#![warn(unreachable_pub)]
#![warn(clippy::all)]
#![deny(clippy::exhaustive_enums)]
#![deny(clippy::exhaustive_structs)]
#![deny(clippy::unwrap_used)]

//! A shared error-classification type for the dcnet crates.
//!
//! Every crate in this workspace defines its own `Error` type with
//! `thiserror`, but implements [`HasKind`] so that a caller driving a
//! [`Client`](../dcnet_proto/struct.Client.html)/Trustee/Relay loop can
//! decide what to do about a failure (drop the interval? blame a nym? abort
//! the process?) without matching on every crate's variants individually.

use derive_more::Display;

mod internal;
pub use internal::*;

/// A classification of the *meaning* of an error, as opposed to its cause.
///
/// Loosely modeled on the "location + likely response" classification used
/// by larger Tor-like systems: we don't split `ErrorKind` by which crate
/// raised it, only by what an outer driver should do about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A message was too large to fit in the fixed encoding it was given.
    ///
    /// This is the caller's fault: the message should have been checked
    /// against the codec's capacity before being handed in.
    #[display("input too large for fixed-size encoding")]
    InputTooLarge,

    /// A byte string did not decode to a valid group element.
    ///
    /// Either the bytes were corrupted in transit, or whoever produced them
    /// used a different group.
    #[display("invalid group element encoding")]
    GroupEncoding,

    /// A Schnorr signature failed to verify.
    #[display("signature verification failed")]
    BadSignature,

    /// A cell failed its trap-bit integrity check.
    ///
    /// This indicates that some participant's ciphertext did not combine to
    /// the expected value; the relay should treat the interval as
    /// compromised rather than trust the decoded payload.
    #[display("trap-bit integrity check failed")]
    TrapMismatch,

    /// A request cell's Bloom filter could not represent the number of
    /// reservations asked of it at the configured false-positive rate.
    #[display("bloom filter capacity exceeded")]
    BloomCapacityExceeded,

    /// An operation referenced a pseudonym that is not in the relay's
    /// currently-registered set.
    #[display("unknown pseudonym")]
    UnknownNym,

    /// An operation was attempted against the wrong interval (for example,
    /// a ciphertext submitted for an interval that has already closed).
    #[display("interval mismatch")]
    IntervalMismatch,

    /// The caller used an API in a way its preconditions forbid (for
    /// example, calling `sync` twice without consuming the result).
    #[display("bad API usage")]
    BadApiUsage,

    /// Internal error (bug).
    ///
    /// A supposedly impossible condition was reached. This indicates a bug
    /// in this workspace.
    #[display("internal error (bug)")]
    Internal,

    /// Unclassified error, provided for extension by code outside this
    /// workspace.
    #[display("unclassified error")]
    Other,
}

/// Trait for errors that can be classified into an [`ErrorKind`].
pub trait HasKind {
    /// Return the kind of this error.
    fn kind(&self) -> ErrorKind;
}

impl HasKind for std::convert::Infallible {
    fn kind(&self) -> ErrorKind {
        unreachable!()
    }
}
