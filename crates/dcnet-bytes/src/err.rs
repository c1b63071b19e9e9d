//! Internal: Declare an Error type for dcnet-bytes

use std::borrow::Cow;
use std::num::NonZeroUsize;

use thiserror::Error;

/// Error type for decoding dcnet objects from bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Tried to read something, but didn't find enough bytes.
    #[error("object truncated, at least {deficit} more bytes needed")]
    Truncated {
        /// Lower bound on the number of additional bytes needed.
        deficit: NonZeroUsize,
    },
    /// Called `Reader::should_be_exhausted()`, but found bytes anyway.
    #[error("extra bytes at end of object")]
    ExtraneousBytes,
    /// Invalid length value: too large to represent as `usize`, or to fit
    /// in the length field it was headed for.
    #[error("object length too large to represent")]
    BadLengthValue,
    /// An attempt to parse an object failed for some reason related to its
    /// contents.
    #[error("bad object: {0}")]
    InvalidMessage(Cow<'static, str>),
}

impl Error {
    /// Construct a [`Error::Truncated`] with the given deficit, for use in
    /// tests.
    ///
    /// # Panics
    ///
    /// Panics if `deficit` is zero.
    pub fn new_truncated_for_test(deficit: usize) -> Self {
        Error::Truncated {
            deficit: NonZeroUsize::new(deficit).expect("zero deficit"),
        }
    }
}

/// Error type for encoding dcnet objects to bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EncodeError {
    /// We tried to encode an object with an attached length, but the
    /// length was too large to encode in the available space.
    #[error("object length too large to encode")]
    BadLengthValue,
}
