//! The `InternalError` type, and a macro for constructing it.

use std::fmt::{self, Display};
use std::panic;

use super::*;

/// Internal error (a bug).
#[derive(Debug, Clone)]
pub struct InternalError(Box<InternalErrorRepr>);

/// Internal error (a bug)
#[derive(Debug, Clone)]
struct InternalErrorRepr {
    /// Message, usually from `internal!()` like `format!`.
    message: String,
    /// File and line number of the call site.
    location: &'static panic::Location<'static>,
}

impl InternalError {
    /// Create an internal error capturing this call site.
    ///
    /// Prefer [`internal!`], which makes it easy to add format parameters.
    #[track_caller]
    pub fn new<S: Into<String>>(message: S) -> Self {
        InternalError(
            InternalErrorRepr {
                message: message.into(),
                location: panic::Location::caller(),
            }
            .into(),
        )
    }
}

impl std::error::Error for InternalError {}

impl Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "internal error (bug): {}: {}", self.0.location, self.0.message)
    }
}

/// Construct an [`InternalError`], with a message like `format!`, capturing
/// the call site.
///
/// # Examples
///
/// ```
/// use dcnet_error::internal;
///
/// # fn main() -> Result<(), dcnet_error::InternalError> {
/// # let mut cells = [()].iter();
/// let need_cell = cells.next().ok_or_else(|| internal!("no cells left in queue"))?;
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! internal {
    { $( $arg:tt )* } => {
        $crate::InternalError::new(format!($($arg)*))
    }
}

impl HasKind for InternalError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}
