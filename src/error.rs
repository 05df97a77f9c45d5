//! Defines the decode error and its classification
use std::fmt;

use crate::path::Path;

/// Coarse classification of an [`Error`], for callers that branch on the cause.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidDestination,
    TypeMismatch,
    DestinationFieldNotFound,
    DestinationFieldNotWritable,
    CyclicStructure,
}

/// Error returned by every decode entry point.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// The destination is not a writable reference to a concrete container.
    InvalidDestination {
        reason: &'static str,
    },
    /// Source and destination are structurally incompatible, or a scalar
    /// conversion was refused or failed.
    TypeMismatch {
        expected: String,
        found: String,
        /// Why the conversion failed, when a coercion was attempted.
        reason: Option<String>,
        path: Path,
    },
    /// A source field has no destination counterpart and unmatched fields are not allowed.
    DestinationFieldNotFound {
        field: String,
        path: Path,
    },
    /// A destination slot was matched but the record storage does not hold it.
    DestinationFieldNotWritable {
        field: String,
        path: Path,
    },
    /// Nesting exceeded the configured depth ceiling.
    CyclicStructure {
        depth: usize,
        path: Path,
    },
}

impl Error {
    pub(crate) fn invalid_destination(reason: &'static str) -> Self {
        Error::InvalidDestination { reason }
    }

    /// A `TypeMismatch` without a coercion reason. Also meant for hand-written
    /// [`Reflect`](crate::Reflect) impls, which report at [`Path::root`].
    pub fn mismatch<E: fmt::Display, F: fmt::Display>(expected: E, found: F, path: &Path) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
            reason: None,
            path: path.clone(),
        }
    }

    /// Surface a failed coercion as a `TypeMismatch` at `path`.
    pub(crate) fn from_coercion(err: CoercionError, path: &Path) -> Self {
        Error::TypeMismatch {
            expected: err.to,
            found: err.from,
            reason: Some(err.reason),
            path: path.clone(),
        }
    }

    pub(crate) fn field_not_found<S: Into<String>>(field: S, path: &Path) -> Self {
        Error::DestinationFieldNotFound {
            field: field.into(),
            path: path.clone(),
        }
    }

    pub(crate) fn field_not_writable<S: Into<String>>(field: S, path: &Path) -> Self {
        Error::DestinationFieldNotWritable {
            field: field.into(),
            path: path.clone(),
        }
    }

    pub(crate) fn cyclic(depth: usize, path: &Path) -> Self {
        Error::CyclicStructure {
            depth,
            path: path.clone(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidDestination { .. } => ErrorKind::InvalidDestination,
            Error::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Error::DestinationFieldNotFound { .. } => ErrorKind::DestinationFieldNotFound,
            Error::DestinationFieldNotWritable { .. } => ErrorKind::DestinationFieldNotWritable,
            Error::CyclicStructure { .. } => ErrorKind::CyclicStructure,
        }
    }

    /// Where the error was raised, if it happened below the destination itself.
    ///
    /// Returns:
    /// - `Some(&Path)` for errors raised while walking the values;
    /// - `None` for `InvalidDestination`, which is checked before any walking.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::InvalidDestination { .. } => None,
            Error::TypeMismatch { path, .. }
            | Error::DestinationFieldNotFound { path, .. }
            | Error::DestinationFieldNotWritable { path, .. }
            | Error::CyclicStructure { path, .. } => Some(path),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidDestination { reason } => write!(f, "invalid destination: {reason}"),
            Error::TypeMismatch {
                expected,
                found,
                reason,
                path,
            } => {
                write!(f, "type mismatch at {path}: cannot decode {found} into {expected}")?;
                if let Some(reason) = reason {
                    write!(f, " ({reason})")?;
                }
                Ok(())
            }
            Error::DestinationFieldNotFound { field, path } => {
                write!(f, "destination field `{field}` not found at {path}")
            }
            Error::DestinationFieldNotWritable { field, path } => {
                write!(f, "destination field `{field}` is not writable at {path}")
            }
            Error::CyclicStructure { depth, path } => {
                write!(f, "nesting depth {depth} exceeded at {path}; the structure may be cyclic")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A scalar conversion step that failed.
///
/// Returned by [`crate::coerce`]; the decoder wraps it into [`Error::TypeMismatch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoercionError {
    pub from: String,
    pub to: String,
    pub reason: String,
}

impl CoercionError {
    pub(crate) fn new<F: fmt::Display, T: fmt::Display, R: Into<String>>(from: F, to: T, reason: R) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CoercionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot coerce {} into {}: {}", self.from, self.to, self.reason)
    }
}

impl std::error::Error for CoercionError {}
