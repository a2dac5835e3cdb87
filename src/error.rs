//! Typed error taxonomy shared by all modules of the numeric core.

use thiserror::Error;

/// Errors raised by the EDM numeric core.
///
/// All errors are fatal to the enclosing operation: there is no local
/// recovery inside the core, propagation is via `?` throughout.
#[derive(Error, Debug)]
pub enum EdmError {
    #[error("ConfigInvalid: {0}")]
    ConfigInvalid(String),

    #[error("DimensionMismatch: {0}")]
    DimensionMismatch(String),

    #[error("EmptySelector: columns and indices both empty when selecting sub-frame")]
    EmptySelector,

    #[error("LibraryTooSmall: library is too small to resolve {0} knn neighbors")]
    LibraryTooSmall(usize),

    #[error("UnknownMetric: distance metric enum out of range")]
    UnknownMetric,

    #[error("IOFailure: {0}")]
    Io(#[from] std::io::Error),

    #[error("IOFailure (csv): {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, EdmError>;
