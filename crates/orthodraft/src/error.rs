//! Error types for view composition.

use orthodraft_topo::TopoError;
use thiserror::Error;

use crate::direction::ViewSlot;

/// Errors that abort a drafting request.
///
/// Per-edge and per-view problems are not errors; they are reported as
/// [`Diagnostic`](crate::Diagnostic)s next to the result.
#[derive(Error, Debug)]
pub enum DraftError {
    /// The shape is malformed and cannot be projected.
    #[error("geometry error: {0}")]
    Geometry(#[from] TopoError),

    /// A view direction is not usable.
    #[error("invalid view direction: {0}")]
    InvalidDirection(String),

    /// A secondary view or layout was requested before the primary view.
    #[error("no primary view has been computed")]
    NoPrimaryView,

    /// A secondary view already occupies the slot.
    #[error("a view already occupies the {0:?} slot")]
    DuplicateView(ViewSlot),

    /// No view occupies the slot.
    #[error("no view occupies the {0:?} slot")]
    UnknownView(ViewSlot),

    /// Settings or layout parameters are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The computation was superseded before it finished.
    #[error("view computation was cancelled")]
    Cancelled,

    /// A drawing description could not be parsed.
    #[error("failed to parse drawing description: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for drafting operations.
pub type Result<T> = std::result::Result<T, DraftError>;
