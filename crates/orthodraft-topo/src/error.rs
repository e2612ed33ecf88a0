//! Error types for shape construction and validation.

use thiserror::Error;

/// Structural problems that make a shape impossible to project.
///
/// Any of these aborts the whole drawing request; no partial result is produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopoError {
    /// An id points outside the arena it indexes.
    #[error("{entity} references missing {target} #{index}")]
    InvalidReference {
        /// The entity holding the bad reference.
        entity: String,
        /// Kind of the referenced entity.
        target: &'static str,
        /// The out-of-range index.
        index: u32,
    },

    /// A coordinate or parameter is NaN or infinite.
    #[error("non-finite geometry in {0}")]
    NonFinite(String),

    /// An edge whose curve collapses to a single point in 3D.
    #[error("edge #{0} is degenerate (zero length)")]
    DegenerateEdge(u32),

    /// An edge whose parameter range is empty or reversed.
    #[error("edge #{0} has an empty parameter range")]
    EmptyParameterRange(u32),

    /// A face whose trim region is not bounded.
    #[error("face #{0} is unbounded")]
    UnboundedFace(u32),

    /// An edge that bounds no face.
    #[error("edge #{0} is not attached to any face")]
    DanglingEdge(u32),

    /// An edge shared by more than two face sides.
    #[error("edge #{0} is shared by {1} faces")]
    NonManifoldEdge(u32, usize),

    /// A trim loop that does not close on itself.
    #[error("face #{0} has an open trim loop")]
    OpenLoop(u32),

    /// A trim loop that crosses itself.
    #[error("face #{0} has a self-intersecting trim loop")]
    SelfIntersectingLoop(u32),

    /// A primitive dimension that is zero, negative or otherwise unusable.
    #[error("invalid dimension: {0}")]
    InvalidDimension(String),
}

/// Result type for topology operations.
pub type Result<T> = std::result::Result<T, TopoError>;
