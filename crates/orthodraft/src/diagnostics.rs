//! Non-fatal findings recorded while computing a view.

use orthodraft_topo::{EdgeId, FaceId};
use serde::{Deserialize, Serialize};

/// A non-fatal problem found while computing a view.
///
/// Diagnostics never abort a view; the affected edge is either dropped
/// (degenerate projections) or resolved by a fixed policy (ambiguous rays
/// default to visible).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// An edge collapses to a point in this view and was left out.
    ProjectionDegenerate {
        /// The collapsed edge.
        edge: EdgeId,
    },
    /// The whole view collapses to a point or a line.
    ViewDegenerate {
        /// Width of the projected bounds.
        width: f64,
        /// Height of the projected bounds.
        height: f64,
    },
    /// Some occlusion rays grazed a face and were resolved as visible.
    ClassificationAmbiguous {
        /// Source edge, if the curve is a true edge of the shape.
        edge: Option<EdgeId>,
        /// Face the ambiguous rays grazed.
        face: FaceId,
        /// Number of ambiguous samples along the curve.
        samples: usize,
    },
}

impl Diagnostic {
    /// Emit the diagnostic through `tracing`.
    pub fn log(&self) {
        match self {
            Diagnostic::ProjectionDegenerate { edge } => {
                tracing::warn!(edge = edge.0, "edge projects to a point");
            }
            Diagnostic::ViewDegenerate { width, height } => {
                tracing::warn!(width, height, "view collapses to a point or line");
            }
            Diagnostic::ClassificationAmbiguous {
                edge,
                face,
                samples,
            } => {
                tracing::warn!(
                    edge = edge.map(|e| e.0),
                    face = face.0,
                    samples,
                    "grazing occlusion rays resolved as visible"
                );
            }
        }
    }
}
