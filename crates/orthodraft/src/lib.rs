#![warn(missing_docs)]

//! Projection and view layout for technical drawings.
//!
//! Given a read-only boundary-representation [`Shape`], this crate computes
//! the 2D views a drafting sheet shows: the primary view, orthographic
//! secondaries placed by first- or third-angle convention, and axonometric
//! views in the corner slots. Every curve of a view is
//!
//! - sampled adaptively and projected onto the view plane,
//! - split into visible and hidden runs by casting rays through a face BVH,
//! - tagged with one of ten [`EdgeCategory`] values (sharp, smooth, sewn,
//!   outline or isoparameter, each visible or hidden).
//!
//! # Architecture
//!
//! - [`direction`] - View bases, cardinal and axonometric directions, slots
//! - [`projection`] - Adaptive curve sampling
//! - [`visibility`] - Ray-cast hidden-line classification
//! - [`taxonomy`] - Edge kinds, silhouettes and isolines
//! - [`view`] - The per-view pipeline
//! - [`scheduler`] - Parallel view jobs with cancellation
//! - [`composer`] - Multi-view drawing state machine
//! - [`layout`] - Page placement and auto-scale
//! - [`config`] - TOML drawing descriptions
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use orthodraft::{AxisDir, DraftSettings, LayoutParams, SecondaryRequest, ViewComposer, ViewSpec};
//! use orthodraft_primitives::make_box;
//!
//! let shape = Arc::new(make_box(40.0, 20.0, 10.0)?);
//! let mut composer = ViewComposer::new(shape, DraftSettings::default())?;
//! composer.set_primary(&ViewSpec::front())?;
//! composer.add_secondary(SecondaryRequest::Cardinal { axis: AxisDir::PosZ })?;
//! let layout = composer.layout(&LayoutParams::default())?;
//! ```

pub mod composer;
pub mod config;
pub mod diagnostics;
pub mod direction;
mod error;
pub mod layout;
pub mod projection;
pub mod scheduler;
pub mod settings;
pub mod taxonomy;
pub mod types;
pub mod view;
pub mod visibility;

pub use composer::{ComposerState, Drawing, DuplicatePolicy, SecondaryRequest, ViewComposer};
pub use config::{DrawingConfig, ShapeSpec};
pub use diagnostics::Diagnostic;
pub use direction::{
    Axonometric, AxonometricStyle, AxisDir, ProjectionConvention, ViewBasis, ViewSlot, ViewSpec,
};
pub use error::{DraftError, Result};
pub use layout::{compute_layout, Layout, LayoutWarning, Placement};
pub use scheduler::{CancelToken, ViewScheduler};
pub use settings::{DraftSettings, LayoutParams, PageRegion, PinnedOrigin, ScaleMode};
pub use types::{
    BoundingBox2D, CategoryMask, EdgeCategory, EdgeKind, EdgeSegment, EdgeSource, Point2D,
    ProjectedEdge, View, Visibility,
};
pub use view::{compute_view, project_shape};

pub use orthodraft_topo::{EdgeId, FaceId, Shape};
