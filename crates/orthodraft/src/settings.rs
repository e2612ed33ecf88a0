//! Tunable parameters for projection, classification and layout.

use serde::{Deserialize, Serialize};

use crate::direction::ViewSlot;
use crate::error::{DraftError, Result};
use crate::types::{CategoryMask, Point2D};

/// Projection and hidden-line parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftSettings {
    /// Maximum chordal deviation of curve polylines (model units).
    pub chord_tolerance: f64,
    /// Minimum number of pieces a curve is sampled with.
    pub min_samples: usize,
    /// Maximum depth of adaptive subdivision.
    pub max_subdivision_depth: u32,
    /// Dihedral angle (radians) above which an edge is sharp.
    pub sharp_angle: f64,
    /// `|normal · view|` below which a surface counts as seen edge-on:
    /// ray hits are ambiguous and smooth edges become outlines.
    pub grazing_cosine: f64,
    /// Ray hits nearer than this to the sample point are ignored.
    pub depth_epsilon: f64,
    /// Distance in parameter space within which a hit lies on a trim boundary.
    pub boundary_tolerance: f64,
    /// Bisection steps used to locate a visibility change.
    pub bisection_steps: u32,
    /// Visibility runs shorter than this fraction of the shape diagonal are
    /// absorbed by their neighbours.
    pub flicker_fraction: f64,
    /// Number of isolines per direction on each curved face.
    pub iso_count: usize,
    /// Draw hidden lines.
    pub show_hidden: bool,
    /// Draw smooth edges and isolines.
    pub show_smooth: bool,
}

impl Default for DraftSettings {
    fn default() -> Self {
        Self {
            chord_tolerance: 0.01,
            min_samples: 8,
            max_subdivision_depth: 12,
            sharp_angle: 0.5f64.to_radians(),
            grazing_cosine: 1e-3,
            depth_epsilon: 1e-6,
            boundary_tolerance: 1e-6,
            bisection_steps: 30,
            flicker_fraction: 1e-4,
            iso_count: 0,
            show_hidden: true,
            show_smooth: true,
        }
    }
}

impl DraftSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("chord_tolerance", self.chord_tolerance),
            ("sharp_angle", self.sharp_angle),
            ("grazing_cosine", self.grazing_cosine),
            ("depth_epsilon", self.depth_epsilon),
            ("boundary_tolerance", self.boundary_tolerance),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(DraftError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.min_samples < 1 {
            return Err(DraftError::InvalidConfig(
                "min_samples must be at least 1".into(),
            ));
        }
        if self.grazing_cosine >= 1.0 {
            return Err(DraftError::InvalidConfig(
                "grazing_cosine must be below 1".into(),
            ));
        }
        if !(self.flicker_fraction.is_finite() && self.flicker_fraction >= 0.0) {
            return Err(DraftError::InvalidConfig(
                "flicker_fraction must be non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Categories enabled by the show-hidden and show-smooth toggles.
    pub fn category_mask(&self) -> CategoryMask {
        CategoryMask::from_flags(self.show_hidden, self.show_smooth)
    }
}

/// How the layout scale is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMode {
    /// Fit the arrangement into the page region.
    Auto,
    /// Use the given scale verbatim.
    Fixed(f64),
}

/// The page rectangle auto-scale fits views into (millimetres, y down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageRegion {
    /// Top-left corner.
    pub origin: Point2D,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Default for PageRegion {
    /// A4 landscape less a 10 mm border.
    fn default() -> Self {
        Self {
            origin: Point2D::new(10.0, 10.0),
            width: 277.0,
            height: 190.0,
        }
    }
}

/// A page origin the caller fixes for one view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinnedOrigin {
    /// View being placed.
    pub slot: ViewSlot,
    /// Page position of the view's local origin.
    pub origin: Point2D,
}

/// Layout parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Scale selection.
    pub scale: ScaleMode,
    /// Top-left corner of the arrangement in manual mode.
    pub top_left: Point2D,
    /// Horizontal gap between adjacent view columns (page units).
    pub spacing_x: f64,
    /// Vertical gap between adjacent view rows (page units).
    pub spacing_y: f64,
    /// Target region for auto-scale.
    pub region: PageRegion,
    /// Round auto-scale down to a standard drafting ratio.
    pub snap_scale: bool,
    /// Origins used verbatim in manual mode instead of the computed ones.
    /// Pinned views may overlap; the layout reports it.
    pub pinned: Vec<PinnedOrigin>,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            scale: ScaleMode::Auto,
            top_left: Point2D::new(10.0, 10.0),
            spacing_x: 15.0,
            spacing_y: 15.0,
            region: PageRegion::default(),
            snap_scale: true,
            pinned: Vec::new(),
        }
    }
}

impl LayoutParams {
    /// Validate parameters.
    pub fn validate(&self) -> Result<()> {
        if let ScaleMode::Fixed(s) = self.scale {
            if !(s.is_finite() && s > 0.0) {
                return Err(DraftError::InvalidConfig(format!(
                    "scale must be positive, got {s}"
                )));
            }
        }
        if !(self.spacing_x.is_finite() && self.spacing_x >= 0.0)
            || !(self.spacing_y.is_finite() && self.spacing_y >= 0.0)
        {
            return Err(DraftError::InvalidConfig(
                "spacing must be non-negative".into(),
            ));
        }
        if self.scale == ScaleMode::Auto && !self.pinned.is_empty() {
            return Err(DraftError::InvalidConfig(
                "pinned origins need a fixed scale".into(),
            ));
        }
        if let Some(pin) = self
            .pinned
            .iter()
            .find(|p| !(p.origin.x.is_finite() && p.origin.y.is_finite()))
        {
            return Err(DraftError::InvalidConfig(format!(
                "pinned origin of {:?} is not finite",
                pin.slot
            )));
        }
        if self.scale == ScaleMode::Auto
            && !(self.region.width > 0.0 && self.region.height > 0.0)
        {
            return Err(DraftError::InvalidConfig(
                "page region must have positive size".into(),
            ));
        }
        Ok(())
    }
}
