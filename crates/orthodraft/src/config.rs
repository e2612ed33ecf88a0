//! TOML drawing descriptions.
//!
//! ```toml
//! convention = "first_angle"
//!
//! [shape]
//! type = "cylinder"
//! radius = 5.0
//! height = 12.0
//!
//! [primary]
//! type = "cardinal"
//! view_from = "neg_y"
//! right = "pos_x"
//!
//! [[secondaries]]
//! type = "cardinal"
//! axis = "pos_z"
//!
//! [settings]
//! show_hidden = false
//!
//! [layout]
//! scale = { fixed = 2.0 }
//! ```

use std::sync::Arc;

use orthodraft_math::{Point2, Point3};
use orthodraft_primitives::{
    make_box, make_cone, make_cylinder, make_prism, make_sheet, make_slot, make_sphere,
};
use orthodraft_topo::Shape;
use serde::{Deserialize, Serialize};

use crate::composer::{Drawing, DuplicatePolicy, SecondaryRequest, ViewComposer};
use crate::direction::{ProjectionConvention, ViewSpec};
use crate::error::Result;
use crate::settings::{DraftSettings, LayoutParams};

/// A primitive shape to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeSpec {
    /// Axis-aligned box with a corner at the origin.
    Box {
        /// Extents along X, Y and Z.
        size: [f64; 3],
    },
    /// Straight extrusion of a polygon in the XY plane.
    Prism {
        /// Polygon corners, counter-clockwise.
        profile: Vec<[f64; 2]>,
        /// Extrusion height along Z.
        height: f64,
    },
    /// Obround prism: a box with half-round ends.
    Slot {
        /// Distance between the end centres.
        length: f64,
        /// Width, equal to the end diameter.
        width: f64,
        /// Height along Z.
        height: f64,
    },
    /// Cylinder on the XY plane.
    Cylinder {
        /// Radius.
        radius: f64,
        /// Height along Z.
        height: f64,
    },
    /// Cone frustum on the XY plane.
    Cone {
        /// Radius at z = 0.
        radius_bottom: f64,
        /// Radius at the top.
        radius_top: f64,
        /// Height along Z.
        height: f64,
    },
    /// Sphere.
    Sphere {
        /// Radius.
        radius: f64,
        /// Centre.
        #[serde(default)]
        center: [f64; 3],
    },
    /// Open rectangular sheet facing +Z.
    Sheet {
        /// Extent along X.
        width: f64,
        /// Extent along Y.
        depth: f64,
    },
}

impl ShapeSpec {
    /// Build the shape.
    pub fn build(&self) -> Result<Shape> {
        let shape = match self {
            ShapeSpec::Box { size } => make_box(size[0], size[1], size[2])?,
            ShapeSpec::Prism { profile, height } => {
                let points: Vec<Point2> = profile.iter().map(|p| Point2::new(p[0], p[1])).collect();
                make_prism(&points, *height)?
            }
            ShapeSpec::Slot {
                length,
                width,
                height,
            } => make_slot(*length, *width, *height)?,
            ShapeSpec::Cylinder { radius, height } => make_cylinder(*radius, *height)?,
            ShapeSpec::Cone {
                radius_bottom,
                radius_top,
                height,
            } => make_cone(*radius_bottom, *radius_top, *height)?,
            ShapeSpec::Sphere { radius, center } => make_sphere(Point3::from(*center), *radius)?,
            ShapeSpec::Sheet { width, depth } => make_sheet(*width, *depth)?,
        };
        Ok(shape)
    }
}

/// A complete drawing request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawingConfig {
    /// Shape to draw.
    pub shape: ShapeSpec,
    /// Primary view direction.
    #[serde(default)]
    pub primary: ViewSpec,
    /// Secondary views, applied in order.
    #[serde(default)]
    pub secondaries: Vec<SecondaryRequest>,
    /// Slot convention.
    #[serde(default)]
    pub convention: ProjectionConvention,
    /// Handling of repeated slots.
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    /// Projection and classification settings.
    #[serde(default)]
    pub settings: DraftSettings,
    /// Page layout.
    #[serde(default)]
    pub layout: LayoutParams,
}

impl DrawingConfig {
    /// Parse a TOML description and validate its settings.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: DrawingConfig = toml::from_str(text)?;
        config.settings.validate()?;
        config.layout.validate()?;
        Ok(config)
    }

    /// A composer with the primary and every secondary view computed.
    pub fn composer(&self) -> Result<ViewComposer> {
        let shape = Arc::new(self.shape.build()?);
        let mut composer = ViewComposer::new(shape, self.settings.clone())?;
        composer.set_duplicate_policy(self.duplicate_policy);
        composer.set_convention(self.convention)?;
        composer.set_primary(&self.primary)?;
        if !self.secondaries.is_empty() {
            composer.add_secondaries(&self.secondaries)?;
        }
        Ok(composer)
    }

    /// Compute and lay out the whole drawing.
    pub fn compose(&self) -> Result<Drawing> {
        let mut composer = self.composer()?;
        composer.layout(&self.layout)?;
        Ok(composer.drawing())
    }
}
