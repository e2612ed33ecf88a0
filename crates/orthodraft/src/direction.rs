//! View directions, projection bases and drawing slots.
//!
//! A [`ViewBasis`] is the orthonormal frame a view is drawn in. Callers
//! name directions through a [`ViewSpec`]: a cardinal axis pair, an
//! axonometric style, or a free plane normal. Secondary orthographic views
//! are derived from the primary basis so that the axis they share with it
//! stays identical on the page.

use orthodraft_math::{Dir3, Point3, Rotation, Tolerance, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{DraftError, Result};
use crate::types::Point2D;

/// A signed world axis.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisDir {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl AxisDir {
    /// Every axis direction.
    pub const ALL: [AxisDir; 6] = [
        AxisDir::PosX,
        AxisDir::NegX,
        AxisDir::PosY,
        AxisDir::NegY,
        AxisDir::PosZ,
        AxisDir::NegZ,
    ];

    /// Unit vector along the axis.
    pub fn vector(self) -> Vec3 {
        match self {
            AxisDir::PosX => Vec3::x(),
            AxisDir::NegX => -Vec3::x(),
            AxisDir::PosY => Vec3::y(),
            AxisDir::NegY => -Vec3::y(),
            AxisDir::PosZ => Vec3::z(),
            AxisDir::NegZ => -Vec3::z(),
        }
    }
}

/// Serialized form of a [`ViewBasis`].
///
/// Uses array representation for serialization compatibility.
#[derive(Serialize, Deserialize)]
struct BasisRepr {
    normal: [f64; 3],
    up: [f64; 3],
    right: [f64; 3],
}

/// An orthonormal, right-handed projection frame.
///
/// `normal` points from the model toward the viewer and
/// `right = up × normal`. A model point `p` lands at `(p·right, p·up)` on
/// the view plane; `p·normal` is its depth, larger meaning nearer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "BasisRepr", into = "BasisRepr")]
pub struct ViewBasis {
    /// Toward the viewer.
    pub normal: Vec3,
    /// Drawn upward on the page.
    pub up: Vec3,
    /// Drawn to the right on the page.
    pub right: Vec3,
}

impl From<BasisRepr> for ViewBasis {
    fn from(r: BasisRepr) -> Self {
        Self {
            normal: Vec3::from(r.normal),
            up: Vec3::from(r.up),
            right: Vec3::from(r.right),
        }
    }
}

impl From<ViewBasis> for BasisRepr {
    fn from(b: ViewBasis) -> Self {
        Self {
            normal: b.normal.into(),
            up: b.up.into(),
            right: b.right.into(),
        }
    }
}

impl ViewBasis {
    /// Build a basis from a viewer direction and an approximate up vector.
    ///
    /// `up` is made perpendicular to `normal`; it must not be parallel to it.
    pub fn new(normal: Vec3, up: Vec3) -> Result<Self> {
        let tol = Tolerance::DEFAULT;
        if !normal.iter().chain(up.iter()).all(|c| c.is_finite()) {
            return Err(DraftError::InvalidDirection(
                "direction has non-finite components".into(),
            ));
        }
        if tol.is_zero(normal.norm()) || tol.is_zero(up.norm()) {
            return Err(DraftError::InvalidDirection("zero-length direction".into()));
        }
        let n = normal.normalize();
        let u = up.normalize();
        if tol.parallel(&n, &u) {
            return Err(DraftError::InvalidDirection(
                "up vector is parallel to the view normal".into(),
            ));
        }
        let u = (u - u.dot(&n) * n).normalize();
        Ok(Self {
            normal: n,
            up: u,
            right: u.cross(&n),
        })
    }

    /// The front view: seen from −Y with +Z up and +X to the right.
    pub fn front() -> Self {
        Self {
            normal: -Vec3::y(),
            up: Vec3::z(),
            right: Vec3::x(),
        }
    }

    /// Project a model point onto the view plane.
    #[inline]
    pub fn project(&self, p: &Point3) -> Point2D {
        Point2D::new(p.coords.dot(&self.right), p.coords.dot(&self.up))
    }

    /// Depth of a model point; larger is nearer the viewer.
    #[inline]
    pub fn depth(&self, p: &Point3) -> f64 {
        p.coords.dot(&self.normal)
    }

    /// Unit direction toward the viewer.
    pub fn toward_viewer(&self) -> Dir3 {
        Dir3::new_normalize(self.normal)
    }

    /// The basis of an orthographic secondary view placed in `slot`
    /// relative to this (primary) basis.
    ///
    /// Returns `None` for the primary slot and the axonometric corners.
    pub fn secondary(&self, slot: ViewSlot) -> Option<ViewBasis> {
        let (n, u, r) = (self.normal, self.up, self.right);
        let (normal, up, right) = match slot {
            ViewSlot::Top => (u, -n, r),
            ViewSlot::Bottom => (-u, n, r),
            ViewSlot::Right => (r, u, -n),
            ViewSlot::Left => (-r, u, n),
            ViewSlot::Rear => (-n, u, -r),
            _ => return None,
        };
        Some(ViewBasis { normal, up, right })
    }

    /// The orthographic slot whose view is seen from world direction `dir`.
    pub fn slot_for(&self, dir: &Vec3) -> Option<ViewSlot> {
        let d = dir.normalize();
        let close = |v: &Vec3| (d - v).norm() < 1e-9;
        if close(&self.normal) {
            Some(ViewSlot::Primary)
        } else if close(&self.up) {
            Some(ViewSlot::Top)
        } else if close(&-self.up) {
            Some(ViewSlot::Bottom)
        } else if close(&self.right) {
            Some(ViewSlot::Right)
        } else if close(&-self.right) {
            Some(ViewSlot::Left)
        } else if close(&-self.normal) {
            Some(ViewSlot::Rear)
        } else {
            None
        }
    }
}

/// Axonometric projection style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxonometricStyle {
    /// All three axes equally foreshortened.
    #[default]
    Isometric,
    /// Two axes equally foreshortened.
    Dimetric,
    /// All three axes foreshortened differently.
    Trimetric,
}

/// Parameters of an axonometric view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Axonometric {
    /// Projection style.
    pub style: AxonometricStyle,
    /// World axis drawn upward.
    pub up_axis: AxisDir,
    /// World axis pointing out of the page and to the right.
    pub right_axis: AxisDir,
    /// Vertical tilt in radians (dimetric and trimetric only).
    pub tilt: Option<f64>,
    /// Horizontal rotation in radians (trimetric only).
    pub trimetric_angle: Option<f64>,
    /// View from below while keeping `up_axis` drawn upward.
    pub flip: bool,
}

impl Default for Axonometric {
    fn default() -> Self {
        Self {
            style: AxonometricStyle::Isometric,
            up_axis: AxisDir::PosZ,
            right_axis: AxisDir::PosX,
            tilt: None,
            trimetric_angle: None,
            flip: false,
        }
    }
}

impl Axonometric {
    /// Standard isometric view with Z up.
    pub fn isometric() -> Self {
        Self::default()
    }

    /// `(tilt, horizontal angle)` in radians after applying style defaults.
    pub fn angles(&self) -> (f64, f64) {
        let quarter = std::f64::consts::FRAC_PI_4;
        let dimetric_tilt = (1.0f64 / 3.0).asin();
        let (theta, phi) = match self.style {
            AxonometricStyle::Isometric => ((1.0 / 3.0f64.sqrt()).asin(), quarter),
            AxonometricStyle::Dimetric => (self.tilt.unwrap_or(dimetric_tilt), quarter),
            AxonometricStyle::Trimetric => (
                self.tilt.unwrap_or(dimetric_tilt),
                self.trimetric_angle.unwrap_or(std::f64::consts::FRAC_PI_6),
            ),
        };
        if self.flip {
            (-theta, phi)
        } else {
            (theta, phi)
        }
    }

    /// Projection basis of this axonometric view.
    pub fn basis(&self) -> Result<ViewBasis> {
        let up = self.up_axis.vector();
        let right = self.right_axis.vector();
        if up.dot(&right).abs() > 1e-12 {
            return Err(DraftError::InvalidDirection(format!(
                "axonometric axes {:?} and {:?} are not perpendicular",
                self.up_axis, self.right_axis
            )));
        }
        let (theta, phi) = self.angles();
        let up_dir = Dir3::new_normalize(up);
        let horizontal = Rotation::from_axis_angle(&up_dir, -phi) * right;
        let normal = theta.sin() * up + theta.cos() * horizontal;
        ViewBasis::new(normal, up)
    }
}

/// How a caller names a view direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewSpec {
    /// Orthographic view along a world axis.
    Cardinal {
        /// Side of the model the viewer stands on.
        view_from: AxisDir,
        /// World axis drawn to the right.
        right: AxisDir,
    },
    /// Axonometric view.
    Axonometric(Axonometric),
    /// Projection onto a user-defined plane.
    Free {
        /// Plane normal, toward the viewer.
        normal: [f64; 3],
        /// Approximate up direction.
        up: [f64; 3],
    },
}

impl ViewSpec {
    /// The front view.
    pub fn front() -> Self {
        ViewSpec::Cardinal {
            view_from: AxisDir::NegY,
            right: AxisDir::PosX,
        }
    }

    /// Resolve the projection basis.
    pub fn basis(&self) -> Result<ViewBasis> {
        match self {
            ViewSpec::Cardinal { view_from, right } => {
                let n = view_from.vector();
                let r = right.vector();
                if n.dot(&r).abs() > 1e-12 {
                    return Err(DraftError::InvalidDirection(format!(
                        "right axis {right:?} is not perpendicular to view axis {view_from:?}"
                    )));
                }
                ViewBasis::new(n, n.cross(&r))
            }
            ViewSpec::Axonometric(axo) => axo.basis(),
            ViewSpec::Free { normal, up } => ViewBasis::new(Vec3::from(*normal), Vec3::from(*up)),
        }
    }
}

impl Default for ViewSpec {
    fn default() -> Self {
        Self::front()
    }
}

/// Drafting convention deciding where secondary views go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionConvention {
    /// Views placed on the side opposite the one they look at (top view below).
    FirstAngle,
    /// Views placed on the side they look at (top view above).
    #[default]
    ThirdAngle,
}

/// Position of a view in the drawing arrangement.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewSlot {
    Primary,
    Top,
    Bottom,
    Left,
    Right,
    Rear,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ViewSlot {
    /// The four axonometric corner slots.
    pub const CORNERS: [ViewSlot; 4] = [
        ViewSlot::TopLeft,
        ViewSlot::TopRight,
        ViewSlot::BottomLeft,
        ViewSlot::BottomRight,
    ];

    /// Whether this is an axonometric corner slot.
    pub fn is_corner(self) -> bool {
        Self::CORNERS.contains(&self)
    }

    /// Grid cell `(column, row)` under a convention; row +1 is above the primary.
    pub fn cell(self, convention: ProjectionConvention) -> (i32, i32) {
        let third_angle = match self {
            ViewSlot::Primary => (0, 0),
            ViewSlot::Top => (0, 1),
            ViewSlot::Bottom => (0, -1),
            ViewSlot::Right => (1, 0),
            ViewSlot::Left => (-1, 0),
            ViewSlot::Rear => (2, 0),
            ViewSlot::TopLeft => return (-1, 1),
            ViewSlot::TopRight => return (1, 1),
            ViewSlot::BottomLeft => return (-1, -1),
            ViewSlot::BottomRight => return (1, -1),
        };
        match convention {
            ProjectionConvention::ThirdAngle => third_angle,
            ProjectionConvention::FirstAngle => (-third_angle.0, -third_angle.1),
        }
    }
}
