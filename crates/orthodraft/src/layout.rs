//! Page placement of computed views.
//!
//! Views sit on a grid of cells around the primary view. Cells in the
//! primary's column share its x origin and cells in its row share its y
//! origin, so features line up across views. Occupied columns and rows are
//! packed with exactly the requested spacing between them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::direction::{ProjectionConvention, ViewSlot};
use crate::error::{DraftError, Result};
use crate::settings::{LayoutParams, ScaleMode};
use crate::types::{BoundingBox2D, Point2D, View};

/// Standard drafting scale mantissas, largest first.
const NICE_SCALES: [f64; 4] = [5.0, 2.5, 2.0, 1.0];

/// Where one view lands on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Role of the view.
    pub slot: ViewSlot,
    /// Grid cell `(column, row)`, row +1 above the primary.
    pub cell: (i32, i32),
    /// Page position of the view's local origin.
    pub origin: Point2D,
    /// Page units per model unit.
    pub scale: f64,
    /// Page-space box of the view (y down).
    pub page_bounds: BoundingBox2D,
    /// Origin minus the primary view's origin.
    pub offset: Point2D,
}

impl Placement {
    /// Map a view-local point to page coordinates.
    pub fn to_page(&self, p: Point2D) -> Point2D {
        Point2D::new(
            self.origin.x + self.scale * p.x,
            self.origin.y - self.scale * p.y,
        )
    }
}

/// Problems a layout reports without failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutWarning {
    /// Page boxes of these views intersect.
    Overlap {
        /// Overlapping pairs in slot order.
        pairs: Vec<(ViewSlot, ViewSlot)>,
    },
    /// The spacing alone leaves no room in the page region; scale 1 is used.
    DoesNotFit {
        /// Width of the region.
        region_width: f64,
        /// Height of the region.
        region_height: f64,
    },
}

/// Placement of every view of a drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// One placement per view, in slot order.
    pub placements: Vec<Placement>,
    /// Page box around every view.
    pub bounds: BoundingBox2D,
    /// Scale applied to all views.
    pub scale: f64,
    /// Convention the cells were derived from.
    pub convention: ProjectionConvention,
    /// Non-fatal problems.
    pub warnings: Vec<LayoutWarning>,
}

impl Layout {
    /// Placement of a slot.
    pub fn placement(&self, slot: ViewSlot) -> Option<&Placement> {
        self.placements.iter().find(|p| p.slot == slot)
    }

    /// Whether any views overlap.
    pub fn has_overlap(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, LayoutWarning::Overlap { .. }))
    }
}

/// Extent of one grid column or row in model units.
#[derive(Debug, Clone, Copy)]
struct Band {
    lo: f64,
    hi: f64,
    size: f64,
}

impl Band {
    fn new() -> Self {
        Self {
            lo: f64::INFINITY,
            hi: f64::NEG_INFINITY,
            size: 0.0,
        }
    }

    fn add(&mut self, lo: f64, hi: f64, shared: bool) {
        if shared {
            self.lo = self.lo.min(lo);
            self.hi = self.hi.max(hi);
            self.size = self.hi - self.lo;
        } else {
            self.size = self.size.max(hi - lo);
        }
    }
}

/// Lay out views on the page.
///
/// Packed cells never overlap. Overlap is only reported when pinned
/// origins put two views on top of each other.
pub fn compute_layout(
    views: &[&View],
    convention: ProjectionConvention,
    params: &LayoutParams,
) -> Result<Layout> {
    params.validate()?;
    if !views.iter().any(|v| v.slot == ViewSlot::Primary) {
        return Err(DraftError::NoPrimaryView);
    }

    let items: Vec<(ViewSlot, (i32, i32), BoundingBox2D)> = views
        .iter()
        .map(|v| {
            let bounds = if v.bounds.is_valid() {
                v.bounds
            } else {
                BoundingBox2D::from_corners(Point2D::ORIGIN, Point2D::ORIGIN)
            };
            (v.slot, v.slot.cell(convention), bounds)
        })
        .collect();

    let mut columns: BTreeMap<i32, Band> = BTreeMap::new();
    let mut rows: BTreeMap<i32, Band> = BTreeMap::new();
    for &(_, (c, r), b) in &items {
        columns
            .entry(c)
            .or_insert_with(Band::new)
            .add(b.min_x, b.max_x, c == 0);
        rows.entry(r)
            .or_insert_with(Band::new)
            .add(b.min_y, b.max_y, r == 0);
    }

    let model_w: f64 = columns.values().map(|b| b.size).sum();
    let model_h: f64 = rows.values().map(|b| b.size).sum();
    let gap_w = params.spacing_x * (columns.len() - 1) as f64;
    let gap_h = params.spacing_y * (rows.len() - 1) as f64;

    let mut warnings = Vec::new();
    let scale = match params.scale {
        ScaleMode::Fixed(s) => s,
        ScaleMode::Auto => {
            let fit = |avail: f64, size: f64| {
                if size > 0.0 {
                    avail / size
                } else {
                    f64::INFINITY
                }
            };
            let s = fit(params.region.width - gap_w, model_w)
                .min(fit(params.region.height - gap_h, model_h));
            if !(s.is_finite() && s > 0.0) {
                warnings.push(LayoutWarning::DoesNotFit {
                    region_width: params.region.width,
                    region_height: params.region.height,
                });
                1.0
            } else if params.snap_scale {
                snap_scale(s)
            } else {
                s
            }
        }
    };

    let total_w = scale * model_w + gap_w;
    let total_h = scale * model_h + gap_h;
    let top_left = match params.scale {
        ScaleMode::Fixed(_) => params.top_left,
        ScaleMode::Auto => Point2D::new(
            params.region.origin.x + (params.region.width - total_w) / 2.0,
            params.region.origin.y + (params.region.height - total_h) / 2.0,
        ),
    };

    // Page position of each column's left edge and each row's top edge.
    let mut column_x = BTreeMap::new();
    let mut x = top_left.x;
    for (&c, band) in &columns {
        column_x.insert(c, x);
        x += scale * band.size + params.spacing_x;
    }
    let mut row_y = BTreeMap::new();
    let mut y = top_left.y;
    for (&r, band) in rows.iter().rev() {
        row_y.insert(r, y);
        y += scale * band.size + params.spacing_y;
    }

    let mut placements: Vec<Placement> = items
        .iter()
        .map(|&(slot, (c, r), b)| {
            let col = columns[&c];
            let row = rows[&r];
            let ox = match c {
                0 => column_x[&c] - scale * col.lo,
                c if c > 0 => column_x[&c] - scale * b.min_x,
                _ => column_x[&c] + scale * col.size - scale * b.max_x,
            };
            let oy = match r {
                0 => row_y[&r] + scale * row.hi,
                r if r > 0 => row_y[&r] + scale * row.size + scale * b.min_y,
                _ => row_y[&r] + scale * b.max_y,
            };
            let origin = params
                .pinned
                .iter()
                .find(|p| p.slot == slot)
                .map_or(Point2D::new(ox, oy), |p| p.origin);
            let page_bounds = BoundingBox2D::from_corners(
                Point2D::new(origin.x + scale * b.min_x, origin.y - scale * b.max_y),
                Point2D::new(origin.x + scale * b.max_x, origin.y - scale * b.min_y),
            );
            Placement {
                slot,
                cell: (c, r),
                origin,
                scale,
                page_bounds,
                offset: Point2D::ORIGIN,
            }
        })
        .collect();
    placements.sort_by_key(|p| p.slot);

    if let Some(primary) = placements
        .iter()
        .find(|p| p.slot == ViewSlot::Primary)
        .map(|p| p.origin)
    {
        for p in &mut placements {
            p.offset = Point2D::new(p.origin.x - primary.x, p.origin.y - primary.y);
        }
    }

    let mut pairs = Vec::new();
    for (i, a) in placements.iter().enumerate() {
        for b in &placements[i + 1..] {
            if a.page_bounds.overlap_area(&b.page_bounds) > 0.0 {
                pairs.push((a.slot, b.slot));
            }
        }
    }
    if !pairs.is_empty() {
        warnings.push(LayoutWarning::Overlap { pairs });
    }
    for w in &warnings {
        warn!(?w, "layout warning");
    }

    let mut bounds = BoundingBox2D::empty();
    for p in &placements {
        bounds.include_point(Point2D::new(p.page_bounds.min_x, p.page_bounds.min_y));
        bounds.include_point(Point2D::new(p.page_bounds.max_x, p.page_bounds.max_y));
    }

    Ok(Layout {
        placements,
        bounds,
        scale,
        convention,
        warnings,
    })
}

/// Round a scale down to `{1, 2, 2.5, 5} × 10^k`.
pub fn snap_scale(s: f64) -> f64 {
    if !(s.is_finite() && s > 0.0) {
        return s;
    }
    let decade = 10f64.powi(s.log10().floor() as i32);
    NICE_SCALES
        .iter()
        .map(|m| m * decade)
        .find(|&c| c <= s * (1.0 + 1e-12))
        .unwrap_or(decade)
}
