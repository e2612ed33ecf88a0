//! Multi-view drawing composition.
//!
//! A [`ViewComposer`] owns one shape and moves through
//! `Unconfigured → PrimaryComputed → SecondariesComputed → LaidOut`.
//! Views are computed on the rayon pool through a [`ViewScheduler`]; the
//! layout step only places finished views and never touches their geometry.

use std::collections::BTreeMap;
use std::sync::Arc;

use orthodraft_topo::{Shape, ShapeStats};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::direction::{Axonometric, AxisDir, ProjectionConvention, ViewBasis, ViewSlot, ViewSpec};
use crate::error::{DraftError, Result};
use crate::layout::{compute_layout, Layout};
use crate::scheduler::ViewScheduler;
use crate::settings::{DraftSettings, LayoutParams};
use crate::types::View;

/// Lifecycle of a composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposerState {
    /// No primary view yet.
    Unconfigured,
    /// Only the primary view exists.
    PrimaryComputed,
    /// Secondary views exist but are not placed.
    SecondariesComputed,
    /// Every view has a page placement.
    LaidOut,
}

/// What happens when a secondary view targets an occupied slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The new view replaces the old one.
    #[default]
    Replace,
    /// The request fails with [`DraftError::DuplicateView`].
    Reject,
}

/// A request for a secondary view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SecondaryRequest {
    /// The orthographic view seen from a world axis.
    Cardinal {
        /// World side the viewer stands on.
        axis: AxisDir,
    },
    /// The orthographic view in a slot around the primary.
    Relative {
        /// Target slot.
        slot: ViewSlot,
    },
    /// An axonometric view in a corner slot.
    Axonometric {
        /// Corner slot.
        corner: ViewSlot,
        /// Projection parameters.
        #[serde(default)]
        params: Axonometric,
    },
}

impl SecondaryRequest {
    /// Slot and basis of the requested view relative to `primary`.
    pub fn resolve(&self, primary: &ViewBasis) -> Result<(ViewSlot, ViewBasis)> {
        match *self {
            SecondaryRequest::Cardinal { axis } => match primary.slot_for(&axis.vector()) {
                Some(ViewSlot::Primary) => Err(DraftError::InvalidDirection(format!(
                    "{axis:?} is the primary view direction"
                ))),
                Some(slot) => Ok((slot, orthographic(primary, slot)?)),
                None => Err(DraftError::InvalidDirection(format!(
                    "{axis:?} is not an orthographic direction of the primary view"
                ))),
            },
            SecondaryRequest::Relative { slot } => {
                if slot == ViewSlot::Primary || slot.is_corner() {
                    return Err(DraftError::InvalidDirection(format!(
                        "{slot:?} is not an orthographic secondary slot"
                    )));
                }
                Ok((slot, orthographic(primary, slot)?))
            }
            SecondaryRequest::Axonometric { corner, params } => {
                if !corner.is_corner() {
                    return Err(DraftError::InvalidDirection(format!(
                        "axonometric views go in corner slots, not {corner:?}"
                    )));
                }
                Ok((corner, params.basis()?))
            }
        }
    }
}

fn orthographic(primary: &ViewBasis, slot: ViewSlot) -> Result<ViewBasis> {
    primary
        .secondary(slot)
        .ok_or_else(|| DraftError::InvalidDirection(format!("{slot:?} has no orthographic basis")))
}

/// Everything a renderer needs: views with their placements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    /// Shape statistics.
    pub stats: ShapeStats,
    /// Views in slot order.
    pub views: Vec<View>,
    /// Placement, when the drawing was laid out.
    pub layout: Option<Layout>,
}

/// Builds a multi-view drawing of one shape.
pub struct ViewComposer {
    scheduler: ViewScheduler,
    convention: ProjectionConvention,
    policy: DuplicatePolicy,
    primary: Option<ViewBasis>,
    requests: BTreeMap<ViewSlot, SecondaryRequest>,
    views: BTreeMap<ViewSlot, View>,
    placement: Option<(LayoutParams, Layout)>,
    state: ComposerState,
}

impl ViewComposer {
    /// Create a composer for `shape`.
    pub fn new(shape: Arc<Shape>, settings: DraftSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            scheduler: ViewScheduler::new(shape, settings),
            convention: ProjectionConvention::default(),
            policy: DuplicatePolicy::default(),
            primary: None,
            requests: BTreeMap::new(),
            views: BTreeMap::new(),
            placement: None,
            state: ComposerState::Unconfigured,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ComposerState {
        self.state
    }

    /// Current projection convention.
    pub fn convention(&self) -> ProjectionConvention {
        self.convention
    }

    /// Current duplicate policy.
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Set how duplicate secondary requests are handled.
    pub fn set_duplicate_policy(&mut self, policy: DuplicatePolicy) {
        self.policy = policy;
    }

    /// Switch convention; only placement changes.
    ///
    /// A laid-out drawing is laid out again with the same parameters.
    pub fn set_convention(&mut self, convention: ProjectionConvention) -> Result<()> {
        self.convention = convention;
        for view in self.views.values_mut() {
            view.convention = convention;
        }
        if let Some((params, _)) = self.placement.take() {
            self.layout(&params)?;
        }
        Ok(())
    }

    /// Compute the primary view.
    ///
    /// Existing secondaries are recomputed against the new primary basis;
    /// those that no longer make sense are dropped.
    pub fn set_primary(&mut self, spec: &ViewSpec) -> Result<()> {
        let basis = spec.basis()?;

        let mut jobs = vec![(ViewSlot::Primary, basis)];
        let mut requests = BTreeMap::new();
        for request in self.requests.values() {
            match request.resolve(&basis) {
                Ok((slot, b)) => {
                    requests.insert(slot, *request);
                    jobs.retain(|(s, _)| *s != slot);
                    jobs.push((slot, b));
                }
                Err(e) => warn!(?request, error = %e, "dropping secondary view"),
            }
        }

        let views = self.compute(&jobs)?;
        self.primary = Some(basis);
        self.requests = requests;
        self.views = views;
        self.placement = None;
        self.state = if self.requests.is_empty() {
            ComposerState::PrimaryComputed
        } else {
            ComposerState::SecondariesComputed
        };
        Ok(())
    }

    /// Compute one secondary view; returns the slot it went to.
    pub fn add_secondary(&mut self, request: SecondaryRequest) -> Result<ViewSlot> {
        let slots = self.add_secondaries(&[request])?;
        slots
            .into_iter()
            .next()
            .ok_or_else(|| DraftError::InvalidDirection("no secondary view computed".into()))
    }

    /// Compute several secondary views in parallel.
    ///
    /// Requests are applied in order, so under [`DuplicatePolicy::Replace`]
    /// the last request for a slot wins.
    pub fn add_secondaries(&mut self, requests: &[SecondaryRequest]) -> Result<Vec<ViewSlot>> {
        let primary = self.primary.ok_or(DraftError::NoPrimaryView)?;

        let mut slots = Vec::with_capacity(requests.len());
        let mut resolved: Vec<(ViewSlot, ViewBasis, SecondaryRequest)> = Vec::new();
        for request in requests {
            let (slot, basis) = request.resolve(&primary)?;
            slots.push(slot);
            let taken = self.views.contains_key(&slot) || resolved.iter().any(|(s, ..)| *s == slot);
            if taken && self.policy == DuplicatePolicy::Reject {
                return Err(DraftError::DuplicateView(slot));
            }
            resolved.retain(|(s, ..)| *s != slot);
            resolved.push((slot, basis, *request));
        }

        let jobs: Vec<(ViewSlot, ViewBasis)> = resolved.iter().map(|(s, b, _)| (*s, *b)).collect();
        let views = self.compute(&jobs)?;
        for (slot, _, request) in &resolved {
            self.requests.insert(*slot, *request);
        }
        self.views.extend(views);
        self.placement = None;
        self.state = ComposerState::SecondariesComputed;
        Ok(slots)
    }

    /// Remove a secondary view.
    pub fn remove_secondary(&mut self, slot: ViewSlot) -> Result<()> {
        if slot == ViewSlot::Primary {
            return Err(DraftError::InvalidDirection(
                "the primary view cannot be removed".into(),
            ));
        }
        if self.views.remove(&slot).is_none() {
            return Err(DraftError::UnknownView(slot));
        }
        self.requests.remove(&slot);
        self.scheduler.cancel(slot);
        self.placement = None;
        self.state = if self.requests.is_empty() {
            ComposerState::PrimaryComputed
        } else {
            ComposerState::SecondariesComputed
        };
        Ok(())
    }

    /// Place every view on the page.
    ///
    /// Calling this again with the same parameters gives the same layout.
    pub fn layout(&mut self, params: &LayoutParams) -> Result<&Layout> {
        if self.primary.is_none() {
            return Err(DraftError::NoPrimaryView);
        }
        let views: Vec<&View> = self.views.values().collect();
        let layout = compute_layout(&views, self.convention, params)?;
        debug!(views = views.len(), scale = layout.scale, "laid out drawing");
        self.state = ComposerState::LaidOut;
        let (_, layout) = self.placement.insert((params.clone(), layout));
        Ok(layout)
    }

    /// The primary basis, once set.
    pub fn primary_basis(&self) -> Option<&ViewBasis> {
        self.primary.as_ref()
    }

    /// View in a slot.
    pub fn view(&self, slot: ViewSlot) -> Option<&View> {
        self.views.get(&slot)
    }

    /// All views in slot order.
    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.views.values()
    }

    /// Current layout, if laid out.
    pub fn current_layout(&self) -> Option<&Layout> {
        self.placement.as_ref().map(|(_, l)| l)
    }

    /// Snapshot of the drawing.
    pub fn drawing(&self) -> Drawing {
        Drawing {
            stats: self.scheduler.shape().stats(),
            views: self.views.values().cloned().collect(),
            layout: self.current_layout().cloned(),
        }
    }

    fn compute(&mut self, jobs: &[(ViewSlot, ViewBasis)]) -> Result<BTreeMap<ViewSlot, View>> {
        for &(slot, basis) in jobs {
            self.scheduler.submit(slot, basis, self.convention);
        }
        let mut out = BTreeMap::new();
        for (slot, result) in self.scheduler.join() {
            out.insert(slot, result?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orthodraft_primitives::make_box;

    fn composer() -> ViewComposer {
        let shape = Arc::new(make_box(10.0, 20.0, 30.0).unwrap());
        ViewComposer::new(shape, DraftSettings::default()).unwrap()
    }

    #[test]
    fn test_state_machine() {
        let mut c = composer();
        assert_eq!(c.state(), ComposerState::Unconfigured);
        assert!(matches!(
            c.add_secondary(SecondaryRequest::Cardinal { axis: AxisDir::PosZ }),
            Err(DraftError::NoPrimaryView)
        ));
        assert!(matches!(
            c.layout(&LayoutParams::default()),
            Err(DraftError::NoPrimaryView)
        ));

        c.set_primary(&ViewSpec::front()).unwrap();
        assert_eq!(c.state(), ComposerState::PrimaryComputed);

        let slot = c
            .add_secondary(SecondaryRequest::Cardinal { axis: AxisDir::PosZ })
            .unwrap();
        assert_eq!(slot, ViewSlot::Top);
        assert_eq!(c.state(), ComposerState::SecondariesComputed);

        c.layout(&LayoutParams::default()).unwrap();
        assert_eq!(c.state(), ComposerState::LaidOut);

        c.remove_secondary(ViewSlot::Top).unwrap();
        assert_eq!(c.state(), ComposerState::PrimaryComputed);
        assert!(c.current_layout().is_none());
    }

    #[test]
    fn test_cardinal_slots() {
        let mut c = composer();
        c.set_primary(&ViewSpec::front()).unwrap();
        let slots = c
            .add_secondaries(&[
                SecondaryRequest::Cardinal { axis: AxisDir::PosX },
                SecondaryRequest::Cardinal { axis: AxisDir::NegX },
                SecondaryRequest::Cardinal { axis: AxisDir::NegZ },
                SecondaryRequest::Cardinal { axis: AxisDir::PosY },
            ])
            .unwrap();
        assert_eq!(
            slots,
            vec![ViewSlot::Right, ViewSlot::Left, ViewSlot::Bottom, ViewSlot::Rear]
        );
        assert!(matches!(
            c.add_secondary(SecondaryRequest::Cardinal { axis: AxisDir::NegY }),
            Err(DraftError::InvalidDirection(_))
        ));
    }

    #[test]
    fn test_invalid_requests() {
        let mut c = composer();
        c.set_primary(&ViewSpec::front()).unwrap();
        for request in [
            SecondaryRequest::Relative { slot: ViewSlot::Primary },
            SecondaryRequest::Relative { slot: ViewSlot::TopLeft },
            SecondaryRequest::Axonometric {
                corner: ViewSlot::Top,
                params: Axonometric::isometric(),
            },
        ] {
            assert!(matches!(
                c.add_secondary(request),
                Err(DraftError::InvalidDirection(_))
            ));
        }
        assert!(matches!(
            c.remove_secondary(ViewSlot::Right),
            Err(DraftError::UnknownView(ViewSlot::Right))
        ));
    }

    #[test]
    fn test_axonometric_corner() {
        let mut c = composer();
        c.set_primary(&ViewSpec::front()).unwrap();
        let slot = c
            .add_secondary(SecondaryRequest::Axonometric {
                corner: ViewSlot::TopRight,
                params: Axonometric::isometric(),
            })
            .unwrap();
        assert_eq!(slot, ViewSlot::TopRight);
        let view = c.view(slot).unwrap();
        // Seen from a corner, all twelve cube edges are drawn.
        assert_eq!(view.edges.len(), 12);
    }

    #[test]
    fn test_new_primary_recomputes_secondaries() {
        let mut c = composer();
        c.set_primary(&ViewSpec::front()).unwrap();
        c.add_secondary(SecondaryRequest::Relative { slot: ViewSlot::Right })
            .unwrap();
        let before = c.view(ViewSlot::Right).unwrap().bounds;

        c.set_primary(&ViewSpec::Cardinal {
            view_from: AxisDir::PosX,
            right: AxisDir::PosY,
        })
        .unwrap();
        let after = c.view(ViewSlot::Right).unwrap();
        assert_eq!(c.state(), ComposerState::SecondariesComputed);
        assert_ne!(after.bounds, before);
        assert_eq!(
            Some(after.basis),
            c.primary_basis().and_then(|b| b.secondary(ViewSlot::Right))
        );
    }

    #[test]
    fn test_drawing_snapshot() {
        let mut c = composer();
        c.set_primary(&ViewSpec::front()).unwrap();
        c.layout(&LayoutParams::default()).unwrap();
        let drawing = c.drawing();
        assert_eq!(drawing.stats.faces, 6);
        assert_eq!(drawing.views.len(), 1);
        assert!(drawing.layout.is_some());
    }
}
