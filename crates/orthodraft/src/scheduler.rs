//! Parallel view computation with cancellation of superseded requests.
//!
//! Every slot carries a generation counter. Submitting a new request for a
//! slot bumps its generation and cancels the token of the running one;
//! results that come back with an old generation are dropped, so a stale
//! computation can never overwrite a newer view.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use orthodraft_raytrace::Bvh;
use orthodraft_topo::Shape;
use tracing::trace;

use crate::direction::{ProjectionConvention, ViewBasis, ViewSlot};
use crate::error::Result;
use crate::settings::DraftSettings;
use crate::types::View;
use crate::view::compute_view;

/// Cooperative cancellation flag shared with a running computation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the computation to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

type Message = (ViewSlot, u64, Result<View>);

/// Runs view computations on the rayon pool.
pub struct ViewScheduler {
    shape: Arc<Shape>,
    bvh: Arc<Bvh>,
    settings: Arc<DraftSettings>,
    tx: Sender<Message>,
    rx: Receiver<Message>,
    generations: HashMap<ViewSlot, u64>,
    tokens: HashMap<ViewSlot, CancelToken>,
    pending: usize,
}

impl ViewScheduler {
    /// Create a scheduler for one shape; the BVH is built here, once.
    pub fn new(shape: Arc<Shape>, settings: DraftSettings) -> Self {
        let bvh = Bvh::build(shape.clone()).with_boundary_tolerance(settings.boundary_tolerance);
        let bvh = Arc::new(bvh);
        let (tx, rx) = channel();
        Self {
            shape,
            bvh,
            settings: Arc::new(settings),
            tx,
            rx,
            generations: HashMap::new(),
            tokens: HashMap::new(),
            pending: 0,
        }
    }

    /// The shape being drawn.
    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    /// Settings every view is computed with.
    pub fn settings(&self) -> &DraftSettings {
        &self.settings
    }

    /// Start computing a view for `slot`, superseding any earlier request.
    ///
    /// Returns the generation of the new request.
    pub fn submit(&mut self, slot: ViewSlot, basis: ViewBasis, convention: ProjectionConvention) -> u64 {
        let generation = self.bump(slot);
        let token = CancelToken::new();
        self.tokens.insert(slot, token.clone());

        let shape = Arc::clone(&self.shape);
        let bvh = Arc::clone(&self.bvh);
        let settings = Arc::clone(&self.settings);
        let tx = self.tx.clone();
        self.pending += 1;
        rayon::spawn(move || {
            let result = compute_view(&shape, &bvh, basis, slot, convention, &settings, &token);
            // The receiver lives as long as the scheduler.
            let _ = tx.send((slot, generation, result));
        });
        trace!(?slot, generation, "submitted view");
        generation
    }

    /// Supersede whatever is running for `slot` without a replacement.
    pub fn cancel(&mut self, slot: ViewSlot) {
        self.bump(slot);
    }

    /// Current generation of a slot.
    pub fn generation(&self, slot: ViewSlot) -> u64 {
        self.generations.get(&slot).copied().unwrap_or(0)
    }

    /// Wait for every submitted request and return the current ones.
    ///
    /// Superseded results are discarded. The rest are ordered by slot.
    pub fn join(&mut self) -> Vec<(ViewSlot, Result<View>)> {
        let mut out = Vec::new();
        while self.pending > 0 {
            let Ok((slot, generation, result)) = self.rx.recv() else {
                break;
            };
            self.pending -= 1;
            if generation != self.generation(slot) {
                trace!(?slot, generation, "discarded stale view");
                continue;
            }
            self.tokens.remove(&slot);
            out.push((slot, result));
        }
        out.sort_by_key(|(slot, _)| *slot);
        out
    }

    fn bump(&mut self, slot: ViewSlot) -> u64 {
        if let Some(token) = self.tokens.remove(&slot) {
            token.cancel();
        }
        let generation = self.generations.entry(slot).or_insert(0);
        *generation += 1;
        *generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orthodraft_primitives::make_box;

    fn scheduler() -> ViewScheduler {
        ViewScheduler::new(
            Arc::new(make_box(10.0, 20.0, 30.0).unwrap()),
            DraftSettings::default(),
        )
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        let shared = token.clone();
        assert!(!shared.is_cancelled());
        token.cancel();
        assert!(shared.is_cancelled());
    }

    #[test]
    fn test_views_come_back_in_slot_order() {
        let mut s = scheduler();
        let front = ViewBasis::front();
        let convention = ProjectionConvention::ThirdAngle;
        for slot in [ViewSlot::Right, ViewSlot::Top, ViewSlot::Primary] {
            let basis = front.secondary(slot).unwrap_or(front);
            s.submit(slot, basis, convention);
        }
        let views = s.join();
        let slots: Vec<_> = views.iter().map(|(slot, _)| *slot).collect();
        assert_eq!(slots, vec![ViewSlot::Primary, ViewSlot::Top, ViewSlot::Right]);
        assert!(views.iter().all(|(_, r)| r.is_ok()));
    }

    #[test]
    fn test_resubmission_discards_stale_result() {
        let mut s = scheduler();
        let front = ViewBasis::front();
        let convention = ProjectionConvention::ThirdAngle;
        let first = s.submit(ViewSlot::Primary, front, convention);
        let top = front.secondary(ViewSlot::Top).unwrap();
        let second = s.submit(ViewSlot::Primary, top, convention);
        assert!(second > first);
        let views = s.join();
        assert_eq!(views.len(), 1);
        let view = views[0].1.as_ref().unwrap();
        assert_eq!(view.basis, top);
    }

    #[test]
    fn test_cancelled_slot_yields_nothing() {
        let mut s = scheduler();
        s.submit(ViewSlot::Right, ViewBasis::front(), ProjectionConvention::ThirdAngle);
        s.cancel(ViewSlot::Right);
        assert!(s.join().is_empty());
        assert_eq!(s.generation(ViewSlot::Right), 2);
        assert_eq!(s.generation(ViewSlot::Top), 0);
    }
}
