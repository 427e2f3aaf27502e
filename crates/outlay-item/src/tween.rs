//! Frame-driven tween backend.
//!
//! `TweenBackend` is a [`TransitionBackend`] that advances when the host calls
//! [`TweenBackend::tick`], typically once per frame:
//! - Every running tween writes its interpolated style to the surface, in
//!   start order, so the newest request wins for properties that overlap.
//! - Tweens that finish write their exact target style, then their
//!   completions run in finish order once all internal borrows are released.
//!
//! Starting a tween on an element that is already animating takes over the
//! properties it targets: older tweens on that element stop writing them for
//! good. The older tweens are not cancelled; they still complete, and their
//! completions still run.
//!
//! ```ignore
//! let backend = TweenBackend::new(surface.clone());
//! item.move_to(120.0, 0.0);
//! while !backend.is_idle() {
//!     backend.tick(16.0);
//! }
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{trace, warn};

use crate::easing::EasingFunction;
use crate::style::StyleMap;
use crate::surface::{ElementId, SharedSurface};
use crate::transition::{ActiveTween, Completion, TransitionBackend};

/// Upper bound on frames `settle` will run.
const MAX_SETTLE_FRAMES: usize = 100_000;

#[derive(Default)]
struct TweenState {
    /// Running tweens in start order.
    tweens: Vec<ActiveTween>,
    next_seq: u64,
    easing: EasingFunction,
}

/// Tween backend driven by an explicit frame clock.
///
/// Cloning yields another handle to the same set of tweens.
#[derive(Clone)]
pub struct TweenBackend {
    state: Rc<RefCell<TweenState>>,
    surface: SharedSurface,
}

impl TweenBackend {
    pub fn new(surface: SharedSurface) -> Self {
        Self {
            state: Rc::new(RefCell::new(TweenState::default())),
            surface,
        }
    }

    /// Use `easing` for tweens started from now on.
    pub fn with_easing(self, easing: EasingFunction) -> Self {
        self.state.borrow_mut().easing = easing;
        self
    }

    /// Number of running tweens.
    pub fn active_count(&self) -> usize {
        self.state.borrow().tweens.len()
    }

    /// Number of running tweens on one element.
    pub fn active_for(&self, element: ElementId) -> usize {
        self.state
            .borrow()
            .tweens
            .iter()
            .filter(|t| t.element == element)
            .count()
    }

    pub fn is_idle(&self) -> bool {
        self.state.borrow().tweens.is_empty()
    }

    /// Advance all tweens by `delta_ms`.
    ///
    /// Returns how many completions ran.
    pub fn tick(&self, delta_ms: f32) -> usize {
        let completions = self.advance(delta_ms);
        let count = completions.len();
        for on_complete in completions {
            on_complete();
        }
        count
    }

    fn advance(&self, delta_ms: f32) -> Vec<Completion> {
        let mut state = self.state.borrow_mut();
        if state.tweens.is_empty() {
            return Vec::new();
        }

        for tween in state.tweens.iter_mut() {
            tween.update(delta_ms);
        }

        {
            let mut surface = self.surface.borrow_mut();
            for tween in &state.tweens {
                surface.apply(tween.element, &tween.current_style());
            }
        }

        let (mut finished, running): (Vec<ActiveTween>, Vec<ActiveTween>) =
            state.tweens.drain(..).partition(ActiveTween::is_finished);
        state.tweens = running;

        // Larger overshoot means the tween ended earlier within this frame.
        finished.sort_by(|a, b| {
            let overshoot_a = a.elapsed_ms - a.duration_ms;
            let overshoot_b = b.elapsed_ms - b.duration_ms;
            overshoot_b.total_cmp(&overshoot_a).then(a.seq.cmp(&b.seq))
        });

        finished
            .iter_mut()
            .filter_map(|tween| {
                trace!(element = tween.element.0, seq = tween.seq, "tween finished");
                tween.take_completion()
            })
            .collect()
    }

    /// Tick in steps of `frame_ms` until no tweens remain.
    ///
    /// Completions may start new tweens; those are run to completion too.
    /// Returns how many completions ran.
    pub fn settle(&self, frame_ms: f32) -> usize {
        let frame_ms = if frame_ms > 0.0 { frame_ms } else { 16.0 };
        let mut completed = 0;
        for _ in 0..MAX_SETTLE_FRAMES {
            if self.is_idle() {
                return completed;
            }
            completed += self.tick(frame_ms);
        }
        warn!(active = self.active_count(), "tweens did not settle");
        completed
    }
}

impl TransitionBackend for TweenBackend {
    fn run(
        &self,
        element: ElementId,
        duration_ms: f32,
        from: Option<&StyleMap>,
        to: &StyleMap,
        on_complete: Completion,
    ) {
        let start = match from {
            Some(from) => {
                // fromTo renders the start state immediately.
                self.surface.borrow_mut().apply(element, from);
                from.clone()
            }
            None => self.surface.borrow().current_style(element),
        };

        let mut state = self.state.borrow_mut();
        for older in state.tweens.iter_mut().filter(|t| t.element == element) {
            older.release(to);
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        trace!(element = element.0, seq, duration_ms, "tween started");
        let easing = state.easing;
        state.tweens.push(ActiveTween::new(
            seq,
            element,
            start,
            to.clone(),
            duration_ms,
            easing,
            on_complete,
        ));
    }
}

impl fmt::Debug for TweenBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("TweenBackend")
            .field("tweens", &state.tweens)
            .field("easing", &state.easing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleProperty;
    use crate::surface::{ElementSize, SceneSurface, StyleApplier};

    fn setup() -> (Rc<RefCell<SceneSurface>>, TweenBackend, ElementId) {
        let surface = Rc::new(RefCell::new(SceneSurface::new()));
        let element = surface.borrow_mut().insert(ElementSize::new(10.0, 10.0));
        let shared: SharedSurface = surface.clone();
        let backend = TweenBackend::new(shared).with_easing(EasingFunction::Linear);
        (surface, backend, element)
    }

    fn record(log: &Rc<RefCell<Vec<u32>>>, tag: u32) -> Completion {
        let log = Rc::clone(log);
        Box::new(move || log.borrow_mut().push(tag))
    }

    #[test]
    fn test_interpolates_from_current_style() {
        let (surface, backend, element) = setup();
        surface
            .borrow_mut()
            .apply(element, &StyleMap::new().with(StyleProperty::X, 0.0));

        let log = Rc::new(RefCell::new(Vec::new()));
        backend.run(
            element,
            100.0,
            None,
            &StyleMap::new().with(StyleProperty::X, 100.0),
            record(&log, 1),
        );
        assert!(log.borrow().is_empty(), "run must not complete inline");

        assert_eq!(backend.tick(50.0), 0);
        assert_eq!(surface.borrow().rendered_translation(element).0, 50.0);

        assert_eq!(backend.tick(50.0), 1);
        assert_eq!(surface.borrow().rendered_translation(element).0, 100.0);
        assert_eq!(*log.borrow(), vec![1]);
        assert!(backend.is_idle());
    }

    #[test]
    fn test_from_style_rendered_immediately() {
        let (surface, backend, element) = setup();
        backend.run(
            element,
            100.0,
            Some(&StyleMap::new().with(StyleProperty::Opacity, 0.0)),
            &StyleMap::new().with(StyleProperty::Opacity, 1.0),
            Box::new(|| {}),
        );
        assert_eq!(
            surface.borrow().current_style(element).number(StyleProperty::Opacity),
            Some(0.0)
        );
    }

    #[test]
    fn test_superseded_tween_still_completes_in_finish_order() {
        let (surface, backend, element) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));

        backend.run(
            element,
            100.0,
            None,
            &StyleMap::new().with(StyleProperty::X, 100.0),
            record(&log, 1),
        );
        backend.tick(20.0);
        backend.run(
            element,
            30.0,
            None,
            &StyleMap::new().with(StyleProperty::X, 300.0),
            record(&log, 2),
        );
        assert_eq!(backend.active_for(element), 2);

        backend.tick(40.0);
        assert_eq!(*log.borrow(), vec![2]);
        assert_eq!(surface.borrow().rendered_translation(element).0, 300.0);

        // The older tween no longer owns `x`.
        backend.tick(10.0);
        assert_eq!(surface.borrow().rendered_translation(element).0, 300.0);
        backend.settle(10.0);
        assert_eq!(*log.borrow(), vec![2, 1]);
        assert_eq!(surface.borrow().rendered_translation(element).0, 300.0);
    }

    #[test]
    fn test_newer_tween_releases_only_overlapping_properties() {
        let (surface, backend, element) = setup();
        surface.borrow_mut().apply(
            element,
            &StyleMap::new()
                .with(StyleProperty::X, 0.0)
                .with(StyleProperty::Opacity, 0.0),
        );

        backend.run(
            element,
            100.0,
            None,
            &StyleMap::new()
                .with(StyleProperty::X, 100.0)
                .with(StyleProperty::Opacity, 1.0),
            Box::new(|| {}),
        );
        backend.run(
            element,
            10.0,
            None,
            &StyleMap::new().with(StyleProperty::X, 50.0),
            Box::new(|| {}),
        );
        backend.tick(50.0);

        let style = surface.borrow().current_style(element);
        assert_eq!(style.number(StyleProperty::X), Some(50.0));
        assert_eq!(style.number(StyleProperty::Opacity), Some(0.5));
    }

    #[test]
    fn test_other_elements_are_not_released() {
        let (surface, backend, element) = setup();
        let other = surface.borrow_mut().insert(ElementSize::new(10.0, 10.0));
        let to = StyleMap::new().with(StyleProperty::Y, 40.0);
        surface.borrow_mut().apply(other, &StyleMap::new().with(StyleProperty::Y, 0.0));

        backend.run(other, 40.0, None, &to, Box::new(|| {}));
        backend.run(element, 10.0, None, &to, Box::new(|| {}));
        backend.tick(20.0);

        assert_eq!(surface.borrow().rendered_translation(other).1, 20.0);
    }

    #[test]
    fn test_same_frame_completions_ordered_by_end_time() {
        let (_surface, backend, element) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        let to = StyleMap::new().with(StyleProperty::Opacity, 1.0);

        backend.run(element, 50.0, None, &to, record(&log, 1));
        backend.run(element, 30.0, None, &to, record(&log, 2));
        backend.run(element, 50.0, None, &to, record(&log, 3));

        assert_eq!(backend.tick(60.0), 3);
        assert_eq!(*log.borrow(), vec![2, 1, 3]);
    }

    #[test]
    fn test_completion_can_start_new_tween() {
        let (_surface, backend, element) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));

        let chained = backend.clone();
        let chained_log = Rc::clone(&log);
        backend.run(
            element,
            10.0,
            None,
            &StyleMap::new().with(StyleProperty::Y, 10.0),
            Box::new(move || {
                chained_log.borrow_mut().push(1);
                chained.run(
                    element,
                    10.0,
                    None,
                    &StyleMap::new().with(StyleProperty::Y, 20.0),
                    record(&chained_log, 2),
                );
            }),
        );

        assert_eq!(backend.settle(5.0), 2);
        assert_eq!(*log.borrow(), vec![1, 2]);
    }
}
