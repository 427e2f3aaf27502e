//! Transition requests and the backend seam.
//!
//! This module provides:
//! - `TransitionRequest`: The `to` style and optional `from` style of a transition
//! - `TransitionBackend`: Anything that can animate an element between styles
//! - `ActiveTween`: Runtime state of one in-progress tween, used by
//!   [`TweenBackend`](crate::tween::TweenBackend)
//!
//! A backend must invoke the completion it is handed exactly once, after the
//! animation finishes, and never from inside `run`.

use std::fmt;
use std::rc::Rc;

use crate::easing::EasingFunction;
use crate::style::StyleMap;
use crate::surface::ElementId;

/// Callback run once when a transition finishes.
pub type Completion = Box<dyn FnOnce()>;

/// Identifies one transition started through an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(pub u64);

/// Styles a transition moves between.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionRequest {
    /// Starting style. When absent the backend starts from the element's
    /// current style.
    pub from: Option<StyleMap>,
    /// Final style.
    pub to: StyleMap,
}

impl TransitionRequest {
    pub fn to(to: StyleMap) -> Self {
        Self { from: None, to }
    }

    pub fn from_to(from: StyleMap, to: StyleMap) -> Self {
        Self {
            from: Some(from),
            to,
        }
    }
}

/// Animates elements between styles.
pub trait TransitionBackend {
    /// Start animating `element` to `to` over `duration_ms`.
    fn run(
        &self,
        element: ElementId,
        duration_ms: f32,
        from: Option<&StyleMap>,
        to: &StyleMap,
        on_complete: Completion,
    );
}

/// Backend shared between the items of one layout.
pub type SharedBackend = Rc<dyn TransitionBackend>;

/// Runtime state of a tween.
pub struct ActiveTween {
    /// Start order within the owning backend.
    pub seq: u64,
    pub element: ElementId,
    pub from: StyleMap,
    pub to: StyleMap,
    pub duration_ms: f32,
    pub elapsed_ms: f32,
    pub easing: EasingFunction,
    on_complete: Option<Completion>,
}

impl ActiveTween {
    pub fn new(
        seq: u64,
        element: ElementId,
        from: StyleMap,
        to: StyleMap,
        duration_ms: f32,
        easing: EasingFunction,
        on_complete: Completion,
    ) -> Self {
        Self {
            seq,
            element,
            from,
            to,
            duration_ms,
            elapsed_ms: 0.0,
            easing,
            on_complete: Some(on_complete),
        }
    }

    /// Linear progress from 0.0 to 1.0.
    pub fn progress(&self) -> f32 {
        if self.duration_ms > 0.0 {
            (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Style at the current eased progress.
    pub fn current_style(&self) -> StyleMap {
        if self.is_finished() {
            return self.to.clone();
        }
        StyleMap::interpolate(&self.from, &self.to, self.easing.evaluate(self.progress()))
    }

    /// Advance time. Returns `true` while the tween is still running.
    pub fn update(&mut self, delta_ms: f32) -> bool {
        self.elapsed_ms += delta_ms.max(0.0);
        !self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }

    /// Stop animating every property present in `style`.
    ///
    /// The tween keeps its clock and completion.
    pub fn release(&mut self, style: &StyleMap) {
        for (property, _) in style.iter() {
            self.from.remove(property);
            self.to.remove(property);
        }
    }

    /// Take the completion. Yields it at most once.
    pub fn take_completion(&mut self) -> Option<Completion> {
        self.on_complete.take()
    }
}

impl fmt::Debug for ActiveTween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveTween")
            .field("seq", &self.seq)
            .field("element", &self.element)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("duration_ms", &self.duration_ms)
            .field("elapsed_ms", &self.elapsed_ms)
            .field("easing", &self.easing)
            .field("pending_completion", &self.on_complete.is_some())
            .finish()
    }
}
