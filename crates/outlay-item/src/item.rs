//! A positioned, animatable element owned by a grid layout.
//!
//! An [`Item`] tracks the logical grid position of one element and reconciles
//! it with the element's rendered translation. Moves, reveals, hides and
//! removals are expressed as transitions handed to a [`TransitionBackend`];
//! logical state is only updated once the backend reports completion.
//!
//! # States
//!
//! ```text
//! idle ──move_to/reveal──▶ transitioning ──completion──▶ idle
//!   │                                                     ▲
//!   └──hide──▶ hidden + transitioning ──completion──▶ hidden
//!                  │
//!                  └──reveal (before completion)──▶ transitioning
//! ```
//!
//! A completing hide re-checks the hidden flag before suppressing display,
//! so a reveal issued mid-hide always wins.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::events::{EventEmitter, ItemEvent, Listen, ListenerId};
use crate::layout::{LayoutHost, LayoutOptions};
use crate::style::{StyleMap, StyleProperty, StyleValue};
use crate::surface::{ElementId, ElementSize, SharedSurface};
use crate::transition::{Completion, SharedBackend, TransitionId, TransitionRequest};

/// Perspective applied when an item settles.
const SETTLED_PERSPECTIVE: f64 = 600.0;

/// Properties cleared by [`Item::destroy`].
const POSITIONING_PROPERTIES: [StyleProperty; 12] = [
    StyleProperty::Position,
    StyleProperty::Left,
    StyleProperty::Right,
    StyleProperty::Top,
    StyleProperty::Bottom,
    StyleProperty::Transition,
    StyleProperty::Transform,
    StyleProperty::X,
    StyleProperty::Y,
    StyleProperty::Z,
    StyleProperty::TransformPerspective,
    StyleProperty::Force3d,
];

/// Truncate a coordinate toward zero. NaN and infinities become 0.
pub fn truncate_coordinate(value: f64) -> i32 {
    if value.is_finite() {
        value.trunc() as i32
    } else {
        0
    }
}

/// Logical grid position, independent of padding and origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Position from raw coordinates, truncated.
    pub fn truncated(x: f64, y: f64) -> Self {
        Self::new(truncate_coordinate(x), truncate_coordinate(y))
    }
}

/// Collaborators shared by the items of one layout.
#[derive(Clone)]
pub struct ItemContext {
    pub layout: Weak<dyn LayoutHost>,
    pub surface: SharedSurface,
    pub backend: SharedBackend,
}

impl ItemContext {
    pub fn new<L>(layout: &Rc<L>, surface: SharedSurface, backend: SharedBackend) -> Self
    where
        L: LayoutHost + 'static,
    {
        let weak: Weak<L> = Rc::downgrade(layout);
        let layout: Weak<dyn LayoutHost> = weak;
        Self {
            layout,
            surface,
            backend,
        }
    }
}

struct ItemInner {
    element: ElementId,
    layout: Weak<dyn LayoutHost>,
    surface: SharedSurface,
    backend: SharedBackend,
    position: Cell<GridPosition>,
    size: Cell<Option<ElementSize>>,
    hidden: Cell<bool>,
    removed: Cell<bool>,
    /// Backend transitions started and not yet completed.
    in_flight: Cell<u32>,
    next_transition: Cell<u64>,
    /// Transition whose completion is currently running.
    finishing: Cell<Option<TransitionId>>,
    events: EventEmitter<ItemEvent, Item>,
}

/// Handle to one laid-out element.
///
/// Cloning yields another handle to the same item.
#[derive(Clone)]
pub struct Item {
    inner: Rc<ItemInner>,
}

impl Item {
    /// Adopt `element` and position it absolutely.
    pub fn new(element: ElementId, context: &ItemContext) -> Self {
        let item = Self {
            inner: Rc::new(ItemInner {
                element,
                layout: context.layout.clone(),
                surface: Rc::clone(&context.surface),
                backend: Rc::clone(&context.backend),
                position: Cell::new(GridPosition::default()),
                size: Cell::new(None),
                hidden: Cell::new(false),
                removed: Cell::new(false),
                in_flight: Cell::new(0),
                next_transition: Cell::new(1),
                finishing: Cell::new(None),
                events: EventEmitter::new(),
            }),
        };
        item.css(&StyleMap::new().with(StyleProperty::Position, "absolute"));
        debug!(element = element.0, "item created");
        item
    }

    /// Adopt an element that may be missing. Yields no item in that case.
    pub fn adopt(element: Option<ElementId>, context: &ItemContext) -> Option<Self> {
        element.map(|element| Self::new(element, context))
    }

    pub fn element(&self) -> ElementId {
        self.inner.element
    }

    /// Last recorded logical position.
    pub fn position(&self) -> GridPosition {
        self.inner.position.get()
    }

    pub fn is_hidden(&self) -> bool {
        self.inner.hidden.get()
    }

    /// Whether a backend transition for this item is in flight.
    pub fn is_transitioning(&self) -> bool {
        self.inner.in_flight.get() > 0
    }

    /// Whether the element has been detached through this item.
    pub fn is_removed(&self) -> bool {
        self.inner.removed.get()
    }

    /// Size recorded by the last [`Item::get_size`].
    pub fn size(&self) -> Option<ElementSize> {
        self.inner.size.get()
    }

    /// The transition whose completion is being reported, if any.
    ///
    /// Set while `transitionEnd` listeners run.
    pub fn finishing_transition(&self) -> Option<TransitionId> {
        self.inner.finishing.get()
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn on(&self, event: ItemEvent, handler: impl Fn(&Item) -> Listen + 'static) -> ListenerId {
        self.inner.events.on(event, handler)
    }

    pub fn once(&self, event: ItemEvent, handler: impl Fn(&Item) + 'static) -> ListenerId {
        self.inner.events.once(event, handler)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.inner.events.off(id)
    }

    /// Emit `event` with this item as payload.
    pub fn emit(&self, event: ItemEvent) -> usize {
        trace!(element = self.inner.element.0, event = event.name(), "emit");
        self.inner.events.emit(event, self)
    }

    // ------------------------------------------------------------------
    // Measurement and styling
    // ------------------------------------------------------------------

    fn layout(&self) -> Option<Rc<dyn LayoutHost>> {
        let layout = self.inner.layout.upgrade();
        if layout.is_none() {
            warn!(element = self.inner.element.0, "layout dropped, using defaults");
        }
        layout
    }

    fn options(&self) -> LayoutOptions {
        self.layout().map(|layout| layout.options()).unwrap_or_default()
    }

    fn transition_duration(&self) -> Option<f32> {
        match self.layout() {
            Some(layout) => layout.transition_duration(),
            None => LayoutOptions::default().transition_duration(),
        }
    }

    fn origin_offset(&self) -> (f64, f64) {
        self.layout()
            .map(|layout| layout.origin_offset())
            .unwrap_or_default()
    }

    /// Measure the element and record the result.
    pub fn get_size(&self) -> ElementSize {
        let size = self.inner.surface.borrow().measure(self.inner.element);
        self.inner.size.set(Some(size));
        size
    }

    /// Apply styles immediately.
    pub fn css(&self, style: &StyleMap) {
        self.inner
            .surface
            .borrow_mut()
            .apply(self.inner.element, style);
    }

    // ------------------------------------------------------------------
    // Position
    // ------------------------------------------------------------------

    /// Read the logical position back from the rendered translation.
    pub fn get_position(&self) -> GridPosition {
        let (x, y) = self
            .inner
            .surface
            .borrow()
            .rendered_translation(self.inner.element);
        let x = if x.is_finite() { x } else { 0.0 };
        let y = if y.is_finite() { y } else { 0.0 };

        let (pad_x, pad_y) = self.origin_offset();
        let position = GridPosition::truncated(x - pad_x, y - pad_y);
        self.inner.position.set(position);
        position
    }

    /// Pin the element exactly at its logical position and emit `layout`.
    pub fn layout_position(&self) {
        let (pad_x, pad_y) = self.origin_offset();
        let position = self.position();

        let style = StyleMap::new()
            .with(StyleProperty::X, pad_x + f64::from(position.x))
            .with(StyleProperty::Y, pad_y + f64::from(position.y))
            .with(StyleProperty::Z, 0.0)
            .with(StyleProperty::TransformPerspective, SETTLED_PERSPECTIVE);
        self.css(&style);
        self.emit(ItemEvent::Layout);
    }

    /// Record a logical position without touching the element.
    pub fn set_position(&self, x: f64, y: f64) {
        self.inner.position.set(GridPosition::truncated(x, y));
    }

    /// Jump to a position without animating.
    pub fn go_to(&self, x: f64, y: f64) {
        self.set_position(x, y);
        self.layout_position();
    }

    /// Move to a position, animating if the element actually has to move.
    pub fn move_to(&self, x: f64, y: f64) {
        let current = self.get_position();
        let target = GridPosition::truncated(x, y);

        if target == current && !self.is_transitioning() {
            trace!(element = self.inner.element.0, ?target, "already in place");
            self.layout_position();
            return;
        }

        debug!(element = self.inner.element.0, from = ?current, to = ?target, "move");
        let to = StyleMap::new()
            .with(StyleProperty::X, target.x)
            .with(StyleProperty::Y, target.y)
            .with(StyleProperty::Force3d, true);
        self.transition(TransitionRequest::to(to), move |item| {
            item.inner.position.set(target);
            item.layout_position();
            item.emit(ItemEvent::TransitionEnd);
        });
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    fn allocate_transition_id(&self) -> TransitionId {
        let id = self.inner.next_transition.get();
        self.inner.next_transition.set(id + 1);
        TransitionId(id)
    }

    /// Transition the element, then run `on_complete` exactly once.
    ///
    /// Without a configured duration the `to` style is applied and
    /// `on_complete` runs before this returns.
    pub fn transition(
        &self,
        request: TransitionRequest,
        on_complete: impl FnOnce(&Item) + 'static,
    ) -> TransitionId {
        let id = self.allocate_transition_id();
        self.start_transition(id, request, Box::new(on_complete));
        id
    }

    fn start_transition(
        &self,
        id: TransitionId,
        request: TransitionRequest,
        on_complete: Box<dyn FnOnce(&Item)>,
    ) {
        let Some(duration_ms) = self.transition_duration() else {
            self.non_transition(id, &request.to, on_complete);
            return;
        };

        self.inner.in_flight.set(self.inner.in_flight.get() + 1);
        let item = self.clone();
        let completion: Completion = Box::new(move || {
            let remaining = item.inner.in_flight.get().saturating_sub(1);
            item.inner.in_flight.set(remaining);
            item.finish(id, on_complete);
        });
        self.inner.backend.run(
            self.inner.element,
            duration_ms,
            request.from.as_ref(),
            &request.to,
            completion,
        );
    }

    fn non_transition(&self, id: TransitionId, to: &StyleMap, on_complete: Box<dyn FnOnce(&Item)>) {
        self.css(to);
        self.finish(id, on_complete);
    }

    fn finish(&self, id: TransitionId, on_complete: Box<dyn FnOnce(&Item)>) {
        let previous = self.inner.finishing.replace(Some(id));
        on_complete(self);
        self.inner.finishing.set(previous);
    }

    // ------------------------------------------------------------------
    // Show, hide, remove
    // ------------------------------------------------------------------

    /// Transition from the hidden style to the visible style.
    pub fn reveal(&self) {
        self.inner.hidden.set(false);
        self.css(&StyleMap::new().with(StyleProperty::Display, StyleValue::unset()));

        let options = self.options();
        self.transition(
            TransitionRequest::from_to(options.hidden_style, options.visible_style),
            |item| {
                item.emit(ItemEvent::TransitionEnd);
            },
        );
    }

    /// Transition from the visible style to the hidden style, then stop
    /// displaying the element unless it was revealed in the meantime.
    pub fn hide(&self) {
        let id = self.allocate_transition_id();
        self.start_hide(id);
    }

    fn start_hide(&self, id: TransitionId) {
        self.inner.hidden.set(true);
        self.css(&StyleMap::new().with(StyleProperty::Display, StyleValue::unset()));

        let options = self.options();
        self.start_transition(
            id,
            TransitionRequest::from_to(options.visible_style, options.hidden_style),
            Box::new(|item: &Item| {
                if item.is_hidden() {
                    item.css(&StyleMap::new().with(StyleProperty::Display, "none"));
                }
                item.emit(ItemEvent::TransitionEnd);
            }),
        );
    }

    /// Detach the element and emit `remove`. Only the first call has an effect.
    pub fn remove_element(&self) {
        if self.inner.removed.replace(true) {
            return;
        }
        self.inner.surface.borrow_mut().detach(self.inner.element);
        debug!(element = self.inner.element.0, "item removed");
        self.emit(ItemEvent::Remove);
    }

    /// Hide the element, then detach it.
    ///
    /// Without a configured duration the element is detached immediately.
    /// Otherwise detachment waits for the `transitionEnd` of this hide;
    /// completions of other transitions in flight do not trigger it.
    pub fn remove(&self) {
        if self.transition_duration().is_none() {
            self.remove_element();
            return;
        }

        let hide_id = self.allocate_transition_id();
        self.on(ItemEvent::TransitionEnd, move |item| {
            if item.finishing_transition() == Some(hide_id) {
                item.remove_element();
                Listen::Remove
            } else {
                Listen::Keep
            }
        });
        self.start_hide(hide_id);
    }

    /// Clear positioning and transition styles.
    pub fn destroy(&self) {
        let style: StyleMap = POSITIONING_PROPERTIES
            .iter()
            .map(|property| (*property, StyleValue::unset()))
            .collect();
        self.css(&style);
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("element", &self.inner.element)
            .field("position", &self.inner.position.get())
            .field("hidden", &self.inner.hidden.get())
            .field("in_flight", &self.inner.in_flight.get())
            .field("removed", &self.inner.removed.get())
            .finish()
    }
}
