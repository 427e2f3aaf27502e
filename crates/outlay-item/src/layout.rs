//! The owning layout, as seen from an item.
//!
//! Items hold a weak reference to a [`LayoutHost`] and only ever read its
//! options and padding. Placement itself belongs to the layout engine.

use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};

use crate::style::{StyleMap, StyleProperty};

/// Options an item reads from its layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Coordinates grow from the left edge (otherwise from the right).
    pub origin_left: bool,
    /// Coordinates grow from the top edge (otherwise from the bottom).
    pub origin_top: bool,
    /// Transition duration in milliseconds. Zero, negative or NaN disables
    /// animation and selects the synchronous path.
    pub transition_duration_ms: f32,
    /// Style an item transitions to when revealed.
    pub visible_style: StyleMap,
    /// Style an item transitions to when hidden.
    pub hidden_style: StyleMap,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            origin_left: true,
            origin_top: true,
            transition_duration_ms: 400.0,
            visible_style: StyleMap::new()
                .with(StyleProperty::Opacity, 1.0)
                .with(StyleProperty::Scale, 1.0),
            hidden_style: StyleMap::new()
                .with(StyleProperty::Opacity, 0.0)
                .with(StyleProperty::Scale, 0.001),
        }
    }
}

impl LayoutOptions {
    /// The configured duration, if animation is enabled.
    pub fn transition_duration(&self) -> Option<f32> {
        let duration = self.transition_duration_ms;
        (duration.is_finite() && duration > 0.0).then_some(duration)
    }

    pub fn with_transition_duration(mut self, duration_ms: f32) -> Self {
        self.transition_duration_ms = duration_ms;
        self
    }

    pub fn with_origin(mut self, origin_left: bool, origin_top: bool) -> Self {
        self.origin_left = origin_left;
        self.origin_top = origin_top;
        self
    }
}

/// Padding of the layout container.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutSize {
    pub padding_left: f64,
    pub padding_right: f64,
    pub padding_top: f64,
    pub padding_bottom: f64,
}

impl LayoutSize {
    pub fn uniform(padding: f64) -> Self {
        Self {
            padding_left: padding,
            padding_right: padding,
            padding_top: padding,
            padding_bottom: padding,
        }
    }

    /// Horizontal and vertical padding on the origin sides.
    pub fn origin_offset(&self, options: &LayoutOptions) -> (f64, f64) {
        let x = if options.origin_left {
            self.padding_left
        } else {
            self.padding_right
        };
        let y = if options.origin_top {
            self.padding_top
        } else {
            self.padding_bottom
        };
        (x, y)
    }
}

/// Read-only view of the layout that owns an item.
///
/// Items query the duration and origin offset on every move, so hosts that
/// can answer those without cloning their options should override them.
pub trait LayoutHost {
    fn options(&self) -> LayoutOptions;
    fn size(&self) -> LayoutSize;

    fn transition_duration(&self) -> Option<f32> {
        self.options().transition_duration()
    }

    /// Padding on the origin sides.
    fn origin_offset(&self) -> (f64, f64) {
        self.size().origin_offset(&self.options())
    }
}

/// A layout host backed by interior mutability, for layouts driven from a
/// single thread.
#[derive(Debug, Default)]
pub struct SharedLayout {
    options: RefCell<LayoutOptions>,
    size: Cell<LayoutSize>,
}

impl SharedLayout {
    pub fn new(options: LayoutOptions, size: LayoutSize) -> Self {
        Self {
            options: RefCell::new(options),
            size: Cell::new(size),
        }
    }

    pub fn set_options(&self, options: LayoutOptions) {
        *self.options.borrow_mut() = options;
    }

    pub fn set_transition_duration(&self, duration_ms: f32) {
        self.options.borrow_mut().transition_duration_ms = duration_ms;
    }

    pub fn set_size(&self, size: LayoutSize) {
        self.size.set(size);
    }
}

impl LayoutHost for SharedLayout {
    fn options(&self) -> LayoutOptions {
        self.options.borrow().clone()
    }

    fn size(&self) -> LayoutSize {
        self.size.get()
    }

    fn transition_duration(&self) -> Option<f32> {
        self.options.borrow().transition_duration()
    }

    fn origin_offset(&self) -> (f64, f64) {
        self.size.get().origin_offset(&self.options.borrow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = LayoutOptions::default();
        assert!(options.origin_left);
        assert!(options.origin_top);
        assert_eq!(options.transition_duration(), Some(400.0));
        assert_eq!(options.hidden_style.number(StyleProperty::Opacity), Some(0.0));
        assert_eq!(options.visible_style.number(StyleProperty::Opacity), Some(1.0));
    }

    #[test]
    fn test_disabled_durations() {
        for duration in [0.0, -10.0, f32::NAN, f32::INFINITY] {
            let options = LayoutOptions::default().with_transition_duration(duration);
            assert_eq!(options.transition_duration(), None, "{duration}");
        }
    }

    #[test]
    fn test_origin_offset() {
        let size = LayoutSize {
            padding_left: 1.0,
            padding_right: 2.0,
            padding_top: 3.0,
            padding_bottom: 4.0,
        };
        let options = LayoutOptions::default();
        assert_eq!(size.origin_offset(&options), (1.0, 3.0));
        assert_eq!(size.origin_offset(&options.with_origin(false, false)), (2.0, 4.0));
    }

    #[test]
    fn test_shared_layout_updates() {
        let layout = SharedLayout::new(LayoutOptions::default(), LayoutSize::default());
        layout.set_transition_duration(0.0);
        layout.set_size(LayoutSize::uniform(8.0));
        assert_eq!(layout.options().transition_duration(), None);
        assert_eq!(layout.size().padding_bottom, 8.0);
    }

    #[test]
    fn test_shared_layout_cheap_queries_match_options() {
        let size = LayoutSize {
            padding_left: 1.0,
            padding_right: 2.0,
            padding_top: 3.0,
            padding_bottom: 4.0,
        };
        let layout = SharedLayout::new(LayoutOptions::default().with_origin(false, true), size);
        assert_eq!(layout.origin_offset(), size.origin_offset(&layout.options()));
        assert_eq!(layout.origin_offset(), (2.0, 3.0));
        assert_eq!(layout.transition_duration(), Some(400.0));

        layout.set_transition_duration(-1.0);
        assert_eq!(layout.transition_duration(), None);
    }
}
