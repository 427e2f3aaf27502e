//! Rendered element access.
//!
//! Items never touch a rendering tree directly. They go through three seams:
//! - [`StyleApplier`]: write styles, read back the rendered translation
//! - [`SizeQuery`]: measure an element's box
//! - [`Surface`]: both of the above plus detaching elements
//!
//! [`SceneSurface`] is an in-memory retained implementation used by the demo
//! runner and by tests.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

use crate::style::{StyleMap, StyleProperty};

/// Opaque handle to a rendered element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl ElementId {
    /// Generate a new unique element ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

/// Measured box of an element.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementSize {
    pub width: f64,
    pub height: f64,
    pub padding_left: f64,
    pub padding_right: f64,
    pub padding_top: f64,
    pub padding_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
}

impl ElementSize {
    /// A box with no padding or margin.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin_left = margin;
        self.margin_right = margin;
        self.margin_top = margin;
        self.margin_bottom = margin;
        self
    }

    /// Width including margins.
    pub fn outer_width(&self) -> f64 {
        self.width + self.margin_left + self.margin_right
    }

    /// Height including margins.
    pub fn outer_height(&self) -> f64 {
        self.height + self.margin_top + self.margin_bottom
    }
}

/// Synchronous style application.
pub trait StyleApplier {
    /// Apply a style map to an element. Unset values clear properties.
    fn apply(&mut self, element: ElementId, style: &StyleMap);

    /// Current style of an element, as accumulated from applied maps.
    fn current_style(&self, element: ElementId) -> StyleMap;

    /// Rendered `(x, y)` translation of an element.
    ///
    /// Components that are missing or not numeric are reported as NaN.
    fn rendered_translation(&self, element: ElementId) -> (f64, f64) {
        let style = self.current_style(element);
        (
            style.number(StyleProperty::X).unwrap_or(f64::NAN),
            style.number(StyleProperty::Y).unwrap_or(f64::NAN),
        )
    }
}

/// Element measurement.
pub trait SizeQuery {
    fn measure(&self, element: ElementId) -> ElementSize;
}

/// The rendering tree an item's element lives in.
pub trait Surface: StyleApplier + SizeQuery {
    /// Detach an element from its parent.
    fn detach(&mut self, element: ElementId);

    fn is_attached(&self, element: ElementId) -> bool;
}

/// Surface shared between items and the transition backend.
pub type SharedSurface = Rc<RefCell<dyn Surface>>;

#[derive(Debug, Clone, Default)]
struct ElementRecord {
    style: StyleMap,
    size: ElementSize,
    attached: bool,
}

/// In-memory retained surface.
#[derive(Debug, Default)]
pub struct SceneSurface {
    elements: HashMap<ElementId, ElementRecord>,
    applied: usize,
}

impl SceneSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and attach a new element with the given size.
    pub fn insert(&mut self, size: ElementSize) -> ElementId {
        let id = ElementId::new();
        self.elements.insert(
            id,
            ElementRecord {
                size,
                attached: true,
                ..ElementRecord::default()
            },
        );
        id
    }

    pub fn set_size(&mut self, element: ElementId, size: ElementSize) {
        self.elements.entry(element).or_default().size = size;
    }

    /// Total number of `apply` calls seen.
    pub fn applied_count(&self) -> usize {
        self.applied
    }

    /// Number of attached elements.
    pub fn attached_count(&self) -> usize {
        self.elements.values().filter(|e| e.attached).count()
    }
}

impl StyleApplier for SceneSurface {
    fn apply(&mut self, element: ElementId, style: &StyleMap) {
        trace!(element = element.0, properties = style.len(), "apply style");
        self.applied += 1;
        self.elements.entry(element).or_default().style.apply(style);
    }

    fn current_style(&self, element: ElementId) -> StyleMap {
        self.elements
            .get(&element)
            .map(|e| e.style.clone())
            .unwrap_or_default()
    }
}

impl SizeQuery for SceneSurface {
    fn measure(&self, element: ElementId) -> ElementSize {
        self.elements
            .get(&element)
            .map(|e| e.size)
            .unwrap_or_default()
    }
}

impl Surface for SceneSurface {
    fn detach(&mut self, element: ElementId) {
        if let Some(record) = self.elements.get_mut(&element) {
            record.attached = false;
        }
    }

    fn is_attached(&self, element: ElementId) -> bool {
        self.elements.get(&element).is_some_and(|e| e.attached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleValue;

    #[test]
    fn test_rendered_translation() {
        let mut surface = SceneSurface::new();
        let id = surface.insert(ElementSize::new(10.0, 10.0));

        let (x, y) = surface.rendered_translation(id);
        assert!(x.is_nan() && y.is_nan());

        surface.apply(
            id,
            &StyleMap::new()
                .with(StyleProperty::X, 12.5)
                .with(StyleProperty::Y, "auto"),
        );
        let (x, y) = surface.rendered_translation(id);
        assert_eq!(x, 12.5);
        assert!(y.is_nan());
    }

    #[test]
    fn test_detach() {
        let mut surface = SceneSurface::new();
        let a = surface.insert(ElementSize::new(10.0, 10.0));
        let b = surface.insert(ElementSize::new(10.0, 10.0));
        assert_eq!(surface.attached_count(), 2);

        surface.detach(a);
        assert!(!surface.is_attached(a));
        assert!(surface.is_attached(b));
        assert_eq!(surface.attached_count(), 1);
    }

    #[test]
    fn test_measure_and_unset() {
        let mut surface = SceneSurface::new();
        let id = surface.insert(ElementSize::new(100.0, 50.0).with_margin(5.0));
        let size = surface.measure(id);
        assert_eq!(size.outer_width(), 110.0);
        assert_eq!(size.outer_height(), 60.0);

        surface.apply(id, &StyleMap::new().with(StyleProperty::Position, "absolute"));
        surface.apply(id, &StyleMap::new().with(StyleProperty::Position, StyleValue::unset()));
        assert!(surface.current_style(id).is_empty());
        assert_eq!(surface.applied_count(), 2);
    }
}
