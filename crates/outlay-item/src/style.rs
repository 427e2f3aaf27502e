//! Style values applied to rendered elements.
//!
//! This module defines the style vocabulary shared by items, surfaces and
//! transition backends:
//! - `StyleProperty`: The properties an item and its presets touch
//! - `StyleValue`: A numeric, boolean or keyword value
//! - `StyleMap`: An ordered property → value map with interpolation support
//!
//! An empty keyword is the "unset" value (CSS `''`): applying it removes the
//! property from the element.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A style property understood by the item layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StyleProperty {
    /// Horizontal translation in pixels.
    #[serde(rename = "x")]
    X,
    /// Vertical translation in pixels.
    #[serde(rename = "y")]
    Y,
    /// Depth translation in pixels.
    #[serde(rename = "z")]
    Z,
    /// Perspective distance used when composing the 3D transform.
    #[serde(rename = "transformPerspective")]
    TransformPerspective,
    /// Force GPU compositing of the transform.
    #[serde(rename = "force3D")]
    Force3d,
    #[serde(rename = "opacity")]
    Opacity,
    #[serde(rename = "scale")]
    Scale,
    #[serde(rename = "display")]
    Display,
    #[serde(rename = "position")]
    Position,
    #[serde(rename = "left")]
    Left,
    #[serde(rename = "right")]
    Right,
    #[serde(rename = "top")]
    Top,
    #[serde(rename = "bottom")]
    Bottom,
    #[serde(rename = "transition")]
    Transition,
    #[serde(rename = "transform")]
    Transform,
}

impl StyleProperty {
    /// All known properties, in declaration order.
    pub const ALL: [StyleProperty; 15] = [
        Self::X,
        Self::Y,
        Self::Z,
        Self::TransformPerspective,
        Self::Force3d,
        Self::Opacity,
        Self::Scale,
        Self::Display,
        Self::Position,
        Self::Left,
        Self::Right,
        Self::Top,
        Self::Bottom,
        Self::Transition,
        Self::Transform,
    ];

    /// The property name as written in style maps and config files.
    pub fn name(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::TransformPerspective => "transformPerspective",
            Self::Force3d => "force3D",
            Self::Opacity => "opacity",
            Self::Scale => "scale",
            Self::Display => "display",
            Self::Position => "position",
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Transition => "transition",
            Self::Transform => "transform",
        }
    }
}

impl fmt::Display for StyleProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a property name is not part of the style vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown style property: {0}")]
pub struct UnknownProperty(pub String);

impl FromStr for StyleProperty {
    type Err = UnknownProperty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| UnknownProperty(s.to_string()))
    }
}

/// A single style value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Number(f64),
    Flag(bool),
    /// Keyword such as `absolute` or `none`. Empty means unset.
    Keyword(String),
}

impl StyleValue {
    /// The unset value (CSS `''`).
    pub fn unset() -> Self {
        Self::Keyword(String::new())
    }

    /// Check if this value clears the property.
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Keyword(k) if k.is_empty())
    }

    /// Get the numeric value, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the keyword, if any.
    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Self::Keyword(k) => Some(k),
            _ => None,
        }
    }

    /// Interpolate towards `to` at eased progress `t`.
    ///
    /// Numbers are linearly interpolated. Any other pairing is discrete and
    /// switches to `to` as soon as the interpolation has started.
    pub fn interpolate(&self, to: &StyleValue, t: f32) -> StyleValue {
        match (self, to) {
            (Self::Number(a), Self::Number(b)) => Self::Number(lerp(*a, *b, t)),
            _ if t > 0.0 => to.clone(),
            _ => self.clone(),
        }
    }
}

#[inline]
fn lerp(from: f64, to: f64, t: f32) -> f64 {
    from + (to - from) * t as f64
}

impl From<f64> for StyleValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for StyleValue {
    fn from(value: i32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for StyleValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        Self::Keyword(value.to_string())
    }
}

/// An ordered collection of style declarations.
///
/// Style maps are plain values: items read presets from the layout options
/// and pass them by reference, never annotating shared maps per call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleMap {
    entries: BTreeMap<StyleProperty, StyleValue>,
}

impl StyleMap {
    /// Create an empty style map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration, builder style.
    pub fn with(mut self, property: StyleProperty, value: impl Into<StyleValue>) -> Self {
        self.set(property, value);
        self
    }

    /// Set a declaration, replacing any previous value.
    pub fn set(&mut self, property: StyleProperty, value: impl Into<StyleValue>) {
        self.entries.insert(property, value.into());
    }

    pub fn get(&self, property: StyleProperty) -> Option<&StyleValue> {
        self.entries.get(&property)
    }

    /// Numeric value of a property, if present and numeric.
    pub fn number(&self, property: StyleProperty) -> Option<f64> {
        self.get(property).and_then(StyleValue::as_f64)
    }

    pub fn remove(&mut self, property: StyleProperty) -> Option<StyleValue> {
        self.entries.remove(&property)
    }

    pub fn contains(&self, property: StyleProperty) -> bool {
        self.entries.contains_key(&property)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate declarations in property order.
    pub fn iter(&self) -> impl Iterator<Item = (StyleProperty, &StyleValue)> {
        self.entries.iter().map(|(p, v)| (*p, v))
    }

    /// Apply `other` on top of this map.
    ///
    /// Unset values in `other` remove the property instead of storing it,
    /// which is how a rendered element accumulates style.
    pub fn apply(&mut self, other: &StyleMap) {
        for (property, value) in other.iter() {
            if value.is_unset() {
                self.entries.remove(&property);
            } else {
                self.entries.insert(property, value.clone());
            }
        }
    }

    /// Interpolate every property of `to` starting from `from`.
    ///
    /// Properties missing from `from` take their target value immediately.
    pub fn interpolate(from: &StyleMap, to: &StyleMap, t: f32) -> StyleMap {
        let entries = to
            .iter()
            .map(|(property, target)| {
                let value = match from.get(property) {
                    Some(start) => start.interpolate(target, t),
                    None => target.clone(),
                };
                (property, value)
            })
            .collect();
        StyleMap { entries }
    }
}

impl FromIterator<(StyleProperty, StyleValue)> for StyleMap {
    fn from_iter<I: IntoIterator<Item = (StyleProperty, StyleValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
