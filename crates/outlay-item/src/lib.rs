//! Positioned, animatable layout items.
//!
//! This crate provides:
//! - **Item**: Logical grid position, visibility and transition state for one element
//! - **Surface**: The seam through which items style and measure elements
//! - **Transitions**: The backend seam plus a frame-driven tween backend
//! - **Events**: `layout`, `transitionEnd` and `remove` notifications
//!
//! # Architecture
//!
//! ```text
//! Layout engine
//!   └── Item ──css──────────▶ Surface (StyleApplier + SizeQuery)
//!        │  └─transition──▶ TransitionBackend ──completion──┐
//!        └── EventEmitter ◀─────────────────────────────────┘
//! ```

pub mod easing;
pub mod events;
pub mod item;
pub mod layout;
pub mod style;
pub mod surface;
pub mod transition;
pub mod tween;

pub use easing::EasingFunction;
pub use events::{EventEmitter, ItemEvent, Listen, ListenerId};
pub use item::{GridPosition, Item, ItemContext, truncate_coordinate};
pub use layout::{LayoutHost, LayoutOptions, LayoutSize, SharedLayout};
pub use style::{StyleMap, StyleProperty, StyleValue, UnknownProperty};
pub use surface::{ElementId, ElementSize, SceneSurface, SharedSurface, SizeQuery, StyleApplier, Surface};
pub use transition::{
    ActiveTween, Completion, SharedBackend, TransitionBackend, TransitionId, TransitionRequest,
};
pub use tween::TweenBackend;
