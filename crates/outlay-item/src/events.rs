//! Lifecycle events and a small single-threaded event emitter.
//!
//! Listeners are kept per event kind in registration order. A listener can
//! ask to be removed after it runs, either up front with [`EventEmitter::once`]
//! or by returning [`Listen::Remove`].
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use outlay_item::events::{EventEmitter, ItemEvent, Listen};
//!
//! let emitter: EventEmitter<ItemEvent, u32> = EventEmitter::new();
//! let seen = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&seen);
//! emitter.once(ItemEvent::Remove, move |value| {
//!     counter.set(*value);
//! });
//!
//! emitter.emit(ItemEvent::Remove, &7);
//! emitter.emit(ItemEvent::Remove, &8);
//! assert_eq!(seen.get(), 7);
//! ```

use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

/// Events emitted by an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemEvent {
    /// The item settled at its logical position.
    #[serde(rename = "layout")]
    Layout,
    /// A transition on the item completed.
    #[serde(rename = "transitionEnd")]
    TransitionEnd,
    /// The item's element was detached.
    #[serde(rename = "remove")]
    Remove,
}

impl ItemEvent {
    pub fn name(self) -> &'static str {
        match self {
            Self::Layout => "layout",
            Self::TransitionEnd => "transitionEnd",
            Self::Remove => "remove",
        }
    }
}

/// What a listener wants after it has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listen {
    Keep,
    Remove,
}

/// Handle returned when registering a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler<P> = Rc<dyn Fn(&P) -> Listen>;

struct Listener<P: ?Sized> {
    id: ListenerId,
    handler: Handler<P>,
    once: bool,
}

impl<P: ?Sized> Clone for Listener<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handler: Rc::clone(&self.handler),
            once: self.once,
        }
    }
}

/// Ordered listener lists keyed by event kind.
///
/// Emitting never holds an internal borrow while a listener runs, so
/// listeners may register or remove listeners and emit nested events.
pub struct EventEmitter<K, P: ?Sized> {
    listeners: RefCell<HashMap<K, Vec<Listener<P>>>>,
    next_id: Cell<u64>,
}

impl<K, P: ?Sized> Default for EventEmitter<K, P> {
    fn default() -> Self {
        Self {
            listeners: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
        }
    }
}

impl<K, P> EventEmitter<K, P>
where
    K: Copy + Eq + Hash,
    P: ?Sized,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener that decides after each call whether to stay.
    pub fn on(&self, kind: K, handler: impl Fn(&P) -> Listen + 'static) -> ListenerId {
        self.register(kind, Rc::new(handler), false)
    }

    /// Register a listener that runs at most once.
    pub fn once(&self, kind: K, handler: impl Fn(&P) + 'static) -> ListenerId {
        self.register(
            kind,
            Rc::new(move |payload: &P| {
                handler(payload);
                Listen::Remove
            }),
            true,
        )
    }

    fn register(&self, kind: K, handler: Handler<P>, once: bool) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(Listener { id, handler, once });
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        for list in listeners.values_mut() {
            if let Some(index) = list.iter().position(|l| l.id == id) {
                list.remove(index);
                return true;
            }
        }
        false
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: K) -> usize {
        self.listeners.borrow().get(&kind).map_or(0, Vec::len)
    }

    /// Invoke the listeners registered for `kind`, in registration order.
    ///
    /// Returns how many listeners ran.
    pub fn emit(&self, kind: K, payload: &P) -> usize {
        let snapshot: Vec<Listener<P>> = match self.listeners.borrow().get(&kind) {
            Some(list) => list.clone(),
            None => return 0,
        };

        let mut invoked = 0;
        for listener in snapshot {
            // Removed by an earlier listener during this emit.
            if !self.contains(kind, listener.id) {
                continue;
            }
            // One-shot listeners leave before running so nested emits skip them.
            if listener.once {
                self.remove_from(kind, listener.id);
            }
            invoked += 1;
            if (listener.handler)(payload) == Listen::Remove && !listener.once {
                self.remove_from(kind, listener.id);
            }
        }
        invoked
    }

    fn contains(&self, kind: K, id: ListenerId) -> bool {
        self.listeners
            .borrow()
            .get(&kind)
            .is_some_and(|list| list.iter().any(|l| l.id == id))
    }

    fn remove_from(&self, kind: K, id: ListenerId) {
        if let Some(list) = self.listeners.borrow_mut().get_mut(&kind) {
            list.retain(|l| l.id != id);
        }
    }
}

impl<K, P: ?Sized> fmt::Debug for EventEmitter<K, P>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.borrow();
        let counts: Vec<(&K, usize)> = listeners.iter().map(|(k, v)| (k, v.len())).collect();
        f.debug_struct("EventEmitter")
            .field("listeners", &counts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_in_registration_order() {
        let emitter: EventEmitter<ItemEvent, ()> = EventEmitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&log);
        emitter.on(ItemEvent::Layout, move |_| {
            first.borrow_mut().push("first");
            Listen::Keep
        });
        let second = Rc::clone(&log);
        emitter.on(ItemEvent::Layout, move |_| {
            second.borrow_mut().push("second");
            Listen::Keep
        });

        assert_eq!(emitter.emit(ItemEvent::Layout, &()), 2);
        assert_eq!(emitter.emit(ItemEvent::Remove, &()), 0);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_listener_requested_removal() {
        let emitter: EventEmitter<ItemEvent, ()> = EventEmitter::new();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        emitter.on(ItemEvent::TransitionEnd, move |_| {
            counter.set(counter.get() + 1);
            if counter.get() == 2 { Listen::Remove } else { Listen::Keep }
        });

        for _ in 0..4 {
            emitter.emit(ItemEvent::TransitionEnd, &());
        }
        assert_eq!(calls.get(), 2);
        assert_eq!(emitter.listener_count(ItemEvent::TransitionEnd), 0);
    }

    #[test]
    fn test_off() {
        let emitter: EventEmitter<ItemEvent, ()> = EventEmitter::new();
        let id = emitter.on(ItemEvent::Layout, |_| Listen::Keep);
        assert!(emitter.off(id));
        assert!(!emitter.off(id));
        assert_eq!(emitter.listener_count(ItemEvent::Layout), 0);
    }

    #[test]
    fn test_once_survives_nested_emit() {
        let emitter = Rc::new(EventEmitter::<ItemEvent, ()>::new());
        let calls = Rc::new(Cell::new(0));

        let nested = Rc::clone(&emitter);
        let counter = Rc::clone(&calls);
        emitter.once(ItemEvent::TransitionEnd, move |_| {
            counter.set(counter.get() + 1);
            nested.emit(ItemEvent::TransitionEnd, &());
        });

        emitter.emit(ItemEvent::TransitionEnd, &());
        emitter.emit(ItemEvent::TransitionEnd, &());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_listener_removed_mid_emit_is_skipped() {
        let emitter = Rc::new(EventEmitter::<ItemEvent, ()>::new());
        let log = Rc::new(RefCell::new(Vec::<&str>::new()));
        let victim = Rc::new(Cell::new(None));

        let remover = Rc::clone(&emitter);
        let target = Rc::clone(&victim);
        emitter.on(ItemEvent::Layout, move |_| {
            if let Some(id) = target.get() {
                remover.off(id);
            }
            Listen::Keep
        });
        let second = Rc::clone(&log);
        let id = emitter.on(ItemEvent::Layout, move |_| {
            second.borrow_mut().push("second");
            Listen::Keep
        });
        victim.set(Some(id));

        assert_eq!(emitter.emit(ItemEvent::Layout, &()), 1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_event_names() {
        assert_eq!(ItemEvent::TransitionEnd.name(), "transitionEnd");
        assert_eq!(
            serde_json::to_string(&ItemEvent::TransitionEnd).unwrap(),
            r#""transitionEnd""#
        );
    }
}
