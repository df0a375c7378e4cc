#![forbid(unsafe_code)]

//! Observable ordered collections.
//!
//! [`MvcArray`] wraps a `Vec<Value>` and is itself an attribute store (see
//! [`MvcArray::as_object`]). Every mutation goes through an indexed operation
//! that dispatches exactly one structural event followed by one `changed`:
//!
//! | Operation        | Structural event | Arguments              |
//! |------------------|------------------|------------------------|
//! | `insert_at`/`push` | `insert_at`    | `[index, element]`     |
//! | `remove_at`/`pop`  | `remove_at`    | `[index, removed]`     |
//! | `set_at`           | `set_at`       | `[index, previous]`    |
//!
//! # Invariants
//!
//! 1. Events are dispatched after the sequence is updated, so listeners see
//!    the new state.
//! 2. `clear()` is a loop of `pop()`, so a pop override runs for every
//!    element removed.
//! 3. An array built with [`MvcArray::from_source`] re-dispatches only the
//!    source's `changed` event, never its structural events.
//!
//! # Failure Modes
//!
//! - **Out-of-range index**: `get_at`, `remove_at` and `set_at` return
//!   `None` and dispatch nothing; `insert_at` clamps to the length.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::event::{EventRegistry, ListenerHandle};
use crate::identity::{Instance, InstanceId};
use crate::object::MvcObject;
use crate::object::properties::PropertyTable;
use crate::value::Value;

pub const INSERT_AT: &str = "insert_at";
pub const REMOVE_AT: &str = "remove_at";
pub const SET_AT: &str = "set_at";
pub const CHANGED: &str = "changed";

/// Replacement for [`MvcArray::pop`]. Typically tears down a side effect and
/// delegates to [`MvcArray::pop_default`].
pub type PopOverride = Rc<dyn Fn(&MvcArray) -> Option<Value>>;

struct ArrayInner {
    object: MvcObject,
    items: Rc<RefCell<Vec<Value>>>,
    pop_override: Option<PopOverride>,
}

/// An observable ordered sequence of [`Value`]s.
///
/// Cloning yields another handle to the same array.
#[derive(Clone)]
pub struct MvcArray {
    inner: Rc<ArrayInner>,
}

impl PartialEq for MvcArray {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for MvcArray {}

impl fmt::Debug for MvcArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MvcArray")
            .field("id", &self.id())
            .field("items", &*self.inner.items.borrow())
            .finish()
    }
}

impl Default for MvcArray {
    fn default() -> Self {
        Self::new()
    }
}

impl Instance for MvcArray {
    fn instance_id(&self) -> InstanceId {
        self.id()
    }
}

impl From<Vec<Value>> for MvcArray {
    fn from(items: Vec<Value>) -> Self {
        Self::builder().items(items).build()
    }
}

/// Builder for arrays with initial items, a pop override or store hooks.
#[derive(Default)]
pub struct MvcArrayBuilder {
    items: Vec<Value>,
    pop_override: Option<PopOverride>,
    properties: Option<Rc<PropertyTable>>,
}

impl MvcArrayBuilder {
    #[must_use]
    pub fn items(mut self, items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        self.items = items.into_iter().map(Into::into).collect();
        self
    }

    /// Replace `pop` (and therefore `clear`) with `f`.
    #[must_use]
    pub fn on_pop(mut self, f: impl Fn(&MvcArray) -> Option<Value> + 'static) -> Self {
        self.pop_override = Some(Rc::new(f));
        self
    }

    /// Hooks for the array's own attribute store.
    #[must_use]
    pub fn properties(mut self, properties: Rc<PropertyTable>) -> Self {
        self.properties = Some(properties);
        self
    }

    #[must_use]
    pub fn build(self) -> MvcArray {
        let object = match self.properties {
            Some(properties) => MvcObject::with_properties(properties),
            None => MvcObject::new(),
        };
        MvcArray {
            inner: Rc::new(ArrayInner {
                object,
                items: Rc::new(RefCell::new(self.items)),
                pop_override: self.pop_override,
            }),
        }
    }
}

impl MvcArray {
    /// An empty array.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> MvcArrayBuilder {
        MvcArrayBuilder::default()
    }

    /// An array viewing the same sequence as `source`.
    ///
    /// Whenever `source` dispatches `changed`, the new array dispatches its
    /// own `changed`. Returns the array and the handle of that forwarding
    /// subscription.
    ///
    /// Treat the result as a read-only view. Storage is shared, so mutating
    /// the view changes what `source` holds, yet every event goes to the view
    /// only: listeners on `source` are not told.
    pub fn from_source(source: &MvcArray) -> (Self, ListenerHandle) {
        let array = Self {
            inner: Rc::new(ArrayInner {
                object: MvcObject::new(),
                items: Rc::clone(&source.inner.items),
                pop_override: None,
            }),
        };
        let own = array.id();
        let forward = EventRegistry::global().add_listener(source, CHANGED, move |_| {
            EventRegistry::global().trigger(own, CHANGED, &[]);
        });
        (array, forward)
    }

    /// Identity shared with the array's attribute store.
    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.inner.object.id()
    }

    /// The array's attribute store.
    #[must_use]
    pub fn as_object(&self) -> &MvcObject {
        &self.inner.object
    }

    #[must_use]
    pub fn get_length(&self) -> usize {
        self.inner.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.get_length() == 0
    }

    #[must_use]
    pub fn get_at(&self, index: usize) -> Option<Value> {
        self.inner.items.borrow().get(index).cloned()
    }

    /// A copy of the current elements.
    #[must_use]
    pub fn get_array(&self) -> Vec<Value> {
        self.inner.items.borrow().clone()
    }

    /// Visit every element with its index. Iterates over a copy, so `f` may
    /// mutate the array.
    pub fn for_each(&self, mut f: impl FnMut(&Value, usize)) {
        for (index, item) in self.get_array().iter().enumerate() {
            f(item, index);
        }
    }

    /// Insert `element` at `index` (clamped to the length).
    pub fn insert_at(&self, index: usize, element: impl Into<Value>) {
        let element = element.into();
        let index = {
            let mut items = self.inner.items.borrow_mut();
            let index = index.min(items.len());
            items.insert(index, element.clone());
            index
        };
        self.emit(INSERT_AT, &[Value::from(index), element]);
    }

    /// Append `element`; returns the new length.
    pub fn push(&self, element: impl Into<Value>) -> usize {
        self.insert_at(self.get_length(), element);
        self.get_length()
    }

    /// Remove and return the element at `index`.
    pub fn remove_at(&self, index: usize) -> Option<Value> {
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            (index < items.len()).then(|| items.remove(index))
        }?;
        self.emit(REMOVE_AT, &[Value::from(index), removed.clone()]);
        Some(removed)
    }

    /// Replace the element at `index`; returns the previous element.
    pub fn set_at(&self, index: usize, element: impl Into<Value>) -> Option<Value> {
        let element = element.into();
        let previous = {
            let mut items = self.inner.items.borrow_mut();
            let slot = items.get_mut(index)?;
            std::mem::replace(slot, element)
        };
        self.emit(SET_AT, &[Value::from(index), previous.clone()]);
        Some(previous)
    }

    /// Remove and return the last element, via the pop override if the array
    /// has one.
    pub fn pop(&self) -> Option<Value> {
        match &self.inner.pop_override {
            Some(f) => {
                let f = Rc::clone(f);
                f(self)
            }
            None => self.pop_default(),
        }
    }

    /// The built-in pop: `remove_at(len - 1)`.
    pub fn pop_default(&self) -> Option<Value> {
        let len = self.get_length();
        if len == 0 {
            return None;
        }
        self.remove_at(len - 1)
    }

    /// Pop until empty.
    pub fn clear(&self) {
        while !self.is_empty() {
            let before = self.get_length();
            self.pop();
            if self.get_length() >= before {
                tracing::warn!(array = %self.id(), "pop did not shrink the array; clear stopped");
                break;
            }
        }
    }

    /// Subscribe to `event` on this array.
    pub fn add_listener(&self, event: &str, handler: impl Fn(&[Value]) + 'static) -> ListenerHandle {
        self.inner.object.add_listener(event, handler)
    }

    pub fn add_listener_once(
        &self,
        event: &str,
        handler: impl Fn(&[Value]) + 'static,
    ) -> ListenerHandle {
        self.inner.object.add_listener_once(event, handler)
    }

    fn emit(&self, event: &str, args: &[Value]) {
        let registry = EventRegistry::global();
        registry.trigger(self.id(), event, args);
        registry.trigger(self.id(), CHANGED, &[]);
    }
}
