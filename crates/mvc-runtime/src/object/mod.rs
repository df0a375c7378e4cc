#![forbid(unsafe_code)]

//! Attribute stores with delegation and change notification.
//!
//! # Design
//!
//! [`MvcObject`] is a shared handle (`Rc`) to a key/value bag. A key holds
//! either a raw [`Value`] or an accessor that redirects `get`/`set`/`notify`
//! to a key on another store (see [`binding`]). Every raw mutation runs the
//! change-propagation walk in [`propagation`]:
//!
//! ```text
//! C.set("z", 1)
//!   C: z hook            (key-changed hook, else generic changed hook)
//!   B: y hook            (B.y is bound to C.z)
//!     A: x hook          (A.x is bound to B.y)
//!     A: "x_changed"     listeners
//!   B: "y_changed"       listeners
//! C: "z_changed"         listeners
//! ```
//!
//! # Invariants
//!
//! 1. With no accessor on `k`, `set(k, v)` followed by `get(k)` yields `v`.
//! 2. A key has at most one accessor.
//! 3. No `RefCell` borrow is held while hooks or listeners run, so they may
//!    call any method on any store.
//!
//! # Failure Modes
//!
//! - **Unset key**: `get` returns `None`.
//! - **Runaway hooks**: a hook that keeps re-setting keys is cut off at
//!   [`RuntimeConfig::max_propagation_depth`](crate::RuntimeConfig) and
//!   reported through `tracing`.

pub mod binding;
pub mod properties;
pub(crate) mod propagation;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use crate::event::{self, ListenerHandle};
use crate::identity::{Instance, InstanceId};
use crate::value::Value;
use binding::{Accessor, Binding, BindingId};
use properties::PropertyTable;

pub(crate) struct ObjectInner {
    id: InstanceId,
    properties: Rc<PropertyTable>,
    state: RefCell<ObjectState>,
}

#[derive(Default)]
struct ObjectState {
    values: FxHashMap<String, Value>,
    accessors: FxHashMap<String, Accessor>,
    /// Reverse index: stores bound to one of our keys, by our key.
    bindings: FxHashMap<String, BTreeMap<BindingId, Binding>>,
}

/// A dynamically typed, observable attribute store.
///
/// Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct MvcObject {
    inner: Rc<ObjectInner>,
}

impl PartialEq for MvcObject {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for MvcObject {}

impl fmt::Debug for MvcObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("MvcObject")
            .field("id", &self.inner.id)
            .field("values", &state.values.len())
            .field("accessors", &state.accessors.len())
            .finish()
    }
}

impl Default for MvcObject {
    fn default() -> Self {
        Self::new()
    }
}

impl Instance for MvcObject {
    fn instance_id(&self) -> InstanceId {
        self.inner.id
    }
}

impl MvcObject {
    /// Create an empty store with no hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::with_properties(Rc::new(PropertyTable::new()))
    }

    /// Create an empty store using `properties` for getter/setter and change
    /// hooks.
    #[must_use]
    pub fn with_properties(properties: Rc<PropertyTable>) -> Self {
        let id = InstanceId::next();
        tracing::trace!(object = %id, "object created");
        Self {
            inner: Rc::new(ObjectInner {
                id,
                properties,
                state: RefCell::new(ObjectState::default()),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.inner.id
    }

    pub(crate) fn properties(&self) -> &PropertyTable {
        &self.inner.properties
    }

    pub(crate) fn downgrade(&self) -> Weak<ObjectInner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn from_weak(weak: &Weak<ObjectInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Target store and key of the accessor on `key`, if bound.
    fn delegate(&self, key: &str) -> Option<(MvcObject, String)> {
        self.inner
            .state
            .borrow()
            .accessors
            .get(key)
            .map(|a| (a.target.clone(), a.target_key.clone()))
    }

    /// Read `key`, following its accessor if bound.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.delegate(key) {
            Some((target, target_key)) => match target.properties().getter_for(&target_key) {
                Some(getter) => getter(&target),
                None => target.get(&target_key),
            },
            None => self.inner.state.borrow().values.get(key).cloned(),
        }
    }

    /// Write `key`. If bound, the write goes to the target (through its
    /// registered setter when there is one); otherwise the raw value is
    /// stored and the change is propagated.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> &Self {
        let value = value.into();
        match self.delegate(key) {
            Some((target, target_key)) => match target.properties().setter_for(&target_key) {
                Some(setter) => setter(&target, value),
                None => {
                    target.set(&target_key, value);
                }
            },
            None => {
                let previous = self
                    .inner
                    .state
                    .borrow_mut()
                    .values
                    .insert(key.to_owned(), value);
                drop(previous);
                propagation::propagate(self, key);
            }
        }
        self
    }

    /// Make `key` undefined again. Follows the accessor if bound.
    pub fn unset(&self, key: &str) -> &Self {
        match self.delegate(key) {
            Some((target, target_key)) => {
                target.unset(&target_key);
            }
            None => {
                let previous = self.inner.state.borrow_mut().values.remove(key);
                drop(previous);
                propagation::propagate(self, key);
            }
        }
        self
    }

    /// Re-broadcast `key` without changing it.
    pub fn notify(&self, key: &str) -> &Self {
        match self.delegate(key) {
            Some((target, target_key)) => {
                target.notify(&target_key);
            }
            None => propagation::propagate(self, key),
        }
        self
    }

    /// Apply every `(key, value)` pair, preferring the setter registered for
    /// the key on this store's table over a plain [`set`](Self::set).
    pub fn set_values<K, V>(&self, values: impl IntoIterator<Item = (K, V)>) -> &Self
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (key, value) in values {
            let key = key.as_ref();
            match self.properties().setter_for(key) {
                Some(setter) => setter(self, value.into()),
                None => {
                    self.set(key, value);
                }
            }
        }
        self
    }

    /// Keys that hold a raw value or an accessor, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let state = self.inner.state.borrow();
        let mut keys: Vec<String> = state
            .values
            .keys()
            .chain(state.accessors.keys().filter(|k| !state.values.contains_key(*k)))
            .cloned()
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Subscribe to `event` on this store.
    pub fn add_listener(&self, event: &str, handler: impl Fn(&[Value]) + 'static) -> ListenerHandle {
        event::add_listener(self, event, handler)
    }

    /// Subscribe to the next `event` on this store only.
    pub fn add_listener_once(
        &self,
        event: &str,
        handler: impl Fn(&[Value]) + 'static,
    ) -> ListenerHandle {
        event::add_listener_once(self, event, handler)
    }

    pub fn remove_listener(&self, handle: &ListenerHandle) {
        event::remove_listener(handle);
    }

    /// Dispatch `event` on this store.
    pub fn trigger(&self, event: &str, args: &[Value]) {
        event::trigger(self, event, args);
    }

    pub fn clear_listeners(&self, event: &str) {
        event::clear_listeners(self, event);
    }

    pub fn clear_instance_listeners(&self) {
        event::clear_instance_listeners(self);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    #[test]
    fn set_then_get() {
        let obj = MvcObject::new();
        assert_eq!(obj.get("x"), None);
        obj.set("x", 1).set("y", "two");
        assert_eq!(obj.get("x"), Some(Value::from(1)));
        assert_eq!(obj.get("y"), Some(Value::from("two")));
    }

    #[test]
    fn set_fires_changed_event_every_time() {
        let obj = MvcObject::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let _h = obj.add_listener("x_changed", move |args| {
            assert!(args.is_empty());
            c.set(c.get() + 1);
        });

        obj.set("x", 1);
        obj.set("x", 1);
        obj.set("y", 1);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn unset_clears_and_notifies() {
        let obj = MvcObject::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        obj.set("x", 1);
        let _h = obj.add_listener("x_changed", move |_| c.set(c.get() + 1));

        obj.unset("x");
        assert_eq!(obj.get("x"), None);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn notify_rebroadcasts_without_change() {
        let obj = MvcObject::new();
        obj.set("x", 3);
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let _h = obj.add_listener("x_changed", move |_| c.set(c.get() + 1));

        obj.notify("x");
        assert_eq!(count.get(), 1);
        assert_eq!(obj.get("x"), Some(Value::from(3)));
    }

    #[test]
    fn key_hook_replaces_generic_hook() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (l1, l2) = (Rc::clone(&log), Rc::clone(&log));
        let table = PropertyTable::new()
            .on_changed("x", move |_| l1.borrow_mut().push("x hook".to_owned()))
            .on_any_changed(move |_, key| l2.borrow_mut().push(format!("changed({key})")))
            .shared();
        let obj = MvcObject::with_properties(table);

        obj.set("x", 1);
        obj.set("y", 1);
        assert_eq!(*log.borrow(), vec!["x hook", "changed(y)"]);
    }

    #[test]
    fn hook_runs_before_listeners() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let table = PropertyTable::new()
            .on_changed("x", move |_| l.borrow_mut().push("hook"))
            .shared();
        let obj = MvcObject::with_properties(table);
        let l = Rc::clone(&log);
        let _h = obj.add_listener("x_changed", move |_| l.borrow_mut().push("listener"));

        obj.set("x", 1);
        assert_eq!(*log.borrow(), vec!["hook", "listener"]);
    }

    #[test]
    fn set_values_prefers_registered_setter() {
        let table = PropertyTable::new()
            .setter("opacity", |obj, v| {
                let clamped = v.as_float().unwrap_or(1.0).clamp(0.0, 1.0);
                obj.set("opacity", clamped);
            })
            .shared();
        let obj = MvcObject::with_properties(table);

        obj.set_values([("opacity", Value::from(4.0)), ("title", Value::from("t"))]);
        assert_eq!(obj.get("opacity"), Some(Value::from(1.0)));
        assert_eq!(obj.get("title"), Some(Value::from("t")));
    }

    #[test]
    fn handlers_may_reenter_the_store() {
        let obj = MvcObject::new();
        let o = obj.clone();
        let _h = obj.add_listener("x_changed", move |_| {
            let x = o.get("x").and_then(|v| v.as_int()).unwrap_or(0);
            o.set("double", x * 2);
        });

        obj.set("x", 21);
        assert_eq!(obj.get("double"), Some(Value::from(42)));
        obj.clear_instance_listeners();
    }

    #[test]
    fn keys_are_sorted() {
        let obj = MvcObject::new();
        obj.set("b", 1).set("a", 2);
        assert_eq!(obj.keys(), vec!["a", "b"]);
    }

    #[test]
    fn trigger_and_clear_forwarders() {
        let obj = MvcObject::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let h = obj.add_listener("custom", move |_| c.set(c.get() + 1));
        let c = Rc::clone(&count);
        let _once = obj.add_listener_once("custom", move |_| c.set(c.get() + 10));

        obj.trigger("custom", &[]);
        obj.trigger("custom", &[]);
        assert_eq!(count.get(), 12);

        obj.remove_listener(&h);
        obj.trigger("custom", &[]);
        assert_eq!(count.get(), 12);

        let _again = obj.add_listener("custom", |_| {});
        obj.clear_listeners("custom");
        assert!(!event::EventRegistry::global().has_listeners(&obj, "custom"));
    }

    #[test]
    fn debug_format() {
        let obj = MvcObject::new();
        obj.set("a", 1);
        let dbg = format!("{obj:?}");
        assert!(dbg.contains("MvcObject"));
        assert!(dbg.contains("values: 1"));
    }
}
