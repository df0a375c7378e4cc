#![forbid(unsafe_code)]

//! Per-type property registration tables.
//!
//! Domain types customize attribute access by registering hooks against key
//! names when they build their table, instead of relying on method names:
//!
//! | Hook | Runs when |
//! |------|-----------|
//! | getter | another store bound to this key reads through its accessor |
//! | setter | a bound store writes through its accessor, or `set_values` |
//! | key-changed | change propagation reaches this key |
//! | changed (generic) | change propagation reaches a key with no key-changed hook |
//!
//! A table is immutable once built and is shared (`Rc`) by every instance
//! constructed from it.
//!
//! ```ignore
//! let table = PropertyTable::new()
//!     .setter("opacity", |obj, v| {
//!         let clamped = v.as_float().unwrap_or(1.0).clamp(0.0, 1.0);
//!         obj.set("opacity", clamped);
//!     })
//!     .on_changed("opacity", |obj| redraw(obj))
//!     .shared();
//! let marker = MvcObject::with_properties(table);
//! ```

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::MvcObject;
use crate::value::Value;

pub type Getter = Rc<dyn Fn(&MvcObject) -> Option<Value>>;
pub type Setter = Rc<dyn Fn(&MvcObject, Value)>;
pub type KeyChangedHook = Rc<dyn Fn(&MvcObject)>;
pub type ChangedHook = Rc<dyn Fn(&MvcObject, &str)>;

#[derive(Clone, Default)]
struct PropertyHooks {
    getter: Option<Getter>,
    setter: Option<Setter>,
    on_changed: Option<KeyChangedHook>,
}

/// Hooks for one object type, keyed by attribute name.
#[derive(Clone, Default)]
pub struct PropertyTable {
    properties: FxHashMap<String, PropertyHooks>,
    changed: Option<ChangedHook>,
}

impl PropertyTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, key: &str) -> &mut PropertyHooks {
        self.properties.entry(key.to_owned()).or_default()
    }

    /// Register the getter used when a bound store reads `key` through an
    /// accessor.
    #[must_use]
    pub fn getter(mut self, key: &str, f: impl Fn(&MvcObject) -> Option<Value> + 'static) -> Self {
        self.entry(key).getter = Some(Rc::new(f));
        self
    }

    /// Register the setter used when a bound store writes `key` through an
    /// accessor, and by [`MvcObject::set_values`].
    #[must_use]
    pub fn setter(mut self, key: &str, f: impl Fn(&MvcObject, Value) + 'static) -> Self {
        self.entry(key).setter = Some(Rc::new(f));
        self
    }

    /// Register the hook run when `key` changes. Replaces the generic
    /// [`on_any_changed`](Self::on_any_changed) hook for this key.
    #[must_use]
    pub fn on_changed(mut self, key: &str, f: impl Fn(&MvcObject) + 'static) -> Self {
        self.entry(key).on_changed = Some(Rc::new(f));
        self
    }

    /// Register the generic hook run for keys without a key-changed hook.
    #[must_use]
    pub fn on_any_changed(mut self, f: impl Fn(&MvcObject, &str) + 'static) -> Self {
        self.changed = Some(Rc::new(f));
        self
    }

    /// Freeze into a shareable table.
    #[must_use]
    pub fn shared(self) -> Rc<Self> {
        Rc::new(self)
    }

    pub(crate) fn getter_for(&self, key: &str) -> Option<Getter> {
        self.properties.get(key)?.getter.clone()
    }

    pub(crate) fn setter_for(&self, key: &str) -> Option<Setter> {
        self.properties.get(key)?.setter.clone()
    }

    pub(crate) fn key_changed(&self, key: &str) -> Option<KeyChangedHook> {
        self.properties.get(key)?.on_changed.clone()
    }

    pub(crate) fn any_changed(&self) -> Option<ChangedHook> {
        self.changed.clone()
    }
}

impl fmt::Debug for PropertyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.properties.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("PropertyTable")
            .field("keys", &keys)
            .field("changed", &self.changed.is_some())
            .finish()
    }
}
