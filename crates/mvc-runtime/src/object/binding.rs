#![forbid(unsafe_code)]

//! Property bindings between attribute stores.
//!
//! `b.bind_to("y", &a, "x", false)` installs two records:
//!
//! - an **accessor** on `b` under `"y"` pointing at `(a, "x")`, which
//!   redirects `b.get("y")`, `b.set("y", ..)` and `b.notify("y")` to `a`;
//! - a **binding** on `a` under `"x"`, a reverse-index entry naming
//!   `(b, "y")`, which lets a change to `a.x` propagate up to `b.y`.
//!
//! Binders hold their targets strongly; targets hold binders weakly. Entries
//! for binders that have been dropped are pruned the next time the target's
//! key propagates.
//!
//! # Invariants
//!
//! 1. Each `(store, key)` has at most one accessor.
//! 2. Following accessors from any key terminates: `bind_to` refuses any
//!    binding that would close a cycle.
//! 3. A target's bindings for a key are walked in creation order.
//! 4. `unbind` leaves the last delegated value behind as a raw value.

use std::rc::Weak;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{MvcObject, ObjectInner, propagation};
use crate::error::BindError;

static NEXT_BINDING: AtomicU64 = AtomicU64::new(1);

/// Identity of one binding; also orders a target's binders by creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u64);

impl BindingId {
    fn next() -> Self {
        Self(NEXT_BINDING.fetch_add(1, Ordering::Relaxed))
    }
}

/// Forward half of a binding, stored on the binder.
pub(crate) struct Accessor {
    pub(crate) target: MvcObject,
    pub(crate) target_key: String,
    pub(crate) binding: BindingId,
}

/// Reverse half of a binding, stored on the target.
pub(crate) struct Binding {
    binder: Weak<ObjectInner>,
    binder_key: String,
}

impl MvcObject {
    /// Bind `key` to `target_key` on `target`.
    ///
    /// Any existing binding on `key` is removed first. Unless `no_notify` is
    /// set, change propagation runs for `key` once the binding is in place.
    ///
    /// # Errors
    ///
    /// [`BindError::Cycle`] if following accessors from `(target,
    /// target_key)` leads back to `(self, key)`, including binding a key to
    /// itself. The store is left unchanged.
    pub fn bind_to(
        &self,
        key: &str,
        target: &MvcObject,
        target_key: &str,
        no_notify: bool,
    ) -> Result<&Self, BindError> {
        if self.is_reachable_from(key, target, target_key) {
            tracing::warn!(
                binder = %self.id(),
                key,
                target = %target.id(),
                target_key,
                "refusing cyclic binding"
            );
            return Err(BindError::Cycle {
                key: key.to_owned(),
                target_key: target_key.to_owned(),
            });
        }

        self.unbind(key);

        let binding = BindingId::next();
        target
            .inner
            .state
            .borrow_mut()
            .bindings
            .entry(target_key.to_owned())
            .or_default()
            .insert(
                binding,
                Binding {
                    binder: self.downgrade(),
                    binder_key: key.to_owned(),
                },
            );
        self.inner.state.borrow_mut().accessors.insert(
            key.to_owned(),
            Accessor {
                target: target.clone(),
                target_key: target_key.to_owned(),
                binding,
            },
        );
        tracing::debug!(
            binder = %self.id(),
            key,
            target = %target.id(),
            target_key,
            "bound"
        );

        if !no_notify {
            propagation::propagate(self, key);
        }
        Ok(self)
    }

    /// Bind `key` to the same-named key on `target` and notify.
    ///
    /// # Errors
    ///
    /// See [`bind_to`](Self::bind_to).
    pub fn bind(&self, key: &str, target: &MvcObject) -> Result<&Self, BindError> {
        self.bind_to(key, target, key, false)
    }

    /// Whether `(self, key)` is reached by following accessors from
    /// `(start, start_key)`.
    fn is_reachable_from(&self, key: &str, start: &MvcObject, start_key: &str) -> bool {
        let mut current = start.clone();
        let mut current_key = start_key.to_owned();
        loop {
            if current == *self && current_key == key {
                return true;
            }
            match current.delegate(&current_key) {
                Some((next, next_key)) => {
                    current = next;
                    current_key = next_key;
                }
                None => return false,
            }
        }
    }

    /// Remove the binding on `key`, keeping its current value as a raw value.
    /// No-op when `key` is not bound.
    pub fn unbind(&self, key: &str) -> &Self {
        if !self.is_bound(key) {
            return self;
        }
        let value = self.get(key);
        let (accessor, previous) = {
            let mut state = self.inner.state.borrow_mut();
            let previous = match value {
                Some(value) => state.values.insert(key.to_owned(), value),
                None => state.values.remove(key),
            };
            (state.accessors.remove(key), previous)
        };
        drop(previous);

        if let Some(accessor) = accessor {
            accessor
                .target
                .remove_binding(&accessor.target_key, accessor.binding);
            tracing::debug!(
                binder = %self.id(),
                key,
                target = %accessor.target.id(),
                target_key = accessor.target_key.as_str(),
                "unbound"
            );
        }
        self
    }

    /// Unbind every bound key.
    pub fn unbind_all(&self) -> &Self {
        let keys: Vec<String> = self.inner.state.borrow().accessors.keys().cloned().collect();
        for key in keys {
            self.unbind(&key);
        }
        self
    }

    /// Whether `key` currently delegates to another store.
    #[must_use]
    pub fn is_bound(&self, key: &str) -> bool {
        self.inner.state.borrow().accessors.contains_key(key)
    }

    /// Number of live stores bound to `key` on this store.
    #[must_use]
    pub fn binder_count(&self, key: &str) -> usize {
        self.inner
            .state
            .borrow()
            .bindings
            .get(key)
            .map_or(0, |b| b.values().filter(|b| b.binder.strong_count() > 0).count())
    }

    fn remove_binding(&self, key: &str, binding: BindingId) {
        let mut state = self.inner.state.borrow_mut();
        if let Some(bindings) = state.bindings.get_mut(key) {
            bindings.remove(&binding);
            if bindings.is_empty() {
                state.bindings.remove(key);
            }
        }
    }

    /// Live binders of `key`, in creation order. Prunes dead entries.
    pub(crate) fn binders_of(&self, key: &str) -> Vec<(MvcObject, String)> {
        let mut state = self.inner.state.borrow_mut();
        let Some(bindings) = state.bindings.get_mut(key) else {
            return Vec::new();
        };
        bindings.retain(|_, b| b.binder.strong_count() > 0);
        let binders = bindings
            .values()
            .filter_map(|b| MvcObject::from_weak(&b.binder).map(|obj| (obj, b.binder_key.clone())))
            .collect();
        if bindings.is_empty() {
            state.bindings.remove(key);
        }
        binders
    }
}
