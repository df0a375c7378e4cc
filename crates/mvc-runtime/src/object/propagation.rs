#![forbid(unsafe_code)]

//! The change-propagation walk.
//!
//! For a change on `(object, key)`:
//!
//! 1. run the key-changed hook for `key`, or else the generic changed hook;
//! 2. recurse into every store bound to `key`, depth-first, in binding
//!    creation order;
//! 3. dispatch `"{key}_changed"` to the object's listeners.
//!
//! Step 2 always finishes before step 3 for the same pair, so by the time a
//! listener on a target runs, every binder above it has already been told.
//!
//! The binder walk itself is not depth-limited: `bind_to` refuses cycles, so
//! it always ends, however long the chain. What is capped by
//! [`RuntimeConfig::max_propagation_depth`] is re-entry, i.e. propagation
//! started by `set`/`unset`/`notify` calls made from inside hooks and
//! listeners. A re-entry that would exceed the cap is abandoned and logged at
//! error level.

use std::cell::Cell;

use super::MvcObject;
use crate::config::RuntimeConfig;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Name of the event dispatched when `key` changes.
#[must_use]
pub fn changed_event_name(key: &str) -> String {
    format!("{key}_changed")
}

struct DepthGuard;

impl DepthGuard {
    fn enter() -> Option<Self> {
        let limit = RuntimeConfig::current().max_propagation_depth;
        DEPTH.with(|depth| {
            let current = depth.get();
            if current >= limit {
                None
            } else {
                depth.set(current + 1);
                Some(DepthGuard)
            }
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Entry point for a mutation. Each call counts as one level of nesting.
pub(crate) fn propagate(object: &MvcObject, key: &str) {
    let Some(_guard) = DepthGuard::enter() else {
        tracing::error!(
            object = %object.id(),
            key,
            limit = RuntimeConfig::current().max_propagation_depth,
            "change propagation exceeded max depth; branch abandoned"
        );
        return;
    };
    walk(object, key);
}

fn walk(object: &MvcObject, key: &str) {
    let properties = object.properties();
    if let Some(hook) = properties.key_changed(key) {
        hook(object);
    } else if let Some(hook) = properties.any_changed() {
        hook(object, key);
    }

    for (binder, binder_key) in object.binders_of(key) {
        walk(&binder, &binder_key);
    }

    object.trigger(&changed_event_name(key), &[]);
}
