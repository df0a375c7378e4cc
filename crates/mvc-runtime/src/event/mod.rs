#![forbid(unsafe_code)]

//! Named events multiplexed per instance.
//!
//! - [`EventRegistry`]: listener buckets with tombstoning and snapshot
//!   dispatch.
//! - [`ListenerHandle`]: disposable handle returned by every subscribe call.
//! - [`EventTarget`]: native event sources for DOM-style listeners.
//! - [`adapters`]: closures that re-publish pointer signals or fan one signal
//!   out to several event names.
//!
//! The free functions below operate on the thread-local
//! [`EventRegistry::global`], which is also what attribute stores and arrays
//! use.
//!
//! # Invariants
//!
//! 1. A trigger invokes each listener in its start-of-dispatch snapshot
//!    exactly once, in subscription order.
//! 2. Listeners added during a dispatch are not invoked by that dispatch.
//! 3. A once-listener runs at most once, even under re-entrant dispatch.
//! 4. Removing a listener twice, or clearing an empty bucket, is a no-op.

pub mod adapters;
pub mod dom;
pub mod handle;
pub mod registry;

pub use adapters::{PointerEvent, PointerSignal, fan_out, pointer_forwarder};
pub use dom::{EventTarget, NativeListenerId};
pub use handle::ListenerHandle;
pub use registry::{EventRegistry, Handler, ListenerId};

use crate::identity::Instance;
use crate::value::Value;

/// Subscribe on the global registry.
pub fn add_listener(
    instance: impl Instance,
    event: &str,
    handler: impl Fn(&[Value]) + 'static,
) -> ListenerHandle {
    EventRegistry::global().add_listener(instance, event, handler)
}

/// Subscribe for one delivery on the global registry.
pub fn add_listener_once(
    instance: impl Instance,
    event: &str,
    handler: impl Fn(&[Value]) + 'static,
) -> ListenerHandle {
    EventRegistry::global().add_listener_once(instance, event, handler)
}

/// DOM-style subscription on the global registry.
pub fn add_dom_listener<T>(
    target: &T,
    event: &str,
    handler: impl Fn(&[Value]) + 'static,
    capture: bool,
) -> ListenerHandle
where
    T: EventTarget + Clone + 'static,
{
    EventRegistry::global().add_dom_listener(target, event, handler, capture)
}

/// One-shot DOM-style subscription on the global registry.
pub fn add_dom_listener_once<T>(
    target: &T,
    event: &str,
    handler: impl Fn(&[Value]) + 'static,
    capture: bool,
) -> ListenerHandle
where
    T: EventTarget + Clone + 'static,
{
    EventRegistry::global().add_dom_listener_once(target, event, handler, capture)
}

pub fn clear_listeners(instance: impl Instance, event: &str) {
    EventRegistry::global().clear_listeners(instance, event);
}

pub fn clear_instance_listeners(instance: impl Instance) {
    EventRegistry::global().clear_instance_listeners(instance);
}

/// Same as [`ListenerHandle::remove`].
pub fn remove_listener(handle: &ListenerHandle) {
    handle.remove();
}

pub fn trigger(instance: impl Instance, event: &str, args: &[Value]) {
    EventRegistry::global().trigger(instance, event, args);
}
