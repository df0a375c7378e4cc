#![forbid(unsafe_code)]

//! DOM-style listeners: registry bookkeeping plus a native subscription.
//!
//! The runtime never touches a real DOM. Anything that can deliver native
//! events implements [`EventTarget`]; [`EventRegistry::add_dom_listener`]
//! attaches the handler there and records it in the registry, so the handler
//! fires both for native events and for [`EventRegistry::trigger`] on the
//! target's instance id. Removing the subscription, through its handle or
//! through the registry's clear operations, detaches the native side too.
//!
//! [`EventRegistry::add_dom_listener`]: super::EventRegistry::add_dom_listener
//! [`EventRegistry::trigger`]: super::EventRegistry::trigger

use super::registry::Handler;
use crate::identity::Instance;

/// Token a native event source hands out for one attached callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeListenerId(pub u64);

/// A native event source.
pub trait EventTarget: Instance {
    /// Start delivering `event` to `callback`.
    fn attach(&self, event: &str, callback: Handler, capture: bool) -> NativeListenerId;

    /// Stop delivering to the callback registered as `id`. Unknown ids are
    /// ignored.
    fn detach(&self, event: &str, id: NativeListenerId, capture: bool);
}
