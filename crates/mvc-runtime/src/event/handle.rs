#![forbid(unsafe_code)]

//! Disposable subscription handles.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::registry::{EventRegistry, ListenerId, RegistryState};
use crate::identity::InstanceId;

/// Handle returned by every subscribe call.
///
/// Unlike an RAII guard, dropping a `ListenerHandle` does **not** unsubscribe;
/// listener lifetime is managed explicitly through [`remove`](Self::remove)
/// or the registry's clear operations. Clones refer to the same subscription.
#[derive(Clone)]
pub struct ListenerHandle {
    inner: Rc<HandleInner>,
}

struct HandleInner {
    registry: Weak<RefCell<RegistryState>>,
    instance: InstanceId,
    event: String,
    id: ListenerId,
}

impl ListenerHandle {
    pub(crate) fn new(
        registry: Weak<RefCell<RegistryState>>,
        instance: InstanceId,
        event: &str,
        id: ListenerId,
    ) -> Self {
        Self {
            inner: Rc::new(HandleInner {
                registry,
                instance,
                event: event.to_owned(),
                id,
            }),
        }
    }

    /// Unsubscribe. Detaches the native listener too, if there is one.
    /// Calling this more than once is a no-op.
    pub fn remove(&self) {
        if let Some(state) = self.inner.registry.upgrade() {
            EventRegistry::from_inner(state).remove(
                self.inner.instance,
                &self.inner.event,
                self.inner.id,
            );
        }
    }

    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.inner.id
    }

    #[must_use]
    pub fn instance(&self) -> InstanceId {
        self.inner.instance
    }

    #[must_use]
    pub fn event_name(&self) -> &str {
        &self.inner.event
    }

    /// Whether this subscription is still live in its registry.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.registry.upgrade().is_some_and(|state| {
            EventRegistry::from_inner(state).contains(
                self.inner.instance,
                &self.inner.event,
                self.inner.id,
            )
        })
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("instance", &self.inner.instance)
            .field("event", &self.inner.event)
            .field("id", &self.inner.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn remove_deactivates() {
        let reg = EventRegistry::new();
        let h = reg.add_listener(InstanceId::next(), "e", |_: &[Value]| {});
        assert!(h.is_active());
        h.remove();
        assert!(!h.is_active());
    }

    #[test]
    fn clone_refers_to_same_subscription() {
        let reg = EventRegistry::new();
        let h = reg.add_listener(InstanceId::next(), "e", |_: &[Value]| {});
        let h2 = h.clone();
        h2.remove();
        assert!(!h.is_active());
        assert_eq!(h.id(), h2.id());
    }

    #[test]
    fn drop_does_not_unsubscribe() {
        let reg = EventRegistry::new();
        let id = InstanceId::next();
        drop(reg.add_listener(id, "e", |_: &[Value]| {}));
        assert_eq!(reg.listener_count(id, "e"), 1);
    }

    #[test]
    fn remove_after_registry_dropped_is_harmless() {
        let reg = EventRegistry::new();
        let h = reg.add_listener(InstanceId::next(), "e", |_: &[Value]| {});
        drop(reg);
        h.remove();
        assert!(!h.is_active());
    }

    #[test]
    fn debug_format() {
        let reg = EventRegistry::new();
        let h = reg.add_listener(InstanceId::next(), "clicked", |_: &[Value]| {});
        let dbg = format!("{h:?}");
        assert!(dbg.contains("clicked"));
        assert!(dbg.contains("active: true"));
    }
}
