#![forbid(unsafe_code)]

//! Per-instance, per-event listener bookkeeping.
//!
//! # Design
//!
//! Listeners live in buckets keyed by `(InstanceId, event name)`. Each bucket
//! maps a [`ListenerId`] to `Option<Handler>`; `None` is a tombstone.
//!
//! Dispatch copies the live handlers of a bucket into a snapshot before
//! invoking any of them, and never holds a `RefCell` borrow while user code
//! runs. Handlers may therefore subscribe, unsubscribe, clear buckets or
//! trigger other events freely:
//!
//! - a handler added mid-dispatch does not run in the current pass,
//! - a handler removed mid-dispatch still runs in the current pass,
//! - removals made while any dispatch is in flight only tombstone the entry;
//!   the outermost dispatch sweeps tombstones when it returns.
//!
//! # Performance
//!
//! | Operation        | Complexity                         |
//! |------------------|------------------------------------|
//! | `add_listener`   | O(log L) where L = bucket size      |
//! | `remove`         | O(log L)                            |
//! | `trigger`        | O(L) snapshot + L handler calls     |
//! | sweep            | O(size of tombstoned buckets), after the outermost dispatch |
//!
//! # Failure Modes
//!
//! - **Handler panic**: unwinds out of `trigger`. The dispatch depth guard
//!   still runs, so the registry stays usable.
//! - **Removing twice**: no-op.

use std::cell::{Cell, OnceCell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use super::dom::{EventTarget, NativeListenerId};
use super::handle::ListenerHandle;
use crate::identity::{Instance, InstanceId};
use crate::value::Value;

/// A type-erased event handler. Receives the arguments passed to `trigger`.
pub type Handler = Rc<dyn Fn(&[Value])>;

/// Opaque token identifying one subscription.
///
/// Every subscribe call yields a fresh id, so registering the same closure
/// twice creates two independent subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// One subscription: the handler plus, for DOM-style listeners, the hook
/// that detaches it from its native source.
pub(crate) struct ListenerRecord {
    handler: Handler,
    detach: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl ListenerRecord {
    fn new(handler: Handler, detach: Option<Box<dyn FnOnce()>>) -> Rc<Self> {
        Rc::new(Self {
            handler,
            detach: RefCell::new(detach),
        })
    }

    /// Run the native detach hook, if any. Must be called outside any
    /// registry borrow.
    fn retire(&self) {
        let detach = self.detach.borrow_mut().take();
        if let Some(detach) = detach {
            detach();
        }
    }
}

type Record = Rc<ListenerRecord>;
type Bucket = BTreeMap<ListenerId, Option<Record>>;

fn retire_all(records: Vec<Record>) {
    for record in records {
        record.retire();
    }
}

#[derive(Default)]
pub(crate) struct RegistryState {
    instances: FxHashMap<InstanceId, FxHashMap<String, Bucket>>,
    next_listener: u64,
    /// Number of `trigger` calls currently on the stack.
    dispatch_depth: usize,
    /// Tombstones written since the last sweep.
    tombstones: usize,
    /// Buckets holding those tombstones. Only these are swept.
    dirty: FxHashSet<(InstanceId, String)>,
}

impl RegistryState {
    fn live_handlers(&self, instance: InstanceId, event: &str) -> Vec<Handler> {
        self.instances
            .get(&instance)
            .and_then(|events| events.get(event))
            .map(|bucket| {
                bucket
                    .values()
                    .flatten()
                    .map(|record| Rc::clone(&record.handler))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Remove or tombstone every entry selected by `event` (all events when
    /// `None`). Returns the records taken out of the table so the caller can
    /// retire them outside the borrow.
    fn take_records(&mut self, instance: InstanceId, event: Option<&str>) -> Vec<Record> {
        let dispatching = self.dispatch_depth > 0;
        let mut retired = Vec::new();
        let Some(events) = self.instances.get_mut(&instance) else {
            return retired;
        };

        if dispatching {
            let mut tombstoned = 0;
            for (name, bucket) in events.iter_mut() {
                if event.is_some_and(|e| e != name.as_str()) {
                    continue;
                }
                let before = tombstoned;
                for slot in bucket.values_mut() {
                    if let Some(record) = slot.take() {
                        retired.push(record);
                        tombstoned += 1;
                    }
                }
                if tombstoned > before {
                    self.dirty.insert((instance, name.clone()));
                }
            }
            self.tombstones += tombstoned;
            return retired;
        }

        match event {
            Some(name) => {
                if let Some(bucket) = events.remove(name) {
                    retired.extend(bucket.into_values().flatten());
                }
                if events.is_empty() {
                    self.instances.remove(&instance);
                }
            }
            None => {
                if let Some(events) = self.instances.remove(&instance) {
                    retired.extend(
                        events
                            .into_iter()
                            .flat_map(|(_, bucket)| bucket.into_values().flatten()),
                    );
                }
            }
        }
        retired
    }

    /// Drop tombstones from the buckets that received them, then any bucket
    /// or instance left empty.
    fn sweep(&mut self) -> usize {
        let swept = self.tombstones;
        for (instance, event) in std::mem::take(&mut self.dirty) {
            let Some(events) = self.instances.get_mut(&instance) else {
                continue;
            };
            if let Some(bucket) = events.get_mut(&event) {
                bucket.retain(|_, slot| slot.is_some());
                if bucket.is_empty() {
                    events.remove(&event);
                }
            }
            if events.is_empty() {
                self.instances.remove(&instance);
            }
        }
        self.tombstones = 0;
        swept
    }
}

/// Listener registry shared by every instance on a thread.
///
/// Cloning an `EventRegistry` yields another handle to the same table.
#[derive(Clone, Default)]
pub struct EventRegistry {
    inner: Rc<RefCell<RegistryState>>,
}

thread_local! {
    static GLOBAL_REGISTRY: EventRegistry = EventRegistry::new();
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        let listeners: usize = state
            .instances
            .values()
            .flat_map(|events| events.values())
            .map(|bucket| bucket.values().filter(|slot| slot.is_some()).count())
            .sum();
        f.debug_struct("EventRegistry")
            .field("instances", &state.instances.len())
            .field("listeners", &listeners)
            .field("dispatch_depth", &state.dispatch_depth)
            .field("tombstones", &state.tombstones)
            .finish()
    }
}

impl EventRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry used by attribute stores, arrays and the free functions
    /// in [`crate::event`] (thread-local).
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_REGISTRY.with(Clone::clone)
    }

    pub(crate) fn from_inner(inner: Rc<RefCell<RegistryState>>) -> Self {
        Self { inner }
    }

    /// Subscribe `handler` to `event` on `instance`.
    pub fn add_listener(
        &self,
        instance: impl Instance,
        event: &str,
        handler: impl Fn(&[Value]) + 'static,
    ) -> ListenerHandle {
        let instance = instance.instance_id();
        let id = self.insert(instance, event, ListenerRecord::new(Rc::new(handler), None));
        ListenerHandle::new(Rc::downgrade(&self.inner), instance, event, id)
    }

    /// Subscribe `handler` so that it runs on the first trigger only.
    ///
    /// The subscription is removed before `handler` runs. Even if the first
    /// trigger re-enters dispatch for the same event, `handler` runs once.
    pub fn add_listener_once(
        &self,
        instance: impl Instance,
        event: &str,
        handler: impl Fn(&[Value]) + 'static,
    ) -> ListenerHandle {
        let instance = instance.instance_id();
        subscribe_once(handler, |wrapped| {
            let id = self.insert(instance, event, ListenerRecord::new(wrapped, None));
            ListenerHandle::new(Rc::downgrade(&self.inner), instance, event, id)
        })
    }

    /// Subscribe `handler` to `event` on `target`, and attach it as a native
    /// listener on the target as well. Removing the returned handle detaches
    /// both.
    pub fn add_dom_listener<T>(
        &self,
        target: &T,
        event: &str,
        handler: impl Fn(&[Value]) + 'static,
        capture: bool,
    ) -> ListenerHandle
    where
        T: EventTarget + Clone + 'static,
    {
        self.insert_dom(target, event, Rc::new(handler), capture)
    }

    /// [`add_dom_listener`](Self::add_dom_listener) that removes itself after
    /// the first delivery, whether that came from the native side or from
    /// [`trigger`](Self::trigger).
    pub fn add_dom_listener_once<T>(
        &self,
        target: &T,
        event: &str,
        handler: impl Fn(&[Value]) + 'static,
        capture: bool,
    ) -> ListenerHandle
    where
        T: EventTarget + Clone + 'static,
    {
        subscribe_once(handler, |wrapped| {
            self.insert_dom(target, event, wrapped, capture)
        })
    }

    fn insert_dom<T>(&self, target: &T, event: &str, handler: Handler, capture: bool) -> ListenerHandle
    where
        T: EventTarget + Clone + 'static,
    {
        let instance = target.instance_id();
        let native: NativeListenerId = target.attach(event, Rc::clone(&handler), capture);
        let detach_target = target.clone();
        let detach_event = event.to_owned();
        let detach: Box<dyn FnOnce()> =
            Box::new(move || detach_target.detach(&detach_event, native, capture));
        let id = self.insert(instance, event, ListenerRecord::new(handler, Some(detach)));
        ListenerHandle::new(Rc::downgrade(&self.inner), instance, event, id)
    }

    fn insert(&self, instance: InstanceId, event: &str, record: Record) -> ListenerId {
        let mut state = self.inner.borrow_mut();
        state.next_listener += 1;
        let id = ListenerId(state.next_listener);
        state
            .instances
            .entry(instance)
            .or_default()
            .entry(event.to_owned())
            .or_default()
            .insert(id, Some(record));
        tracing::trace!(%instance, event, listener = id.0, "listener added");
        id
    }

    /// Remove one subscription, detaching its native side if it has one.
    /// Returns `false` if it was already gone.
    pub(crate) fn remove(&self, instance: InstanceId, event: &str, id: ListenerId) -> bool {
        let retired = {
            let mut state = self.inner.borrow_mut();
            let dispatching = state.dispatch_depth > 0;
            let Some(events) = state.instances.get_mut(&instance) else {
                return false;
            };
            let Some(bucket) = events.get_mut(event) else {
                return false;
            };
            let retired = if dispatching {
                bucket.get_mut(&id).and_then(Option::take)
            } else {
                let retired = bucket.remove(&id).flatten();
                if bucket.is_empty() {
                    events.remove(event);
                    if events.is_empty() {
                        state.instances.remove(&instance);
                    }
                }
                retired
            };
            if dispatching && retired.is_some() {
                state.tombstones += 1;
                state.dirty.insert((instance, event.to_owned()));
            }
            retired
        };
        match retired {
            Some(record) => {
                tracing::trace!(%instance, event, listener = id.0, "listener removed");
                record.retire();
                true
            }
            None => false,
        }
    }

    /// Remove every listener for `event` on `instance`. DOM-style listeners
    /// are detached from their native source as well.
    pub fn clear_listeners(&self, instance: impl Instance, event: &str) {
        let instance = instance.instance_id();
        let retired = self.inner.borrow_mut().take_records(instance, Some(event));
        tracing::trace!(%instance, event, count = retired.len(), "listeners cleared");
        retire_all(retired);
    }

    /// Remove every listener of every event on `instance`.
    pub fn clear_instance_listeners(&self, instance: impl Instance) {
        let instance = instance.instance_id();
        let retired = self.inner.borrow_mut().take_records(instance, None);
        tracing::trace!(%instance, count = retired.len(), "instance listeners cleared");
        retire_all(retired);
    }

    /// Invoke every live listener for `event` on `instance` with `args`.
    ///
    /// Listeners are taken from a snapshot made before the first one runs.
    pub fn trigger(&self, instance: impl Instance, event: &str, args: &[Value]) {
        let instance = instance.instance_id();
        let handlers = self.inner.borrow().live_handlers(instance, event);
        if handlers.is_empty() {
            return;
        }
        tracing::trace!(%instance, event, listeners = handlers.len(), "dispatch");
        let _guard = DispatchGuard::enter(&self.inner);
        for handler in &handlers {
            handler(args);
        }
    }

    /// Whether any live listener exists for `event` on `instance`.
    #[must_use]
    pub fn has_listeners(&self, instance: impl Instance, event: &str) -> bool {
        self.listener_count(instance, event) > 0
    }

    /// Number of live (non-tombstoned) listeners for `event` on `instance`.
    #[must_use]
    pub fn listener_count(&self, instance: impl Instance, event: &str) -> usize {
        let instance = instance.instance_id();
        self.inner
            .borrow()
            .instances
            .get(&instance)
            .and_then(|events| events.get(event))
            .map_or(0, |bucket| bucket.values().filter(|s| s.is_some()).count())
    }

    /// Number of entries, tombstones included, stored for `event` on
    /// `instance`.
    #[must_use]
    pub fn slot_count(&self, instance: impl Instance, event: &str) -> usize {
        let instance = instance.instance_id();
        self.inner
            .borrow()
            .instances
            .get(&instance)
            .and_then(|events| events.get(event))
            .map_or(0, BTreeMap::len)
    }

    pub(crate) fn contains(&self, instance: InstanceId, event: &str, id: ListenerId) -> bool {
        self.inner
            .borrow()
            .instances
            .get(&instance)
            .and_then(|events| events.get(event))
            .and_then(|bucket| bucket.get(&id))
            .is_some_and(Option::is_some)
    }

    /// Whether any bucket, live or tombstoned, exists for `instance`.
    #[must_use]
    pub fn has_instance(&self, instance: impl Instance) -> bool {
        self.inner
            .borrow()
            .instances
            .contains_key(&instance.instance_id())
    }
}

/// Tracks dispatch nesting; the outermost exit sweeps tombstones.
struct DispatchGuard<'a> {
    state: &'a RefCell<RegistryState>,
}

impl<'a> DispatchGuard<'a> {
    fn enter(state: &'a RefCell<RegistryState>) -> Self {
        state.borrow_mut().dispatch_depth += 1;
        Self { state }
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.dispatch_depth -= 1;
        if state.dispatch_depth == 0 && state.tombstones > 0 {
            let swept = state.sweep();
            tracing::debug!(swept, "tombstones swept");
        }
    }
}

/// Wrap `handler` so that it unsubscribes itself and runs at most once, then
/// register the wrapper with `register`.
fn subscribe_once(
    handler: impl Fn(&[Value]) + 'static,
    register: impl FnOnce(Handler) -> ListenerHandle,
) -> ListenerHandle {
    let slot: Rc<OnceCell<ListenerHandle>> = Rc::new(OnceCell::new());
    let fired = Cell::new(false);
    let own_handle = Rc::clone(&slot);
    let wrapped: Handler = Rc::new(move |args: &[Value]| {
        if fired.replace(true) {
            return;
        }
        if let Some(handle) = own_handle.get() {
            handle.remove();
        }
        handler(args);
    });
    let handle = register(wrapped);
    // The cell is fresh, so this cannot fail.
    let _ = slot.set(handle.clone());
    handle
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<Cell<u32>>, impl Fn(&[Value]) + 'static) {
        let count = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&count);
        (count, move |_: &[Value]| c.set(c.get() + 1))
    }

    #[test]
    fn trigger_invokes_each_listener_once() {
        let reg = EventRegistry::new();
        let id = InstanceId::next();
        let (a, fa) = counter();
        let (b, fb) = counter();
        let _ha = reg.add_listener(id, "click", fa);
        let _hb = reg.add_listener(id, "click", fb);

        reg.trigger(id, "click", &[]);
        assert_eq!((a.get(), b.get()), (1, 1));
    }

    #[test]
    fn trigger_passes_arguments() {
        let reg = EventRegistry::new();
        let id = InstanceId::next();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _h = reg.add_listener(id, "moved", move |args| {
            s.borrow_mut().extend_from_slice(args);
        });

        reg.trigger(id, "moved", &[Value::from(1), Value::from("x")]);
        assert_eq!(*seen.borrow(), vec![Value::Int(1), Value::from("x")]);
    }

    #[test]
    fn buckets_are_per_instance_and_event() {
        let reg = EventRegistry::new();
        let (id1, id2) = (InstanceId::next(), InstanceId::next());
        let (count, f) = counter();
        let _h = reg.add_listener(id1, "a", f);

        reg.trigger(id2, "a", &[]);
        reg.trigger(id1, "b", &[]);
        assert_eq!(count.get(), 0);
        reg.trigger(id1, "a", &[]);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn same_handler_registered_twice_is_two_subscriptions() {
        let reg = EventRegistry::new();
        let id = InstanceId::next();
        let count = Rc::new(Cell::new(0u32));
        let handler: Handler = {
            let c = Rc::clone(&count);
            Rc::new(move |_: &[Value]| c.set(c.get() + 1))
        };
        let h1 = reg.add_listener(id, "e", {
            let h = Rc::clone(&handler);
            move |args: &[Value]| h(args)
        });
        let _h2 = reg.add_listener(id, "e", {
            let h = Rc::clone(&handler);
            move |args: &[Value]| h(args)
        });

        reg.trigger(id, "e", &[]);
        assert_eq!(count.get(), 2);

        h1.remove();
        reg.trigger(id, "e", &[]);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn removal_during_dispatch_tombstones_then_sweeps() {
        let reg = EventRegistry::new();
        let id = InstanceId::next();
        let (b_count, fb) = counter();
        let slot: Rc<RefCell<Option<ListenerHandle>>> = Rc::new(RefCell::new(None));

        let s = Rc::clone(&slot);
        let r = reg.clone();
        let _a = reg.add_listener(id, "e", move |_| {
            let Some(h) = s.borrow_mut().take() else {
                return;
            };
            h.remove();
            // Tombstoned, not deleted, while dispatch is running.
            assert_eq!(r.slot_count(id, "e"), 2);
            assert_eq!(r.listener_count(id, "e"), 1);
        });
        *slot.borrow_mut() = Some(reg.add_listener(id, "e", fb));

        reg.trigger(id, "e", &[]);
        // Snapshot isolation: the removed listener still ran this pass.
        assert_eq!(b_count.get(), 1);
        assert_eq!(reg.slot_count(id, "e"), 1);

        reg.trigger(id, "e", &[]);
        assert_eq!(b_count.get(), 1);
    }

    #[test]
    fn sweep_visits_only_tombstoned_buckets() {
        let reg = EventRegistry::new();
        let bystanders: Vec<InstanceId> = (0..64).map(|_| InstanceId::next()).collect();
        for &other in &bystanders {
            let _ = reg.add_listener(other, "e", |_| {});
            let _ = reg.add_listener(other, "f", |_| {});
        }

        let id = InstanceId::next();
        let r = reg.clone();
        let _once = reg.add_listener_once(id, "e", move |_| {
            let state = r.inner.borrow();
            assert_eq!(state.dirty.len(), 1);
            assert!(state.dirty.contains(&(id, "e".to_owned())));
        });
        let _keep = reg.add_listener(id, "f", |_| {});

        reg.trigger(id, "e", &[]);
        {
            let state = reg.inner.borrow();
            assert!(state.dirty.is_empty());
            assert_eq!(state.tombstones, 0);
        }
        assert_eq!(reg.slot_count(id, "e"), 0);
        assert_eq!(reg.slot_count(id, "f"), 1);
        for &other in &bystanders {
            assert_eq!(reg.slot_count(other, "e"), 1);
            assert_eq!(reg.slot_count(other, "f"), 1);
        }
    }

    #[test]
    fn clear_during_dispatch_marks_each_cleared_bucket() {
        let reg = EventRegistry::new();
        let id = InstanceId::next();
        let _f = reg.add_listener(id, "f", |_| {});
        let _g = reg.add_listener(id, "g", |_| {});
        let r = reg.clone();
        let _e = reg.add_listener(id, "e", move |_| {
            r.clear_instance_listeners(id);
            assert_eq!(r.inner.borrow().dirty.len(), 3);
        });

        reg.trigger(id, "e", &[]);
        assert!(!reg.has_instance(id));
        assert!(reg.inner.borrow().dirty.is_empty());
    }

    #[test]
    fn listener_added_during_dispatch_waits_for_next_pass() {
        let reg = EventRegistry::new();
        let id = InstanceId::next();
        let (late, f_late) = counter();
        let pending = Rc::new(RefCell::new(Some(f_late)));

        let r = reg.clone();
        let p = Rc::clone(&pending);
        let _h = reg.add_listener(id, "e", move |_| {
            if let Some(f) = p.borrow_mut().take() {
                let _ = r.add_listener(id, "e", f);
            }
        });

        reg.trigger(id, "e", &[]);
        assert_eq!(late.get(), 0);
        reg.trigger(id, "e", &[]);
        assert_eq!(late.get(), 1);
    }

    #[test]
    fn once_fires_exactly_once() {
        let reg = EventRegistry::new();
        let id = InstanceId::next();
        let (count, f) = counter();
        let _h = reg.add_listener_once(id, "e", f);

        for _ in 0..5 {
            reg.trigger(id, "e", &[]);
        }
        assert_eq!(count.get(), 1);
        assert!(!reg.has_listeners(id, "e"));
    }

    #[test]
    fn once_survives_reentrant_trigger() {
        let reg = EventRegistry::new();
        let id = InstanceId::next();
        let (count, f) = counter();

        let r = reg.clone();
        let depth = Rc::new(Cell::new(0));
        let d = Rc::clone(&depth);
        let _outer = reg.add_listener(id, "e", move |_| {
            if d.replace(d.get() + 1) == 0 {
                r.trigger(id, "e", &[]);
            }
        });
        let _once = reg.add_listener_once(id, "e", f);

        reg.trigger(id, "e", &[]);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn once_removed_before_firing_never_fires() {
        let reg = EventRegistry::new();
        let id = InstanceId::next();
        let (count, f) = counter();
        let h = reg.add_listener_once(id, "e", f);
        h.remove();
        reg.trigger(id, "e", &[]);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn clear_listeners_only_touches_one_event() {
        let reg = EventRegistry::new();
        let id = InstanceId::next();
        let (a, fa) = counter();
        let (b, fb) = counter();
        let _ha = reg.add_listener(id, "a", fa);
        let _hb = reg.add_listener(id, "b", fb);

        reg.clear_listeners(id, "a");
        reg.trigger(id, "a", &[]);
        reg.trigger(id, "b", &[]);
        assert_eq!((a.get(), b.get()), (0, 1));
    }

    #[test]
    fn clear_instance_listeners_discards_bucket() {
        let reg = EventRegistry::new();
        let id = InstanceId::next();
        let (count, f) = counter();
        let _h = reg.add_listener(id, "a", f);
        let _h2 = reg.add_listener(id, "b", |_| {});
        assert!(reg.has_instance(id));

        reg.clear_instance_listeners(id);
        assert!(!reg.has_instance(id));
        reg.trigger(id, "a", &[]);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn clear_instance_during_dispatch_is_swept_afterwards() {
        let reg = EventRegistry::new();
        let id = InstanceId::next();
        let (count, f) = counter();
        let r = reg.clone();
        let _h = reg.add_listener(id, "a", move |_| r.clear_instance_listeners(id));
        let _h2 = reg.add_listener(id, "a", f);

        reg.trigger(id, "a", &[]);
        assert_eq!(count.get(), 1);
        assert!(!reg.has_instance(id));
    }

    #[test]
    fn double_remove_is_noop() {
        let reg = EventRegistry::new();
        let id = InstanceId::next();
        let h = reg.add_listener(id, "e", |_| {});
        h.remove();
        h.remove();
        assert_eq!(reg.listener_count(id, "e"), 0);
    }

    #[test]
    fn global_is_shared_per_thread() {
        let id = InstanceId::next();
        let h = EventRegistry::global().add_listener(id, "e", |_| {});
        assert!(EventRegistry::global().has_listeners(id, "e"));
        h.remove();
        assert!(!EventRegistry::global().has_listeners(id, "e"));
    }

    #[test]
    fn debug_format() {
        let reg = EventRegistry::new();
        let _h = reg.add_listener(InstanceId::next(), "e", |_| {});
        let dbg = format!("{reg:?}");
        assert!(dbg.contains("listeners: 1"));
    }
}
