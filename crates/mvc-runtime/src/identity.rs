#![forbid(unsafe_code)]

//! Instance identity shared by the binding graph and the event registry.
//!
//! Every attribute store, observable array and event target carries one
//! [`InstanceId`], assigned eagerly when the instance is created. The same id
//! keys both the reverse binding index and the listener buckets.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-unique identity of an event-bearing instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Allocate a fresh id. Ids are monotonic and never reused.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, for logging.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Anything that can own listener buckets.
pub trait Instance {
    /// The identity under which listeners for this instance are stored.
    fn instance_id(&self) -> InstanceId;
}

impl Instance for InstanceId {
    fn instance_id(&self) -> InstanceId {
        *self
    }
}

impl<T: Instance + ?Sized> Instance for &T {
    fn instance_id(&self) -> InstanceId {
        (**self).instance_id()
    }
}

impl<T: Instance + ?Sized> Instance for std::rc::Rc<T> {
    fn instance_id(&self) -> InstanceId {
        (**self).instance_id()
    }
}
