#![forbid(unsafe_code)]

//! Attribute observation and property binding for single-threaded UI models.
//!
//! Provides key/value attribute stores whose keys can be bound to keys on
//! other stores, change notification that walks binding chains depth-first,
//! a per-instance named event registry, and an observable array that reports
//! every indexed mutation.

pub mod array;
pub mod config;
pub mod error;
pub mod event;
pub mod identity;
pub mod object;
pub mod value;

pub use array::{MvcArray, MvcArrayBuilder};
pub use config::RuntimeConfig;
pub use error::BindError;
pub use event::{EventRegistry, ListenerHandle, ListenerId};
pub use identity::{Instance, InstanceId};
pub use object::MvcObject;
pub use object::properties::PropertyTable;
pub use object::propagation::changed_event_name;
pub use value::Value;
