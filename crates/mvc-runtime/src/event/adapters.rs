#![forbid(unsafe_code)]

//! Handler adapters that re-publish signals through the registry.
//!
//! Both adapters are pure: they capture an instance id and event name(s) and
//! return a closure. All dispatch goes through [`EventRegistry::global`].

use std::collections::BTreeMap;

use super::registry::EventRegistry;
use crate::identity::Instance;
use crate::value::Value;

/// Heterogeneous pointer input as delivered by different sources.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerSignal {
    /// A signal with no position (e.g. a synthetic activation).
    Bare,
    /// A pointer position.
    Pointer { x: f64, y: f64 },
    /// A hit-test result: the position plus whatever was hit, topmost first.
    HitTest { x: f64, y: f64, hits: Vec<Value> },
}

/// Uniform payload published for every [`PointerSignal`].
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub position: Option<(f64, f64)>,
    /// Topmost hit, if the signal was a hit test with at least one hit.
    pub target: Option<Value>,
    pub hit_count: usize,
}

impl PointerEvent {
    /// Normalize a signal.
    #[must_use]
    pub fn from_signal(signal: &PointerSignal) -> Self {
        match signal {
            PointerSignal::Bare => Self {
                position: None,
                target: None,
                hit_count: 0,
            },
            PointerSignal::Pointer { x, y } => Self {
                position: Some((*x, *y)),
                target: None,
                hit_count: 0,
            },
            PointerSignal::HitTest { x, y, hits } => Self {
                position: Some((*x, *y)),
                target: hits.first().cloned(),
                hit_count: hits.len(),
            },
        }
    }

    /// Encode as a map value with keys `x`, `y`, `target` and `hit_count`.
    /// Missing fields are [`Value::Null`].
    #[must_use]
    pub fn to_value(&self) -> Value {
        let (x, y) = match self.position {
            Some((x, y)) => (Value::Float(x), Value::Float(y)),
            None => (Value::Null, Value::Null),
        };
        let mut map = BTreeMap::new();
        map.insert("x".to_owned(), x);
        map.insert("y".to_owned(), y);
        map.insert(
            "target".to_owned(),
            self.target.clone().unwrap_or(Value::Null),
        );
        map.insert("hit_count".to_owned(), Value::from(self.hit_count));
        Value::Map(map)
    }

    /// Decode a payload produced by [`to_value`](Self::to_value).
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_map()?;
        let position = match (
            map.get("x").and_then(Value::as_float),
            map.get("y").and_then(Value::as_float),
        ) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        };
        let target = map.get("target").filter(|v| !v.is_null()).cloned();
        let hit_count = map
            .get("hit_count")
            .and_then(Value::as_int)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        Some(Self {
            position,
            target,
            hit_count,
        })
    }
}

/// Build a handler that normalizes pointer signals and triggers `event` on
/// `instance` with the [`PointerEvent`] payload as the single argument.
pub fn pointer_forwarder(
    instance: impl Instance,
    event: impl Into<String>,
) -> impl Fn(&PointerSignal) + 'static {
    let instance = instance.instance_id();
    let event = event.into();
    move |signal: &PointerSignal| {
        let payload = PointerEvent::from_signal(signal).to_value();
        EventRegistry::global().trigger(instance, &event, &[payload]);
    }
}

/// Build a handler that re-triggers its arguments on `instance` under each
/// of `events`, in order.
pub fn fan_out<I, S>(instance: impl Instance, events: I) -> impl Fn(&[Value]) + 'static
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let instance = instance.instance_id();
    let events: Vec<String> = events.into_iter().map(Into::into).collect();
    move |args: &[Value]| {
        let registry = EventRegistry::global();
        for event in &events {
            registry.trigger(instance, event, args);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::identity::InstanceId;

    fn recorder(instance: InstanceId, event: &str) -> Rc<RefCell<Vec<Vec<Value>>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let _ = EventRegistry::global().add_listener(instance, event, move |args| {
            l.borrow_mut().push(args.to_vec());
        });
        log
    }

    #[test]
    fn pointer_signals_normalize() {
        let bare = PointerEvent::from_signal(&PointerSignal::Bare);
        assert_eq!(bare.position, None);

        let hit = PointerEvent::from_signal(&PointerSignal::HitTest {
            x: 1.0,
            y: 2.0,
            hits: vec![Value::from("top"), Value::from("below")],
        });
        assert_eq!(hit.position, Some((1.0, 2.0)));
        assert_eq!(hit.target, Some(Value::from("top")));
        assert_eq!(hit.hit_count, 2);
        assert_eq!(PointerEvent::from_value(&hit.to_value()), Some(hit));
    }

    #[test]
    fn forwarder_triggers_uniform_payload() {
        let id = InstanceId::next();
        let log = recorder(id, "click");
        let forward = pointer_forwarder(id, "click");

        forward(&PointerSignal::Pointer { x: 3.0, y: 4.0 });
        forward(&PointerSignal::Bare);

        let log = log.borrow();
        assert_eq!(log.len(), 2);
        let first = PointerEvent::from_value(&log[0][0]).unwrap();
        assert_eq!(first.position, Some((3.0, 4.0)));
        let second = PointerEvent::from_value(&log[1][0]).unwrap();
        assert_eq!(second.position, None);
        assert_eq!(second.target, None);
    }

    #[test]
    fn fan_out_publishes_each_name() {
        let id = InstanceId::next();
        let a = recorder(id, "dragend");
        let b = recorder(id, "position_changed");
        let forward = fan_out(id, ["dragend", "position_changed"]);

        forward(&[Value::from(1)]);
        assert_eq!(*a.borrow(), vec![vec![Value::from(1)]]);
        assert_eq!(*b.borrow(), vec![vec![Value::from(1)]]);
    }

    #[test]
    fn from_value_rejects_non_maps() {
        assert_eq!(PointerEvent::from_value(&Value::from(3)), None);
    }
}
