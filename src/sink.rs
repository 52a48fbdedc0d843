//! Event sinks.
//!
//! The joystick layer receives events through [`JoystickSink`]. Besides plain
//! closures this module provides:
//! - [`EventLog`], which records events (handy for tests and replay),
//! - [`LogSink`], which writes every event to the `log` facade,
//! - [`FilteredSink`], a predicate wrapper,
//! - [`SinkBus`], a fan-out to several sinks with per-entry filters.

use crate::event::{InstanceId, JoystickEvent};
use std::collections::BTreeMap;

/// Receiver of normalized joystick events.
pub trait JoystickSink {
    fn on_event(&mut self, event: &JoystickEvent);
}

impl<F: FnMut(&JoystickEvent)> JoystickSink for F {
    fn on_event(&mut self, event: &JoystickEvent) {
        self(event)
    }
}

/// Records every event in arrival order.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<JoystickEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[JoystickEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take the recorded events, leaving the log empty.
    pub fn drain(&mut self) -> Vec<JoystickEvent> {
        std::mem::take(&mut self.events)
    }

    /// Instance ids of all `DeviceAdded` events, in order.
    pub fn added(&self) -> Vec<InstanceId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                JoystickEvent::DeviceAdded { instance_id } => Some(*instance_id),
                _ => None,
            })
            .collect()
    }

    /// Instance ids of all `DeviceRemoved` events, in order.
    pub fn removed(&self) -> Vec<InstanceId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                JoystickEvent::DeviceRemoved { instance_id } => Some(*instance_id),
                _ => None,
            })
            .collect()
    }
}

impl JoystickSink for EventLog {
    fn on_event(&mut self, event: &JoystickEvent) {
        self.events.push(event.clone());
    }
}

/// Logs every event at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl JoystickSink for LogSink {
    fn on_event(&mut self, event: &JoystickEvent) {
        log::debug!("[joystick] {:?}", event);
    }
}

/// Forwards only the events accepted by a predicate.
pub struct FilteredSink<S> {
    predicate: Box<dyn Fn(&JoystickEvent) -> bool + Send + Sync>,
    inner: S,
}

impl<S: JoystickSink> FilteredSink<S> {
    pub fn new(predicate: impl Fn(&JoystickEvent) -> bool + Send + Sync + 'static, inner: S) -> Self {
        Self {
            predicate: Box::new(predicate),
            inner,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: JoystickSink> JoystickSink for FilteredSink<S> {
    fn on_event(&mut self, event: &JoystickEvent) {
        if (self.predicate)(event) {
            self.inner.on_event(event);
        }
    }
}

/// Which kinds of events a [`SinkBus`] entry wants.
#[derive(Debug, Clone, Copy)]
pub enum EventFilter {
    All,
    AxesOnly,
    ButtonsOnly,
    /// Added/removed only.
    Lifecycle,
    Custom(fn(&JoystickEvent) -> bool),
}

impl EventFilter {
    fn accepts(&self, event: &JoystickEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::AxesOnly => matches!(event, JoystickEvent::AxisMoved { .. }),
            EventFilter::ButtonsOnly => matches!(event, JoystickEvent::ButtonChanged { .. }),
            EventFilter::Lifecycle => event.is_lifecycle(),
            EventFilter::Custom(f) => f(event),
        }
    }
}

/// Identifier returned by [`SinkBus::add_sink`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SinkId(pub u64);

struct SinkEntry {
    sink: Box<dyn JoystickSink + Send>,
    enabled: bool,
    filter: EventFilter,
    /// Only events for this device, if set.
    tag: Option<InstanceId>,
}

/// Fan-out sink. Entries are visited in registration order.
#[derive(Default)]
pub struct SinkBus {
    next_id: u64,
    sinks: BTreeMap<SinkId, SinkEntry>,
}

impl SinkBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink with a filter and optional device tag.
    pub fn add_sink(
        &mut self,
        sink: impl JoystickSink + Send + 'static,
        filter: EventFilter,
        tag: Option<InstanceId>,
    ) -> SinkId {
        let id = SinkId(self.next_id);
        self.next_id += 1;
        self.sinks.insert(
            id,
            SinkEntry {
                sink: Box::new(sink),
                enabled: true,
                filter,
                tag,
            },
        );
        id
    }

    pub fn enable(&mut self, id: SinkId) {
        if let Some(entry) = self.sinks.get_mut(&id) {
            entry.enabled = true;
        }
    }

    /// Mute a sink without removing it.
    pub fn disable(&mut self, id: SinkId) {
        if let Some(entry) = self.sinks.get_mut(&id) {
            entry.enabled = false;
        }
    }

    /// Unregister a sink, handing it back.
    pub fn remove_sink(&mut self, id: SinkId) -> Option<Box<dyn JoystickSink + Send>> {
        self.sinks.remove(&id).map(|entry| entry.sink)
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl JoystickSink for SinkBus {
    fn on_event(&mut self, event: &JoystickEvent) {
        for entry in self.sinks.values_mut() {
            if !entry.enabled {
                continue;
            }
            if let Some(wanted) = entry.tag {
                if event.instance_id() != wanted {
                    continue;
                }
            }
            if entry.filter.accepts(event) {
                entry.sink.on_event(event);
            }
        }
    }
}
