//! Debugging session records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::event::EventKind;

/// One entry in a session's event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Kind of the recorded event.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Payload exactly as submitted.
    pub data: Value,
}

impl SessionEvent {
    #[must_use]
    pub const fn new(kind: EventKind, data: Value) -> Self {
        Self { kind, data }
    }
}

/// One debugging run, from its start event to its (optional) termination.
///
/// Header fields (`id`, `name`, `type`, `startTime`, `endTime`) are copied
/// from the lifecycle payloads as submitted, whatever their JSON type, and
/// are null when the payload lacks them.
///
/// `variables`, `stack` and `breakpoints` hold the last submitted payload
/// verbatim. Well-behaved clients send a mapping for `variables`, frames as
/// `{id, name, line, source}` and breakpoints as
/// `{id, enabled, condition, hitCondition, logMessage}`, but nothing here
/// depends on that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Client-supplied run identifier. Not checked for uniqueness.
    pub id: Value,
    /// Launch configuration name.
    pub name: Value,
    /// Debug adapter type (e.g. `debugpy`).
    #[serde(rename = "type")]
    pub adapter_type: Value,
    /// Timestamp from the start event.
    pub start_time: Value,
    /// Timestamp from the termination event, null while running or abandoned.
    pub end_time: Value,
    /// Every event recorded for this run, in arrival order.
    pub events: Vec<SessionEvent>,
    /// Last variable snapshot.
    pub variables: Value,
    /// Last stack trace.
    pub stack: Value,
    /// Last breakpoint list.
    pub breakpoints: Value,
}

impl Session {
    /// Create a session from a `sessionStarted` payload.
    ///
    /// The start event itself is the first entry of the event log.
    #[must_use]
    pub fn start(payload: Value) -> Self {
        let mut session = Self {
            id: field(&payload, "id"),
            name: field(&payload, "name"),
            adapter_type: field(&payload, "type"),
            start_time: field(&payload, "timestamp"),
            end_time: Value::Null,
            events: Vec::new(),
            variables: Value::Object(Map::new()),
            stack: Value::Array(Vec::new()),
            breakpoints: Value::Array(Vec::new()),
        };
        session.record(EventKind::SessionStarted, payload);
        session
    }

    /// Close the session with a `sessionTerminated` payload.
    pub fn terminate(&mut self, payload: Value) {
        self.end_time = field(&payload, "timestamp");
        self.record(EventKind::SessionTerminated, payload);
    }

    /// Replace the variable snapshot and log the update.
    pub fn set_variables(&mut self, variables: Value) {
        self.variables = variables.clone();
        self.record(EventKind::Variables, variables);
    }

    /// Replace the stack trace and log the update.
    pub fn set_stack(&mut self, stack: Value) {
        self.stack = stack.clone();
        self.record(EventKind::Stack, stack);
    }

    /// Replace the breakpoint list and log the update.
    pub fn set_breakpoints(&mut self, breakpoints: Value) {
        self.breakpoints = breakpoints.clone();
        self.record(EventKind::Breakpoints, breakpoints);
    }

    /// Append an event to the log without touching any other field.
    pub fn record(&mut self, kind: EventKind, data: Value) {
        self.events.push(SessionEvent::new(kind, data));
    }

    /// Whether a termination event has been recorded.
    ///
    /// Independent of `end_time`, which stays null when the termination
    /// payload carries no timestamp.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.events
            .iter()
            .any(|e| e.kind == EventKind::SessionTerminated)
    }
}

/// Payload field as submitted, null when missing or the payload is not an
/// object.
fn field(payload: &Value, key: &str) -> Value {
    payload.get(key).cloned().unwrap_or(Value::Null)
}
