//! Classification of submitted debugger records.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of a submitted record.
///
/// Serialized with the same camelCase names the debugging client uses as
/// top-level keys, so `EventKind::Variables` travels as `"variables"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// A debugging run started.
    SessionStarted,
    /// A debugging run ended.
    SessionTerminated,
    /// Free-form adapter event (console output, stops, threads...).
    DebugEvent,
    /// Variable snapshot.
    Variables,
    /// Stack trace snapshot.
    Stack,
    /// Breakpoint list snapshot.
    Breakpoints,
    /// Anything without a recognized top-level key.
    Unrecognized,
}

impl EventKind {
    /// Recognized kinds in classification order. First key present wins.
    pub const PRECEDENCE: [Self; 6] = [
        Self::SessionStarted,
        Self::SessionTerminated,
        Self::DebugEvent,
        Self::Variables,
        Self::Stack,
        Self::Breakpoints,
    ];

    /// Top-level record key for this kind.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::SessionStarted => "sessionStarted",
            Self::SessionTerminated => "sessionTerminated",
            Self::DebugEvent => "debugEvent",
            Self::Variables => "variables",
            Self::Stack => "stack",
            Self::Breakpoints => "breakpoints",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A classified record, carrying the payload found under its key.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SessionStarted(Value),
    SessionTerminated(Value),
    DebugEvent(Value),
    Variables(Value),
    Stack(Value),
    Breakpoints(Value),
    Unrecognized,
}

impl Event {
    /// Classify a submitted record.
    ///
    /// Never fails: non-object records and objects without a recognized key
    /// are [`Event::Unrecognized`]. When several recognized keys are present,
    /// [`EventKind::PRECEDENCE`] decides.
    #[must_use]
    pub fn classify(record: &Value) -> Self {
        let Some(fields) = record.as_object() else {
            return Self::Unrecognized;
        };

        EventKind::PRECEDENCE
            .iter()
            .find_map(|kind| {
                fields
                    .get(kind.key())
                    .map(|payload| Self::with_payload(*kind, payload.clone()))
            })
            .unwrap_or(Self::Unrecognized)
    }

    fn with_payload(kind: EventKind, payload: Value) -> Self {
        match kind {
            EventKind::SessionStarted => Self::SessionStarted(payload),
            EventKind::SessionTerminated => Self::SessionTerminated(payload),
            EventKind::DebugEvent => Self::DebugEvent(payload),
            EventKind::Variables => Self::Variables(payload),
            EventKind::Stack => Self::Stack(payload),
            EventKind::Breakpoints => Self::Breakpoints(payload),
            EventKind::Unrecognized => Self::Unrecognized,
        }
    }

    /// Kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::SessionStarted(_) => EventKind::SessionStarted,
            Self::SessionTerminated(_) => EventKind::SessionTerminated,
            Self::DebugEvent(_) => EventKind::DebugEvent,
            Self::Variables(_) => EventKind::Variables,
            Self::Stack(_) => EventKind::Stack,
            Self::Breakpoints(_) => EventKind::Breakpoints,
            Self::Unrecognized => EventKind::Unrecognized,
        }
    }

    /// Payload of a recognized event.
    #[must_use]
    pub const fn payload(&self) -> Option<&Value> {
        match self {
            Self::SessionStarted(p)
            | Self::SessionTerminated(p)
            | Self::DebugEvent(p)
            | Self::Variables(p)
            | Self::Stack(p)
            | Self::Breakpoints(p) => Some(p),
            Self::Unrecognized => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_classify_each_kind() {
        let cases = [
            (json!({"sessionStarted": {"id": "s1"}}), EventKind::SessionStarted),
            (json!({"sessionTerminated": {}}), EventKind::SessionTerminated),
            (json!({"debugEvent": {"event": "output"}}), EventKind::DebugEvent),
            (json!({"variables": {"x": 1}}), EventKind::Variables),
            (json!({"stack": []}), EventKind::Stack),
            (json!({"breakpoints": []}), EventKind::Breakpoints),
        ];

        for (record, expected) in cases {
            assert_eq!(Event::classify(&record).kind(), expected, "{record}");
        }
    }

    #[test]
    fn test_classify_keeps_payload() {
        let event = Event::classify(&json!({"variables": {"x": 10, "y": 20}}));
        assert_eq!(event, Event::Variables(json!({"x": 10, "y": 20})));
    }

    #[test]
    fn test_precedence_resolves_multiple_keys() {
        let record = json!({
            "breakpoints": [],
            "variables": {"x": 1},
            "sessionTerminated": {"timestamp": "t"},
        });
        assert_eq!(
            Event::classify(&record),
            Event::SessionTerminated(json!({"timestamp": "t"}))
        );

        let record = json!({"stack": [1], "debugEvent": {"event": "stopped"}});
        assert_eq!(Event::classify(&record).kind(), EventKind::DebugEvent);
    }

    #[test]
    fn test_unknown_shapes_are_unrecognized() {
        for record in [
            json!({}),
            json!({"console": "hello"}),
            json!([{"variables": {}}]),
            json!("variables"),
            json!(42),
            Value::Null,
        ] {
            let event = Event::classify(&record);
            assert_eq!(event, Event::Unrecognized, "{record}");
            assert!(event.payload().is_none());
        }
    }

    #[test]
    fn test_null_payload_is_still_recognized() {
        let event = Event::classify(&json!({"stack": null}));
        assert_eq!(event, Event::Stack(Value::Null));
    }

    #[test]
    fn test_kind_serializes_as_record_key() {
        for kind in EventKind::PRECEDENCE {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, Value::String(kind.key().to_string()));
        }
        assert_eq!(EventKind::Unrecognized.to_string(), "unrecognized");
    }
}
