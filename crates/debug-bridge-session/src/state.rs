//! Session lifecycle state machine and read projections.

use std::sync::Arc;

use debug_bridge_core::{Event, EventKind, LatestView, Session, SessionList};
use serde_json::{Map, Value};

/// Keys `latest_view` always fills from the session history.
const RESERVED_KEYS: [&str; 2] = ["sessions", "totalSessions"];

/// What applying an event did to the session bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// A new session became active. `abandoned` is the index of a session
    /// that was still active and is now left without an end time.
    Started {
        index: usize,
        abandoned: Option<usize>,
    },
    /// The active session was closed.
    Terminated { index: usize },
    /// The event was appended to the active session.
    Recorded { index: usize },
    /// No session was active; only the latest view saw the record.
    Detached,
    /// The record had no recognized kind.
    Ignored,
}

/// Complete store state: session history, active slot and the latest view.
///
/// Callers serialize access; every method runs to completion without I/O.
/// Sessions are copy-on-write: snapshots share them, and a session is only
/// cloned when it is updated while a snapshot still holds it.
#[derive(Debug, Clone)]
pub struct StoreState {
    sessions: Vec<Arc<Session>>,
    active: Option<usize>,
    latest: Map<String, Value>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreState {
    /// Create an empty state.
    ///
    /// The latest view starts with empty `variables`, `stack` and
    /// `breakpoints` so readers that predate sessions always find them.
    #[must_use]
    pub fn new() -> Self {
        let mut latest = Map::new();
        latest.insert(EventKind::Variables.key().to_string(), Value::Object(Map::new()));
        latest.insert(EventKind::Stack.key().to_string(), Value::Array(Vec::new()));
        latest.insert(EventKind::Breakpoints.key().to_string(), Value::Array(Vec::new()));

        Self {
            sessions: Vec::new(),
            active: None,
            latest,
        }
    }

    /// Apply a classified event to the session bookkeeping.
    pub fn apply(&mut self, event: Event) -> Transition {
        match event {
            Event::SessionStarted(payload) => self.start(payload),
            Event::Unrecognized => Transition::Ignored,
            event => match self.active {
                Some(index) => self.update(index, event),
                None => Transition::Detached,
            },
        }
    }

    fn start(&mut self, payload: Value) -> Transition {
        let index = self.sessions.len();
        self.sessions.push(Arc::new(Session::start(payload)));
        let abandoned = self.active.replace(index);
        Transition::Started { index, abandoned }
    }

    fn update(&mut self, index: usize, event: Event) -> Transition {
        let session = Arc::make_mut(&mut self.sessions[index]);

        match event {
            Event::SessionTerminated(payload) => {
                session.terminate(payload);
                self.active = None;
                return Transition::Terminated { index };
            }
            Event::DebugEvent(payload) => session.record(EventKind::DebugEvent, payload),
            Event::Variables(payload) => session.set_variables(payload),
            Event::Stack(payload) => session.set_stack(payload),
            Event::Breakpoints(payload) => session.set_breakpoints(payload),
            Event::SessionStarted(_) | Event::Unrecognized => return Transition::Ignored,
        }

        Transition::Recorded { index }
    }

    /// Merge a submitted record into the latest view, last write wins per
    /// top-level key. Records that are not objects have no keys to merge.
    pub fn merge_latest(&mut self, record: Value) {
        if let Value::Object(fields) = record {
            self.latest.extend(fields);
        }
    }

    /// Session at `index` in arrival order.
    #[must_use]
    pub fn session(&self, index: usize) -> Option<&Session> {
        self.sessions.get(index).map(Arc::as_ref)
    }

    /// Currently active session, if any.
    #[must_use]
    pub fn active_session(&self) -> Option<&Session> {
        self.active.and_then(|index| self.session(index))
    }

    /// Number of sessions ever started.
    #[must_use]
    pub fn sessions_count(&self) -> usize {
        self.sessions.len()
    }

    /// Snapshot of the session history.
    #[must_use]
    pub fn session_list(&self) -> SessionList {
        SessionList {
            sessions: self.sessions.clone(),
            total_sessions: self.sessions.len(),
        }
    }

    /// Snapshot of the latest view with the session history injected.
    #[must_use]
    pub fn latest_view(&self) -> LatestView {
        let mut fields = self.latest.clone();
        for key in RESERVED_KEYS {
            fields.remove(key);
        }

        LatestView {
            fields,
            sessions: self.sessions.clone(),
            total_sessions: self.sessions.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn submit(state: &mut StoreState, record: Value) -> Transition {
        let transition = state.apply(Event::classify(&record));
        state.merge_latest(record);
        transition
    }

    fn started(id: &str) -> Value {
        json!({"sessionStarted": {
            "name": "test_debug.py",
            "type": "debugpy",
            "id": id,
            "timestamp": "2025-01-01T10:00:00",
        }})
    }

    fn terminated(id: &str) -> Value {
        json!({"sessionTerminated": {"id": id, "timestamp": "2025-01-01T10:05:00"}})
    }

    #[test]
    fn test_empty_latest_view() {
        let view = StoreState::new().latest_view();
        assert_eq!(
            serde_json::to_value(view).unwrap(),
            json!({
                "variables": {},
                "stack": [],
                "breakpoints": [],
                "sessions": [],
                "totalSessions": 0,
            })
        );
    }

    #[test]
    fn test_start_then_terminate() {
        let mut state = StoreState::new();

        assert_eq!(
            submit(&mut state, started("s1")),
            Transition::Started {
                index: 0,
                abandoned: None
            }
        );
        assert_eq!(
            submit(&mut state, terminated("s1")),
            Transition::Terminated { index: 0 }
        );

        let session = state.session(0).unwrap();
        assert_eq!(session.end_time, "2025-01-01T10:05:00");
        let kinds: Vec<_> = session.events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::SessionStarted, EventKind::SessionTerminated]
        );
        assert!(state.active_session().is_none());
    }

    #[test]
    fn test_variables_replace_whole_mapping() {
        let mut state = StoreState::new();
        submit(&mut state, started("s1"));
        submit(&mut state, json!({"variables": {"a": 1, "b": 2}}));
        submit(&mut state, json!({"variables": {"x": 10, "y": 20}}));

        let session = state.active_session().unwrap();
        assert_eq!(session.variables, json!({"x": 10, "y": 20}));
        assert_eq!(
            session
                .events
                .iter()
                .filter(|e| e.kind == EventKind::Variables)
                .count(),
            2
        );
    }

    #[test]
    fn test_stack_replaced_events_kept() {
        let mut state = StoreState::new();
        submit(&mut state, started("s1"));
        let first = json!([{"id": 1, "name": "main", "line": 25, "source": "test_debug.py"}]);
        let second = json!([
            {"id": 1, "name": "main", "line": 26, "source": "test_debug.py"},
            {"id": 2, "name": "calculate_sum", "line": 7, "source": "test_debug.py"},
        ]);
        submit(&mut state, json!({"stack": first.clone()}));
        submit(&mut state, json!({"stack": second.clone()}));

        let session = state.active_session().unwrap();
        assert_eq!(session.stack, second);
        assert_eq!(session.events[1].data, first);
        assert_eq!(session.events[2].data, second);
    }

    #[test]
    fn test_breakpoints_replaced() {
        let mut state = StoreState::new();
        submit(&mut state, started("s1"));
        submit(
            &mut state,
            json!({"breakpoints": [{"id": "bp1", "enabled": true, "condition": null,
                                    "hitCondition": null, "logMessage": null}]}),
        );
        submit(&mut state, json!({"breakpoints": []}));

        assert_eq!(state.active_session().unwrap().breakpoints, json!([]));
        assert_eq!(state.latest_view().field("breakpoints"), Some(&json!([])));
    }

    #[test]
    fn test_start_while_active_abandons_previous() {
        let mut state = StoreState::new();
        submit(&mut state, started("s1"));
        submit(&mut state, json!({"debugEvent": {"event": "output"}}));

        assert_eq!(
            submit(&mut state, started("s2")),
            Transition::Started {
                index: 1,
                abandoned: Some(0)
            }
        );
        submit(&mut state, terminated("s2"));

        assert_eq!(state.sessions_count(), 2);
        let first = state.session(0).unwrap();
        assert_eq!(first.end_time, Value::Null);
        assert!(!first.is_terminated());
        assert_eq!(first.events.len(), 2);
        assert!(state.session(1).unwrap().is_terminated());
    }

    #[test]
    fn test_duplicate_ids_create_distinct_sessions() {
        let mut state = StoreState::new();
        submit(&mut state, started("same"));
        submit(&mut state, terminated("same"));
        submit(&mut state, started("same"));

        assert_eq!(state.sessions_count(), 2);
        assert_eq!(state.session(0).unwrap().id, state.session(1).unwrap().id);
    }

    #[test]
    fn test_events_without_active_session_only_reach_latest() {
        let mut state = StoreState::new();

        assert_eq!(submit(&mut state, terminated("ghost")), Transition::Detached);
        assert_eq!(
            submit(&mut state, json!({"variables": {"x": 1}})),
            Transition::Detached
        );
        assert_eq!(submit(&mut state, json!({"other": true})), Transition::Ignored);

        assert_eq!(state.sessions_count(), 0);
        let view = state.latest_view();
        assert_eq!(view.field("variables"), Some(&json!({"x": 1})));
        assert_eq!(view.field("other"), Some(&json!(true)));
        assert!(view.field("sessionTerminated").is_some());
    }

    #[test]
    fn test_unrecognized_while_active_is_not_recorded() {
        let mut state = StoreState::new();
        submit(&mut state, started("s1"));
        assert_eq!(
            submit(&mut state, json!({"console": "hi"})),
            Transition::Ignored
        );
        assert_eq!(state.active_session().unwrap().events.len(), 1);
        assert_eq!(state.latest_view().field("console"), Some(&json!("hi")));
    }

    #[test]
    fn test_latest_spans_sessions() {
        let mut state = StoreState::new();
        submit(&mut state, started("s1"));
        submit(&mut state, json!({"variables": {"x": 1}}));
        submit(&mut state, terminated("s1"));
        submit(&mut state, started("s2"));

        let view = state.latest_view();
        assert_eq!(view.field("variables"), Some(&json!({"x": 1})));
        assert_eq!(view.field("sessionStarted").unwrap()["id"], "s2");
        assert_eq!(state.active_session().unwrap().variables, json!({}));
    }

    #[test]
    fn test_reserved_keys_come_from_history() {
        let mut state = StoreState::new();
        submit(&mut state, json!({"sessions": "bogus", "totalSessions": 99}));
        submit(&mut state, started("s1"));

        let json = serde_json::to_value(state.latest_view()).unwrap();
        assert_eq!(json["totalSessions"], 1);
        assert_eq!(json["sessions"][0]["id"], "s1");
    }

    #[test]
    fn test_non_object_record_merges_nothing() {
        let mut state = StoreState::new();
        assert_eq!(submit(&mut state, json!([1, 2, 3])), Transition::Ignored);
        assert_eq!(state.latest_view().fields.len(), 3);
    }

    #[test]
    fn test_session_list_counts() {
        let mut state = StoreState::new();
        for id in ["a", "b", "c"] {
            submit(&mut state, started(id));
        }

        let list = state.session_list();
        assert_eq!(list.total_sessions, 3);
        let ids: Vec<_> = list.sessions.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, vec![json!("a"), json!("b"), json!("c")]);
    }

    #[test]
    fn test_snapshots_share_sessions() {
        let mut state = StoreState::new();
        submit(&mut state, started("s1"));
        submit(&mut state, terminated("s1"));
        submit(&mut state, started("s2"));

        let before = state.session_list();
        let view = state.latest_view();
        assert!(Arc::ptr_eq(&before.sessions[0], &view.sessions[0]));
        assert!(Arc::ptr_eq(&before.sessions[1], &view.sessions[1]));

        submit(&mut state, json!({"variables": {"x": 1}}));
        let after = state.session_list();

        // The closed session is untouched and still shared.
        assert!(Arc::ptr_eq(&before.sessions[0], &after.sessions[0]));
        // The active one was copied on write; the old snapshot is unchanged.
        assert!(!Arc::ptr_eq(&before.sessions[1], &after.sessions[1]));
        assert_eq!(before.sessions[1].events.len(), 1);
        assert_eq!(before.sessions[1].variables, json!({}));
        assert_eq!(after.sessions[1].variables, json!({"x": 1}));
    }

    #[test]
    fn test_non_string_header_fields_reach_history() {
        let mut state = StoreState::new();
        submit(
            &mut state,
            json!({"sessionStarted": {"id": 7, "name": ["a"], "timestamp": 1_700_000_000}}),
        );
        submit(
            &mut state,
            json!({"sessionTerminated": {"timestamp": {"epoch": 1_700_000_100}}}),
        );

        let json = serde_json::to_value(state.session_list()).unwrap();
        let session = &json["sessions"][0];
        assert_eq!(session["id"], json!(7));
        assert_eq!(session["name"], json!(["a"]));
        assert_eq!(session["startTime"], json!(1_700_000_000));
        assert_eq!(session["endTime"], json!({"epoch": 1_700_000_100}));
        assert!(state.active_session().is_none());
    }
}
