//! Store trait and the values it exchanges with transports.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::Session;

/// Acknowledgement status of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    Ok,
}

/// Result of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    pub status: AckStatus,
    /// Total sessions known to the store after the submission was applied.
    pub sessions_count: usize,
}

impl Ack {
    #[must_use]
    pub const fn ok(sessions_count: usize) -> Self {
        Self {
            status: AckStatus::Ok,
            sessions_count,
        }
    }
}

/// Full session history.
///
/// Sessions are shared with the store; a snapshot costs one pointer per
/// session and is unaffected by later submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionList {
    pub sessions: Vec<Arc<Session>>,
    pub total_sessions: usize,
}

/// Flat last-write-wins view with the session history injected.
///
/// `fields` never contains `sessions` or `totalSessions`; those always come
/// from the session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestView {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub sessions: Vec<Arc<Session>>,
    pub total_sessions: usize,
}

impl LatestView {
    /// Latest value submitted under a top-level key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Liveness status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
}

/// Liveness report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: HealthStatus,
}

/// Store error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store error: {0}")]
    Internal(String),
}

/// Trait for debugger event stores.
///
/// Every operation is atomic with respect to every other: a read never
/// observes a partially applied submission.
#[async_trait]
pub trait DebugStore: Send + Sync {
    /// Classify and apply one submitted record.
    ///
    /// Any JSON value is accepted; unknown shapes only reach the latest view
    /// (or nothing, if they have no top-level keys).
    async fn submit(&self, record: Value) -> Result<Ack, StoreError>;

    /// Latest flat view plus session history.
    async fn query(&self) -> Result<LatestView, StoreError>;

    /// Session history only.
    async fn sessions(&self) -> Result<SessionList, StoreError>;

    /// Liveness. The store has no external dependencies to check.
    fn health(&self) -> Health {
        Health {
            status: HealthStatus::Healthy,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_ack_wire_shape() {
        let json = serde_json::to_value(Ack::ok(3)).unwrap();
        assert_eq!(json, json!({"status": "ok", "sessionsCount": 3}));
    }

    #[test]
    fn test_health_wire_shape() {
        let health = Health {
            status: HealthStatus::Healthy,
        };
        assert_eq!(serde_json::to_value(health).unwrap(), json!({"status": "healthy"}));
    }

    #[test]
    fn test_latest_view_flattens_fields() {
        let mut fields = Map::new();
        fields.insert("variables".to_string(), json!({"x": 1}));
        fields.insert("stack".to_string(), json!([]));
        let view = LatestView {
            fields,
            sessions: Vec::new(),
            total_sessions: 0,
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(
            json,
            json!({"variables": {"x": 1}, "stack": [], "sessions": [], "totalSessions": 0})
        );

        let parsed: LatestView = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, view);
        assert_eq!(parsed.field("variables"), Some(&json!({"x": 1})));
    }
}
