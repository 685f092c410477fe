//! Validation session store.
//!
//! A process-local key-value store of validation history, keyed by session
//! id. Sessions are created on first reference, mutated only by appending
//! attempts, and never deleted at this layer (deletion is a no-op).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// One recorded fulfillment of a validation operation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ValidationAttempt {
    pub operation: String,
    pub provider: String,
    pub model: String,
    /// Structured model reply, as parsed.
    pub response: serde_json::Value,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Session {
    pub id: String,
    pub created_ms: u64,
    /// Free-form problem/tech metadata supplied at creation.
    pub context: serde_json::Value,
    pub history: Vec<ValidationAttempt>,
}

#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    counter: AtomicU64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<Session> {
        self.sessions.lock().await.get(id).cloned()
    }

    /// Create a session with a generated id.
    pub async fn create(&self, context: serde_json::Value) -> Session {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let id = format!("session-{}-{seq}", unix_ms_now());
        self.get_or_create(&id, context).await
    }

    /// Fetch the session, creating it on first reference to an unseen id.
    pub async fn get_or_create(&self, id: &str, context: serde_json::Value) -> Session {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(id.to_string())
            .or_insert_with(|| Session {
                id: id.to_string(),
                created_ms: unix_ms_now(),
                context,
                history: Vec::new(),
            })
            .clone()
    }

    /// Append an attempt, creating the session if needed.
    pub async fn append(&self, id: &str, attempt: ValidationAttempt) {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(id.to_string())
            .or_insert_with(|| Session {
                id: id.to_string(),
                created_ms: unix_ms_now(),
                context: serde_json::Value::Null,
                history: Vec::new(),
            })
            .history
            .push(attempt);
    }

    pub async fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
