//! Agent status storage

use std::fmt;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// What an agent is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentState {
    #[default]
    Unknown,
    Available,
    Ringing,
    OnCall,
    Unavailable,
}

impl AgentState {
    /// Map an Asterisk device state number (`QueueMemberStatus` `Status`).
    pub fn from_device_state(code: u8) -> Self {
        match code {
            1 => AgentState::Available,
            2 | 3 | 8 => AgentState::OnCall,
            6 | 7 => AgentState::Ringing,
            4 | 5 => AgentState::Unavailable,
            _ => AgentState::Unknown,
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentState::Unknown => "unknown",
            AgentState::Available => "available",
            AgentState::Ringing => "ringing",
            AgentState::OnCall => "on-call",
            AgentState::Unavailable => "unavailable",
        };
        f.write_str(s)
    }
}

/// Last known status of one agent, keyed by extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatus {
    pub extension: String,
    pub state: AgentState,
    pub paused: bool,
    pub pause_reason: Option<String>,
    pub queue: Option<String>,
    pub calls_taken: u32,
    pub updated_at: DateTime<Utc>,
}

impl AgentStatus {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            state: AgentState::Unknown,
            paused: false,
            pause_reason: None,
            queue: None,
            calls_taken: 0,
            updated_at: Utc::now(),
        }
    }
}

/// Shared agent status map.
///
/// Implementations must be safe to use from several tasks at once.
pub trait AgentStatusStore: Send + Sync {
    fn get(&self, extension: &str) -> Option<AgentStatus>;

    /// Insert or replace the status for `status.extension`.
    fn upsert(&self, status: AgentStatus);

    /// All statuses in first-seen order.
    fn enumerate(&self) -> Vec<AgentStatus>;
}

/// Process-local store backed by an insertion-ordered map
#[derive(Debug, Default)]
pub struct InMemoryAgentStatusStore {
    inner: RwLock<IndexMap<String, AgentStatus>>,
}

impl InMemoryAgentStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AgentStatusStore for InMemoryAgentStatusStore {
    fn get(&self, extension: &str) -> Option<AgentStatus> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(extension)
            .cloned()
    }

    fn upsert(&self, status: AgentStatus) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                status
                    .extension
                    .clone(),
                status,
            );
    }

    fn enumerate(&self) -> Vec<AgentStatus> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn upsert_replaces_in_place() {
        let store = InMemoryAgentStatusStore::new();
        store.upsert(AgentStatus::new("1000"));
        store.upsert(AgentStatus::new("1001"));

        let mut busy = AgentStatus::new("1000");
        busy.state = AgentState::OnCall;
        store.upsert(busy);

        let all = store.enumerate();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].extension, "1000");
        assert_eq!(all[0].state, AgentState::OnCall);
        assert_eq!(all[1].extension, "1001");
        assert!(store
            .get("9999")
            .is_none());
    }

    #[test]
    fn shared_between_threads() {
        let store = Arc::new(InMemoryAgentStatusStore::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.upsert(AgentStatus::new(format!("10{:02}", i))))
            })
            .collect();
        for h in handles {
            h.join()
                .unwrap();
        }
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn device_state_codes() {
        assert_eq!(AgentState::from_device_state(1), AgentState::Available);
        assert_eq!(AgentState::from_device_state(2), AgentState::OnCall);
        assert_eq!(AgentState::from_device_state(6), AgentState::Ringing);
        assert_eq!(AgentState::from_device_state(5), AgentState::Unavailable);
        assert_eq!(AgentState::from_device_state(42), AgentState::Unknown);
        assert_eq!(AgentState::OnCall.to_string(), "on-call");
    }

    #[test]
    fn serializes_camel_case() {
        let status = AgentStatus::new("1000");
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["callsTaken"], 0);
        assert_eq!(json["state"], "unknown");
    }
}
