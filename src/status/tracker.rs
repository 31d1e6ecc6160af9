//! Folding queue events into the status store

use std::sync::Arc;

use chrono::Utc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace};

use super::store::{AgentState, AgentStatus, AgentStatusStore};
use crate::{
    ami::{AmiConnection, AmiEvent, AmiEventType},
    error::DialplanResult,
};

/// Extension from an interface such as `PJSIP/1000` or `Local/1000@from-queue/n`.
pub fn extension_of(interface: &str) -> Option<&str> {
    let rest = match interface.split_once('/') {
        Some((_, rest)) => rest,
        None => interface,
    };
    let ext = rest
        .split(['@', '/', '-'])
        .next()
        .unwrap_or(rest)
        .trim();
    (!ext.is_empty()).then_some(ext)
}

fn is_set(flag: Option<&str>) -> bool {
    matches!(flag.map(str::trim), Some("1") | Some("true") | Some("yes"))
}

/// Applies `AgentConnect`, `AgentComplete`, `QueueMemberPause` and
/// `QueueMemberStatus` events to a store.
pub struct AgentStatusTracker<T: AgentStatusStore> {
    store: Arc<T>,
}

impl<T: AgentStatusStore> AgentStatusTracker<T> {
    pub fn new(store: Arc<T>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<T> {
        &self.store
    }

    /// Update the store from one event. Returns the new status when the event
    /// concerned an agent.
    pub fn apply(&self, event: &AmiEvent) -> Option<AgentStatus> {
        let interface = event
            .header("Interface")
            .or_else(|| event.header("StateInterface"))
            .or_else(|| event.header("Location"))?;
        let extension = extension_of(interface)?;

        let mut status = self
            .store
            .get(extension)
            .unwrap_or_else(|| AgentStatus::new(extension));
        let queue = event
            .header("Queue")
            .map(str::to_string);

        match event.event_type() {
            AmiEventType::AgentConnect => {
                status.state = AgentState::OnCall;
                status.queue = queue.or(status.queue);
            }
            AmiEventType::AgentComplete => {
                status.state = AgentState::Available;
                status.calls_taken += 1;
            }
            AmiEventType::QueueMemberPause => {
                status.paused = is_set(event.header("Paused"));
                status.pause_reason = if status.paused {
                    event
                        .header("PausedReason")
                        .or_else(|| event.header("Reason"))
                        .filter(|r| !r.is_empty())
                        .map(str::to_string)
                } else {
                    None
                };
            }
            AmiEventType::QueueMemberStatus => {
                if let Some(code) = event
                    .header("Status")
                    .and_then(|s| {
                        s.trim()
                            .parse::<u8>()
                            .ok()
                    })
                {
                    status.state = AgentState::from_device_state(code);
                }
                if let Some(paused) = event.header("Paused") {
                    status.paused = is_set(Some(paused));
                }
                status.queue = queue.or(status.queue);
            }
            other => {
                trace!("Event {} does not affect agent status", other);
                return None;
            }
        }

        status.updated_at = Utc::now();
        debug!(
            "Agent {} is {}{}",
            status.extension,
            status.state,
            if status.paused { " (paused)" } else { "" }
        );
        self.store
            .upsert(status.clone());
        Some(status)
    }

    /// Apply events from `connection` until the server closes the session.
    pub async fn follow<S>(&self, connection: &mut AmiConnection<S>) -> DialplanResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        while let Some(event) = connection
            .recv_event()
            .await?
        {
            self.apply(&event);
        }
        Ok(())
    }
}
