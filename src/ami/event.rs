//! Manager events

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::protocol::{AmiMessage, MessageType};

/// Events the crate reacts to; everything else is kept by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmiEventType {
    FullyBooted,
    Reload,
    AgentCalled,
    AgentConnect,
    AgentComplete,
    AgentRingNoAnswer,
    QueueMemberAdded,
    QueueMemberRemoved,
    QueueMemberPause,
    QueueMemberStatus,
    Other(String),
}

impl AmiEventType {
    pub fn parse_event_type(name: &str) -> Self {
        match name {
            "FullyBooted" => Self::FullyBooted,
            "Reload" => Self::Reload,
            "AgentCalled" => Self::AgentCalled,
            "AgentConnect" => Self::AgentConnect,
            "AgentComplete" => Self::AgentComplete,
            "AgentRingNoAnswer" => Self::AgentRingNoAnswer,
            "QueueMemberAdded" => Self::QueueMemberAdded,
            "QueueMemberRemoved" => Self::QueueMemberRemoved,
            // Asterisk 12 renamed QueueMemberPaused
            "QueueMemberPause" | "QueueMemberPaused" => Self::QueueMemberPause,
            "QueueMemberStatus" => Self::QueueMemberStatus,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for AmiEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FullyBooted => "FullyBooted",
            Self::Reload => "Reload",
            Self::AgentCalled => "AgentCalled",
            Self::AgentConnect => "AgentConnect",
            Self::AgentComplete => "AgentComplete",
            Self::AgentRingNoAnswer => "AgentRingNoAnswer",
            Self::QueueMemberAdded => "QueueMemberAdded",
            Self::QueueMemberRemoved => "QueueMemberRemoved",
            Self::QueueMemberPause => "QueueMemberPause",
            Self::QueueMemberStatus => "QueueMemberStatus",
            Self::Other(name) => name,
        };
        f.write_str(name)
    }
}

/// Event with its headers in wire order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmiEvent {
    event_type: AmiEventType,
    headers: IndexMap<String, String>,
}

impl AmiEvent {
    pub fn new(event_type: AmiEventType) -> Self {
        Self {
            event_type,
            headers: IndexMap::new(),
        }
    }

    /// `None` if the message is not an event
    pub fn from_message(message: AmiMessage) -> Option<Self> {
        match message.message_type {
            MessageType::Event(name) => Some(Self {
                event_type: AmiEventType::parse_event_type(&name),
                headers: message.headers,
            }),
            _ => None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into(), value.into());
        self
    }

    pub fn event_type(&self) -> &AmiEventType {
        &self.event_type
    }

    pub fn is_event_type(&self, event_type: &AmiEventType) -> bool {
        &self.event_type == event_type
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .map(String::as_str)
    }

    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }
}
