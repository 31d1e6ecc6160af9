//! Manager actions and their responses

use std::fmt;

use indexmap::IndexMap;

use super::protocol::{AmiMessage, MessageType};
use crate::{
    constants::*,
    error::{DialplanError, DialplanResult},
};

/// Outgoing action. `Display` renders the wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    name: String,
    action_id: Option<String>,
    headers: IndexMap<String, String>,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action_id: None,
            headers: IndexMap::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into(), value.into());
        self
    }

    pub fn with_action_id(mut self, id: impl Into<String>) -> Self {
        self.action_id = Some(id.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action_id(&self) -> Option<&str> {
        self.action_id
            .as_deref()
    }

    pub fn login(username: &str, secret: &str) -> Self {
        Self::new("Login")
            .header("Username", username)
            .header("Secret", secret)
            .header("Events", "on")
    }

    /// CLI command, e.g. `dialplan reload`
    pub fn command(command: &str) -> Self {
        Self::new("Command").header("Command", command)
    }

    pub fn ping() -> Self {
        Self::new("Ping")
    }

    pub fn logoff() -> Self {
        Self::new("Logoff")
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}{}", HEADER_ACTION, self.name, LINE_TERMINATOR)?;
        if let Some(id) = &self.action_id {
            write!(f, "{}: {}{}", HEADER_ACTION_ID, id, LINE_TERMINATOR)?;
        }
        for (key, value) in &self.headers {
            write!(f, "{}: {}{}", key, value, LINE_TERMINATOR)?;
        }
        f.write_str(LINE_TERMINATOR)
    }
}

/// Reply to an [`Action`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmiResponse {
    status: String,
    headers: IndexMap<String, String>,
    output: Vec<String>,
}

impl AmiResponse {
    /// `None` if the message is not a response
    pub fn from_message(message: AmiMessage) -> Option<Self> {
        match message.message_type {
            MessageType::Response(status) => Some(Self {
                status,
                headers: message.headers,
                output: message.output,
            }),
            _ => None,
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// `Success`, `Follows` and `Goodbye` all count as success.
    pub fn is_success(&self) -> bool {
        ["Success", "Follows", "Goodbye"]
            .iter()
            .any(|s| {
                self.status
                    .eq_ignore_ascii_case(s)
            })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .map(String::as_str)
    }

    pub fn message(&self) -> Option<&str> {
        self.header(HEADER_MESSAGE)
    }

    pub fn action_id(&self) -> Option<&str> {
        self.header(HEADER_ACTION_ID)
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// `Err(ActionFailed)` unless the response reports success
    pub fn into_result(self, action: &str) -> DialplanResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(DialplanError::ActionFailed {
                action: action.to_string(),
                message: self
                    .message()
                    .unwrap_or("no message")
                    .to_string(),
            })
        }
    }
}
